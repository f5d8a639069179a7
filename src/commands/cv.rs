//! # cv 命令实现
//!
//! 完整流程：读取结构与数据 → 设计矩阵 → 分组交叉验证 →
//! 以测试误差最小的 α 拟合全部数据 → 输出力常数与评分。
//!
//! ## 依赖关系
//! - 使用 `cli/cv.rs` 定义的 CvArgs
//! - 使用 `commands/pipeline.rs` 的共享步骤
//! - 使用 `regression/cv.rs` 做交叉验证，`report/` 写文件和绘图

use super::pipeline::{self, FinalFit};
use crate::cli::common::PlotFormat;
use crate::cli::cv::CvArgs;
use crate::error::{FclassoError, Result};
use crate::regression::{self, CvScores, CvSettings, PathParams};
use crate::report;
use crate::utils::{output, progress};

use std::path::Path;
use tabled::{Table, Tabled};

/// 执行 cv 命令
pub fn execute(args: CvArgs) -> Result<()> {
    output::print_header("LASSO Force Constants: Cross-Validation");
    validate_args(&args)?;

    let pool = pipeline::build_pool(args.jobs)?;
    let crystal = pipeline::load_crystal(&args.data)?;
    let data = pipeline::load_data(&args.data, crystal.n_atoms())?;
    let mut model = pipeline::build_model(&crystal, &args.model)?;
    let (x, y) = pipeline::assemble(&mut model, &data, &pool)?;

    output::print_info(&format!(
        "Estimated alpha_max = {:.6e}",
        regression::estimate_alpha_max(&x, &y)?
    ));

    // 交叉验证
    let settings = CvSettings {
        alphas: regression::logspace(args.alpha_max.log10(), args.alpha_min.log10(), args.n_alphas),
        n_splits: args.n_splits,
        standardize: !args.no_standardize,
        path: PathParams {
            tol: args.path_tol,
            max_iter: args.max_iter,
            l1_ratio: args.l1_ratio,
        },
    };
    output::print_info(&format!(
        "{}-fold group cross-validation over {} alphas in [{:e}, {:e}] using {} threads",
        settings.n_splits,
        settings.alphas.len(),
        args.alpha_min,
        args.alpha_max,
        pool.current_num_threads()
    ));

    let pb = progress::create_progress_bar(
        (settings.n_splits * settings.alphas.len()) as u64,
        "LASSO path",
    );
    let groups = data.groups();
    let scores = pool.install(|| {
        regression::cross_validate(&x, &y, &groups, &settings, || pb.inc(1))
    });
    pb.finish_and_clear();
    let scores = scores?;

    if scores.n_unconverged > 0 {
        output::print_warning(&format!(
            "{} path points did not converge within {} iterations",
            scores.n_unconverged, args.max_iter
        ));
    }

    report::export::write_cv_scores(&args.output, &scores)?;
    output::print_success(&format!("CV scores saved to '{}'", args.output.display()));

    if let Some(path) = &args.save_path {
        let solution = pool.install(|| pipeline::full_path(&x, &y, &settings))?;
        report::export::write_solution_path(path, &solution)?;
        output::print_success(&format!("Solution path saved to '{}'", path.display()));
    }

    let alpha_opt = scores.best_alpha();
    print_score_summary(&scores);
    output::print_info(&format!("alpha_opt = {:e}", alpha_opt));
    output::print_array("rmse_mean", &scores.train_mean);
    output::print_array("cv_mean", &scores.test_mean);

    // 最优 α 拟合全部数据
    let final_fit = FinalFit {
        alpha: alpha_opt,
        l1_ratio: args.l1_ratio,
        tol: args.tol,
        max_iter: args.max_iter,
        standardize: !args.no_standardize,
        debias: args.debias,
    };
    let params = pool.install(|| pipeline::fit_all(&x, &y, &final_fit))?;
    pipeline::report_fit(&model, &x, &y, &params, args.fc_csv.as_deref())?;

    if !args.no_plot {
        let use_svg = match args.format {
            Some(format) => format == PlotFormat::Svg,
            None => guess_svg(&args.plot),
        };
        report::plot::plot_cv_scores(&scores, &args.plot, args.width, args.height, use_svg)?;
        output::print_success(&format!("CV plot saved to '{}'", args.plot.display()));
    }

    output::print_done("Cross-validation finished");
    Ok(())
}

fn validate_args(args: &CvArgs) -> Result<()> {
    if args.n_alphas == 0 {
        return Err(FclassoError::InvalidArgument(
            "--n-alphas must be at least 1".to_string(),
        ));
    }
    if args.alpha_min <= 0.0 || args.alpha_max <= 0.0 {
        return Err(FclassoError::InvalidArgument(format!(
            "alpha grid bounds must be positive, got [{}, {}]",
            args.alpha_min, args.alpha_max
        )));
    }
    if !(args.l1_ratio > 0.0 && args.l1_ratio <= 1.0) {
        return Err(FclassoError::InvalidArgument(format!(
            "--l1-ratio must be in (0, 1], got {}",
            args.l1_ratio
        )));
    }
    if args.n_splits < 2 {
        return Err(FclassoError::InvalidArgument(format!(
            "--n-splits must be at least 2, got {}",
            args.n_splits
        )));
    }
    Ok(())
}

/// 根据扩展名判断是否输出 SVG
fn guess_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("svg"))
        .unwrap_or(false)
}

#[derive(Tabled)]
struct ScoreRow {
    #[tabled(rename = "")]
    mark: &'static str,
    #[tabled(rename = "alpha")]
    alpha: String,
    #[tabled(rename = "RMSE train")]
    train: String,
    #[tabled(rename = "RMSE test")]
    test: String,
    #[tabled(rename = "std test")]
    test_std: String,
}

/// 最优 α 附近的评分表
fn print_score_summary(scores: &CvScores) {
    let best = scores.best_index();
    let lo = best.saturating_sub(3);
    let hi = (best + 4).min(scores.len());

    let rows: Vec<ScoreRow> = (lo..hi)
        .map(|k| ScoreRow {
            mark: if k == best { "*" } else { "" },
            alpha: format!("{:.4e}", scores.alphas[k]),
            train: format!("{:.6}", scores.train_mean[k]),
            test: format!("{:.6}", scores.test_mean[k]),
            test_std: format!("{:.6}", scores.test_std[k]),
        })
        .collect();

    output::print_header("Cross-Validation Scores near the Optimum");
    println!("{}", Table::new(&rows));
}
