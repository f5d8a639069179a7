//! # 共享流程
//!
//! 各子命令共用的步骤：读取输入、构建力常数模型、组装设计矩阵、
//! 最终拟合与力常数报告。
//!
//! ## 依赖关系
//! - 被 `commands/cv.rs`, `commands/fit.rs`, `commands/basis.rs` 调用
//! - 使用 `parsers/`, `fcs/`, `regression/`, `report/`, `utils/`

use crate::cli::common::{DataArgs, ModelArgs};
use crate::error::{FclassoError, Result};
use crate::fcs::{Constraint, ForceConstantModel, Interaction};
use crate::models::{Crystal, TrainingSet};
use crate::parsers;
use crate::regression::{self, CvSettings, Dmat, Dvec, Lasso, LassoPath, StandardScaler};
use crate::report;
use crate::utils::{output, progress};

use std::path::Path;
use tabled::{Table, Tabled};

/// 由命令行参数构造相互作用设置
pub fn interaction_from_args(args: &ModelArgs) -> Interaction {
    let constraint = if args.no_translation {
        Constraint::None
    } else {
        Constraint::Translation
    };
    Interaction::from_raw(args.maxorder, &args.cutoff, &args.nbody, constraint)
}

/// 按 `jobs` 创建 rayon 线程池，0 表示使用全部核心
pub fn build_pool(jobs: usize) -> Result<rayon::ThreadPool> {
    let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| FclassoError::Other(format!("failed to build thread pool: {}", e)))
}

/// 读取结构
pub fn load_crystal(data: &DataArgs) -> Result<Crystal> {
    let crystal = parsers::load_structure(data.structure.as_deref())?;
    output::print_success(&format!(
        "Loaded structure: {} ({} atoms, {})",
        crystal.name,
        crystal.n_atoms(),
        crystal.formula()
    ));
    let (a, b, c, alpha, beta, gamma) = crystal.lattice.parameters();
    output::print_info(&format!(
        "Lattice: a = {:.4}, b = {:.4}, c = {:.4} bohr, angles = ({:.2}, {:.2}, {:.2}), V = {:.3} bohr^3",
        a,
        b,
        c,
        alpha,
        beta,
        gamma,
        crystal.lattice.volume().abs()
    ));
    Ok(crystal)
}

/// 读取位移与力数据
pub fn load_data(data: &DataArgs, n_atoms: usize) -> Result<TrainingSet> {
    let set = parsers::load_training_set(&data.disp, &data.force, n_atoms, data.ndata)?;
    let (samples, atoms, dim) = set.shape();
    output::print_success(&format!(
        "Loaded displacements '{}' and forces '{}' with shape ({}, {}, {})",
        data.disp.display(),
        data.force.display(),
        samples,
        atoms,
        dim
    ));
    Ok(set)
}

/// 对称性分析并生成候选基函数
pub fn build_model(crystal: &Crystal, args: &ModelArgs) -> Result<ForceConstantModel> {
    let interaction = interaction_from_args(args);
    interaction.validate()?;

    let spinner = progress::create_spinner("Analyzing symmetry and clusters...");
    let model = ForceConstantModel::build(crystal, &interaction);
    spinner.finish_and_clear();
    let model = model?;

    output::print_info(&format!(
        "Space group: {} operations ({} rotations x {} translations), {} primitive atom(s)",
        model.group.order(),
        model.group.point_group_order(),
        model.group.pure_translations().count(),
        model.group.primitive_atoms().len()
    ));
    output::print_info(&format!(
        "{} cluster orbits, {} candidate basis functions",
        model.orbits.len(),
        model.candidates.len()
    ));
    Ok(model)
}

/// 组装设计矩阵
pub fn assemble(
    model: &mut ForceConstantModel,
    data: &TrainingSet,
    pool: &rayon::ThreadPool,
) -> Result<(Dmat, Dvec)> {
    let spinner = progress::create_spinner("Building design matrix...");
    let result = pool.install(|| model.design_matrix(data));
    spinner.finish_and_clear();
    let (x, y) = result?;

    output::print_info(&format!("force shape: ({},)", y.len()));
    output::print_info(&format!("Amat shape : ({}, {})", x.nrows(), x.ncols()));
    Ok((x, y))
}

/// 最终拟合设置
#[derive(Debug, Clone, Copy)]
pub struct FinalFit {
    pub alpha: f64,
    pub l1_ratio: f64,
    pub tol: f64,
    pub max_iter: usize,
    pub standardize: bool,
    pub debias: bool,
}

/// 在全部数据上拟合，返回原始列尺度下的力常数参数
pub fn fit_all(x: &Dmat, y: &Dvec, settings: &FinalFit) -> Result<Dvec> {
    let lasso = Lasso::new(settings.alpha)
        .with_l1_ratio(settings.l1_ratio)
        .with_tol(settings.tol)
        .with_max_iter(settings.max_iter);

    let (fit, params) = if settings.standardize {
        let scaler = StandardScaler::fit(x);
        let fit = lasso.fit(&scaler.transform(x), y)?;
        let params = scaler.unscale(&fit.coef);
        (fit, params)
    } else {
        let fit = lasso.fit(x, y)?;
        let params = fit.coef.clone();
        (fit, params)
    };

    if fit.converged {
        output::print_success(&format!(
            "LASSO converged in {} iterations (alpha = {:e}, duality gap = {:.3e}, {} nonzero)",
            fit.n_iter,
            settings.alpha,
            fit.dual_gap,
            fit.l0_norm()
        ));
    } else {
        output::print_warning(&format!(
            "LASSO did not converge in {} iterations (duality gap = {:.3e}); \
             consider increasing --max-iter",
            fit.n_iter, fit.dual_gap
        ));
    }

    if settings.debias {
        output::print_info("Refitting the selected coefficients by least squares");
        return regression::debias(x, y, &params);
    }
    Ok(params)
}

/// 在全部数据上沿 α 网格计算路径，系数换算回原始列尺度
pub fn full_path(x: &Dmat, y: &Dvec, settings: &CvSettings) -> Result<LassoPath> {
    let pb = progress::create_progress_bar(settings.alphas.len() as u64, "Full-data path");
    let result = if settings.standardize {
        let scaler = StandardScaler::fit(x);
        regression::lasso_path(
            &scaler.transform(x),
            y,
            &settings.alphas,
            &settings.path,
            || pb.inc(1),
        )
        .map(|mut path| {
            for k in 0..path.alphas.len() {
                let coef = scaler.unscale(&path.coefs.column(k).into_owned());
                path.coefs.set_column(k, &coef);
            }
            path
        })
    } else {
        regression::lasso_path(x, y, &settings.alphas, &settings.path, || pb.inc(1))
    };
    pb.finish_and_clear();
    result
}

#[derive(Tabled)]
struct OrderRow {
    #[tabled(rename = "Order")]
    name: String,
    #[tabled(rename = "Parameters")]
    parameters: usize,
    #[tabled(rename = "Nonzero")]
    nonzero: usize,
}

/// 打印拟合结果：系数、简谐力常数、L0 范数与每阶非零个数
pub fn report_fit(
    model: &ForceConstantModel,
    x: &Dmat,
    y: &Dvec,
    params: &Dvec,
    fc_csv: Option<&Path>,
) -> Result<()> {
    let values: Vec<f64> = params.iter().copied().collect();

    output::print_header("Fitted Parameters");
    output::print_array("fc", &values);

    output::print_header("Harmonic Force Constants (origin mode)");
    let elements = model.harmonic_constants(&values)?;
    for e in &elements {
        println!("{:15.7} {} {}", e.value, e.label(0), e.label(1));
    }

    if let Some(path) = fc_csv {
        report::export::write_fc_csv(path, &elements)?;
        output::print_success(&format!(
            "Harmonic force constants saved to '{}'",
            path.display()
        ));
    }

    let l0 = values.iter().filter(|v| **v != 0.0).count();
    let residual = (y - x * params).norm_squared();
    let norm = y.norm_squared();
    output::print_separator();
    output::print_info(&format!("L0 norm of fc: {}", l0));
    if norm > 0.0 {
        output::print_info(&format!(
            "Relative fitting error: {:.6e}",
            (residual / norm).sqrt()
        ));
    }

    let nonzero = model.nonzero_per_order(&values)?;
    let rows: Vec<OrderRow> = model
        .parameters_per_order()
        .into_iter()
        .zip(nonzero)
        .enumerate()
        .map(|(k, (parameters, nonzero))| OrderRow {
            name: Interaction::order_name(k + 1),
            parameters,
            nonzero,
        })
        .collect();
    println!("{}", Table::new(&rows));

    Ok(())
}
