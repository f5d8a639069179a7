//! # fit 命令实现
//!
//! 不做交叉验证，直接以给定 α 拟合全部数据并输出力常数。
//!
//! ## 依赖关系
//! - 使用 `cli/fit.rs` 定义的 FitArgs
//! - 使用 `commands/pipeline.rs` 的共享步骤

use super::pipeline::{self, FinalFit};
use crate::cli::fit::FitArgs;
use crate::error::{FclassoError, Result};
use crate::utils::output;

/// 执行 fit 命令
pub fn execute(args: FitArgs) -> Result<()> {
    output::print_header("LASSO Force Constants: Single Fit");

    if args.alpha < 0.0 {
        return Err(FclassoError::InvalidArgument(format!(
            "--alpha must be non-negative, got {}",
            args.alpha
        )));
    }

    let pool = pipeline::build_pool(args.jobs)?;
    let crystal = pipeline::load_crystal(&args.data)?;
    let data = pipeline::load_data(&args.data, crystal.n_atoms())?;
    let mut model = pipeline::build_model(&crystal, &args.model)?;
    let (x, y) = pipeline::assemble(&mut model, &data, &pool)?;

    let final_fit = FinalFit {
        alpha: args.alpha,
        l1_ratio: args.l1_ratio,
        tol: args.tol,
        max_iter: args.max_iter,
        standardize: !args.no_standardize,
        debias: args.debias,
    };
    let params = pool.install(|| pipeline::fit_all(&x, &y, &final_fit))?;
    pipeline::report_fit(&model, &x, &y, &params, args.fc_csv.as_deref())?;

    output::print_done("Fit finished");
    Ok(())
}
