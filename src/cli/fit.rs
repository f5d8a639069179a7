//! # fit 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/fit.rs`

use super::common::{DataArgs, ModelArgs};
use clap::Args;
use std::path::PathBuf;

/// fit 子命令参数
#[derive(Args, Debug)]
pub struct FitArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Regularization strength
    #[arg(long)]
    pub alpha: f64,

    /// Share of the L1 term in the penalty (1 = LASSO, below 1 = elastic net)
    #[arg(long, default_value_t = 1.0)]
    pub l1_ratio: f64,

    /// Convergence tolerance
    #[arg(long, default_value_t = 1e-7)]
    pub tol: f64,

    /// Maximum coordinate-descent sweeps
    #[arg(long, default_value_t = 1000)]
    pub max_iter: usize,

    /// Do not standardize design-matrix columns
    #[arg(long)]
    pub no_standardize: bool,

    /// Refit the selected coefficients by ordinary least squares
    #[arg(long)]
    pub debias: bool,

    /// Also write the harmonic force constants to this CSV file
    #[arg(long)]
    pub fc_csv: Option<PathBuf>,

    /// Number of parallel jobs (0 = all cores)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,
}
