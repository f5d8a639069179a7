//! # cv 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/cv.rs`

use super::common::{DataArgs, ModelArgs, PlotFormat};
use clap::Args;
use std::path::PathBuf;

/// cv 子命令参数
#[derive(Args, Debug)]
pub struct CvArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Number of alphas on the logarithmic grid
    #[arg(long, default_value_t = 300)]
    pub n_alphas: usize,

    /// Largest alpha of the grid
    #[arg(long, default_value_t = 1e-1)]
    pub alpha_max: f64,

    /// Smallest alpha of the grid
    #[arg(long, default_value_t = 1e-6)]
    pub alpha_min: f64,

    /// Number of group folds
    #[arg(long, default_value_t = 5)]
    pub n_splits: usize,

    /// Share of the L1 term in the penalty (1 = LASSO, below 1 = elastic net)
    #[arg(long, default_value_t = 1.0)]
    pub l1_ratio: f64,

    /// Convergence tolerance of the final fit at the optimal alpha
    #[arg(long, default_value_t = 1e-7)]
    pub tol: f64,

    /// Convergence tolerance along the regularization path
    #[arg(long, default_value_t = 1e-4)]
    pub path_tol: f64,

    /// Maximum coordinate-descent sweeps per alpha
    #[arg(long, default_value_t = 1000)]
    pub max_iter: usize,

    /// Do not standardize design-matrix columns
    #[arg(long)]
    pub no_standardize: bool,

    /// Refit the selected coefficients by ordinary least squares
    #[arg(long)]
    pub debias: bool,

    /// Cross-validation score table
    #[arg(short, long, default_value = "sklearn_cvscore.dat")]
    pub output: PathBuf,

    /// Cross-validation plot
    #[arg(long, default_value = "sklearn_cvscore.png")]
    pub plot: PathBuf,

    /// Plot format (default: guessed from the plot file extension)
    #[arg(long, value_enum)]
    pub format: Option<PlotFormat>,

    /// Do not draw the cross-validation plot
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width in pixels
    #[arg(long, default_value_t = 1000)]
    pub width: u32,

    /// Plot height in pixels
    #[arg(long, default_value_t = 700)]
    pub height: u32,

    /// Write the coefficients along the full-data regularization path to this file
    #[arg(long)]
    pub save_path: Option<PathBuf>,

    /// Also write the harmonic force constants to this CSV file
    #[arg(long)]
    pub fc_csv: Option<PathBuf>,

    /// Number of parallel jobs (0 = all cores)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,
}
