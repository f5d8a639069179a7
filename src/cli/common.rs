//! # 公共参数
//!
//! 各子命令共享的数据输入与模型设置参数。
//!
//! ## 依赖关系
//! - 被 `cli/cv.rs`, `cli/fit.rs`, `cli/basis.rs` 引用
//! - 由 `commands/pipeline.rs` 转换为 TrainingSet 与 Interaction

use clap::Args;
use std::path::PathBuf;

/// 训练数据输入
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Displacement file: whitespace-separated numbers, 3 per atom per sample (bohr)
    #[arg(long, default_value = "disp_random.dat")]
    pub disp: PathBuf,

    /// Force file with the same layout as the displacement file (Ry/bohr)
    #[arg(long, default_value = "force_random.dat")]
    pub force: PathBuf,

    /// Supercell in POSCAR format (default: built-in 64-atom Si diamond supercell)
    #[arg(long)]
    pub structure: Option<PathBuf>,

    /// Number of displacement configurations to use
    #[arg(long, default_value_t = 30)]
    pub ndata: usize,
}

/// 力常数模型设置
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Maximum order (1 = harmonic, 2 = cubic, ...)
    #[arg(long, default_value_t = 5)]
    pub maxorder: usize,

    /// Cutoff radius per order in bohr, negative for none
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_value = "-1,-1,15,8,8"
    )]
    pub cutoff: Vec<f64>,

    /// Maximum number of distinct atoms per order
    #[arg(long, value_delimiter = ',', default_value = "2,3,3,2,2")]
    pub nbody: Vec<usize>,

    /// Do not impose translational invariance
    #[arg(long)]
    pub no_translation: bool,
}

/// 图像格式
#[derive(Debug, Clone, Copy, clap::ValueEnum, PartialEq, Eq)]
pub enum PlotFormat {
    /// PNG image
    Png,
    /// SVG vector image
    Svg,
}
