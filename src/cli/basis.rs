//! # basis 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/basis.rs`

use super::common::{DataArgs, ModelArgs};
use clap::Args;

/// basis 子命令参数
#[derive(Args, Debug)]
pub struct BasisArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Also read the training data and build the design matrix
    #[arg(long)]
    pub with_data: bool,

    /// Number of parallel jobs (0 = all cores)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,
}
