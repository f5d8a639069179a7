//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `fcs/`, `regression/`, `report/`, `utils/`
//! - 子模块: pipeline, cv, fit, basis

pub mod basis;
pub mod cv;
pub mod fit;
pub mod pipeline;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Cv(args) => cv::execute(args),
        Commands::Fit(args) => fit::execute(args),
        Commands::Basis(args) => basis::execute(args),
    }
}
