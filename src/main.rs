//! # fclasso - 基于 LASSO 的非简谐力常数稀疏拟合
//!
//! 由超胞中随机位移构型的位移-力数据，构造对称化的力常数基函数
//! 设计矩阵，用分组交叉验证选择 LASSO 正则化强度并输出简谐力常数。
//!
//! ## 子命令
//! - `cv`    - 交叉验证 + 最优 α 拟合（完整流程）
//! - `fit`   - 给定 α 的单次拟合
//! - `basis` - 对称性与基函数统计
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/    (结构与数据文件解析)
//!   │     ├── models/     (晶体结构与训练集)
//!   │     ├── fcs/        (对称性、团簇、基函数、设计矩阵)
//!   │     ├── regression/ (标准化、LASSO、交叉验证)
//!   │     └── report/     (评分文件、CSV 与图表)
//!   ├── utils/      (输出与进度条)
//!   └── error.rs    (错误处理)
//! ```

mod cli;
mod commands;
mod error;
mod fcs;
mod models;
mod parsers;
mod regression;
mod report;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
