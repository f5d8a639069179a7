//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `cv`: 分组交叉验证选择 α，并用最优 α 拟合全部数据
//! - `fit`: 给定 α 的单次 LASSO 拟合
//! - `basis`: 对称性与基函数统计
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: common, cv, fit, basis

pub mod basis;
pub mod common;
pub mod cv;
pub mod fit;

use clap::{Parser, Subcommand};

/// fclasso - 基于 LASSO 的非简谐力常数稀疏拟合
#[derive(Parser)]
#[command(name = "fclasso")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Sparse fitting of anharmonic force constants with LASSO and group cross-validation",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Choose alpha by group K-fold cross-validation, then fit all data
    Cv(cv::CvArgs),

    /// Fit force constants with a fixed alpha
    Fit(fit::FitArgs),

    /// Report symmetry and basis-function statistics
    Basis(basis::BasisArgs),
}
