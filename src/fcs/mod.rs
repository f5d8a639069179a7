//! # 力常数模型模块
//!
//! 将位移-力数据转化为稀疏回归问题：对称性分析、团簇枚举、
//! 对称化基函数、设计矩阵组装与简谐力常数提取。
//!
//! ## 子模块
//! - `interaction`: 阶数、截断与多体数设置
//! - `symmetry`: 空间群搜索
//! - `cluster`: 团簇枚举与轨道划分
//! - `basis`: 对称化多项式基函数
//! - `design`: ForceConstantModel 与设计矩阵
//! - `harmonic`: 简谐力常数 "origin" 模式输出
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/` 的 Crystal, TrainingSet

pub mod basis;
pub mod cluster;
pub mod design;
pub mod harmonic;
pub mod interaction;
pub mod symmetry;

pub use design::ForceConstantModel;
pub use harmonic::FcElement;
pub use interaction::{Constraint, Interaction};
