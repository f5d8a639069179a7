//! # 数据模型模块
//!
//! 定义晶体结构和位移-力训练数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`fcs/` 和 `commands/` 使用
//! - 子模块: structure, dataset

pub mod dataset;
pub mod structure;

pub use dataset::TrainingSet;
pub use structure::{Atom, Crystal, Lattice};
