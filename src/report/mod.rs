//! # 结果输出模块
//!
//! 交叉验证评分与力常数的文件导出和绘图。
//!
//! ## 子模块
//! - `export`: 评分表（numpy savetxt 格式）与力常数 CSV
//! - `plot`: 训练/测试误差随 α 变化的曲线图
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `regression/cv.rs` 的 CvScores 与 `fcs/harmonic.rs` 的 FcElement

pub mod export;
pub mod plot;
