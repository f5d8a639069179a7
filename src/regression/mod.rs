//! # 稀疏回归模块
//!
//! 提供 LASSO 坐标下降、正则化路径、标准化与分组交叉验证。
//!
//! ## 子模块
//! - `scaler`: 列标准化
//! - `lasso`: 坐标下降 LASSO、正则化路径与去偏
//! - `cv`: GroupKFold 与交叉验证评分
//!
//! ## 依赖关系
//! - 被 `fcs/design.rs` 使用（矩阵类型别名）
//! - 被 `commands/` 使用
//! - 使用 `nalgebra` 进行线性代数运算

pub mod cv;
pub mod lasso;
pub mod scaler;

pub use cv::{cross_validate, logspace, CvScores, CvSettings, GroupKFold};
pub use lasso::{debias, estimate_alpha_max, lasso_path, Lasso, LassoFit, LassoPath, PathParams};
pub use scaler::StandardScaler;

pub type Dmat = nalgebra::DMatrix<f64>;
pub type Dvec = nalgebra::DVector<f64>;
