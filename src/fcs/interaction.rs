//! # 相互作用定义
//!
//! 描述力常数展开的阶数、每阶截断半径与多体数上限，以及平移约束。
//!
//! 阶数 k（从 1 开始）对应 k+1 阶力常数，即位移的 k+1 次多项式：
//! k = 1 为简谐项，k = 2 为三阶非简谐项，依此类推。
//!
//! ## 依赖关系
//! - 被 `fcs/cluster.rs`、`fcs/basis.rs` 和 `fcs/design.rs` 使用
//! - 由 `commands/` 根据 CLI 参数构造

use crate::error::{FclassoError, Result};

/// 约束类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// 平移不变性（声学求和规则）：基函数只依赖于团簇内的相对位移
    Translation,
    /// 无约束：基函数直接使用原子位移
    None,
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constraint::Translation => write!(f, "translation"),
            Constraint::None => write!(f, "none"),
        }
    }
}

/// 力常数模型的相互作用范围
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub maxorder: usize,
    /// 每阶截断半径（bohr），None 表示不截断
    pub cutoffs: Vec<Option<f64>>,
    /// 每阶允许的最大不同原子数
    pub nbody: Vec<usize>,
    pub constraint: Constraint,
}

impl Default for Interaction {
    fn default() -> Self {
        Interaction::from_raw(
            5,
            &[-1.0, -1.0, 15.0, 8.0, 8.0],
            &[2, 3, 3, 2, 2],
            Constraint::Translation,
        )
    }
}

impl Interaction {
    /// 从命令行形式构造：负截断半径表示不截断
    pub fn from_raw(
        maxorder: usize,
        cutoffs: &[f64],
        nbody: &[usize],
        constraint: Constraint,
    ) -> Self {
        Interaction {
            maxorder,
            cutoffs: cutoffs
                .iter()
                .map(|&c| if c < 0.0 { None } else { Some(c) })
                .collect(),
            nbody: nbody.to_vec(),
            constraint,
        }
    }

    /// 检查参数一致性
    pub fn validate(&self) -> Result<()> {
        if self.maxorder == 0 {
            return Err(FclassoError::InvalidArgument(
                "maxorder must be at least 1".to_string(),
            ));
        }
        if self.cutoffs.len() != self.maxorder {
            return Err(FclassoError::InvalidArgument(format!(
                "expected {} cutoff values (one per order), got {}",
                self.maxorder,
                self.cutoffs.len()
            )));
        }
        if self.nbody.len() != self.maxorder {
            return Err(FclassoError::InvalidArgument(format!(
                "expected {} nbody values (one per order), got {}",
                self.maxorder,
                self.nbody.len()
            )));
        }

        let min_body = match self.constraint {
            Constraint::Translation => 2,
            Constraint::None => 1,
        };
        if let Some((order, &n)) = self
            .nbody
            .iter()
            .enumerate()
            .find(|(_, &n)| n < min_body)
        {
            return Err(FclassoError::InvalidArgument(format!(
                "nbody for order {} is {}, but must be >= {} with constraint '{}'",
                order + 1,
                n,
                min_body,
                self.constraint
            )));
        }
        Ok(())
    }

    /// 第 order 阶（从 1 开始）的多项式次数
    pub fn degree(order: usize) -> usize {
        order + 1
    }

    /// 第 order 阶允许的团簇最大原子数（不超过多项式次数）
    pub fn max_cluster_size(&self, order: usize) -> usize {
        self.nbody[order - 1].min(Self::degree(order))
    }

    pub fn cutoff(&self, order: usize) -> Option<f64> {
        self.cutoffs[order - 1]
    }

    /// 人类可读的阶数名称
    pub fn order_name(order: usize) -> String {
        match order {
            1 => "HARMONIC".to_string(),
            n => format!("ANHARM{}", n + 1),
        }
    }
}
