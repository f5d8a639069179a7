//! # 对称化多项式基函数
//!
//! 每个团簇轨道上的候选基函数是代表团簇自由变量的单项式 P，
//! 经空间群求和得到 B(u) = Σ_g P(g⁻¹u)，其中 (g⁻¹u)_a = Rᵀ u_{π(a)}。
//! 这样得到的每个 B 都在空间群下不变。
//!
//! 自由变量：
//! - 平移约束下为相对位移 u[a_s] − u[a_0]，s = 1..m−1
//! - 无约束时为原子位移 u[a_s]，s = 0..m−1
//!
//! 只保留每个自由槽位都出现的单项式，保证其为真正的 m 体项。
//!
//! ## 依赖关系
//! - 被 `fcs/design.rs` 和 `fcs/harmonic.rs` 使用
//! - 使用 `fcs/cluster.rs`, `fcs/symmetry.rs`, `fcs/interaction.rs`

use super::cluster::ClusterOrbit;
use super::interaction::{Constraint, Interaction};
use super::symmetry::SymmetryOp;

/// 团簇自由变量：第 slot 个原子的 axis 分量
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable {
    pub slot: usize,
    pub axis: usize,
}

/// 候选基函数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasisFunction {
    /// 轨道编号（`ForceConstantModel::orbits` 中的下标）
    pub orbit: usize,
    pub order: usize,
    /// 单项式，变量按升序排列，可重复
    pub monomial: Vec<Variable>,
}

/// 位移坐标的线性组合 Σ coef · u[index]，index = 3 * atom + axis
#[derive(Debug, Clone, PartialEq)]
pub struct LinearForm {
    pub terms: Vec<(usize, f64)>,
}

impl LinearForm {
    /// 在展平的位移向量上求值
    pub fn eval(&self, u: &[f64]) -> f64 {
        self.terms.iter().map(|&(idx, c)| c * u[idx]).sum()
    }
}

/// 自由槽位编号
fn free_slots(size: usize, constraint: Constraint) -> std::ops::Range<usize> {
    match constraint {
        Constraint::Translation => 1..size,
        Constraint::None => 0..size,
    }
}

/// 枚举 `size` 原子团簇上次数为 `degree` 的单项式
pub fn monomials(size: usize, degree: usize, constraint: Constraint) -> Vec<Vec<Variable>> {
    let slots = free_slots(size, constraint);
    if slots.is_empty() {
        return Vec::new();
    }

    let variables: Vec<Variable> = slots
        .clone()
        .flat_map(|slot| (0..3).map(move |axis| Variable { slot, axis }))
        .collect();

    fn combinations(
        variables: &[Variable],
        start: usize,
        remaining: usize,
        current: &mut Vec<Variable>,
        out: &mut Vec<Vec<Variable>>,
    ) {
        if remaining == 0 {
            out.push(current.clone());
            return;
        }
        for i in start..variables.len() {
            current.push(variables[i]);
            combinations(variables, i, remaining - 1, current, out);
            current.pop();
        }
    }

    let mut all = Vec::new();
    combinations(&variables, 0, degree, &mut Vec::with_capacity(degree), &mut all);

    all.retain(|m| slots.clone().all(|s| m.iter().any(|v| v.slot == s)));
    all
}

/// 为全部轨道生成候选基函数
pub fn enumerate_basis(orbits: &[ClusterOrbit], constraint: Constraint) -> Vec<BasisFunction> {
    let mut basis = Vec::new();
    for (index, orbit) in orbits.iter().enumerate() {
        let degree = Interaction::degree(orbit.order);
        for monomial in monomials(orbit.size(), degree, constraint) {
            basis.push(BasisFunction {
                orbit: index,
                order: orbit.order,
                monomial,
            });
        }
    }
    basis
}

/// 变量在对称操作 g 下的像，表示为位移的线性组合
///
/// v'(u) = Σ_δ R[δ][axis] (u[π(a_slot)][δ] − u[π(a_0)][δ])，无约束时去掉参考项。
pub fn variable_form(
    op: &SymmetryOp,
    cluster: &[usize],
    var: Variable,
    constraint: Constraint,
) -> LinearForm {
    let target = op.perm[cluster[var.slot]];
    let mut terms = Vec::with_capacity(6);
    for delta in 0..3 {
        let c = op.rotation[delta][var.axis];
        if c != 0.0 {
            terms.push((3 * target + delta, c));
        }
    }

    if constraint == Constraint::Translation {
        let reference = op.perm[cluster[0]];
        for delta in 0..3 {
            let c = op.rotation[delta][var.axis];
            if c != 0.0 {
                terms.push((3 * reference + delta, -c));
            }
        }
    }

    LinearForm { terms }
}

/// 团簇全部自由变量在操作 g 下的像，顺序为 (slot, axis)
pub fn orbit_forms(
    op: &SymmetryOp,
    cluster: &[usize],
    constraint: Constraint,
) -> Vec<LinearForm> {
    free_slots(cluster.len(), constraint)
        .flat_map(|slot| (0..3).map(move |axis| Variable { slot, axis }))
        .map(|var| variable_form(op, cluster, var, constraint))
        .collect()
}

/// 变量在 `orbit_forms` 结果中的位置
pub fn form_index(var: Variable, constraint: Constraint) -> usize {
    let first = match constraint {
        Constraint::Translation => 1,
        Constraint::None => 0,
    };
    3 * (var.slot - first) + var.axis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fcs::symmetry::SpaceGroup;

    #[test]
    fn test_pair_harmonic_monomials() {
        // 相对位移 d = u1 − u0 的二次单项式：6 个
        let m = monomials(2, 2, Constraint::Translation);
        assert_eq!(m.len(), 6);

        // 无约束：6 个变量的二次单项式 21 个，其中两个原子都出现的 9 个
        let m = monomials(2, 2, Constraint::None);
        assert_eq!(m.len(), 9);
    }

    #[test]
    fn test_triplet_monomials_cover_both_slots() {
        let m = monomials(3, 3, Constraint::Translation);
        assert!(m.iter().all(|mono| {
            mono.iter().any(|v| v.slot == 1) && mono.iter().any(|v| v.slot == 2)
        }));
        // C(6+3-1, 3) − 2 * C(3+3-1, 3) = 56 − 20
        assert_eq!(m.len(), 36);
    }

    #[test]
    fn test_single_slot_translation_has_no_variables() {
        assert!(monomials(1, 2, Constraint::Translation).is_empty());
        assert_eq!(monomials(1, 2, Constraint::None).len(), 6);
    }

    #[test]
    fn test_identity_form_is_relative_displacement() {
        let group = SpaceGroup::trivial(3);
        let var = Variable { slot: 1, axis: 2 };
        let form = variable_form(&group.ops[0], &[0, 2], var, Constraint::Translation);

        // u[2].z − u[0].z
        let mut u = vec![0.0; 9];
        u[8] = 0.5;
        u[2] = 0.2;
        assert!((form.eval(&u) - 0.3).abs() < 1e-15);
        assert_eq!(form_index(var, Constraint::Translation), 2);
    }
}
