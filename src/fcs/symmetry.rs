//! # 空间群搜索
//!
//! 在周期性超胞中寻找全部对称操作 {W|t}，并给出每个操作的
//! 笛卡尔转动矩阵与原子置换。
//!
//! ## 算法概述
//! 1. 枚举元素取自 {-1, 0, 1} 的整数矩阵 W，保留 det = ±1 且 WᵀGW = G 的矩阵
//! 2. 对每个 W，用第一个原子的所有同种原子像确定候选平移 t = f_j − W f_0
//! 3. 检查 {W|t} 是否把每个原子映射到同种原子（模晶格平移）
//!
//! 分数坐标取列向量约定：f' = W f + t。
//! 晶格矩阵 M 的行为晶格向量，故笛卡尔转动 R = Mᵀ W (Mᵀ)⁻¹。
//!
//! ## 依赖关系
//! - 被 `fcs/cluster.rs` 和 `fcs/design.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{FclassoError, Result};
use crate::models::structure::invert;
use crate::models::Crystal;

/// 原子位置匹配容差（分数坐标）
pub const DEFAULT_TOLERANCE: f64 = 1e-5;

/// 单个空间群操作
#[derive(Debug, Clone)]
pub struct SymmetryOp {
    /// 分数坐标下的整数转动矩阵
    pub rotation_frac: [[i32; 3]; 3],
    /// 笛卡尔转动矩阵
    pub rotation: [[f64; 3]; 3],
    /// 原子置换：perm[i] 为原子 i 的像
    pub perm: Vec<usize>,
}

impl SymmetryOp {
    pub fn is_pure_translation(&self) -> bool {
        self.rotation_frac == IDENTITY
    }

    pub fn is_identity(&self) -> bool {
        self.is_pure_translation() && self.perm.iter().enumerate().all(|(i, &p)| i == p)
    }
}

const IDENTITY: [[i32; 3]; 3] = [[1, 0, 0], [0, 1, 0], [0, 0, 1]];

/// 空间群
#[derive(Debug, Clone)]
pub struct SpaceGroup {
    pub ops: Vec<SymmetryOp>,
    n_atoms: usize,
}

impl SpaceGroup {
    /// 搜索晶体的全部对称操作
    pub fn find(crystal: &Crystal, tol: f64) -> Result<Self> {
        let n_atoms = crystal.n_atoms();
        if n_atoms == 0 {
            return Err(FclassoError::SymmetryError(
                "structure contains no atoms".to_string(),
            ));
        }

        let metric = crystal.lattice.metric();
        let scale = metric
            .iter()
            .flatten()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));

        let mt = transpose(&crystal.lattice.matrix);
        let mt_inv = invert(&mt)
            .ok_or_else(|| FclassoError::SymmetryError("degenerate lattice".to_string()))?;

        let mut ops = Vec::new();
        for w in candidate_rotations() {
            if !preserves_metric(&w, &metric, scale * 1e-6) {
                continue;
            }

            let rotation = cartesian_rotation(&w, &mt, &mt_inv);
            let f0 = rotate_frac(&w, crystal.atoms[0].position);

            for target in crystal
                .atoms
                .iter()
                .filter(|a| a.element == crystal.atoms[0].element)
            {
                let mut t = [0.0; 3];
                for k in 0..3 {
                    let d = target.position[k] - f0[k];
                    t[k] = d - d.floor();
                }

                if let Some(perm) = map_atoms(crystal, &w, t, tol) {
                    ops.push(SymmetryOp {
                        rotation_frac: w,
                        rotation,
                        perm,
                    });
                }
            }
        }

        if !ops.iter().any(SymmetryOp::is_identity) {
            return Err(FclassoError::SymmetryError(
                "identity operation not found; check the tolerance".to_string(),
            ));
        }

        // 恒等操作排在最前，其余保持枚举顺序
        ops.sort_by_key(|op| !op.is_identity());

        Ok(SpaceGroup { ops, n_atoms })
    }

    /// 仅包含恒等操作的平凡群
    #[cfg(test)]
    pub fn trivial(n_atoms: usize) -> Self {
        SpaceGroup {
            ops: vec![SymmetryOp {
                rotation_frac: IDENTITY,
                rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                perm: (0..n_atoms).collect(),
            }],
            n_atoms,
        }
    }

    pub fn order(&self) -> usize {
        self.ops.len()
    }

    /// 纯平移操作
    pub fn pure_translations(&self) -> impl Iterator<Item = &SymmetryOp> {
        self.ops.iter().filter(|op| op.is_pure_translation())
    }

    /// 点群阶数（不同转动的数目）
    pub fn point_group_order(&self) -> usize {
        let mut rotations: Vec<[[i32; 3]; 3]> = self.ops.iter().map(|op| op.rotation_frac).collect();
        rotations.sort();
        rotations.dedup();
        rotations.len()
    }

    /// 原胞原子：每个平移轨道中编号最小的原子
    pub fn primitive_atoms(&self) -> Vec<usize> {
        (0..self.n_atoms)
            .filter(|&i| self.pure_translations().all(|op| op.perm[i] >= i))
            .collect()
    }
}

fn candidate_rotations() -> impl Iterator<Item = [[i32; 3]; 3]> {
    (0..3_i32.pow(9)).filter_map(|code| {
        let mut w = [[0; 3]; 3];
        let mut c = code;
        for row in w.iter_mut() {
            for v in row.iter_mut() {
                *v = c % 3 - 1;
                c /= 3;
            }
        }
        let det = w[0][0] * (w[1][1] * w[2][2] - w[1][2] * w[2][1])
            - w[0][1] * (w[1][0] * w[2][2] - w[1][2] * w[2][0])
            + w[0][2] * (w[1][0] * w[2][1] - w[1][1] * w[2][0]);
        (det.abs() == 1).then_some(w)
    })
}

fn preserves_metric(w: &[[i32; 3]; 3], g: &[[f64; 3]; 3], tol: f64) -> bool {
    // (WᵀGW)_ij = Σ_kl W_ki G_kl W_lj
    for i in 0..3 {
        for j in 0..3 {
            let mut v = 0.0;
            for k in 0..3 {
                for l in 0..3 {
                    v += w[k][i] as f64 * g[k][l] * w[l][j] as f64;
                }
            }
            if (v - g[i][j]).abs() > tol {
                return false;
            }
        }
    }
    true
}

fn transpose(m: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut t = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            t[i][j] = m[j][i];
        }
    }
    t
}

fn cartesian_rotation(
    w: &[[i32; 3]; 3],
    mt: &[[f64; 3]; 3],
    mt_inv: &[[f64; 3]; 3],
) -> [[f64; 3]; 3] {
    let mut tmp = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            tmp[i][j] = (0..3).map(|k| mt[i][k] * w[k][j] as f64).sum();
        }
    }
    let mut r = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            let v: f64 = (0..3).map(|k| tmp[i][k] * mt_inv[k][j]).sum();
            // 消除舍入噪声
            r[i][j] = if v.abs() < 1e-12 { 0.0 } else { v };
        }
    }
    r
}

fn rotate_frac(w: &[[i32; 3]; 3], f: [f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for i in 0..3 {
        out[i] = (0..3).map(|k| w[i][k] as f64 * f[k]).sum();
    }
    out
}

/// 检查 {W|t} 是否为对称操作，是则返回原子置换
fn map_atoms(crystal: &Crystal, w: &[[i32; 3]; 3], t: [f64; 3], tol: f64) -> Option<Vec<usize>> {
    let n = crystal.n_atoms();
    let mut perm = Vec::with_capacity(n);
    let mut used = vec![false; n];

    for atom in &crystal.atoms {
        let mut image = rotate_frac(w, atom.position);
        for k in 0..3 {
            image[k] += t[k];
        }

        let found = crystal.atoms.iter().enumerate().position(|(j, other)| {
            !used[j]
                && other.element == atom.element
                && (0..3).all(|k| {
                    let d = image[k] - other.position[k];
                    (d - d.round()).abs() < tol
                })
        })?;

        used[found] = true;
        perm.push(found);
    }

    Some(perm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice};

    fn simple_cubic_2x2x2() -> Crystal {
        let lattice = Lattice::from_vectors([[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]]);
        let mut atoms = Vec::new();
        for x in 0..2 {
            for y in 0..2 {
                for z in 0..2 {
                    atoms.push(Atom::new(
                        "Po",
                        [x as f64 * 0.5, y as f64 * 0.5, z as f64 * 0.5],
                    ));
                }
            }
        }
        Crystal::new("Po8", lattice, atoms)
    }

    #[test]
    fn test_simple_cubic_supercell() {
        let crystal = simple_cubic_2x2x2();
        let sg = SpaceGroup::find(&crystal, DEFAULT_TOLERANCE).unwrap();

        assert_eq!(sg.point_group_order(), 48);
        assert_eq!(sg.pure_translations().count(), 8);
        assert_eq!(sg.order(), 48 * 8);
        assert_eq!(sg.primitive_atoms(), vec![0]);
        assert!(sg.ops[0].is_identity());
    }

    #[test]
    fn test_rotations_are_orthogonal() {
        let crystal = simple_cubic_2x2x2();
        let sg = SpaceGroup::find(&crystal, DEFAULT_TOLERANCE).unwrap();
        for op in &sg.ops {
            let r = op.rotation;
            for i in 0..3 {
                for j in 0..3 {
                    let dot: f64 = (0..3).map(|k| r[k][i] * r[k][j]).sum();
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert!((dot - expected).abs() < 1e-10);
                }
            }
        }
    }

    #[test]
    fn test_si_supercell_symmetry() {
        let crystal = Crystal::si_diamond_supercell();
        let sg = SpaceGroup::find(&crystal, DEFAULT_TOLERANCE).unwrap();

        // Fd-3m：点群 48，2x2x2 常规胞中有 32 个 fcc 格点平移
        assert_eq!(sg.point_group_order(), 48);
        assert_eq!(sg.pure_translations().count(), 32);
        assert_eq!(sg.order(), 48 * 32);
        assert_eq!(sg.primitive_atoms().len(), 2);
    }

    #[test]
    fn test_two_species_lower_symmetry() {
        let lattice = Lattice::from_vectors([[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 5.0]]);
        let atoms = vec![
            Atom::new("A", [0.0, 0.0, 0.0]),
            Atom::new("B", [0.0, 0.0, 0.3]),
        ];
        let crystal = Crystal::new("AB", lattice, atoms);
        let sg = SpaceGroup::find(&crystal, DEFAULT_TOLERANCE).unwrap();

        // 4mm
        assert_eq!(sg.point_group_order(), 8);
        assert_eq!(sg.primitive_atoms(), vec![0, 1]);
    }

    #[test]
    fn test_trivial_group() {
        let sg = SpaceGroup::trivial(3);
        assert_eq!(sg.order(), 1);
        assert_eq!(sg.primitive_atoms(), vec![0, 1, 2]);
    }
}
