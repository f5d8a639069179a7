//! # 力常数模型与设计矩阵
//!
//! 组合空间群、团簇轨道与对称化基函数，把位移-力数据写成线性回归问题
//! y = X θ：
//! - 行：(样本, 原子, xyz)，与 force.ravel() 顺序一致
//! - 列：X[row, c] = −∂B_c/∂u，即基函数 c 贡献的力
//!
//! 组装时丢弃恒为零的列（对称求和相互抵消）以及与前面某列成比例的重复列。
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `fcs/symmetry.rs`, `fcs/cluster.rs`, `fcs/basis.rs`
//! - 使用 `rayon` 按轨道并行构造列
//! - 使用 `nalgebra` 存储稠密矩阵

use super::basis::{self, form_index, BasisFunction};
use super::cluster::{self, ClusterOrbit};
use super::interaction::Interaction;
use super::symmetry::{SpaceGroup, DEFAULT_TOLERANCE};
use crate::error::{FclassoError, Result};
use crate::models::{Crystal, TrainingSet};
use crate::regression::{Dmat, Dvec};

use rayon::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// 列 L1 范数低于贡献绝对值之和的该比例时视为恒零
const VANISHING_RATIO: f64 = 1e-9;
/// 重复列指纹的量化精度
const FINGERPRINT_SCALE: f64 = 1e8;

/// 力常数模型
pub struct ForceConstantModel {
    pub crystal: Crystal,
    pub interaction: Interaction,
    pub group: SpaceGroup,
    pub orbits: Vec<ClusterOrbit>,
    /// 全部候选基函数
    pub candidates: Vec<BasisFunction>,
    /// 设计矩阵各列对应的候选基函数编号
    active: Vec<usize>,
}

/// 单列构造结果
struct Column {
    candidate: usize,
    values: Vec<f64>,
    magnitude: f64,
}

impl ForceConstantModel {
    /// 分析对称性并生成候选基函数
    pub fn build(crystal: &Crystal, interaction: &Interaction) -> Result<Self> {
        interaction.validate()?;
        let group = SpaceGroup::find(crystal, DEFAULT_TOLERANCE)?;
        Ok(Self::with_group(crystal, interaction, group))
    }

    /// 使用给定的对称群构造（测试中可用平凡群关闭对称性）
    pub fn with_group(crystal: &Crystal, interaction: &Interaction, group: SpaceGroup) -> Self {
        let orbits = cluster::enumerate_orbits(crystal, &group, interaction);
        let candidates = basis::enumerate_basis(&orbits, interaction.constraint);
        let active = (0..candidates.len()).collect();

        ForceConstantModel {
            crystal: crystal.clone(),
            interaction: interaction.clone(),
            group,
            orbits,
            candidates,
            active,
        }
    }

    /// 设计矩阵列数
    pub fn n_parameters(&self) -> usize {
        self.active.len()
    }

    /// 设计矩阵各列对应的基函数
    pub fn active_functions(&self) -> impl Iterator<Item = &BasisFunction> {
        self.active.iter().map(|&c| &self.candidates[c])
    }

    /// 每阶参数个数
    pub fn parameters_per_order(&self) -> Vec<usize> {
        let mut counts = vec![0; self.interaction.maxorder];
        for f in self.active_functions() {
            counts[f.order - 1] += 1;
        }
        counts
    }

    /// 每阶非零系数个数
    pub fn nonzero_per_order(&self, params: &[f64]) -> Result<Vec<usize>> {
        self.check_params(params)?;
        let mut counts = vec![0; self.interaction.maxorder];
        for (f, &p) in self.active_functions().zip(params) {
            if p != 0.0 {
                counts[f.order - 1] += 1;
            }
        }
        Ok(counts)
    }

    pub(crate) fn check_params(&self, params: &[f64]) -> Result<()> {
        if params.len() != self.active.len() {
            return Err(FclassoError::ShapeMismatch {
                what: "force constant parameters".to_string(),
                expected: format!("{} values", self.active.len()),
                found: format!("{} values", params.len()),
            });
        }
        Ok(())
    }

    /// 构造设计矩阵 X 与目标向量 y，并记录保留下来的列
    pub fn design_matrix(&mut self, data: &TrainingSet) -> Result<(Dmat, Dvec)> {
        if data.n_atoms != self.crystal.n_atoms() {
            return Err(FclassoError::ShapeMismatch {
                what: "training data".to_string(),
                expected: format!("{} atoms", self.crystal.n_atoms()),
                found: format!("{} atoms", data.n_atoms),
            });
        }

        // 按轨道分组候选基函数
        let mut by_orbit: Vec<Vec<usize>> = vec![Vec::new(); self.orbits.len()];
        for (c, f) in self.candidates.iter().enumerate() {
            by_orbit[f.orbit].push(c);
        }

        let this = &*self;
        let columns: Vec<Vec<Column>> = by_orbit
            .par_iter()
            .enumerate()
            .map(|(orbit, members)| this.orbit_columns(orbit, members, data))
            .collect();

        let n_rows = data.n_rows();
        let mut kept: Vec<Column> = Vec::new();
        let mut seen: HashMap<u64, Vec<usize>> = HashMap::new();

        for column in columns.into_iter().flatten() {
            let l1: f64 = column.values.iter().map(|v| v.abs()).sum();
            if l1 <= VANISHING_RATIO * column.magnitude {
                continue;
            }

            let print = fingerprint(&column.values);
            let mut hasher = DefaultHasher::new();
            print.hash(&mut hasher);
            let key = hasher.finish();

            let bucket = seen.entry(key).or_default();
            if bucket
                .iter()
                .any(|&k| fingerprint(&kept[k].values) == print)
            {
                continue;
            }
            bucket.push(kept.len());
            kept.push(column);
        }

        if kept.is_empty() {
            return Err(FclassoError::InvalidArgument(
                "no non-vanishing force constant basis functions for this interaction".to_string(),
            ));
        }

        self.active = kept.iter().map(|c| c.candidate).collect();

        let n_cols = kept.len();
        let x = Dmat::from_iterator(
            n_rows,
            n_cols,
            kept.into_iter().flat_map(|c| c.values.into_iter()),
        );
        let y = Dvec::from_column_slice(data.force_ravel());

        Ok((x, y))
    }

    /// 构造单个轨道上全部候选基函数的列
    fn orbit_columns(&self, orbit: usize, members: &[usize], data: &TrainingSet) -> Vec<Column> {
        let constraint = self.interaction.constraint;
        let cluster = &self.orbits[orbit].atoms;
        let stride = 3 * data.n_atoms;

        let mut columns: Vec<Column> = members
            .iter()
            .map(|&c| Column {
                candidate: c,
                values: vec![0.0; data.n_rows()],
                magnitude: 0.0,
            })
            .collect();

        let monomials: Vec<Vec<usize>> = members
            .iter()
            .map(|&c| {
                self.candidates[c]
                    .monomial
                    .iter()
                    .map(|&v| form_index(v, constraint))
                    .collect()
            })
            .collect();

        let mut values = Vec::new();
        let mut others = Vec::new();

        for op in &self.group.ops {
            let forms = basis::orbit_forms(op, cluster, constraint);

            for s in 0..data.n_samples {
                let u = data.sample_disp(s);
                let offset = s * stride;
                values.clear();
                values.extend(forms.iter().map(|f| f.eval(u)));

                for (column, mono) in columns.iter_mut().zip(&monomials) {
                    products_of_others(mono, &values, &mut others);
                    for (&var, &rest) in mono.iter().zip(&others) {
                        if rest == 0.0 {
                            continue;
                        }
                        for &(idx, coef) in &forms[var].terms {
                            let contribution = coef * rest;
                            // F = −∂B/∂u
                            column.values[offset + idx] -= contribution;
                            column.magnitude += contribution.abs();
                        }
                    }
                }
            }
        }

        columns
    }
}

/// others[k] = Π_{j≠k} values[mono[j]]
fn products_of_others(mono: &[usize], values: &[f64], others: &mut Vec<f64>) {
    let n = mono.len();
    others.clear();
    others.resize(n, 1.0);

    let mut prefix = 1.0;
    for k in 0..n {
        others[k] = prefix;
        prefix *= values[mono[k]];
    }
    let mut suffix = 1.0;
    for k in (0..n).rev() {
        others[k] *= suffix;
        suffix *= values[mono[k]];
    }
}

/// 归一化（最大绝对值为 1，首个显著元素为正）后量化的列指纹
fn fingerprint(values: &[f64]) -> Vec<i64> {
    let max = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if max == 0.0 {
        return vec![0; values.len()];
    }
    let sign = values
        .iter()
        .find(|v| v.abs() > 1e-6 * max)
        .map_or(1.0, |v| v.signum());

    values
        .iter()
        .map(|v| (v * sign / max * FINGERPRINT_SCALE).round() as i64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fcs::interaction::Constraint;
    use crate::models::{Atom, Lattice};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// 沿 x 方向的单原子链，y/z 方向间距足够大
    fn chain(n: usize) -> Crystal {
        let lattice =
            Lattice::from_vectors([[n as f64, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]]);
        let atoms = (0..n)
            .map(|i| Atom::new("H", [i as f64 / n as f64, 0.0, 0.0]))
            .collect();
        Crystal::new("chain", lattice, atoms)
    }

    fn pseudo_random(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(-0.05_f64..0.05)).collect()
    }

    #[test]
    fn test_products_of_others() {
        let mut others = Vec::new();
        products_of_others(&[0, 1, 1], &[2.0, 3.0], &mut others);
        assert_eq!(others, vec![9.0, 6.0, 6.0]);
    }

    #[test]
    fn test_fingerprint_ignores_scale_and_sign() {
        let a = fingerprint(&[0.0, 1.0, -2.0]);
        let b = fingerprint(&[0.0, -3.0, 6.0]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_translation_invariance_of_forces() {
        let crystal = chain(4);
        let inter = Interaction::from_raw(2, &[-1.0, -1.0], &[2, 2], Constraint::Translation);
        let mut model = ForceConstantModel::build(&crystal, &inter).unwrap();

        let disp = pseudo_random(2 * 12, 7);
        let data = TrainingSet::from_arrays(disp, vec![0.0; 24], 4, 2).unwrap();
        let (x, y) = model.design_matrix(&data).unwrap();

        assert_eq!(x.nrows(), 24);
        assert_eq!(y.len(), 24);
        assert!(x.ncols() > 0);

        // 平移不变 ⇒ 每个样本中各分量的力之和为零
        for c in 0..x.ncols() {
            for s in 0..2 {
                for axis in 0..3 {
                    let total: f64 = (0..4).map(|a| x[(s * 12 + 3 * a + axis, c)]).sum();
                    assert!(total.abs() < 1e-12, "column {c} not translation invariant");
                }
            }
        }
    }

    #[test]
    fn test_symmetry_reduces_parameters() {
        let crystal = chain(4);
        let inter = Interaction::from_raw(1, &[-1.0], &[2], Constraint::Translation);
        let disp = pseudo_random(3 * 12, 11);
        let data = TrainingSet::from_arrays(disp, vec![0.0; 36], 4, 3).unwrap();

        let mut full = ForceConstantModel::build(&crystal, &inter).unwrap();
        full.design_matrix(&data).unwrap();

        let mut plain =
            ForceConstantModel::with_group(&crystal, &inter, SpaceGroup::trivial(4));
        plain.design_matrix(&data).unwrap();

        assert!(full.n_parameters() < plain.n_parameters());
        assert_eq!(full.parameters_per_order(), vec![full.n_parameters()]);
    }

    #[test]
    fn test_reproduces_harmonic_spring_forces() {
        // 最近邻弹簧 k：F_i = −k Σ_j (u_i − u_j)，沿 x 的链
        let crystal = chain(4);
        let inter = Interaction::from_raw(1, &[1.5], &[2], Constraint::Translation);
        let mut model = ForceConstantModel::build(&crystal, &inter).unwrap();

        let n_samples = 4;
        let disp = pseudo_random(n_samples * 12, 3);
        let k = 0.7;
        let mut force = vec![0.0; disp.len()];
        for s in 0..n_samples {
            for i in 0..4 {
                for j in [(i + 1) % 4, (i + 3) % 4] {
                    for axis in 0..3 {
                        // 各向同性弹簧
                        force[s * 12 + 3 * i + axis] -=
                            k * (disp[s * 12 + 3 * i + axis] - disp[s * 12 + 3 * j + axis]);
                    }
                }
            }
        }

        let data = TrainingSet::from_arrays(disp, force, 4, n_samples).unwrap();
        let (x, y) = model.design_matrix(&data).unwrap();

        // 最小二乘应能精确拟合
        let svd = x.clone().svd(true, true);
        let theta = svd.solve(&y, 1e-12).unwrap();
        let residual = (&x * &theta - &y).norm();
        assert!(residual < 1e-10, "residual {residual}");
    }
}
