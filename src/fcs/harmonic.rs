//! # 简谐力常数提取
//!
//! 由拟合得到的参数 θ 重建简谐力常数矩阵 Φ = Σ_c θ_c ∂²B_c，
//! 并按 "origin" 模式列出：第一个原子位于原胞内，第二个原子遍历超胞。
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `fcs/design.rs` 的 ForceConstantModel 与 `fcs/basis.rs` 的线性型

use super::basis::{self, form_index};
use super::design::ForceConstantModel;
use crate::error::Result;

/// 小于该阈值的矩阵元不输出
const ZERO_THRESHOLD: f64 = 1e-12;

/// 力常数矩阵元
#[derive(Debug, Clone, PartialEq)]
pub struct FcElement {
    pub value: f64,
    /// 展平下标 3 * atom + xyz
    pub indices: [usize; 2],
}

impl FcElement {
    /// (原子编号, 方向) 对，原子编号从 0 开始
    pub fn atom_axis(&self, k: usize) -> (usize, usize) {
        (self.indices[k] / 3, self.indices[k] % 3)
    }

    /// 形如 `1x` 的标签，原子编号从 1 开始
    pub fn label(&self, k: usize) -> String {
        let (atom, axis) = self.atom_axis(k);
        format!("{}{}", atom + 1, AXES[axis])
    }
}

pub const AXES: [char; 3] = ['x', 'y', 'z'];

impl ForceConstantModel {
    /// 完整的 3N x 3N 简谐力常数矩阵（行优先展平）
    pub fn harmonic_matrix(&self, params: &[f64]) -> Result<Vec<f64>> {
        self.check_params(params)?;

        let dim = 3 * self.crystal.n_atoms();
        let constraint = self.interaction.constraint;
        let mut phi = vec![0.0; dim * dim];

        for (f, &theta) in self.active_functions().zip(params) {
            if f.order != 1 || theta == 0.0 {
                continue;
            }
            let cluster = &self.orbits[f.orbit].atoms;
            let a = form_index(f.monomial[0], constraint);
            let b = form_index(f.monomial[1], constraint);

            for op in &self.group.ops {
                let forms = basis::orbit_forms(op, cluster, constraint);
                for &(i, ci) in &forms[a].terms {
                    for &(j, cj) in &forms[b].terms {
                        let v = theta * ci * cj;
                        phi[i * dim + j] += v;
                        phi[j * dim + i] += v;
                    }
                }
            }
        }

        Ok(phi)
    }

    /// 按 "origin" 模式列出简谐力常数
    pub fn harmonic_constants(&self, params: &[f64]) -> Result<Vec<FcElement>> {
        let phi = self.harmonic_matrix(params)?;
        let n_atoms = self.crystal.n_atoms();
        let dim = 3 * n_atoms;
        let primitive = self.group.primitive_atoms();

        let mut elements = Vec::new();
        for &i in &primitive {
            for alpha in 0..3 {
                let first = 3 * i + alpha;
                for j in 0..n_atoms {
                    for beta in 0..3 {
                        let second = 3 * j + beta;
                        // 两个原子都在原胞内时，对称的另一半已经列出
                        if second < first && primitive.contains(&j) {
                            continue;
                        }
                        let value = phi[first * dim + second];
                        if value.abs() > ZERO_THRESHOLD {
                            elements.push(FcElement {
                                value,
                                indices: [first, second],
                            });
                        }
                    }
                }
            }
        }

        Ok(elements)
    }
}
