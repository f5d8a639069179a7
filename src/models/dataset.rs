//! # 位移-力训练数据
//!
//! 保存 (samples, atoms, 3) 形状的位移与力数组，按行优先展平。
//! 展平顺序即设计矩阵的行顺序：样本 → 原子 → xyz。
//!
//! ## 依赖关系
//! - 被 `parsers/dat.rs` 填充
//! - 被 `fcs/design.rs` 与 `regression/cv.rs` 使用

use crate::error::{FclassoError, Result};
use crate::utils::output;

/// 训练数据集
#[derive(Debug, Clone)]
pub struct TrainingSet {
    /// 位移，长度 n_samples * n_atoms * 3
    pub disp: Vec<f64>,
    /// 力，长度 n_samples * n_atoms * 3
    pub force: Vec<f64>,
    pub n_samples: usize,
    pub n_atoms: usize,
}

impl TrainingSet {
    /// 将展平的数组重整为 (-1, n_atoms, 3) 并截取前 `ndata` 个样本
    pub fn from_arrays(
        disp: Vec<f64>,
        force: Vec<f64>,
        n_atoms: usize,
        ndata: usize,
    ) -> Result<Self> {
        if n_atoms == 0 {
            return Err(FclassoError::InvalidArgument(
                "structure contains no atoms".to_string(),
            ));
        }

        let stride = 3 * n_atoms;
        let disp_samples = samples_in("displacement", disp.len(), stride)?;
        let force_samples = samples_in("force", force.len(), stride)?;

        if disp_samples != force_samples {
            return Err(FclassoError::ShapeMismatch {
                what: "training data".to_string(),
                expected: format!("{} force samples", disp_samples),
                found: format!("{} force samples", force_samples),
            });
        }

        let n_samples = if disp_samples < ndata {
            output::print_warning(&format!(
                "Requested {} samples but only {} available; using all of them",
                ndata, disp_samples
            ));
            disp_samples
        } else {
            ndata
        };

        if n_samples == 0 {
            return Err(FclassoError::InvalidArgument(
                "no training samples available".to_string(),
            ));
        }

        let mut disp = disp;
        let mut force = force;
        disp.truncate(n_samples * stride);
        force.truncate(n_samples * stride);

        Ok(TrainingSet {
            disp,
            force,
            n_samples,
            n_atoms,
        })
    }

    /// 设计矩阵行数
    pub fn n_rows(&self) -> usize {
        self.n_samples * self.n_atoms * 3
    }

    /// 第 s 个样本的位移切片（长度 n_atoms * 3）
    pub fn sample_disp(&self, s: usize) -> &[f64] {
        let stride = 3 * self.n_atoms;
        &self.disp[s * stride..(s + 1) * stride]
    }

    /// 展平后的力向量
    pub fn force_ravel(&self) -> &[f64] {
        &self.force
    }

    /// 每行对应的分组编号（样本编号，每个样本 3 * n_atoms 行）
    pub fn groups(&self) -> Vec<usize> {
        (0..self.n_samples)
            .flat_map(|s| std::iter::repeat(s).take(3 * self.n_atoms))
            .collect()
    }

    /// (samples, atoms, 3) 形状描述
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.n_samples, self.n_atoms, 3)
    }
}

fn samples_in(what: &str, len: usize, stride: usize) -> Result<usize> {
    if len % stride != 0 {
        return Err(FclassoError::ShapeMismatch {
            what: format!("{} data", what),
            expected: format!("a multiple of {} values", stride),
            found: format!("{} values", len),
        });
    }
    Ok(len / stride)
}
