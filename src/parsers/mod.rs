//! # 解析器模块
//!
//! 提供结构文件与训练数据文件的解析器。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: dat, poscar

pub mod dat;
pub mod poscar;

use crate::error::Result;
use crate::models::{Crystal, TrainingSet};
use std::path::Path;

/// 读取结构：给定 POSCAR 路径则解析文件，否则使用内置 Si 超胞
pub fn load_structure(path: Option<&Path>) -> Result<Crystal> {
    match path {
        Some(p) => poscar::parse_poscar_file(p),
        None => Ok(Crystal::si_diamond_supercell()),
    }
}

/// 读取位移与力文件并组装训练集
pub fn load_training_set(
    disp_path: &Path,
    force_path: &Path,
    n_atoms: usize,
    ndata: usize,
) -> Result<TrainingSet> {
    let force = dat::load_matrix_text(force_path)?;
    let disp = dat::load_matrix_text(disp_path)?;
    TrainingSet::from_arrays(disp.values, force.values, n_atoms, ndata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_training_set() {
        let dir = tempfile::tempdir().unwrap();
        let disp_path = dir.path().join("disp_random.dat");
        let force_path = dir.path().join("force_random.dat");

        let mut disp = std::fs::File::create(&disp_path).unwrap();
        let mut force = std::fs::File::create(&force_path).unwrap();
        for s in 0..3 {
            for a in 0..2 {
                writeln!(disp, "{} {} {}", s, a, 0.01).unwrap();
                writeln!(force, "{} {} {}", -(s as f64), a, -0.01).unwrap();
            }
        }
        drop(disp);
        drop(force);

        let set = load_training_set(&disp_path, &force_path, 2, 2).unwrap();
        assert_eq!(set.shape(), (2, 2, 3));
        assert_eq!(set.sample_disp(1)[0], 1.0);
    }

    #[test]
    fn test_default_structure() {
        let crystal = load_structure(None).unwrap();
        assert_eq!(crystal.n_atoms(), 64);
    }
}
