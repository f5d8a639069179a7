//! # 数据导出
//!
//! ## 支持格式
//! - 评分表: 每行 `alpha train_mean train_std test_mean test_std`，
//!   数字格式与 numpy `savetxt` 默认的 `%.18e` 相同
//! - 解路径: 每行 `alpha coef_1 ... coef_m`，α 降序
//! - CSV: 简谐力常数 `value, atom1, xyz1, atom2, xyz2`
//!
//! ## 依赖关系
//! - 被 `commands/cv.rs` 和 `commands/fit.rs` 调用
//! - 使用 `csv` 与 `serde` 写入 CSV 文件

use crate::error::{FclassoError, Result};
use crate::fcs::harmonic::{FcElement, AXES};
use crate::regression::{CvScores, LassoPath};

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// `%.18e` 格式：指数带符号且至少两位
pub fn format_sci(value: f64) -> String {
    format_exp(value, 18)
}

/// `%.{digits}e` 格式，与 numpy 的指数写法一致
pub fn format_exp(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let s = format!("{:.*e}", digits, value);
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => s,
    }
}

/// 写出交叉验证评分表
pub fn write_cv_scores(path: &Path, scores: &CvScores) -> Result<()> {
    let write_err = |e: std::io::Error| FclassoError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    };

    let file = File::create(path).map_err(write_err)?;
    let mut out = BufWriter::new(file);

    for k in 0..scores.len() {
        let row = [
            scores.alphas[k],
            scores.train_mean[k],
            scores.train_std[k],
            scores.test_mean[k],
            scores.test_std[k],
        ];
        let line: Vec<String> = row.iter().map(|v| format_sci(*v)).collect();
        writeln!(out, "{}", line.join(" ")).map_err(write_err)?;
    }

    out.flush().map_err(write_err)?;
    Ok(())
}

/// 写出正则化解路径，每个 α 一行
pub fn write_solution_path(path: &Path, solution: &LassoPath) -> Result<()> {
    let write_err = |e: std::io::Error| FclassoError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    };

    let file = File::create(path).map_err(write_err)?;
    let mut out = BufWriter::new(file);

    writeln!(out, "# alpha, coefficients").map_err(write_err)?;
    for (k, alpha) in solution.alphas.iter().enumerate() {
        let mut line = vec![format_sci(*alpha)];
        line.extend(solution.coefs.column(k).iter().map(|v| format_sci(*v)));
        writeln!(out, "{}", line.join(" ")).map_err(write_err)?;
    }

    out.flush().map_err(write_err)?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct FcRow {
    value: f64,
    atom1: usize,
    xyz1: char,
    atom2: usize,
    xyz2: char,
}

impl From<&FcElement> for FcRow {
    fn from(e: &FcElement) -> Self {
        let (a1, x1) = e.atom_axis(0);
        let (a2, x2) = e.atom_axis(1);
        FcRow {
            value: e.value,
            atom1: a1 + 1,
            xyz1: AXES[x1],
            atom2: a2 + 1,
            xyz2: AXES[x2],
        }
    }
}

/// 导出简谐力常数为 CSV 格式，原子编号从 1 开始
pub fn write_fc_csv(path: &Path, elements: &[FcElement]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    for e in elements {
        wtr.serialize(FcRow::from(e))?;
    }

    wtr.flush().map_err(|e| FclassoError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_format_sci() {
        assert_eq!(format_sci(0.1), "1.000000000000000056e-01");
        assert_eq!(format_sci(1.0), "1.000000000000000000e+00");
        let tiny = format_sci(-1e-123);
        assert!(tiny.starts_with("-1.0000000000000000"));
        assert!(tiny.ends_with("e-123"));
        assert_eq!(format_sci(0.0), "0.000000000000000000e+00");
        assert_eq!(format_sci(f64::NAN), "nan");
        assert_eq!(format_exp(1.0, 8), "1.00000000e+00");
        assert_eq!(format_exp(-2.5e-7, 3), "-2.500e-07");
    }

    #[test]
    fn test_write_cv_scores() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cvscore.dat");
        let scores = CvScores {
            alphas: vec![1.0, 0.5],
            train_mean: vec![0.5, 0.25],
            train_std: vec![0.0, 0.0],
            test_mean: vec![0.75, 0.5],
            test_std: vec![0.125, 0.0],
            n_splits: 2,
            n_unconverged: 0,
        };
        write_cv_scores(&path, &scores).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split(' ').count(), 5);
        assert!(lines[1].starts_with("5.000000000000000000e-01 2.500000000000000000e-01"));
    }

    #[test]
    fn test_default_grid_score_file() {
        use crate::regression::{cross_validate, logspace, CvSettings, Dmat, Dvec, PathParams};

        // 6 组 x 3 行，y = x0 − 0.5 x1
        let n = 18;
        let data: Vec<f64> = (0..n * 3)
            .map(|i| ((i * 37 % 29) as f64 - 14.0) / 14.0)
            .collect();
        let x = Dmat::from_row_slice(n, 3, &data);
        let y = &x * Dvec::from_vec(vec![1.0, -0.5, 0.0]);
        let groups: Vec<usize> = (0..n).map(|i| i / 3).collect();
        let settings = CvSettings {
            alphas: logspace(-1.0, -6.0, 300),
            n_splits: 3,
            standardize: true,
            path: PathParams::default(),
        };
        let scores = cross_validate(&x, &y, &groups, &settings, || {}).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("sklearn_cvscore.dat");
        write_cv_scores(&path, &scores).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let alphas: Vec<f64> = content
            .lines()
            .map(|l| l.split(' ').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(alphas.len(), 300);
        assert!((alphas[0] - 1e-1).abs() < 1e-15);
        assert!((alphas[299] - 1e-6).abs() < 1e-18);
        assert!(alphas.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_write_solution_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("coef.dat");
        let solution = LassoPath {
            alphas: vec![1.0, 0.5],
            coefs: crate::regression::Dmat::from_row_slice(3, 2, &[0.0, 0.5, 0.0, 0.0, 0.0, -2.0]),
            n_unconverged: 0,
        };
        write_solution_path(&path, &solution).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('#'));
        let row: Vec<&str> = lines[2].split(' ').collect();
        assert_eq!(row.len(), 4);
        assert_eq!(row[0], "5.000000000000000000e-01");
        assert_eq!(row[1], "5.000000000000000000e-01");
        assert_eq!(row[3], "-2.000000000000000000e+00");
    }

    #[test]
    fn test_write_fc_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fc.csv");
        let elements = vec![
            FcElement {
                value: 1.5,
                indices: [0, 0],
            },
            FcElement {
                value: -0.25,
                indices: [1, 5],
            },
        ];
        write_fc_csv(&path, &elements).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "value,atom1,xyz1,atom2,xyz2");
        assert_eq!(lines[1], "1.5,1,x,1,x");
        assert_eq!(lines[2], "-0.25,1,y,2,z");
    }
}
