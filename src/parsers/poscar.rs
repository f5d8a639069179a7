//! # VASP POSCAR 格式解析器
//!
//! 读取 POSCAR/CONTCAR，用于替换内置的 Si 超胞。
//! 原子顺序必须与位移/力数据文件一致。
//! POSCAR 中的长度单位为 Å，读入后统一换算为 bohr。
//!
//! ## POSCAR 格式说明
//! ```text
//! Comment line (structure name)
//! 1.0                    # scaling factor
//! a1 a2 a3               # lattice vector a
//! b1 b2 b3               # lattice vector b
//! c1 c2 c3               # lattice vector c
//! Element1 Element2 ...  # element symbols (VASP 5+)
//! n1 n2 ...              # number of atoms per element
//! Selective dynamics     # optional
//! Direct/Cartesian       # coordinate type
//! x1 y1 z1               # atom positions
//! ...
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{FclassoError, Result};
use crate::models::{Atom, Crystal, Lattice};
use std::fs;
use std::path::Path;

/// 1 bohr = 0.529177210903 Å
pub const BOHR_IN_ANGSTROM: f64 = 0.529177210903;

/// 解析 POSCAR/CONTCAR 文件
pub fn parse_poscar_file(path: &Path) -> Result<Crystal> {
    if !path.exists() {
        return Err(FclassoError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| FclassoError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_poscar_content(
        &content,
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown"),
    )
}

fn parse_error(name: &str, reason: impl Into<String>) -> FclassoError {
    FclassoError::ParseError {
        format: "poscar".to_string(),
        path: name.to_string(),
        reason: reason.into(),
    }
}

/// 从字符串内容解析 POSCAR 格式
pub fn parse_poscar_content(content: &str, default_name: &str) -> Result<Crystal> {
    let lines: Vec<&str> = content.lines().collect();

    if lines.len() < 8 {
        return Err(parse_error(default_name, "File too short"));
    }

    let name = match lines[0].trim() {
        "" => default_name.to_string(),
        s => s.to_string(),
    };

    let scale: f64 = lines[1]
        .trim()
        .parse()
        .map_err(|_| parse_error(&name, "Invalid scaling factor at line 2"))?;
    let scale = scale / BOHR_IN_ANGSTROM;

    let mut matrix = [[0.0; 3]; 3];
    for (i, row) in matrix.iter_mut().enumerate() {
        let parts: Vec<f64> = lines[2 + i]
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        if parts.len() < 3 {
            return Err(parse_error(
                &name,
                format!("Invalid lattice vector at line {}", 3 + i),
            ));
        }
        *row = [parts[0] * scale, parts[1] * scale, parts[2] * scale];
    }
    let lattice = Lattice::from_vectors(matrix);

    // Line 5: 元素符号 (VASP 5+) 或原子数 (VASP 4)
    let line5: Vec<&str> = lines[5].split_whitespace().collect();
    if line5.is_empty() {
        return Err(parse_error(&name, "Missing species line"));
    }
    let (elements, counts, mut coord_line) = if line5[0].parse::<usize>().is_ok() {
        let counts: Vec<usize> = line5.iter().filter_map(|s| s.parse().ok()).collect();
        let elements: Vec<String> = (0..counts.len()).map(|i| format!("X{}", i + 1)).collect();
        (elements, counts, 6)
    } else {
        let elements: Vec<String> = line5.iter().map(|s| s.to_string()).collect();
        let counts: Vec<usize> = lines[6]
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        (elements, counts, 7)
    };

    if elements.len() != counts.len() {
        return Err(parse_error(&name, "Species and count lines disagree"));
    }

    if lines.len() > coord_line
        && lines[coord_line]
            .trim()
            .to_lowercase()
            .starts_with('s')
    {
        coord_line += 1;
    }

    let coord_type = lines
        .get(coord_line)
        .ok_or_else(|| parse_error(&name, "Missing coordinate type line"))?
        .trim()
        .to_lowercase();
    let is_cartesian = coord_type.starts_with('c') || coord_type.starts_with('k');

    let mut atoms = Vec::new();
    let mut line_idx = coord_line + 1;

    for (elem, &count) in elements.iter().zip(counts.iter()) {
        for _ in 0..count {
            let parts: Vec<f64> = lines
                .get(line_idx)
                .ok_or_else(|| parse_error(&name, "Fewer positions than declared atoms"))?
                .split_whitespace()
                .take(3)
                .filter_map(|s| s.parse().ok())
                .collect();
            if parts.len() < 3 {
                return Err(parse_error(
                    &name,
                    format!("Invalid position at line {}", line_idx + 1),
                ));
            }

            let raw = [parts[0], parts[1], parts[2]];
            let position = if is_cartesian {
                let cart = [raw[0] * scale, raw[1] * scale, raw[2] * scale];
                lattice
                    .cart_to_frac(cart)
                    .ok_or_else(|| parse_error(&name, "Degenerate lattice"))?
            } else {
                raw
            };
            atoms.push(Atom::new(elem.clone(), position));
            line_idx += 1;
        }
    }

    Ok(Crystal::new(name, lattice, atoms))
}
