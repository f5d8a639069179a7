//! # 晶体结构数据模型
//!
//! 定义晶格、原子与晶体结构，以及内置的 64 原子金刚石 Si 超胞。
//!
//! ## 依赖关系
//! - 被 `parsers/poscar.rs`、`fcs/` 和 `commands/` 使用
//! - 无外部模块依赖

/// 晶格参数表示
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    /// [[a1, a2, a3], [b1, b2, b3], [c1, c2, c3]]
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let g = self.metric();
        let a = g[0][0].sqrt();
        let b = g[1][1].sqrt();
        let c = g[2][2].sqrt();

        let alpha = (g[1][2] / (b * c)).acos().to_degrees();
        let beta = (g[0][2] / (a * c)).acos().to_degrees();
        let gamma = (g[0][1] / (a * b)).acos().to_degrees();

        (a, b, c, alpha, beta, gamma)
    }

    /// 度规张量 G_ij = a_i · a_j
    pub fn metric(&self) -> [[f64; 3]; 3] {
        let m = &self.matrix;
        let mut g = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                g[i][j] = (0..3).map(|k| m[i][k] * m[j][k]).sum();
            }
        }
        g
    }

    /// 计算晶格体积（带符号）
    pub fn volume(&self) -> f64 {
        determinant(&self.matrix)
    }

    /// 分数坐标转笛卡尔坐标
    pub fn frac_to_cart(&self, frac: [f64; 3]) -> [f64; 3] {
        let m = &self.matrix;
        [
            frac[0] * m[0][0] + frac[1] * m[1][0] + frac[2] * m[2][0],
            frac[0] * m[0][1] + frac[1] * m[1][1] + frac[2] * m[2][1],
            frac[0] * m[0][2] + frac[1] * m[1][2] + frac[2] * m[2][2],
        ]
    }

    /// 笛卡尔坐标转分数坐标，晶格退化时返回 None
    pub fn cart_to_frac(&self, cart: [f64; 3]) -> Option<[f64; 3]> {
        let inv = invert(&self.matrix)?;
        // x = f · M  =>  f = x · M⁻¹
        Some([
            cart[0] * inv[0][0] + cart[1] * inv[1][0] + cart[2] * inv[2][0],
            cart[0] * inv[0][1] + cart[1] * inv[1][1] + cart[2] * inv[2][1],
            cart[0] * inv[0][2] + cart[1] * inv[1][2] + cart[2] * inv[2][2],
        ])
    }
}

/// 3x3 行列式
pub fn determinant(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// 3x3 矩阵求逆
pub fn invert(m: &[[f64; 3]; 3]) -> Option<[[f64; 3]; 3]> {
    let det = determinant(m);
    if det.abs() < 1e-10 {
        return None;
    }

    Some([
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) / det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) / det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) / det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) / det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) / det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) / det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) / det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) / det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) / det,
        ],
    ])
}

/// 原子信息
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// 元素符号
    pub element: String,

    /// 分数坐标 [x, y, z]
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            element: element.into(),
            position,
        }
    }
}

/// 晶体结构
#[derive(Debug, Clone)]
pub struct Crystal {
    /// 结构名称
    pub name: String,

    /// 晶格
    pub lattice: Lattice,

    /// 原子列表（顺序即训练数据中的原子顺序）
    pub atoms: Vec<Atom>,
}

impl Crystal {
    pub fn new(name: impl Into<String>, lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Crystal {
            name: name.into(),
            lattice,
            atoms,
        }
    }

    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// 计算化学式
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for atom in &self.atoms {
            *counts.entry(atom.element.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// 最小镜像距离（遍历 27 个相邻镜像，适用于非正交晶格）
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        let pi = self.atoms[i].position;
        let pj = self.atoms[j].position;
        let mut diff = [0.0; 3];
        for k in 0..3 {
            let d = pj[k] - pi[k];
            diff[k] = d - d.round();
        }

        let mut best = f64::INFINITY;
        for n0 in -1..=1 {
            for n1 in -1..=1 {
                for n2 in -1..=1 {
                    let f = [
                        diff[0] + n0 as f64,
                        diff[1] + n1 as f64,
                        diff[2] + n2 as f64,
                    ];
                    let x = self.lattice.frac_to_cart(f);
                    let r = (x[0] * x[0] + x[1] * x[1] + x[2] * x[2]).sqrt();
                    best = best.min(r);
                }
            }
        }
        best
    }

    /// 内置结构：金刚石 Si 2x2x2 常规胞超胞，64 原子，晶格常数 20.406 bohr
    pub fn si_diamond_supercell() -> Self {
        let a = 20.406;
        let lattice = Lattice::from_vectors([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]]);
        let atoms = SI64_POSITIONS
            .iter()
            .map(|&p| Atom::new("Si", p))
            .collect();
        Crystal::new("Si64", lattice, atoms)
    }
}

/// 64 原子 Si 超胞的分数坐标，顺序与 disp/force 数据文件一致
const SI64_POSITIONS: [[f64; 3]; 64] = [
    [0.000, 0.000, 0.000],
    [0.000, 0.000, 0.500],
    [0.000, 0.250, 0.250],
    [0.000, 0.250, 0.750],
    [0.000, 0.500, 0.000],
    [0.000, 0.500, 0.500],
    [0.000, 0.750, 0.250],
    [0.000, 0.750, 0.750],
    [0.125, 0.125, 0.125],
    [0.125, 0.125, 0.625],
    [0.125, 0.375, 0.375],
    [0.125, 0.375, 0.875],
    [0.125, 0.625, 0.125],
    [0.125, 0.625, 0.625],
    [0.125, 0.875, 0.375],
    [0.125, 0.875, 0.875],
    [0.250, 0.000, 0.250],
    [0.250, 0.000, 0.750],
    [0.250, 0.250, 0.000],
    [0.250, 0.250, 0.500],
    [0.250, 0.500, 0.250],
    [0.250, 0.500, 0.750],
    [0.250, 0.750, 0.000],
    [0.250, 0.750, 0.500],
    [0.375, 0.125, 0.375],
    [0.375, 0.125, 0.875],
    [0.375, 0.375, 0.125],
    [0.375, 0.375, 0.625],
    [0.375, 0.625, 0.375],
    [0.375, 0.625, 0.875],
    [0.375, 0.875, 0.125],
    [0.375, 0.875, 0.625],
    [0.500, 0.000, 0.000],
    [0.500, 0.000, 0.500],
    [0.500, 0.250, 0.250],
    [0.500, 0.250, 0.750],
    [0.500, 0.500, 0.000],
    [0.500, 0.500, 0.500],
    [0.500, 0.750, 0.250],
    [0.500, 0.750, 0.750],
    [0.625, 0.125, 0.125],
    [0.625, 0.125, 0.625],
    [0.625, 0.375, 0.375],
    [0.625, 0.375, 0.875],
    [0.625, 0.625, 0.125],
    [0.625, 0.625, 0.625],
    [0.625, 0.875, 0.375],
    [0.625, 0.875, 0.875],
    [0.750, 0.000, 0.250],
    [0.750, 0.000, 0.750],
    [0.750, 0.250, 0.000],
    [0.750, 0.250, 0.500],
    [0.750, 0.500, 0.250],
    [0.750, 0.500, 0.750],
    [0.750, 0.750, 0.000],
    [0.750, 0.750, 0.500],
    [0.875, 0.125, 0.375],
    [0.875, 0.125, 0.875],
    [0.875, 0.375, 0.125],
    [0.875, 0.375, 0.625],
    [0.875, 0.625, 0.375],
    [0.875, 0.625, 0.875],
    [0.875, 0.875, 0.125],
    [0.875, 0.875, 0.625],
];
