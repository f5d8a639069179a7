//! # 团簇枚举与轨道划分
//!
//! 按每阶的截断半径与多体数上限枚举原子团簇，再用空间群把团簇划分为轨道。
//! 每个轨道只保留一个代表团簇，其余团簇由对称操作生成。
//!
//! ## 依赖关系
//! - 被 `fcs/basis.rs` 和 `fcs/design.rs` 使用
//! - 使用 `fcs/symmetry.rs`, `fcs/interaction.rs`, `models/structure.rs`

use super::interaction::{Constraint, Interaction};
use super::symmetry::SpaceGroup;
use crate::models::Crystal;

use std::collections::HashSet;

/// 截断比较容差（bohr）
const CUTOFF_TOLERANCE: f64 = 1e-6;

/// 团簇轨道
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterOrbit {
    /// 所属阶数（从 1 开始）
    pub order: usize,
    /// 代表团簇，原子编号升序；atoms[0] 为相对位移的参考原子
    pub atoms: Vec<usize>,
    /// 轨道中不同团簇的数目
    pub multiplicity: usize,
}

impl ClusterOrbit {
    pub fn size(&self) -> usize {
        self.atoms.len()
    }
}

/// 原子间最小镜像距离表
pub struct DistanceTable {
    n: usize,
    data: Vec<f64>,
}

impl DistanceTable {
    pub fn new(crystal: &Crystal) -> Self {
        let n = crystal.n_atoms();
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = crystal.distance(i, j);
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }
        DistanceTable { n, data }
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }
}

/// 枚举所有阶的团簇轨道，按 (阶数, 团簇大小, 原子编号) 排序
pub fn enumerate_orbits(
    crystal: &Crystal,
    group: &SpaceGroup,
    interaction: &Interaction,
) -> Vec<ClusterOrbit> {
    let distances = DistanceTable::new(crystal);
    let min_size = match interaction.constraint {
        Constraint::Translation => 2,
        Constraint::None => 1,
    };

    let mut orbits = Vec::new();
    for order in 1..=interaction.maxorder {
        let cutoff = interaction.cutoff(order);
        for size in min_size..=interaction.max_cluster_size(order) {
            let clusters = enumerate_clusters(crystal.n_atoms(), size, cutoff, &distances);
            orbits.extend(
                split_into_orbits(&clusters, group)
                    .into_iter()
                    .map(|(atoms, multiplicity)| ClusterOrbit {
                        order,
                        atoms,
                        multiplicity,
                    }),
            );
        }
    }
    orbits
}

/// 枚举大小为 `size` 的团簇（原子编号严格升序，所有原子对在截断内）
pub fn enumerate_clusters(
    n_atoms: usize,
    size: usize,
    cutoff: Option<f64>,
    distances: &DistanceTable,
) -> Vec<Vec<usize>> {
    fn extend(
        current: &mut Vec<usize>,
        size: usize,
        n_atoms: usize,
        within: &dyn Fn(usize, usize) -> bool,
        out: &mut Vec<Vec<usize>>,
    ) {
        if current.len() == size {
            out.push(current.clone());
            return;
        }
        let start = current.last().map_or(0, |&a| a + 1);
        for next in start..n_atoms {
            if current.iter().all(|&a| within(a, next)) {
                current.push(next);
                extend(current, size, n_atoms, within, out);
                current.pop();
            }
        }
    }

    let within = |a: usize, b: usize| match cutoff {
        Some(rc) => distances.get(a, b) <= rc + CUTOFF_TOLERANCE,
        None => true,
    };

    let mut out = Vec::new();
    if size > 0 {
        extend(&mut Vec::with_capacity(size), size, n_atoms, &within, &mut out);
    }
    out
}

/// 将团簇划分为对称轨道；返回 (代表团簇, 轨道大小)
///
/// 输入须按字典序排列，每个轨道的代表即其中字典序最小的团簇。
fn split_into_orbits(clusters: &[Vec<usize>], group: &SpaceGroup) -> Vec<(Vec<usize>, usize)> {
    let mut visited: HashSet<Vec<usize>> = HashSet::with_capacity(clusters.len());
    let mut orbits = Vec::new();

    for cluster in clusters {
        if visited.contains(cluster) {
            continue;
        }

        let mut members = 0;
        for op in &group.ops {
            let mut image: Vec<usize> = cluster.iter().map(|&a| op.perm[a]).collect();
            image.sort_unstable();
            if visited.insert(image) {
                members += 1;
            }
        }
        orbits.push((cluster.clone(), members));
    }

    orbits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fcs::symmetry::DEFAULT_TOLERANCE;
    use crate::models::{Atom, Lattice};

    fn chain(n: usize) -> Crystal {
        let lattice =
            Lattice::from_vectors([[n as f64, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]]);
        let atoms = (0..n)
            .map(|i| Atom::new("H", [i as f64 / n as f64, 0.0, 0.0]))
            .collect();
        Crystal::new("chain", lattice, atoms)
    }

    #[test]
    fn test_pairs_within_cutoff() {
        let crystal = chain(6);
        let table = DistanceTable::new(&crystal);
        let pairs = enumerate_clusters(6, 2, Some(1.0), &table);
        // 6 个最近邻键（含周期边界）
        assert_eq!(pairs.len(), 6);
        assert!(pairs.contains(&vec![0, 5]));

        let all = enumerate_clusters(6, 2, None, &table);
        assert_eq!(all.len(), 15);
    }

    #[test]
    fn test_chain_orbits() {
        let crystal = chain(6);
        let group = SpaceGroup::find(&crystal, DEFAULT_TOLERANCE).unwrap();
        let inter = Interaction::from_raw(1, &[-1.0], &[2], Constraint::Translation);
        let orbits = enumerate_orbits(&crystal, &group, &inter);

        // 距离 1, 2, 3 三类原子对
        assert_eq!(orbits.len(), 3);
        assert_eq!(orbits[0].atoms, vec![0, 1]);
        assert_eq!(orbits[0].multiplicity, 6);
        assert_eq!(orbits[2].atoms, vec![0, 3]);
        assert_eq!(orbits[2].multiplicity, 3);

        let total: usize = orbits.iter().map(|o| o.multiplicity).sum();
        assert_eq!(total, 15);
    }

    #[test]
    fn test_single_atom_clusters_without_translation() {
        let crystal = chain(4);
        let group = SpaceGroup::find(&crystal, DEFAULT_TOLERANCE).unwrap();
        let inter = Interaction::from_raw(1, &[-1.0], &[2], Constraint::None);
        let orbits = enumerate_orbits(&crystal, &group, &inter);

        assert_eq!(orbits[0].atoms, vec![0]);
        assert_eq!(orbits[0].multiplicity, 4);
        assert!(orbits.iter().skip(1).all(|o| o.size() == 2));
    }

    #[test]
    fn test_si_orbit_multiplicities_cover_all_pairs() {
        let crystal = Crystal::si_diamond_supercell();
        let group = SpaceGroup::find(&crystal, DEFAULT_TOLERANCE).unwrap();
        let inter = Interaction::from_raw(1, &[8.0], &[2], Constraint::Translation);
        let orbits = enumerate_orbits(&crystal, &group, &inter);

        // 第一、二近邻壳层：4 + 12 个邻居，每原子计数后除以 2
        let total: usize = orbits.iter().map(|o| o.multiplicity).sum();
        assert_eq!(total, 64 * 16 / 2);
        assert_eq!(orbits.len(), 2);
    }
}
