//! # LASSO / Elastic Net 坐标下降
//!
//! 目标函数 (1/2n)‖y − Xw‖² + αρ‖w‖₁ + ½α(1 − ρ)‖w‖²，不含截距；
//! ρ 为 `l1_ratio`，ρ = 1 即纯 LASSO。
//! 循环坐标下降，收敛判据与 scikit-learn 的 `cd_fast` 一致：
//! 当最大系数更新量相对最大系数小于 tol（或全部系数为零、或到达最后一轮）时
//! 计算对偶间隙，间隙小于 tol·‖y‖² 即收敛。
//!
//! ## 依赖关系
//! - 被 `regression/cv.rs` 和 `commands/` 使用
//! - 使用 `nalgebra` 的 SVD 做去偏最小二乘

use super::{Dmat, Dvec};
use crate::error::{FclassoError, Result};

/// 坐标下降参数
#[derive(Debug, Clone, Copy)]
pub struct PathParams {
    pub tol: f64,
    pub max_iter: usize,
    /// L1 在总惩罚中的占比，(0, 1]
    pub l1_ratio: f64,
}

impl Default for PathParams {
    fn default() -> Self {
        PathParams {
            tol: 1e-4,
            max_iter: 1000,
            l1_ratio: 1.0,
        }
    }
}

/// 单次坐标下降的结果
#[derive(Debug, Clone)]
pub struct LassoFit {
    pub coef: Dvec,
    pub n_iter: usize,
    pub dual_gap: f64,
    pub converged: bool,
}

impl LassoFit {
    /// 非零系数个数（L0 范数）
    pub fn l0_norm(&self) -> usize {
        self.coef.iter().filter(|c| **c != 0.0).count()
    }
}

/// 单个 α 的 LASSO 回归
#[derive(Debug, Clone, Copy)]
pub struct Lasso {
    pub alpha: f64,
    pub tol: f64,
    pub max_iter: usize,
    pub l1_ratio: f64,
}

impl Lasso {
    pub fn new(alpha: f64) -> Self {
        Lasso {
            alpha,
            tol: 1e-4,
            max_iter: 1000,
            l1_ratio: 1.0,
        }
    }

    pub fn with_l1_ratio(mut self, l1_ratio: f64) -> Self {
        self.l1_ratio = l1_ratio;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// 从零初值拟合
    pub fn fit(&self, x: &Dmat, y: &Dvec) -> Result<LassoFit> {
        check_shapes(x, y)?;
        check_l1_ratio(self.l1_ratio)?;
        if self.alpha < 0.0 {
            return Err(FclassoError::InvalidArgument(format!(
                "alpha must be non-negative, got {}",
                self.alpha
            )));
        }

        let norms = column_norms(x);
        let mut w = vec![0.0; x.ncols()];
        let outcome = coordinate_descent(
            x,
            y.as_slice(),
            &norms,
            Penalty::new(self.alpha, self.l1_ratio, x.nrows()),
            &mut w,
            self.tol,
            self.max_iter,
        );

        Ok(LassoFit {
            coef: Dvec::from_vec(w),
            n_iter: outcome.n_iter,
            dual_gap: outcome.gap,
            converged: outcome.converged,
        })
    }
}

/// 正则化路径
#[derive(Debug, Clone)]
pub struct LassoPath {
    /// 按降序排列的 α
    pub alphas: Vec<f64>,
    /// 系数矩阵，n_features x n_alphas
    pub coefs: Dmat,
    /// 未收敛的 α 个数
    pub n_unconverged: usize,
}

/// 沿 α 降序计算正则化路径，每个 α 以上一个解为初值
///
/// `on_alpha` 在每个 α 完成后调用一次，用于驱动进度条。
pub fn lasso_path<F>(
    x: &Dmat,
    y: &Dvec,
    alphas: &[f64],
    params: &PathParams,
    mut on_alpha: F,
) -> Result<LassoPath>
where
    F: FnMut(),
{
    check_shapes(x, y)?;
    check_l1_ratio(params.l1_ratio)?;
    if alphas.is_empty() {
        return Err(FclassoError::InvalidArgument(
            "alpha grid is empty".to_string(),
        ));
    }

    let mut sorted = alphas.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));

    let norms = column_norms(x);
    let mut w = vec![0.0; x.ncols()];
    let mut coefs = Dmat::zeros(x.ncols(), sorted.len());
    let mut n_unconverged = 0;

    for (k, &alpha) in sorted.iter().enumerate() {
        let outcome = coordinate_descent(
            x,
            y.as_slice(),
            &norms,
            Penalty::new(alpha, params.l1_ratio, x.nrows()),
            &mut w,
            params.tol,
            params.max_iter,
        );
        if !outcome.converged {
            n_unconverged += 1;
        }
        coefs.set_column(k, &Dvec::from_column_slice(&w));
        on_alpha();
    }

    Ok(LassoPath {
        alphas: sorted,
        coefs,
        n_unconverged,
    })
}

/// 使全部系数为零的最小 α：max|Xᵀy| / n
pub fn estimate_alpha_max(x: &Dmat, y: &Dvec) -> Result<f64> {
    check_shapes(x, y)?;
    let xty = x.tr_mul(y);
    Ok(xty.amax() / x.nrows().max(1) as f64)
}

/// 仅在非零系数上重新做普通最小二乘，消除 L1 收缩偏差
pub fn debias(x: &Dmat, y: &Dvec, coef: &Dvec) -> Result<Dvec> {
    check_shapes(x, y)?;
    if coef.len() != x.ncols() {
        return Err(FclassoError::ShapeMismatch {
            what: "coefficient vector".to_string(),
            expected: x.ncols().to_string(),
            found: coef.len().to_string(),
        });
    }

    let support: Vec<usize> = (0..coef.len()).filter(|&j| coef[j] != 0.0).collect();
    let mut out = Dvec::zeros(coef.len());
    if support.is_empty() {
        return Ok(out);
    }

    let sub = x.select_columns(support.iter());
    let solution = sub
        .svd(true, true)
        .solve(y, 1e-12)
        .map_err(|e| FclassoError::Other(format!("least-squares solve failed: {}", e)))?;

    for (k, &j) in support.iter().enumerate() {
        out[j] = solution[k];
    }
    Ok(out)
}

fn check_shapes(x: &Dmat, y: &Dvec) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(FclassoError::ShapeMismatch {
            what: "design matrix rows vs. force vector".to_string(),
            expected: x.nrows().to_string(),
            found: y.len().to_string(),
        });
    }
    Ok(())
}

fn check_l1_ratio(l1_ratio: f64) -> Result<()> {
    if !(l1_ratio > 0.0 && l1_ratio <= 1.0) {
        return Err(FclassoError::InvalidArgument(format!(
            "l1_ratio must be in (0, 1], got {}",
            l1_ratio
        )));
    }
    Ok(())
}

/// 已乘以样本数的 L1/L2 惩罚系数
#[derive(Debug, Clone, Copy)]
struct Penalty {
    l1: f64,
    l2: f64,
}

impl Penalty {
    fn new(alpha: f64, l1_ratio: f64, n_samples: usize) -> Self {
        let scaled = alpha * n_samples as f64;
        Penalty {
            l1: scaled * l1_ratio,
            l2: scaled * (1.0 - l1_ratio),
        }
    }
}

fn column_norms(x: &Dmat) -> Vec<f64> {
    x.column_iter().map(|c| c.norm_squared()).collect()
}

struct CdOutcome {
    n_iter: usize,
    gap: f64,
    converged: bool,
}

/// 列优先存储中第 j 列
fn column(data: &[f64], n: usize, j: usize) -> &[f64] {
    &data[j * n..(j + 1) * n]
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(p, q)| p * q).sum()
}

fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

fn soft_threshold(z: f64, gamma: f64) -> f64 {
    z.signum() * (z.abs() - gamma).max(0.0)
}

/// 循环坐标下降，`w` 为初值并原地更新
fn coordinate_descent(
    x: &Dmat,
    y: &[f64],
    norms: &[f64],
    penalty: Penalty,
    w: &mut [f64],
    tol: f64,
    max_iter: usize,
) -> CdOutcome {
    let n = x.nrows();
    let data = x.as_slice();

    // R = y − Xw
    let mut r = y.to_vec();
    for (j, &wj) in w.iter().enumerate() {
        if wj != 0.0 {
            axpy(-wj, column(data, n, j), &mut r);
        }
    }

    let gap_tol = tol * dot(y, y);
    let mut gap = gap_tol + 1.0;

    for n_iter in 0..max_iter {
        let mut w_max = 0.0_f64;
        let mut d_w_max = 0.0_f64;

        for j in 0..w.len() {
            if norms[j] == 0.0 {
                continue;
            }
            let xj = column(data, n, j);
            let w_old = w[j];
            if w_old != 0.0 {
                axpy(w_old, xj, &mut r);
            }

            let tmp = dot(xj, &r);
            w[j] = soft_threshold(tmp, penalty.l1) / (norms[j] + penalty.l2);

            if w[j] != 0.0 {
                axpy(-w[j], xj, &mut r);
            }

            d_w_max = d_w_max.max((w[j] - w_old).abs());
            w_max = w_max.max(w[j].abs());
        }

        if w_max == 0.0 || d_w_max / w_max < tol || n_iter + 1 == max_iter {
            gap = duality_gap(x, y, &r, w, penalty);
            if gap < gap_tol {
                return CdOutcome {
                    n_iter: n_iter + 1,
                    gap,
                    converged: true,
                };
            }
        }
    }

    CdOutcome {
        n_iter: max_iter,
        gap,
        converged: false,
    }
}

fn duality_gap(x: &Dmat, y: &[f64], r: &[f64], w: &[f64], penalty: Penalty) -> f64 {
    let Penalty { l1, l2 } = penalty;
    let n = x.nrows();
    let data = x.as_slice();
    let dual_norm = (0..w.len())
        .map(|j| (dot(column(data, n, j), r) - l2 * w[j]).abs())
        .fold(0.0_f64, f64::max);

    let r_norm2 = dot(r, r);
    let w_norm2 = dot(w, w);
    let (scale, mut gap) = if dual_norm > l1 {
        let c = l1 / dual_norm;
        (c, 0.5 * (r_norm2 + r_norm2 * c * c))
    } else {
        (1.0, r_norm2)
    };

    let l1_norm: f64 = w.iter().map(|v| v.abs()).sum();
    gap += l1 * l1_norm - scale * dot(r, y) + 0.5 * l2 * (1.0 + scale * scale) * w_norm2;
    gap
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// 正交设计下 LASSO 有闭式解：软阈值
    fn orthogonal_problem() -> (Dmat, Dvec) {
        // 4 个样本，两列正交且 ‖x_j‖² = n
        let x = Dmat::from_row_slice(
            4,
            2,
            &[1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0, -1.0],
        );
        let y = Dvec::from_vec(vec![3.0, 1.0, -1.0, -3.0]);
        (x, y)
    }

    #[test]
    fn test_soft_threshold_solution() {
        let (x, y) = orthogonal_problem();
        // Xᵀy / n = [2, 1]
        let fit = Lasso::new(0.5).with_tol(1e-10).fit(&x, &y).unwrap();
        assert!(fit.converged);
        assert_abs_diff_eq!(fit.coef[0], 1.5, epsilon = 1e-9);
        assert_abs_diff_eq!(fit.coef[1], 0.5, epsilon = 1e-9);

        let fit = Lasso::new(1.5).with_tol(1e-10).fit(&x, &y).unwrap();
        assert_abs_diff_eq!(fit.coef[0], 0.5, epsilon = 1e-9);
        assert_eq!(fit.coef[1], 0.0);
        assert_eq!(fit.l0_norm(), 1);
    }

    #[test]
    fn test_elastic_net_orthogonal_solution() {
        let (x, y) = orthogonal_problem();
        // w = S(Xᵀy/n, αρ) / (1 + α(1 − ρ))
        let fit = Lasso::new(1.0)
            .with_l1_ratio(0.5)
            .with_tol(1e-12)
            .fit(&x, &y)
            .unwrap();
        assert!(fit.converged);
        assert!(fit.dual_gap.abs() < 1e-9);
        assert_abs_diff_eq!(fit.coef[0], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fit.coef[1], 1.0 / 3.0, epsilon = 1e-9);

        assert!(Lasso::new(1.0).with_l1_ratio(0.0).fit(&x, &y).is_err());
        assert!(Lasso::new(1.0).with_l1_ratio(1.5).fit(&x, &y).is_err());
    }

    #[test]
    fn test_alpha_max_zeroes_everything() {
        let (x, y) = orthogonal_problem();
        let alpha_max = estimate_alpha_max(&x, &y).unwrap();
        assert_abs_diff_eq!(alpha_max, 2.0, epsilon = 1e-12);

        let fit = Lasso::new(alpha_max).fit(&x, &y).unwrap();
        assert_eq!(fit.l0_norm(), 0);
        assert!(fit.converged);
    }

    #[test]
    fn test_path_sorted_and_warm_started() {
        let (x, y) = orthogonal_problem();
        let mut calls = 0;
        let path = lasso_path(
            &x,
            &y,
            &[0.1, 3.0, 1.0],
            &PathParams {
                tol: 1e-10,
                max_iter: 1000,
                l1_ratio: 1.0,
            },
            || calls += 1,
        )
        .unwrap();

        assert_eq!(calls, 3);
        assert_eq!(path.alphas, vec![3.0, 1.0, 0.1]);
        assert_eq!(path.coefs.shape(), (2, 3));
        assert_eq!(path.coefs[(0, 0)], 0.0);
        assert_abs_diff_eq!(path.coefs[(0, 1)], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(path.coefs[(0, 2)], 1.9, epsilon = 1e-9);
        assert_abs_diff_eq!(path.coefs[(1, 2)], 0.9, epsilon = 1e-9);
        assert_eq!(path.n_unconverged, 0);
    }

    #[test]
    fn test_correlated_columns_converge() {
        let n = 40;
        let mut data = Vec::with_capacity(n * 3);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..n {
            let a: f64 = rng.gen_range(-0.5..0.5);
            let b: f64 = rng.gen_range(-0.5..0.5);
            data.extend_from_slice(&[a, a + 0.1 * b, b]);
        }
        let x = Dmat::from_row_slice(n, 3, &data);
        let truth = Dvec::from_vec(vec![2.0, 0.0, -1.0]);
        let y = &x * &truth;

        let fit = Lasso::new(1e-6)
            .with_tol(1e-10)
            .with_max_iter(100_000)
            .fit(&x, &y)
            .unwrap();
        assert!(fit.converged);
        let resid = (&y - &x * &fit.coef).norm();
        assert!(resid < 1e-3 * y.norm());
    }

    #[test]
    fn test_debias_recovers_ols() {
        let (x, y) = orthogonal_problem();
        let fit = Lasso::new(0.5).fit(&x, &y).unwrap();
        let refit = debias(&x, &y, &fit.coef).unwrap();
        assert_abs_diff_eq!(refit[0], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(refit[1], 1.0, epsilon = 1e-9);

        let zero = Dvec::zeros(2);
        assert_eq!(debias(&x, &y, &zero).unwrap(), zero);
    }

    #[test]
    fn test_shape_mismatch() {
        let (x, _) = orthogonal_problem();
        let y = Dvec::zeros(3);
        assert!(Lasso::new(0.1).fit(&x, &y).is_err());
        assert!(lasso_path(&x, &Dvec::zeros(4), &[], &PathParams::default(), || {}).is_err());
    }
}
