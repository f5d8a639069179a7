//! # 列标准化
//!
//! 每列减去均值并除以总体标准差（ddof = 0）。
//! 常数列（方差不超过由均值决定的舍入误差界，或标准差小于 10ε）
//! 的缩放因子取 1。
//!
//! ## 依赖关系
//! - 被 `regression/cv.rs` 和 `commands/` 使用

use super::{Dmat, Dvec};

/// 标准化器
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Dvec,
    scale: Dvec,
}

impl StandardScaler {
    /// 由训练矩阵计算每列均值与标准差
    pub fn fit(x: &Dmat) -> Self {
        let n = x.nrows().max(1) as f64;
        let mut mean = Dvec::zeros(x.ncols());
        let mut scale = Dvec::zeros(x.ncols());

        for (j, col) in x.column_iter().enumerate() {
            let m = col.sum() / n;
            let var = col.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / n;
            let s = var.sqrt();
            mean[j] = m;
            scale[j] = if is_constant(var, m, n) || s < 10.0 * f64::EPSILON {
                1.0
            } else {
                s
            };
        }

        StandardScaler { mean, scale }
    }

    /// (X − mean) / scale
    pub fn transform(&self, x: &Dmat) -> Dmat {
        let mut out = x.clone();
        for (j, mut col) in out.column_iter_mut().enumerate() {
            let (m, s) = (self.mean[j], self.scale[j]);
            col.apply(|v| *v = (*v - m) / s);
        }
        out
    }

    pub fn scale(&self) -> &Dvec {
        &self.scale
    }

    /// 标准化空间中的系数换算回原始列尺度
    pub fn unscale(&self, coef: &Dvec) -> Dvec {
        coef.component_div(&self.scale)
    }
}

/// 方差是否落在求均值与求方差的舍入误差之内
fn is_constant(var: f64, mean: f64, n: f64) -> bool {
    let eps = f64::EPSILON;
    let bound = n * eps * var + (n * mean * eps).powi(2);
    var <= bound
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fit_transform() {
        let x = Dmat::from_row_slice(3, 2, &[1.0, 5.0, 2.0, 5.0, 3.0, 5.0]);
        let scaler = StandardScaler::fit(&x);

        assert_abs_diff_eq!(scaler.scale()[0], (2.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
        // 常数列
        assert_eq!(scaler.scale()[1], 1.0);

        let z = scaler.transform(&x);
        assert_abs_diff_eq!(z.column(0).sum(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(z.column(0).norm_squared() / 3.0, 1.0, epsilon = 1e-12);
        assert!(z.column(1).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_constant_column_with_large_mean() {
        let big = 1e8_f64;
        let x = Dmat::from_row_slice(3, 2, &[big, 1.0, big + 1.5e-8, 2.0, big, 3.0]);
        assert!(x[(1, 0)] != big);

        let scaler = StandardScaler::fit(&x);
        assert_eq!(scaler.scale()[0], 1.0);
        assert_abs_diff_eq!(scaler.scale()[1], (2.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_unscale() {
        let x = Dmat::from_row_slice(2, 1, &[0.0, 4.0]);
        let scaler = StandardScaler::fit(&x);
        let coef = Dvec::from_vec(vec![6.0]);
        assert_abs_diff_eq!(scaler.unscale(&coef)[0], 3.0, epsilon = 1e-12);
    }
}
