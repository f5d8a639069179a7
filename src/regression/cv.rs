//! # 分组交叉验证
//!
//! 按样本（位移构型）分组的 K 折交叉验证，
//! 每折在训练集上计算整条 LASSO 路径，并记录训练/测试相对 RMSE。
//!
//! ## 功能
//! - GroupKFold：同一构型的所有行落在同一折
//! - 可选的逐折标准化（只用训练集统计量）
//! - 基于 rayon 的逐折并行
//!
//! ## 依赖关系
//! - 被 `commands/cv.rs` 调用
//! - 使用 `regression/lasso.rs` 与 `regression/scaler.rs`

use super::lasso::{lasso_path, PathParams};
use super::scaler::StandardScaler;
use super::{Dmat, Dvec};
use crate::error::{FclassoError, Result};

use rayon::prelude::*;

/// 10^start 到 10^stop 的对数等距网格（含端点）
pub fn logspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![10f64.powf(start)],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| 10f64.powf(start + step * i as f64))
                .collect()
        }
    }
}

/// 分组 K 折划分
#[derive(Debug, Clone, Copy)]
pub struct GroupKFold {
    pub n_splits: usize,
}

impl GroupKFold {
    pub fn new(n_splits: usize) -> Self {
        GroupKFold { n_splits }
    }

    /// 返回每折的 (训练行, 测试行)，行号升序
    ///
    /// 各组按大小降序依次分配给当前最轻的折，同样轻时取编号最小的折。
    pub fn split(&self, groups: &[usize]) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        let mut unique: Vec<usize> = groups.to_vec();
        unique.sort_unstable();
        unique.dedup();

        if self.n_splits < 2 {
            return Err(FclassoError::InvalidArgument(format!(
                "n_splits must be at least 2, got {}",
                self.n_splits
            )));
        }
        if self.n_splits > unique.len() {
            return Err(FclassoError::InvalidArgument(format!(
                "cannot have n_splits = {} greater than the number of groups ({})",
                self.n_splits,
                unique.len()
            )));
        }

        let group_index = |g: usize| unique.binary_search(&g).unwrap_or(0);
        let mut sizes = vec![0usize; unique.len()];
        for &g in groups {
            sizes[group_index(g)] += 1;
        }

        // 稳定升序后反转
        let mut order: Vec<usize> = (0..unique.len()).collect();
        order.sort_by_key(|&k| sizes[k]);
        order.reverse();

        let mut fold_weight = vec![0usize; self.n_splits];
        let mut group_fold = vec![0usize; unique.len()];
        for &k in &order {
            let lightest = (0..self.n_splits)
                .min_by_key(|&f| (fold_weight[f], f))
                .unwrap_or(0);
            fold_weight[lightest] += sizes[k];
            group_fold[k] = lightest;
        }

        let row_fold: Vec<usize> = groups.iter().map(|&g| group_fold[group_index(g)]).collect();
        Ok((0..self.n_splits)
            .map(|f| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..groups.len()).partition(|&i| row_fold[i] == f);
                (train, test)
            })
            .collect())
    }
}

/// 交叉验证设置
#[derive(Debug, Clone)]
pub struct CvSettings {
    pub alphas: Vec<f64>,
    pub n_splits: usize,
    pub standardize: bool,
    pub path: PathParams,
}

/// 单折结果
#[derive(Debug, Clone)]
struct FoldScores {
    train: Vec<f64>,
    test: Vec<f64>,
    n_unconverged: usize,
}

/// 交叉验证评分，按 α 降序排列
#[derive(Debug, Clone)]
pub struct CvScores {
    pub alphas: Vec<f64>,
    pub train_mean: Vec<f64>,
    pub train_std: Vec<f64>,
    pub test_mean: Vec<f64>,
    pub test_std: Vec<f64>,
    pub n_splits: usize,
    /// 所有折中未收敛的路径点总数
    pub n_unconverged: usize,
}

impl CvScores {
    /// 测试误差最小的下标，并列时取第一个
    pub fn best_index(&self) -> usize {
        let mut best = 0;
        for (i, &v) in self.test_mean.iter().enumerate() {
            if v < self.test_mean[best] || (self.test_mean[best].is_nan() && !v.is_nan()) {
                best = i;
            }
        }
        best
    }

    pub fn best_alpha(&self) -> f64 {
        self.alphas[self.best_index()]
    }

    pub fn len(&self) -> usize {
        self.alphas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alphas.is_empty()
    }
}

/// 执行分组交叉验证
///
/// 调用方可用 `ThreadPool::install` 控制并行度；`on_progress` 每完成一个
/// (折, α) 调用一次。
pub fn cross_validate<F>(
    x: &Dmat,
    y: &Dvec,
    groups: &[usize],
    settings: &CvSettings,
    on_progress: F,
) -> Result<CvScores>
where
    F: Fn() + Sync,
{
    if x.nrows() != y.len() || groups.len() != y.len() {
        return Err(FclassoError::ShapeMismatch {
            what: "rows of design matrix / forces / groups".to_string(),
            expected: x.nrows().to_string(),
            found: format!("{} / {}", y.len(), groups.len()),
        });
    }
    if settings.alphas.is_empty() {
        return Err(FclassoError::InvalidArgument(
            "alpha grid is empty".to_string(),
        ));
    }

    let mut alphas = settings.alphas.clone();
    alphas.sort_by(|a, b| b.total_cmp(a));

    let splits = GroupKFold::new(settings.n_splits).split(groups)?;

    let folds: Vec<FoldScores> = splits
        .par_iter()
        .map(|(train, test)| run_fold(x, y, train, test, &alphas, settings, &on_progress))
        .collect::<Result<Vec<_>>>()?;

    let n_alphas = alphas.len();

    let mut scores = CvScores {
        alphas,
        train_mean: Vec::with_capacity(n_alphas),
        train_std: Vec::with_capacity(n_alphas),
        test_mean: Vec::with_capacity(n_alphas),
        test_std: Vec::with_capacity(n_alphas),
        n_splits: folds.len(),
        n_unconverged: folds.iter().map(|f| f.n_unconverged).sum(),
    };
    for k in 0..n_alphas {
        let train: Vec<f64> = folds.iter().map(|f| f.train[k]).collect();
        let test: Vec<f64> = folds.iter().map(|f| f.test[k]).collect();
        scores.train_mean.push(mean(&train));
        scores.train_std.push(sample_std(&train));
        scores.test_mean.push(mean(&test));
        scores.test_std.push(sample_std(&test));
    }

    Ok(scores)
}

fn run_fold<F>(
    x: &Dmat,
    y: &Dvec,
    train: &[usize],
    test: &[usize],
    alphas: &[f64],
    settings: &CvSettings,
    on_progress: &F,
) -> Result<FoldScores>
where
    F: Fn() + Sync,
{
    let mut x_train = x.select_rows(train.iter());
    let mut x_test = x.select_rows(test.iter());
    let y_train = y.select_rows(train.iter());
    let y_test = y.select_rows(test.iter());

    if settings.standardize {
        let scaler = StandardScaler::fit(&x_train);
        x_train = scaler.transform(&x_train);
        x_test = scaler.transform(&x_test);
    }

    let path = lasso_path(&x_train, &y_train, alphas, &settings.path, || on_progress())?;

    let pred_train = &x_train * &path.coefs;
    let pred_test = &x_test * &path.coefs;
    let norm_train = y_train.norm_squared();
    let norm_test = y_test.norm_squared();

    let relative_rms = |pred: &Dmat, target: &Dvec, norm: f64| -> Vec<f64> {
        pred.column_iter()
            .map(|col| ((&col - target).norm_squared() / norm).sqrt())
            .collect()
    };

    Ok(FoldScores {
        train: relative_rms(&pred_train, &y_train, norm_train),
        test: relative_rms(&pred_test, &y_test, norm_test),
        n_unconverged: path.n_unconverged,
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// 样本标准差（ddof = 1）
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_logspace() {
        let grid = logspace(-1.0, -6.0, 6);
        assert_eq!(grid.len(), 6);
        for (g, e) in grid.iter().zip([1e-1, 1e-2, 1e-3, 1e-4, 1e-5, 1e-6]) {
            assert_abs_diff_eq!(*g, e, epsilon = e * 1e-12);
        }
        assert_eq!(logspace(0.0, 3.0, 1), vec![1.0]);
        assert!(logspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_group_kfold_assignment() {
        // 10 组，每组 3 行
        let groups: Vec<usize> = (0..10).flat_map(|g| std::iter::repeat(g).take(3)).collect();
        let splits = GroupKFold::new(5).split(&groups).unwrap();
        assert_eq!(splits.len(), 5);

        // 降序分配：组 9 -> 折 0, 组 8 -> 折 1, ..., 组 4 -> 折 0
        let (_, test0) = &splits[0];
        assert_eq!(test0, &vec![12, 13, 14, 27, 28, 29]);

        let mut all_test: Vec<usize> = splits.iter().flat_map(|(_, t)| t.clone()).collect();
        all_test.sort_unstable();
        assert_eq!(all_test, (0..30).collect::<Vec<_>>());

        for (train, test) in &splits {
            assert_eq!(train.len() + test.len(), 30);
            assert!(train.iter().all(|i| !test.contains(i)));
        }
    }

    #[test]
    fn test_group_kfold_uneven_groups() {
        // 组大小 4, 1, 2：先分配大组
        let groups = vec![0, 0, 0, 0, 1, 2, 2];
        let splits = GroupKFold::new(2).split(&groups).unwrap();
        assert_eq!(splits[0].1, vec![0, 1, 2, 3]);
        assert_eq!(splits[1].1, vec![4, 5, 6]);
    }

    #[test]
    fn test_group_kfold_errors() {
        let groups = vec![0, 0, 1, 1];
        assert!(GroupKFold::new(3).split(&groups).is_err());
        assert!(GroupKFold::new(1).split(&groups).is_err());
    }

    #[test]
    fn test_sample_std() {
        assert_abs_diff_eq!(sample_std(&[1.0, 2.0, 3.0]), 1.0, epsilon = 1e-12);
        assert_eq!(sample_std(&[5.0]), 0.0);
    }

    #[test]
    fn test_cross_validate_noiseless() {
        // y = 2 x0 − x1，6 组 x 4 行
        let n = 24;
        let mut data = Vec::with_capacity(n * 3);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..n * 3 {
            data.push(rng.gen_range(-0.5_f64..0.5));
        }
        let x = Dmat::from_row_slice(n, 3, &data);
        let y = &x * Dvec::from_vec(vec![2.0, -1.0, 0.0]);
        let groups: Vec<usize> = (0..n).map(|i| i / 4).collect();

        let settings = CvSettings {
            alphas: logspace(-6.0, 0.0, 7),
            n_splits: 3,
            standardize: false,
            path: PathParams {
                tol: 1e-12,
                max_iter: 10_000,
                l1_ratio: 1.0,
            },
        };
        let counter = std::sync::atomic::AtomicUsize::new(0);
        let scores = cross_validate(&x, &y, &groups, &settings, || {
            counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        })
        .unwrap();

        assert_eq!(counter.into_inner(), 3 * 7);
        assert_eq!(scores.len(), 7);
        // 降序
        assert_abs_diff_eq!(scores.alphas[0], 1.0, epsilon = 1e-12);
        // α = 1 时所有系数为零，相对误差为 1
        assert_abs_diff_eq!(scores.test_mean[0], 1.0, epsilon = 1e-9);
        assert_eq!(scores.best_index(), 6);
        assert!(scores.test_mean[6] < 1e-4);
        assert!(scores.train_mean[6] < 1e-4);
    }

    #[test]
    fn test_best_index_ties_and_nan() {
        let scores = CvScores {
            alphas: vec![3.0, 2.0, 1.0],
            train_mean: vec![0.0; 3],
            train_std: vec![0.0; 3],
            test_mean: vec![f64::NAN, 0.5, 0.5],
            test_std: vec![0.0; 3],
            n_splits: 2,
            n_unconverged: 0,
        };
        assert_eq!(scores.best_index(), 1);
        assert_eq!(scores.best_alpha(), 2.0);
    }
}
