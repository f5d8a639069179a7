//! # 交叉验证曲线
//!
//! 使用 `plotters` 绘制训练/测试平均相对 RMSE 随 α 的变化，x 轴为对数坐标。
//!
//! ## 功能
//! - 两条带圆点标记的折线
//! - 竖线标出测试误差最小的 α
//! - 支持 PNG 和 SVG 输出
//!
//! ## 依赖关系
//! - 被 `commands/cv.rs` 调用
//! - 使用 `regression/cv.rs` 的 CvScores
//! - 使用 `plotters` 渲染图表

use crate::error::{FclassoError, Result};
use crate::regression::CvScores;

use plotters::prelude::*;
use std::path::Path;

/// 生成交叉验证曲线图
pub fn plot_cv_scores(
    scores: &CvScores,
    output_path: &Path,
    width: u32,
    height: u32,
    use_svg: bool,
) -> Result<()> {
    if scores.is_empty() {
        return Err(FclassoError::PlotError("no scores to plot".to_string()));
    }

    if use_svg {
        let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
        draw_cv_chart(&root, scores)?;
        root.present()
            .map_err(|e| FclassoError::PlotError(e.to_string()))?;
    } else {
        let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
        draw_cv_chart(&root, scores)?;
        root.present()
            .map_err(|e| FclassoError::PlotError(e.to_string()))?;
    }
    Ok(())
}

/// 对数 x 轴范围与 y 轴上限
fn axis_ranges(scores: &CvScores) -> Result<((f64, f64), f64)> {
    let positive = scores.alphas.iter().copied().filter(|a| *a > 0.0);
    let x_min = positive.clone().fold(f64::INFINITY, f64::min);
    let x_max = positive.fold(f64::NEG_INFINITY, f64::max);
    if !x_min.is_finite() || !x_max.is_finite() {
        return Err(FclassoError::PlotError(
            "log axis needs positive alphas".to_string(),
        ));
    }
    // 单点网格时展开坐标范围
    let x_range = if x_min == x_max {
        (x_min / 10.0, x_max * 10.0)
    } else {
        (x_min, x_max)
    };

    let y_max = scores
        .train_mean
        .iter()
        .chain(&scores.test_mean)
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let y_max = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

    Ok((x_range, y_max))
}

fn draw_cv_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    scores: &CvScores,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)
        .map_err(|e| FclassoError::PlotError(format!("{:?}", e)))?;

    let ((x_min, x_max), y_max) = axis_ranges(scores)?;

    let mut chart = ChartBuilder::on(root)
        .caption("LASSO cross-validation", ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d((x_min..x_max).log_scale(), 0.0..y_max)
        .map_err(|e| FclassoError::PlotError(format!("{:?}", e)))?;

    chart
        .configure_mesh()
        .x_desc("alpha")
        .y_desc("Relative RMSE")
        .x_label_formatter(&|x| format!("{:.0e}", x))
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| FclassoError::PlotError(format!("{:?}", e)))?;

    let series = [
        ("train", &scores.train_mean, RGBColor(0, 102, 204)),
        ("test (CV)", &scores.test_mean, RGBColor(230, 97, 0)),
    ];

    for (label, values, color) in series {
        let points: Vec<(f64, f64)> = scores
            .alphas
            .iter()
            .zip(values.iter())
            .filter(|(a, v)| **a > 0.0 && v.is_finite())
            .map(|(a, v)| (*a, *v))
            .collect();

        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
            .map_err(|e| FclassoError::PlotError(format!("{:?}", e)))?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });

        chart
            .draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
            )
            .map_err(|e| FclassoError::PlotError(format!("{:?}", e)))?;
    }

    // 最优 α
    let best = scores.best_alpha();
    if best > 0.0 {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(best, 0.0), (best, y_max)],
                BLACK.mix(0.5).stroke_width(1),
            )))
            .map_err(|e| FclassoError::PlotError(format!("{:?}", e)))?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", 16))
        .draw()
        .map_err(|e| FclassoError::PlotError(format!("{:?}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn scores() -> CvScores {
        CvScores {
            alphas: vec![1e-1, 1e-2, 1e-3],
            train_mean: vec![0.9, 0.3, 0.1],
            train_std: vec![0.0; 3],
            test_mean: vec![0.95, 0.35, 0.4],
            test_std: vec![0.0; 3],
            n_splits: 2,
            n_unconverged: 0,
        }
    }

    #[test]
    fn test_axis_ranges() {
        let ((lo, hi), y_max) = axis_ranges(&scores()).unwrap();
        assert_eq!(lo, 1e-3);
        assert_eq!(hi, 1e-1);
        assert!((y_max - 0.95 * 1.1).abs() < 1e-12);

        let mut single = scores();
        single.alphas = vec![1e-2, 1e-2, 1e-2];
        let ((lo, hi), _) = axis_ranges(&single).unwrap();
        assert!(lo < 1e-2 && hi > 1e-2);
    }

    #[test]
    fn test_plot_renders_svg_and_png() {
        let dir = tempdir().unwrap();
        for (name, use_svg) in [("cv.svg", true), ("cv.png", false)] {
            let path = dir.path().join(name);
            plot_cv_scores(&scores(), &path, 640, 480, use_svg).unwrap();
            let size = std::fs::metadata(&path).unwrap().len();
            assert!(size > 0, "{} is empty", name);
        }
        let svg = std::fs::read_to_string(dir.path().join("cv.svg")).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_plot_rejects_empty() {
        let dir = tempdir().unwrap();
        let mut empty = scores();
        empty.alphas.clear();
        let path = dir.path().join("cv.svg");
        assert!(plot_cv_scores(&empty, &path, 640, 480, true).is_err());
    }
}
