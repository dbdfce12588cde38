// ==========================================
// 电动车保有量预测系统 - 小样本增长率外推
// ==========================================
// 适用: 2~3 个不同年份的短序列
// 方法: 相邻年份复合年增长率取平均，从最后一个点复利外推
//       r_i = (v_i / v_{i-1})^(1 / Δyear) - 1，仅取两端均为正的相邻对
// 回退: 无有效相邻对或末点为 0 时，用两点线性趋势
// ==========================================

use crate::engine::regression::{fit_polynomial, PolynomialFit};

/// 增长曲线
#[derive(Debug, Clone, PartialEq)]
pub enum GrowthCurve {
    /// anchor · (1 + rate)^(year - anchor_year)
    Compound {
        anchor_year: i32,
        anchor_value: f64,
        rate: f64,
    },
    /// 线性趋势回退
    Linear(PolynomialFit),
}

impl GrowthCurve {
    pub fn evaluate(&self, year: i32) -> f64 {
        match self {
            GrowthCurve::Compound {
                anchor_year,
                anchor_value,
                rate,
            } => {
                let elapsed = i64::from(year) - i64::from(*anchor_year);
                anchor_value * (1.0 + rate).powf(elapsed as f64)
            }
            GrowthCurve::Linear(fit) => fit.predict(year as f64),
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, GrowthCurve::Compound { .. })
    }
}

/// 拟合增长曲线
///
/// # 参数
/// - points: (year, value)，按年份升序且年份互不相同
///
/// # 返回
/// - None: 不足 2 个点
pub fn fit_growth(points: &[(i32, f64)]) -> Option<GrowthCurve> {
    if points.len() < 2 {
        return None;
    }

    let rates: Vec<f64> = points
        .windows(2)
        .filter_map(|pair| {
            let (y0, v0) = pair[0];
            let (y1, v1) = pair[1];
            let gap = i64::from(y1) - i64::from(y0);
            if gap <= 0 || v0 <= 0.0 || v1 <= 0.0 {
                return None;
            }
            Some((v1 / v0).powf(1.0 / gap as f64) - 1.0)
        })
        .collect();

    let (anchor_year, anchor_value) = points[points.len() - 1];
    if !rates.is_empty() && anchor_value > 0.0 {
        let rate = rates.iter().sum::<f64>() / rates.len() as f64;
        return Some(GrowthCurve::Compound {
            anchor_year,
            anchor_value,
            rate,
        });
    }

    let xs: Vec<f64> = points.iter().map(|(y, _)| *y as f64).collect();
    let ys: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    fit_polynomial(&xs, &ys, 1).map(GrowthCurve::Linear)
}
