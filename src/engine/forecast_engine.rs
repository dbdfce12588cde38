// ==========================================
// 电动车保有量预测系统 - 预测引擎
// ==========================================
// 职责: 历史序列 → 指定年份的保有量/充电需求预测
// 模型选择（按年份聚合后的点数 n）:
// - n == 1           → 水平外推（末值）
// - n >= 回归阈值    → 线性回归；n 足够大时二次多项式参与竞争（调整 R² 择优）
// - 其余（2~3 年）   → 平均复合增长率外推
// 红线:
// - 原始点数 < 2 直接报 InsufficientData
// - 输出非负，计数四舍五入为整数，顺序与请求年份一致
// - 计算出非有限值报 EngineFailure，不替换为默认值
// - 目标年份超出合法区间报 InvalidInput
// ==========================================

use crate::config::engine_config::ForecastSettings;
use crate::domain::ev_stat::{is_plausible_year, SeriesPoint, MAX_PLAUSIBLE_YEAR, MIN_PLAUSIBLE_YEAR};
use crate::domain::forecast::{ModelUsed, YearPrediction};
use crate::engine::error::{ForecastError, ForecastResult};
use crate::engine::growth::{fit_growth, GrowthCurve};
use crate::engine::metrics::{adjusted_r_squared, mean_absolute_percentage_error, r_squared};
use crate::engine::regression::{fit_polynomial, PolynomialFit};
use serde::Serialize;
use tracing::debug;

/// 预测所需的最少原始点数
pub const MIN_HISTORICAL_POINTS: usize = 2;

// ==========================================
// FitAndPredict Trait
// ==========================================
// 同步接口；调用方负责超时与线程隔离
pub trait FitAndPredict: Send + Sync {
    /// 拟合历史序列并预测指定年份
    ///
    /// # 参数
    /// - historical: 历史点（可乱序，同年份多点按和聚合）
    /// - future_years: 目标年份（输出保持此顺序）
    fn fit_and_predict(
        &self,
        historical: &[SeriesPoint],
        future_years: &[i32],
    ) -> ForecastResult<Vec<YearPrediction>>;

    /// 样本内拟合质量（保有量序列）
    fn evaluate_fit(&self, historical: &[SeriesPoint]) -> ForecastResult<FitEvaluation>;
}

/// 样本内拟合质量
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitEvaluation {
    pub model_used: ModelUsed,
    /// 平均绝对百分比误差（%）
    pub mae_percent: f64,
    pub r_squared: f64,
    /// 参与拟合的年度点数
    pub points: usize,
}

// ==========================================
// 内部: 年度汇总与拟合曲线
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
struct YearTotal {
    year: i32,
    count: f64,
    demand: f64,
}

#[derive(Debug, Clone)]
enum Curve {
    Polynomial(PolynomialFit),
    Growth(GrowthCurve),
    Flat(f64),
}

impl Curve {
    fn evaluate(&self, year: i32) -> f64 {
        match self {
            Curve::Polynomial(fit) => fit.predict(year as f64),
            Curve::Growth(curve) => curve.evaluate(year),
            Curve::Flat(value) => *value,
        }
    }
}

#[derive(Debug, Clone)]
struct FittedSeries {
    model_used: ModelUsed,
    count: Curve,
    demand: Curve,
}

/// 同年份累加，按年份升序
fn aggregate_by_year(historical: &[SeriesPoint]) -> Vec<YearTotal> {
    let mut sorted: Vec<&SeriesPoint> = historical.iter().collect();
    sorted.sort_by_key(|p| p.year);

    let mut totals: Vec<YearTotal> = Vec::new();
    for point in sorted {
        match totals.last_mut() {
            Some(last) if last.year == point.year => {
                last.count += point.count as f64;
                last.demand += point.charging_demand_kwh;
            }
            _ => totals.push(YearTotal {
                year: point.year,
                count: point.count as f64,
                demand: point.charging_demand_kwh,
            }),
        }
    }
    totals
}

// ==========================================
// RegressionForecastEngine
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RegressionForecastEngine {
    settings: ForecastSettings,
}

impl RegressionForecastEngine {
    pub fn new(settings: ForecastSettings) -> Self {
        Self { settings }
    }

    fn fit(&self, historical: &[SeriesPoint]) -> ForecastResult<(FittedSeries, Vec<YearTotal>)> {
        if historical.len() < MIN_HISTORICAL_POINTS {
            return Err(ForecastError::InsufficientData {
                needed: MIN_HISTORICAL_POINTS,
                got: historical.len(),
            });
        }
        if let Some(bad) = historical
            .iter()
            .find(|p| !p.charging_demand_kwh.is_finite())
        {
            return Err(ForecastError::InvalidInput(format!(
                "non-finite charging demand in year {}",
                bad.year
            )));
        }

        let totals = aggregate_by_year(historical);
        let n = totals.len();

        let fitted = if n == 1 {
            let only = totals[0];
            FittedSeries {
                model_used: ModelUsed::FlatProjection,
                count: Curve::Flat(only.count),
                demand: Curve::Flat(only.demand),
            }
        } else if let Some(fitted) = self.try_regression(&totals) {
            fitted
        } else {
            self.fit_growth_series(&totals)?
        };

        debug!(
            points = historical.len(),
            years = n,
            model = %fitted.model_used,
            "模型拟合完成"
        );
        Ok((fitted, totals))
    }

    /// 回归路径（点数不足或矩阵奇异时返回 None）
    fn try_regression(&self, totals: &[YearTotal]) -> Option<FittedSeries> {
        let n = totals.len();
        if n < self.settings.regression_min_points || n < self.settings.regression_min_distinct_years
        {
            return None;
        }

        let xs: Vec<f64> = totals.iter().map(|t| t.year as f64).collect();
        let counts: Vec<f64> = totals.iter().map(|t| t.count).collect();
        let demands: Vec<f64> = totals.iter().map(|t| t.demand).collect();

        let linear_count = fit_polynomial(&xs, &counts, 1)?;
        let linear_demand = fit_polynomial(&xs, &demands, 1)?;

        if n >= self.settings.polynomial_min_points {
            if let (Some(quad_count), Some(quad_demand)) = (
                fit_polynomial(&xs, &counts, 2),
                fit_polynomial(&xs, &demands, 2),
            ) {
                let fitted_linear: Vec<f64> = xs.iter().map(|x| linear_count.predict(*x)).collect();
                let fitted_quad: Vec<f64> = xs.iter().map(|x| quad_count.predict(*x)).collect();
                let adj_linear = adjusted_r_squared(r_squared(&counts, &fitted_linear), n, 1);
                let adj_quad = adjusted_r_squared(r_squared(&counts, &fitted_quad), n, 2);

                debug!(adj_linear, adj_quad, "线性/二次模型比较");
                if adj_quad > adj_linear + 1e-9 {
                    return Some(FittedSeries {
                        model_used: ModelUsed::PolynomialRegression,
                        count: Curve::Polynomial(quad_count),
                        demand: Curve::Polynomial(quad_demand),
                    });
                }
            }
        }

        Some(FittedSeries {
            model_used: ModelUsed::LinearRegression,
            count: Curve::Polynomial(linear_count),
            demand: Curve::Polynomial(linear_demand),
        })
    }

    /// 小样本增长率路径
    fn fit_growth_series(&self, totals: &[YearTotal]) -> ForecastResult<FittedSeries> {
        let count_points: Vec<(i32, f64)> = totals.iter().map(|t| (t.year, t.count)).collect();
        let demand_points: Vec<(i32, f64)> = totals.iter().map(|t| (t.year, t.demand)).collect();

        let count = fit_growth(&count_points)
            .ok_or_else(|| ForecastError::EngineFailure("growth fit failed for count".to_string()))?;
        let demand = fit_growth(&demand_points).ok_or_else(|| {
            ForecastError::EngineFailure("growth fit failed for charging demand".to_string())
        })?;

        let model_used = if count.is_compound() {
            ModelUsed::MovingAverageGrowth
        } else {
            ModelUsed::LinearRegression
        };

        Ok(FittedSeries {
            model_used,
            count: Curve::Growth(count),
            demand: Curve::Growth(demand),
        })
    }
}

impl FitAndPredict for RegressionForecastEngine {
    fn fit_and_predict(
        &self,
        historical: &[SeriesPoint],
        future_years: &[i32],
    ) -> ForecastResult<Vec<YearPrediction>> {
        let (fitted, _) = self.fit(historical)?;

        if let Some(bad) = future_years.iter().find(|y| !is_plausible_year(**y)) {
            return Err(ForecastError::InvalidInput(format!(
                "forecast year {} outside {}..={}",
                bad, MIN_PLAUSIBLE_YEAR, MAX_PLAUSIBLE_YEAR
            )));
        }

        future_years
            .iter()
            .map(|&year| {
                let count = fitted.count.evaluate(year);
                let demand = fitted.demand.evaluate(year);
                if !count.is_finite() || !demand.is_finite() {
                    return Err(ForecastError::EngineFailure(format!(
                        "non-finite prediction for year {}",
                        year
                    )));
                }

                Ok(YearPrediction {
                    year,
                    predicted_count: count.max(0.0).round() as i64,
                    predicted_demand_kwh: demand.max(0.0),
                    model_used: fitted.model_used,
                })
            })
            .collect()
    }

    fn evaluate_fit(&self, historical: &[SeriesPoint]) -> ForecastResult<FitEvaluation> {
        let (fitted, totals) = self.fit(historical)?;

        let actual: Vec<f64> = totals.iter().map(|t| t.count).collect();
        let predicted: Vec<f64> = totals.iter().map(|t| fitted.count.evaluate(t.year)).collect();
        if predicted.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::EngineFailure(
                "non-finite in-sample fit".to_string(),
            ));
        }

        Ok(FitEvaluation {
            model_used: fitted.model_used,
            mae_percent: mean_absolute_percentage_error(&actual, &predicted),
            r_squared: r_squared(&actual, &predicted),
            points: totals.len(),
        })
    }
}
