// ==========================================
// 电动车保有量预测系统 - 拟合优度指标
// ==========================================

/// 决定系数 R² = 1 - SS_res / SS_tot
///
/// 实际值无方差时: 残差≈0 记 1.0，否则记 0.0
pub fn r_squared(actual: &[f64], fitted: &[f64]) -> f64 {
    let n = actual.len().min(fitted.len());
    if n == 0 {
        return 0.0;
    }

    let mean = actual[..n].iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = actual[..n].iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual[..n]
        .iter()
        .zip(&fitted[..n])
        .map(|(a, f)| (a - f).powi(2))
        .sum();

    if ss_tot <= f64::EPSILON {
        return if ss_res <= 1e-9 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// 调整 R²（p 为不含截距的参数个数）
pub fn adjusted_r_squared(r2: f64, n: usize, p: usize) -> f64 {
    if n <= p + 1 {
        return r2;
    }
    1.0 - (1.0 - r2) * (n as f64 - 1.0) / (n as f64 - p as f64 - 1.0)
}

/// 平均绝对百分比误差（%），跳过实际值为 0 的点；无有效点时为 0
pub fn mean_absolute_percentage_error(actual: &[f64], fitted: &[f64]) -> f64 {
    let errors: Vec<f64> = actual
        .iter()
        .zip(fitted)
        .filter(|(a, _)| a.abs() > f64::EPSILON)
        .map(|(a, f)| ((a - f) / a).abs())
        .collect();

    if errors.is_empty() {
        return 0.0;
    }
    errors.iter().sum::<f64>() / errors.len() as f64 * 100.0
}
