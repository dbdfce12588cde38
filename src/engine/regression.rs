// ==========================================
// 电动车保有量预测系统 - 多项式最小二乘
// ==========================================
// 方法: 正规方程 X'X β = X'y，Cholesky 分解求解
// 数值: 年份先中心化；对角线加 1e-8 正则
// ==========================================

/// 对角线正则项
const RIDGE: f64 = 1e-8;

/// 多项式拟合结果: y = c0 + c1·t + c2·t² + ...，t = x - x_center
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialFit {
    coefficients: Vec<f64>,
    x_center: f64,
}

impl PolynomialFit {
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn predict(&self, x: f64) -> f64 {
        let t = x - self.x_center;
        // Horner
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * t + c)
    }
}

/// 拟合指定阶数的多项式
///
/// # 返回
/// - None: 点数不足、不同 x 值不足或矩阵非正定
pub fn fit_polynomial(xs: &[f64], ys: &[f64], degree: usize) -> Option<PolynomialFit> {
    let n = xs.len();
    if n != ys.len() || n <= degree {
        return None;
    }

    let mut distinct: Vec<f64> = xs.to_vec();
    distinct.sort_by(|a, b| a.total_cmp(b));
    distinct.dedup();
    if distinct.len() <= degree {
        return None;
    }

    let x_center = xs.iter().sum::<f64>() / n as f64;
    let num_params = degree + 1;

    let mut xtx = vec![vec![0.0; num_params]; num_params];
    let mut xty = vec![0.0; num_params];

    for (x, y) in xs.iter().zip(ys) {
        let t = x - x_center;
        let powers: Vec<f64> = (0..num_params).map(|p| t.powi(p as i32)).collect();
        for i in 0..num_params {
            xty[i] += powers[i] * y;
            for j in 0..num_params {
                xtx[i][j] += powers[i] * powers[j];
            }
        }
    }

    for (i, row) in xtx.iter_mut().enumerate() {
        row[i] += RIDGE;
    }

    let coefficients = solve_symmetric(&xtx, &xty)?;
    if coefficients.iter().any(|c| !c.is_finite()) {
        return None;
    }

    Some(PolynomialFit {
        coefficients,
        x_center,
    })
}

/// Cholesky 分解求解对称正定方程组 A·x = b
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    // A = L·L'
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // L·y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // L'·x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_fit_recovers_exact_line() {
        let xs = [2018.0, 2019.0, 2020.0, 2021.0, 2022.0];
        let ys: Vec<f64> = xs.iter().map(|x| 150.0 * (x - 2018.0) + 400.0).collect();

        let fit = fit_polynomial(&xs, &ys, 1).unwrap();
        assert_eq!(fit.degree(), 1);
        assert_relative_eq!(fit.predict(2023.0), 1150.0, epsilon = 1e-4);
        assert_relative_eq!(fit.coefficients()[1], 150.0, epsilon = 1e-6);
    }

    #[test]
    fn test_quadratic_fit_recovers_curve() {
        let xs: Vec<f64> = (0..7).map(|i| 2015.0 + i as f64).collect();
        let ys: Vec<f64> = xs
            .iter()
            .map(|x| {
                let t = x - 2015.0;
                20.0 * t * t + 5.0 * t + 100.0
            })
            .collect();

        let fit = fit_polynomial(&xs, &ys, 2).unwrap();
        assert_relative_eq!(fit.predict(2023.0), 20.0 * 64.0 + 40.0 + 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_degenerate_inputs_are_rejected() {
        assert!(fit_polynomial(&[2020.0], &[1.0], 1).is_none());
        assert!(fit_polynomial(&[2020.0, 2020.0, 2020.0], &[1.0, 2.0, 3.0], 1).is_none());
        assert!(fit_polynomial(&[2020.0, 2021.0], &[1.0], 1).is_none());
        assert!(fit_polynomial(&[2020.0, 2021.0], &[1.0, 2.0], 2).is_none());
    }
}
