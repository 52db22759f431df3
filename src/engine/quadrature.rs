// ==========================================
// 合金熔体活度计算 - 高精度数值积分
// ==========================================
// 方法: 复合 Gauss-Legendre 求积
// 精度: 节点/权重与累加均为 double-double（约 32 位有效数字）；
//       被积函数值本身为 f64，其舍入误差不在此范围内。
//       差平方积分 ∫(f − g)² 的相减与平方在 double-double 中进行
// 用途: UEM2 偏差积分、GSM 相似系数积分
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// DoubleDouble - hi + lo 两段浮点表示
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleDouble {
    pub hi: f64,
    pub lo: f64,
}

impl DoubleDouble {
    pub const ZERO: DoubleDouble = DoubleDouble { hi: 0.0, lo: 0.0 };

    pub fn from_f64(value: f64) -> Self {
        Self { hi: value, lo: 0.0 }
    }

    pub fn to_f64(self) -> f64 {
        self.hi + self.lo
    }

    pub fn add(self, other: Self) -> Self {
        let (s, e) = two_sum(self.hi, other.hi);
        let (t, f) = two_sum(self.lo, other.lo);
        let (s, e) = quick_two_sum(s, e + t);
        let (hi, lo) = quick_two_sum(s, e + f);
        Self { hi, lo }
    }

    pub fn sub(self, other: Self) -> Self {
        self.add(other.neg())
    }

    pub fn neg(self) -> Self {
        Self {
            hi: -self.hi,
            lo: -self.lo,
        }
    }

    pub fn mul(self, other: Self) -> Self {
        let (p, e) = two_prod(self.hi, other.hi);
        let e = e + (self.hi * other.lo + self.lo * other.hi);
        let (hi, lo) = quick_two_sum(p, e);
        Self { hi, lo }
    }

    pub fn mul_f64(self, other: f64) -> Self {
        self.mul(Self::from_f64(other))
    }

    pub fn div(self, other: Self) -> Self {
        let q1 = self.hi / other.hi;
        let r = self.sub(other.mul_f64(q1));
        let q2 = r.hi / other.hi;
        let r = r.sub(other.mul_f64(q2));
        let q3 = r.hi / other.hi;
        let (hi, lo) = quick_two_sum(q1, q2);
        Self { hi, lo }.add(Self::from_f64(q3))
    }

    pub fn div_f64(self, other: f64) -> Self {
        self.div(Self::from_f64(other))
    }
}

fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    let e = (a - (s - bb)) + (b - bb);
    (s, e)
}

fn quick_two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let e = b - (s - a);
    (s, e)
}

fn two_prod(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    let e = a.mul_add(b, -p);
    (p, e)
}

// ==========================================
// 积分设置
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuadratureSettings {
    pub panels: usize, // 子区间数
    pub points: usize, // 每个子区间的 Gauss 点数
}

impl Default for QuadratureSettings {
    fn default() -> Self {
        Self {
            panels: 16,
            points: 8,
        }
    }
}

// ==========================================
// GaussLegendre - [-1, 1] 上的 n 点规则
// ==========================================
#[derive(Debug, Clone)]
pub struct GaussLegendre {
    nodes: Vec<DoubleDouble>,
    weights: Vec<DoubleDouble>,
}

const NEWTON_MAX_ITERATIONS: usize = 100;

impl GaussLegendre {
    /// 构造 n 点规则（n 为 0 时按 1 处理）
    pub fn new(points: usize) -> Self {
        let n = points.max(1);
        let mut nodes = Vec::with_capacity(n);
        let mut weights = Vec::with_capacity(n);
        let one = DoubleDouble::from_f64(1.0);

        for i in 1..=n {
            let guess = (std::f64::consts::PI * (i as f64 - 0.25) / (n as f64 + 0.5)).cos();
            let mut x = DoubleDouble::from_f64(guess);
            let mut derivative = legendre_with_derivative(n, x).1;

            for _ in 0..NEWTON_MAX_ITERATIONS {
                let (p, dp) = legendre_with_derivative(n, x);
                derivative = dp;
                let step = p.div(dp);
                x = x.sub(step);
                if step.hi.abs() <= 1e-30 {
                    derivative = legendre_with_derivative(n, x).1;
                    break;
                }
            }

            // w = 2 / ((1 − x²)·P'_n(x)²)
            let one_minus_x2 = one.sub(x.mul(x));
            let weight = DoubleDouble::from_f64(2.0).div(one_minus_x2.mul(derivative).mul(derivative));
            nodes.push(x);
            weights.push(weight);
        }

        Self { nodes, weights }
    }

    pub fn points(&self) -> usize {
        self.nodes.len()
    }

    /// 复合求积 ∫_a^b f(x) dx；任一被积值为 NaN 时结果为 NaN
    pub fn integrate<F>(&self, f: F, a: f64, b: f64, panels: usize) -> f64
    where
        F: Fn(f64) -> f64,
    {
        self.integrate_dd(|x| DoubleDouble::from_f64(f(x)), a, b, panels)
            .map_or(f64::NAN, DoubleDouble::to_f64)
    }

    /// ∫_a^b (f(x) − g(x))² dx，差与平方不经 f64 舍入
    pub fn squared_difference<F, G>(&self, f: F, g: G, a: f64, b: f64, panels: usize) -> Option<DoubleDouble>
    where
        F: Fn(f64) -> f64,
        G: Fn(f64) -> f64,
    {
        self.integrate_dd(
            |x| {
                let d = DoubleDouble::from_f64(f(x)).sub(DoubleDouble::from_f64(g(x)));
                d.mul(d)
            },
            a,
            b,
            panels,
        )
    }

    /// 被积值为 NaN 时返回 None
    fn integrate_dd<F>(&self, f: F, a: f64, b: f64, panels: usize) -> Option<DoubleDouble>
    where
        F: Fn(f64) -> DoubleDouble,
    {
        let panels = panels.max(1);
        let lower = DoubleDouble::from_f64(a);
        let width = DoubleDouble::from_f64(b).sub(lower).div_f64(panels as f64);
        let half_width = width.mul_f64(0.5);

        let mut total = DoubleDouble::ZERO;
        for panel in 0..panels {
            let left = lower.add(width.mul_f64(panel as f64));
            let center = left.add(half_width);
            for (node, weight) in self.nodes.iter().zip(self.weights.iter()) {
                let x = center.add(half_width.mul(*node)).to_f64();
                let value = f(x);
                if value.hi.is_nan() {
                    return None;
                }
                total = total.add(weight.mul(half_width).mul(value));
            }
        }
        Some(total)
    }
}

/// 由三项递推计算 (P_n(x), P'_n(x))
fn legendre_with_derivative(n: usize, x: DoubleDouble) -> (DoubleDouble, DoubleDouble) {
    let one = DoubleDouble::from_f64(1.0);
    let mut p_prev = one;
    let mut p = x;
    for k in 1..n {
        let k = k as f64;
        // P_{k+1} = ((2k+1)·x·P_k − k·P_{k−1}) / (k+1)
        let next = x
            .mul(p)
            .mul_f64(2.0 * k + 1.0)
            .sub(p_prev.mul_f64(k))
            .div_f64(k + 1.0);
        p_prev = p;
        p = next;
    }
    if n == 0 {
        return (one, DoubleDouble::ZERO);
    }
    // P'_n = n·(x·P_n − P_{n−1}) / (x² − 1)
    let derivative = x
        .mul(p)
        .sub(p_prev)
        .mul_f64(n as f64)
        .div(x.mul(x).sub(one));
    (p, derivative)
}

/// 按设置在 [a, b] 上积分
pub fn integrate<F>(f: F, a: f64, b: f64, settings: QuadratureSettings) -> f64
where
    F: Fn(f64) -> f64,
{
    GaussLegendre::new(settings.points).integrate(f, a, b, settings.panels)
}

/// 按设置计算 ∫_a^b (f − g)² dx
pub fn integrate_squared_difference<F, G>(f: F, g: G, a: f64, b: f64, settings: QuadratureSettings) -> f64
where
    F: Fn(f64) -> f64,
    G: Fn(f64) -> f64,
{
    GaussLegendre::new(settings.points)
        .squared_difference(f, g, a, b, settings.panels)
        .map_or(f64::NAN, DoubleDouble::to_f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_double_keeps_low_order_bits() {
        let big = DoubleDouble::from_f64(1.0);
        let tiny = DoubleDouble::from_f64(1e-20);
        let sum = big.add(tiny).sub(big);
        assert!((sum.to_f64() - 1e-20).abs() < 1e-35);
    }

    #[test]
    fn test_division_is_accurate() {
        let third = DoubleDouble::from_f64(1.0).div_f64(3.0);
        let back = third.mul_f64(3.0).sub(DoubleDouble::from_f64(1.0));
        assert!(back.to_f64().abs() < 1e-30);
    }

    #[test]
    fn test_weights_sum_to_two() {
        for n in [1, 2, 5, 8, 12] {
            let rule = GaussLegendre::new(n);
            let sum = rule
                .weights
                .iter()
                .fold(DoubleDouble::ZERO, |acc, w| acc.add(*w))
                .to_f64();
            assert!((sum - 2.0).abs() < 1e-14, "n={} sum={}", n, sum);
        }
    }

    #[test]
    fn test_polynomial_exactness() {
        // n 点规则对 2n−1 次多项式精确
        let rule = GaussLegendre::new(4);
        let value = rule.integrate(|x| x.powi(7) - 3.0 * x.powi(2), 0.0, 1.0, 1);
        assert!((value - (0.125 - 1.0)).abs() < 1e-14);
    }

    #[test]
    fn test_smooth_function() {
        let value = integrate(f64::exp, 0.0, 1.0, QuadratureSettings::default());
        assert!((value - (std::f64::consts::E - 1.0)).abs() < 1e-14);
    }

    #[test]
    fn test_panel_doubling_converges() {
        let f = |x: f64| (x * (1.0 - x)).powi(2) / (0.3 + x);
        let coarse = integrate(f, 0.0, 1.0, QuadratureSettings { panels: 8, points: 8 });
        let fine = integrate(f, 0.0, 1.0, QuadratureSettings { panels: 16, points: 8 });
        assert!((coarse - fine).abs() < 1e-13);
    }

    #[test]
    fn test_squared_difference_keeps_cancelled_bits() {
        // 1 − 1e-17 在 f64 中舍入为 1；double-double 保留差值
        let rule = GaussLegendre::new(1);
        let total = rule.squared_difference(|_| 1.0, |_| 1e-17, 0.0, 1.0, 1).unwrap();
        let residual = total.sub(DoubleDouble::from_f64(1.0)).to_f64();
        assert!((residual + 2e-17).abs() < 1e-30, "residual={}", residual);

        let value = integrate_squared_difference(|x| x, |x| -x, 0.0, 1.0, QuadratureSettings::default());
        assert!((value - 4.0 / 3.0).abs() < 1e-14);
        assert!(integrate_squared_difference(|_| f64::NAN, |x| x, 0.0, 1.0, QuadratureSettings::default()).is_nan());
    }

    #[test]
    fn test_nan_propagates() {
        let value = integrate(|x| if x > 0.5 { f64::NAN } else { x }, 0.0, 1.0, QuadratureSettings::default());
        assert!(value.is_nan());
    }
}
