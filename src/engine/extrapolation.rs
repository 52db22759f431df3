// ==========================================
// 合金熔体活度计算 - 几何外推模型
// ==========================================
// 约定: contribution(k, i, j) = 组元 k 对 i-j 二元中组元 i 的贡献系数
// 模型: UEM1 / UEM2 / GSM / Muggianu / Toop-Muggianu / Toop-Kohler
// 缓存: (模型, 元素, λ, 过剩熵, 物态, 温度) → 系数
// ==========================================

use crate::domain::element::Element;
use crate::domain::types::{PhaseState, GAS_CONSTANT};
use crate::engine::binary::BinaryModel;
use crate::engine::cache::CacheKey;
use crate::engine::quadrature;
use serde::{Deserialize, Serialize};
use std::fmt;

/// UEM 两个偏差同时为零时的替代值
const UEM_ZERO_DEVIATION: f64 = -1e-12;

// ==========================================
// ExtrapolationModel - 外推模型（封闭枚举）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtrapolationModel {
    #[serde(rename = "UEM1")]
    Uem1,
    #[serde(rename = "UEM2")]
    Uem2,
    #[serde(rename = "GSM")]
    Gsm,
    #[serde(rename = "Muggianu")]
    Muggianu,
    #[serde(rename = "Toop-Muggianu")]
    ToopMuggianu,
    #[serde(rename = "Toop-Kohler")]
    ToopKohler,
}

impl ExtrapolationModel {
    pub const ALL: [ExtrapolationModel; 6] = [
        ExtrapolationModel::Uem1,
        ExtrapolationModel::Uem2,
        ExtrapolationModel::Gsm,
        ExtrapolationModel::Muggianu,
        ExtrapolationModel::ToopMuggianu,
        ExtrapolationModel::ToopKohler,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtrapolationModel::Uem1 => "UEM1",
            ExtrapolationModel::Uem2 => "UEM2",
            ExtrapolationModel::Gsm => "GSM",
            ExtrapolationModel::Muggianu => "Muggianu",
            ExtrapolationModel::ToopMuggianu => "Toop-Muggianu",
            ExtrapolationModel::ToopKohler => "Toop-Kohler",
        }
    }

    /// 是否为对称模型（系数与元素无关）
    pub fn is_symmetric(&self) -> bool {
        matches!(self, ExtrapolationModel::Muggianu)
    }
}

impl Default for ExtrapolationModel {
    fn default() -> Self {
        ExtrapolationModel::Uem1
    }
}

impl fmt::Display for ExtrapolationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ExtrapolationModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "uem1" => Ok(ExtrapolationModel::Uem1),
            "uem2" => Ok(ExtrapolationModel::Uem2),
            "gsm" => Ok(ExtrapolationModel::Gsm),
            "muggianu" => Ok(ExtrapolationModel::Muggianu),
            "toopmuggianu" => Ok(ExtrapolationModel::ToopMuggianu),
            "toopkohler" => Ok(ExtrapolationModel::ToopKohler),
            _ => Err(format!("未知外推模型: {}", s)),
        }
    }
}

// ==========================================
// 外推系数计算
// ==========================================
impl BinaryModel {
    /// 外推贡献系数（使用实例过剩熵开关）
    pub fn contribution(
        &self,
        model: ExtrapolationModel,
        k: &str,
        i: &str,
        j: &str,
        temperature: f64,
        state: PhaseState,
    ) -> f64 {
        self.contribution_with(model, k, i, j, temperature, state, self.entropy_enabled())
    }

    /// 外推贡献系数（显式指定过剩熵，带缓存）
    #[allow(clippy::too_many_arguments)]
    pub fn contribution_with(
        &self,
        model: ExtrapolationModel,
        k: &str,
        i: &str,
        j: &str,
        temperature: f64,
        state: PhaseState,
        entropy: bool,
    ) -> f64 {
        if model.is_symmetric() {
            return 0.5;
        }

        let key = CacheKey::new(model, &[k, i, j], self.lambda(), entropy, state, temperature);
        self.cache.get_or_insert_with(key, || {
            let ek = self.element(k);
            let ei = self.element(i);
            let ej = self.element(j);
            let ctx = StrategyContext {
                temperature,
                state,
                entropy,
            };
            let value = match model {
                ExtrapolationModel::Uem1 => self.uem1(&ek, &ei, &ej, ctx),
                ExtrapolationModel::Uem2 => self.uem2(&ek, &ei, &ej, ctx),
                ExtrapolationModel::Gsm => self.gsm(&ek, &ei, &ej, ctx),
                ExtrapolationModel::Muggianu => muggianu(),
                ExtrapolationModel::ToopMuggianu => self.toop(&ek, &ei, &ej, ctx, false),
                ExtrapolationModel::ToopKohler => self.toop(&ek, &ei, &ej, ctx, true),
            };
            tracing::debug!(model = %model, k, i, j, temperature, value, "外推系数");
            value
        })
    }

    /// H_ab(x) = binary_model(a, b, x, 1 − x)
    fn curve(&self, ea: &Element, eb: &Element, x: f64, ctx: StrategyContext) -> f64 {
        self.binary_model_with(ea, eb, x, 1.0 - x, ctx.temperature, ctx.state, ctx.entropy)
    }

    /// ∫₀¹ (H_1(x) − H_2(x))² dx
    ///
    /// 相减与平方在 double-double 中进行；H_1、H_2 各自仍按 f64 求值
    fn curve_distance(
        &self,
        first: (&Element, &Element),
        second: (&Element, &Element),
        ctx: StrategyContext,
    ) -> f64 {
        quadrature::integrate_squared_difference(
            |x| self.curve(first.0, first.1, x, ctx),
            |x| self.curve(second.0, second.1, x, ctx),
            0.0,
            1.0,
            self.settings().quadrature,
        )
    }

    // ==========================================
    // UEM1: 无限稀溶解项偏差
    // ==========================================
    pub fn uem1(&self, ek: &Element, ei: &Element, ej: &Element, ctx: StrategyContext) -> f64 {
        let xi = |a: &Element, b: &Element| self.xi(a, b, ctx.temperature, ctx.state, ctx.entropy);

        // k 相对 i（以 j 为参照）的正向与反向偏差
        let d_ki = (xi(ek, ej) - xi(ei, ej)).abs() + (xi(ej, ek) - xi(ej, ei)).abs();
        // k 相对 j（以 i 为参照）
        let d_kj = (xi(ek, ei) - xi(ej, ei)).abs() + (xi(ei, ek) - xi(ei, ej)).abs();

        uem_combine(d_ki, d_kj)
    }

    // ==========================================
    // UEM2: 生成焓曲线积分偏差
    // ==========================================
    /// 两条曲线接近时偏差由相减抵消主导: 积分本身为 double-double，
    /// 但 H(x) 的 f64 舍入误差（约 1e-16·|H|）仍是偏差的下限
    pub fn uem2(&self, ek: &Element, ei: &Element, ej: &Element, ctx: StrategyContext) -> f64 {
        let scale = 1000.0 / (GAS_CONSTANT * ctx.temperature);
        let d_ki = scale * self.curve_distance((ek, ej), (ei, ej), ctx).sqrt();
        let d_kj = scale * self.curve_distance((ek, ei), (ej, ei), ctx).sqrt();
        uem_combine(d_ki, d_kj)
    }

    // ==========================================
    // GSM: 相似系数
    // ==========================================
    pub fn gsm(&self, ek: &Element, ei: &Element, ej: &Element, ctx: StrategyContext) -> f64 {
        let eta_i = self.curve_distance((ei, ej), (ei, ek), ctx);
        let eta_j = self.curve_distance((ej, ei), (ej, ek), ctx);
        let total = eta_i + eta_j;
        if total == 0.0 {
            return 0.5;
        }
        eta_i / total
    }

    // ==========================================
    // Toop: 按 x=0.5 处生成焓符号判定非对称组元
    // ==========================================
    // 非对称组元 i → 0，j → 1；k 为非对称组元时两种变体不同:
    //   Toop-Muggianu: k 对 i、j 平分贡献 (0.5)
    //   Toop-Kohler  : k 不参与 i-j 二元 (0)，三个二元同号时同样按 Kohler 处理
    fn toop(&self, ek: &Element, ei: &Element, ej: &Element, ctx: StrategyContext, kohler: bool) -> f64 {
        let h_ki = self.curve(ek, ei, 0.5, ctx);
        let h_kj = self.curve(ek, ej, 0.5, ctx);
        let h_ij = self.curve(ei, ej, 0.5, ctx);
        if h_ki.is_nan() || h_kj.is_nan() || h_ij.is_nan() {
            return f64::NAN;
        }

        let asymmetric = match odd_binary(h_ki, h_kj, h_ij) {
            Some(odd) => odd.excluded(),
            None if kohler => return 0.0,
            None => smallest_binary(h_ki, h_kj, h_ij).excluded(),
        };

        match asymmetric {
            Component::I => 0.0,
            Component::J => 1.0,
            Component::K if kohler => 0.0,
            Component::K => 0.5,
        }
    }

    pub fn toop_muggianu(&self, ek: &Element, ei: &Element, ej: &Element, ctx: StrategyContext) -> f64 {
        self.toop(ek, ei, ej, ctx, false)
    }

    pub fn toop_kohler(&self, ek: &Element, ei: &Element, ej: &Element, ctx: StrategyContext) -> f64 {
        self.toop(ek, ei, ej, ctx, true)
    }
}

/// 对称模型
pub fn muggianu() -> f64 {
    0.5
}

/// 外推计算的温度/物态/过剩熵上下文
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyContext {
    pub temperature: f64,
    pub state: PhaseState,
    pub entropy: bool,
}

/// exp(−Δki)·Δkj / (Δki + Δkj)
fn uem_combine(d_ki: f64, d_kj: f64) -> f64 {
    let (d_ki, d_kj) = if d_ki == 0.0 && d_kj == 0.0 {
        (UEM_ZERO_DEVIATION, UEM_ZERO_DEVIATION)
    } else {
        (d_ki, d_kj)
    };
    (-d_ki).exp() * d_kj / (d_ki + d_kj)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Component {
    K,
    I,
    J,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binary {
    KI,
    KJ,
    IJ,
}

impl Binary {
    /// 不在该二元中的组元
    fn excluded(self) -> Component {
        match self {
            Binary::KI => Component::J,
            Binary::KJ => Component::I,
            Binary::IJ => Component::K,
        }
    }
}

/// 符号与另两个二元不同的二元；三者同号时为 None
fn odd_binary(h_ki: f64, h_kj: f64, h_ij: f64) -> Option<Binary> {
    let s_ki = h_ki >= 0.0;
    let s_kj = h_kj >= 0.0;
    let s_ij = h_ij >= 0.0;
    if s_ki == s_kj && s_kj == s_ij {
        None
    } else if s_ki == s_kj {
        Some(Binary::IJ)
    } else if s_ki == s_ij {
        Some(Binary::KJ)
    } else {
        Some(Binary::KI)
    }
}

fn smallest_binary(h_ki: f64, h_kj: f64, h_ij: f64) -> Binary {
    let mut best = (Binary::KI, h_ki.abs());
    for candidate in [(Binary::KJ, h_kj.abs()), (Binary::IJ, h_ij.abs())] {
        if candidate.1 < best.1 {
            best = candidate;
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::element::fixtures;
    use crate::engine::binary::ModelSettings;

    const T: f64 = 1873.0;

    fn model() -> BinaryModel {
        BinaryModel::new(fixtures::source(), ModelSettings::default())
    }

    #[test]
    fn test_model_names_roundtrip() {
        for m in ExtrapolationModel::ALL {
            assert_eq!(m.as_str().parse::<ExtrapolationModel>().unwrap(), m);
        }
        assert_eq!("toop_kohler".parse::<ExtrapolationModel>().unwrap(), ExtrapolationModel::ToopKohler);
        assert_eq!("uem 1".parse::<ExtrapolationModel>().unwrap(), ExtrapolationModel::Uem1);
        assert!("kohler".parse::<ExtrapolationModel>().is_err());
    }

    #[test]
    fn test_muggianu_is_constant() {
        let m = model();
        assert_eq!(m.contribution(ExtrapolationModel::Muggianu, "C", "Si", "Fe", T, PhaseState::Liquid), 0.5);
        assert_eq!(m.contribution(ExtrapolationModel::Muggianu, "Xx", "Si", "Fe", T, PhaseState::Solid), 0.5);
    }

    #[test]
    fn test_toop_values_are_discrete() {
        let m = model();
        let symbols = ["Fe", "C", "Si"];
        for model_kind in [ExtrapolationModel::ToopMuggianu, ExtrapolationModel::ToopKohler] {
            for k in symbols {
                for i in symbols {
                    for j in symbols {
                        if k == i || i == j || k == j {
                            continue;
                        }
                        let r = m.contribution(model_kind, k, i, j, T, PhaseState::Liquid);
                        assert!(r == 0.0 || r == 0.5 || r == 1.0, "{} {}{}{} = {}", model_kind, k, i, j, r);
                    }
                }
            }
        }
    }

    #[test]
    fn test_toop_kohler_all_same_sign_excludes_k() {
        // Fe-Ni, Fe-Cr, Ni-Cr 生成焓同号
        let m = model();
        assert_eq!(m.contribution(ExtrapolationModel::ToopKohler, "Cr", "Fe", "Ni", T, PhaseState::Liquid), 0.0);
        let tm = m.contribution(ExtrapolationModel::ToopMuggianu, "Cr", "Fe", "Ni", T, PhaseState::Liquid);
        assert_eq!(tm, 1.0);
    }

    #[test]
    fn test_toop_variants_differ_when_k_is_asymmetric() {
        // C-Fe、C-Al 为负，Fe-Al 为正: 非对称组元为 k = C
        let m = model();
        let ctx = StrategyContext {
            temperature: T,
            state: PhaseState::Liquid,
            entropy: false,
        };
        let (c, fe, al) = (fixtures::c(), fixtures::fe(), fixtures::al());
        assert!(m.curve(&c, &fe, 0.5, ctx) < 0.0);
        assert!(m.curve(&c, &al, 0.5, ctx) < 0.0);
        assert!(m.curve(&fe, &al, 0.5, ctx) > 0.0);

        assert_eq!(m.contribution(ExtrapolationModel::ToopKohler, "C", "Fe", "Al", T, PhaseState::Liquid), 0.0);
        assert_eq!(m.contribution(ExtrapolationModel::ToopKohler, "C", "Al", "Fe", T, PhaseState::Liquid), 0.0);
        assert_eq!(m.contribution(ExtrapolationModel::ToopMuggianu, "C", "Fe", "Al", T, PhaseState::Liquid), 0.5);
        assert_eq!(m.contribution(ExtrapolationModel::ToopMuggianu, "C", "Al", "Fe", T, PhaseState::Liquid), 0.5);
    }

    #[test]
    fn test_uem1_identical_contributor_is_one() {
        let m = model();
        let r = m.contribution(ExtrapolationModel::Uem1, "C", "C", "Fe", T, PhaseState::Liquid);
        assert!((r - 1.0).abs() < 1e-12);
        // 三者相同: 偏差全为零
        let r = m.contribution(ExtrapolationModel::Uem1, "Fe", "Fe", "Fe", T, PhaseState::Liquid);
        assert!((r - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_uem1_in_unit_interval() {
        let m = model();
        let r = m.contribution(ExtrapolationModel::Uem1, "Si", "C", "Fe", T, PhaseState::Liquid);
        assert!(r.is_finite());
        assert!(r > 0.0 && r <= 1.0);
    }

    #[test]
    fn test_uem2_and_gsm_limits() {
        let m = model();
        let uem2 = m.contribution(ExtrapolationModel::Uem2, "C", "C", "Fe", T, PhaseState::Liquid);
        assert!((uem2 - 1.0).abs() < 1e-12);

        let gsm_same_as_i = m.contribution(ExtrapolationModel::Gsm, "C", "C", "Si", T, PhaseState::Liquid);
        let gsm_same_as_j = m.contribution(ExtrapolationModel::Gsm, "Si", "C", "Si", T, PhaseState::Liquid);
        assert!((gsm_same_as_i - 1.0).abs() < 1e-12);
        assert!(gsm_same_as_j.abs() < 1e-12);

        let gsm = m.contribution(ExtrapolationModel::Gsm, "Fe", "C", "Si", T, PhaseState::Liquid);
        assert!((0.0..=1.0).contains(&gsm));
    }

    #[test]
    fn test_missing_element_gives_nan() {
        let m = model();
        for kind in [
            ExtrapolationModel::Uem1,
            ExtrapolationModel::Uem2,
            ExtrapolationModel::Gsm,
            ExtrapolationModel::ToopMuggianu,
        ] {
            assert!(m.contribution(kind, "Xx", "C", "Fe", T, PhaseState::Liquid).is_nan(), "{}", kind);
        }
    }

    #[test]
    fn test_results_are_cached_per_key() {
        let m = model();
        let a = m.contribution(ExtrapolationModel::Uem1, "Si", "C", "Fe", T, PhaseState::Liquid);
        let b = m.contribution(ExtrapolationModel::Uem1, "Si", "C", "Fe", T, PhaseState::Liquid);
        assert_eq!(a, b);
        assert_eq!(m.cache.len(), 1);
        m.contribution(ExtrapolationModel::Uem1, "Si", "C", "Fe", 1823.0, PhaseState::Liquid);
        assert_eq!(m.cache.len(), 2);
    }

    #[test]
    fn test_odd_binary_selection() {
        assert_eq!(odd_binary(-1.0, -2.0, 3.0), Some(Binary::IJ));
        assert_eq!(odd_binary(-1.0, 2.0, -3.0), Some(Binary::KJ));
        assert_eq!(odd_binary(1.0, -2.0, -3.0), Some(Binary::KI));
        assert_eq!(odd_binary(-1.0, -2.0, -3.0), None);
        assert_eq!(smallest_binary(-1.0, -0.2, -3.0), Binary::KJ);
    }
}
