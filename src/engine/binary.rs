// ==========================================
// 合金熔体活度计算 - 二元 Miedema 模型
// ==========================================
// 职责: 二元生成焓、合金中体积修正、弹性项、无限稀溶解焓
// 输入: 元素参数 (Element)、成分、温度、物态
// 输出: kJ/mol 或无量纲系数；参数缺失时为 NaN
// ==========================================
// 外推系数（UEM1/UEM2/GSM/Toop 等）见 extrapolation.rs
// ==========================================

use crate::domain::element::{both_exist, Element};
use crate::domain::types::{PhaseState, GAS_CONSTANT};
use crate::engine::cache::ContributionCache;
use crate::engine::quadrature::QuadratureSettings;
use crate::repository::element_repo::ElementSource;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ===== Miedema 常数 =====
/// 过渡族-过渡族
pub const P_TRANS_TRANS: f64 = 14.2;
/// 过渡族-非过渡族
pub const P_TRANS_NON: f64 = 12.35;
/// 非过渡族-非过渡族
pub const P_NON_NON: f64 = 10.7;
/// Q/P
pub const Q_OVER_P: f64 = 9.4;

// ==========================================
// ModelSettings - 模型实例参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// 非对称参数 λ（固溶体 0，非晶 5，金属间化合物 8）
    pub lambda: f64,
    /// 过剩熵开关
    pub entropy: bool,
    /// 含 H 体系体积迭代上限
    pub hydrogen_max_iterations: usize,
    /// 含 H 体系体积迭代收敛容差
    pub hydrogen_tolerance: f64,
    pub quadrature: QuadratureSettings,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            lambda: 0.0,
            entropy: false,
            hydrogen_max_iterations: 1000,
            hydrogen_tolerance: 1e-6,
            quadrature: QuadratureSettings::default(),
        }
    }
}

// ==========================================
// 纯函数部分
// ==========================================

/// 按过渡族标记选择 P
pub fn p_constant(ea: &Element, eb: &Element) -> f64 {
    match (ea.is_trans, eb.is_trans) {
        (true, true) => P_TRANS_TRANS,
        (false, false) => P_NON_NON,
        _ => P_TRANS_NON,
    }
}

/// 杂化项 R/P = α·R*_a·R*_b（仅 alpha/beta 异类组合计入）
pub fn rp(ea: &Element, eb: &Element, state: PhaseState) -> f64 {
    use crate::domain::types::HybridClass::Other;
    if ea.hybrid == eb.hybrid || ea.hybrid == Other || eb.hybrid == Other {
        return 0.0;
    }
    state.hybrid_alpha() * ea.hybrid_value * eb.hybrid_value
}

/// 界面焓系数 f_ab
///
/// 2P·(−Δφ² + (Q/P)·Δn² − R/P) / (1/n_a^{1/3} + 1/n_b^{1/3})
pub fn fab(ea: &Element, eb: &Element, state: PhaseState) -> f64 {
    if !both_exist(ea, eb) {
        return f64::NAN;
    }
    let denominator = 1.0 / ea.nws + 1.0 / eb.nws;
    if denominator == 0.0 || !denominator.is_finite() {
        return f64::NAN;
    }

    let d_phi = ea.phi - eb.phi;
    let d_nws = ea.nws - eb.nws;
    let p = p_constant(ea, eb);

    2.0 * p * (-d_phi * d_phi + Q_OVER_P * d_nws * d_nws - rp(ea, eb, state)) / denominator
}

/// 弹性项 ΔH_el(a in b) (kJ/mol)，模量缺失时为 NaN
pub fn elastic_a_in_b(ea: &Element, eb: &Element) -> f64 {
    if !ea.has_moduli() || !eb.has_moduli() {
        return f64::NAN;
    }
    let va = ea.molar_volume();
    let vb = eb.molar_volume();
    let k_a = ea.bulk_modulus;
    let g_b = eb.shear_modulus;

    let denominator = 3.0 * k_a * vb + 4.0 * g_b * va;
    if denominator == 0.0 {
        return f64::NAN;
    }
    2.0 * k_a * g_b * (va - vb).powi(2) / denominator * 1e-9
}

/// 过剩熵修正因子 1 − T·(1/Tm_a + 1/Tm_b)/τ
pub fn entropy_factor(ea: &Element, eb: &Element, temperature: f64, state: PhaseState) -> f64 {
    if ea.tm <= 0.0 || eb.tm <= 0.0 {
        return f64::NAN;
    }
    1.0 - temperature * (1.0 / ea.tm + 1.0 / eb.tm) / state.entropy_divisor()
}

// ==========================================
// BinaryModel
// ==========================================
pub struct BinaryModel {
    settings: ModelSettings,
    elements: Arc<dyn ElementSource>,
    pub(crate) cache: ContributionCache,
}

impl BinaryModel {
    pub fn new(elements: Arc<dyn ElementSource>, settings: ModelSettings) -> Self {
        Self {
            settings,
            elements,
            cache: ContributionCache::new(),
        }
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn lambda(&self) -> f64 {
        self.settings.lambda
    }

    pub fn entropy_enabled(&self) -> bool {
        self.settings.entropy
    }

    /// 读取元素参数（未知元素返回 exists=false）
    pub fn element(&self, symbol: &str) -> Element {
        self.elements.element(symbol)
    }

    pub fn element_source(&self) -> Arc<dyn ElementSource> {
        Arc::clone(&self.elements)
    }

    /// 含熵修正的 f_ab（entropy=false 时即 f_ab）
    pub fn fab_effective(
        &self,
        ea: &Element,
        eb: &Element,
        temperature: f64,
        state: PhaseState,
        entropy: bool,
    ) -> f64 {
        let base = fab(ea, eb, state);
        if entropy {
            base * entropy_factor(ea, eb, temperature, state)
        } else {
            base
        }
    }

    // ==========================================
    // 合金中体积修正
    // ==========================================

    /// 合金中的表面体积 (vaa, vba)
    ///
    /// 一般体系: 表面分数取自纯元素体积的闭式解；
    /// 含 H 体系: 表面分数由当前合金体积反复更新直至收敛
    pub fn v_in_alloy(&self, ea: &Element, eb: &Element, xa: f64, xb: f64) -> (f64, f64) {
        if !both_exist(ea, eb) {
            return (f64::NAN, f64::NAN);
        }

        let d_phi = ea.phi - eb.phi;
        let alloy_volumes = |c_a: f64| {
            (
                ea.v * (1.0 + ea.u * (1.0 - c_a) * d_phi),
                eb.v * (1.0 + eb.u * c_a * (-d_phi)),
            )
        };

        let c_pure = surface_fraction(xa, xb, ea.v, eb.v);
        if !(ea.is_hydrogen() || eb.is_hydrogen()) {
            return alloy_volumes(c_pure);
        }

        let (mut vaa, mut vba) = (ea.v, eb.v);
        for _ in 0..self.settings.hydrogen_max_iterations {
            let c_a = surface_fraction(xa, xb, vaa, vba);
            let (next_a, next_b) = alloy_volumes(c_a);
            let converged = (next_a - vaa).abs() < self.settings.hydrogen_tolerance
                && (next_b - vba).abs() < self.settings.hydrogen_tolerance;
            vaa = next_a;
            vba = next_b;
            if converged || vaa.is_nan() || vba.is_nan() {
                return (vaa, vba);
            }
        }

        tracing::warn!(
            a = %ea.symbol,
            b = %eb.symbol,
            max_iterations = self.settings.hydrogen_max_iterations,
            "含 H 体系体积迭代未收敛，返回最后一次迭代值"
        );
        (vaa, vba)
    }

    // ==========================================
    // 二元生成焓
    // ==========================================

    /// 二元生成焓 ΔH (kJ/mol)，使用实例过剩熵开关
    pub fn binary_model(&self, ea: &Element, eb: &Element, xa: f64, xb: f64, temperature: f64, state: PhaseState) -> f64 {
        self.binary_model_with(ea, eb, xa, xb, temperature, state, self.settings.entropy)
    }

    /// 二元生成焓 ΔH (kJ/mol)，显式指定过剩熵
    ///
    /// ΔH = x_a · f_ab' · V_a^{alloy} · c_b · (1 + λ·(c_a·c_b)²)
    #[allow(clippy::too_many_arguments)]
    pub fn binary_model_with(
        &self,
        ea: &Element,
        eb: &Element,
        xa: f64,
        xb: f64,
        temperature: f64,
        state: PhaseState,
        entropy: bool,
    ) -> f64 {
        let f = self.fab_effective(ea, eb, temperature, state, entropy);
        if f.is_nan() {
            return f64::NAN;
        }
        let (vaa, vba) = self.v_in_alloy(ea, eb, xa, xb);
        let c_a = surface_fraction(xa, xb, vaa, vba);
        let c_b = 1.0 - c_a;

        xa * f * vaa * c_b * (1.0 + self.settings.lambda * (c_a * c_b).powi(2))
    }

    /// 无限稀溶解项 ξ(a in b) = 1000·f_ab'·V_a·(1 + u_a(φ_a − φ_b)) / (R·T)
    pub fn xi(&self, ea: &Element, eb: &Element, temperature: f64, state: PhaseState, entropy: bool) -> f64 {
        let f = self.fab_effective(ea, eb, temperature, state, entropy);
        1000.0 * f * ea.v * (1.0 + ea.u * (ea.phi - eb.phi)) / (GAS_CONSTANT * temperature)
    }
}

/// 表面分数 c_a = x_a·V_a / (x_a·V_a + x_b·V_b)
fn surface_fraction(xa: f64, xb: f64, va: f64, vb: f64) -> f64 {
    let total = xa * va + xb * vb;
    if total == 0.0 {
        return f64::NAN;
    }
    xa * va / total
}
