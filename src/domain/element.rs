// ==========================================
// 合金熔体活度计算 - 元素参数模型
// ==========================================
// 来源: MiedemaParameter 表
// 约定: 表中 V 为摩尔体积 (cm³/mol)，载入时换算为 V^{2/3} (cm²)；
//       nws 存储 n_ws^{1/3}
// 红线: 参数缺失时 exists=false，下游公式一律返回 NaN，不报错
// ==========================================

use crate::domain::types::HybridClass;
use serde::{Deserialize, Serialize};

// ==========================================
// Element - 元素物性参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub symbol: String,

    // ===== Miedema 参数 =====
    pub phi: f64,           // 电负性参数 φ* (V)
    pub nws: f64,           // 电子密度 n_ws^{1/3}
    pub v: f64,             // 表面体积 V^{2/3} (cm²)
    pub u: f64,             // 体积修正系数
    pub hybrid: HybridClass, // 杂化类别
    pub hybrid_value: f64,  // 杂化参数 R*
    pub is_trans: bool,     // 是否过渡族
    pub dh_trans: f64,      // 转变焓 ΔH_trans (kJ/mol)

    // ===== 基础物性 =====
    pub mass: f64,          // 原子量 (g/mol)
    pub tm: f64,            // 熔点 (K)
    pub tb: f64,            // 沸点 (K)
    pub bulk_modulus: f64,  // 体模量 (Pa)
    pub shear_modulus: f64, // 剪切模量 (Pa)

    pub exists: bool,
}

impl Element {
    /// 参数缺失的元素：全部字段置零
    pub fn missing(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            phi: 0.0,
            nws: 0.0,
            v: 0.0,
            u: 0.0,
            hybrid: HybridClass::Other,
            hybrid_value: 0.0,
            is_trans: false,
            dh_trans: 0.0,
            mass: 0.0,
            tm: 0.0,
            tb: 0.0,
            bulk_modulus: 0.0,
            shear_modulus: 0.0,
            exists: false,
        }
    }

    /// 真实摩尔体积 V (cm³/mol)，由 V^{2/3} 还原
    pub fn molar_volume(&self) -> f64 {
        if !self.exists {
            return f64::NAN;
        }
        self.v.powf(1.5)
    }

    pub fn is_hydrogen(&self) -> bool {
        self.symbol == "H"
    }

    /// 是否具备弹性项所需的模量数据
    pub fn has_moduli(&self) -> bool {
        self.exists && self.bulk_modulus > 0.0 && self.shear_modulus > 0.0
    }
}

/// 摩尔体积 V (cm³/mol) → Miedema 公式使用的 V^{2/3} (cm²)
pub fn surface_volume(molar_volume: f64) -> f64 {
    molar_volume.powf(2.0 / 3.0)
}

/// 两个元素是否都有完整参数
pub fn both_exist(a: &Element, b: &Element) -> bool {
    a.exists && b.exists
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! 单元测试用元素参数（近似文献值）
    use super::{surface_volume, Element};
    use crate::domain::types::HybridClass;

    #[allow(clippy::too_many_arguments)]
    fn build(
        symbol: &str,
        phi: f64,
        nws: f64,
        molar_volume: f64,
        u: f64,
        hybrid: HybridClass,
        hybrid_value: f64,
        is_trans: bool,
        dh_trans: f64,
        mass: f64,
        tm: f64,
        tb: f64,
    ) -> Element {
        Element {
            symbol: symbol.to_string(),
            phi,
            nws,
            v: surface_volume(molar_volume),
            u,
            hybrid,
            hybrid_value,
            is_trans,
            dh_trans,
            mass,
            tm,
            tb,
            bulk_modulus: 0.0,
            shear_modulus: 0.0,
            exists: true,
        }
    }

    pub fn fe() -> Element {
        let mut e = build("Fe", 4.93, 1.77, 7.09, 0.04, HybridClass::Alpha, 1.0, true, 0.0, 55.845, 1811.0, 3134.0);
        e.bulk_modulus = 170.0e9;
        e.shear_modulus = 82.0e9;
        e
    }

    pub fn c() -> Element {
        build("C", 6.20, 1.90, 5.31, 0.04, HybridClass::Beta, 2.1, false, 180.0, 12.011, 3823.0, 4098.0)
    }

    pub fn si() -> Element {
        build("Si", 4.70, 1.50, 12.06, 0.04, HybridClass::Beta, 1.9, false, 34.0, 28.086, 1687.0, 3538.0)
    }

    pub fn mn() -> Element {
        build("Mn", 4.45, 1.61, 7.35, 0.04, HybridClass::Alpha, 1.0, true, 0.0, 54.938, 1519.0, 2334.0)
    }

    pub fn cr() -> Element {
        build("Cr", 4.65, 1.73, 7.23, 0.04, HybridClass::Alpha, 1.0, true, 0.0, 51.996, 2180.0, 2944.0)
    }

    pub fn ni() -> Element {
        let mut e = build("Ni", 5.20, 1.75, 6.60, 0.04, HybridClass::Alpha, 1.0, true, 0.0, 58.693, 1728.0, 3186.0);
        e.bulk_modulus = 180.0e9;
        e.shear_modulus = 76.0e9;
        e
    }

    pub fn al() -> Element {
        let mut e = build("Al", 4.20, 1.39, 9.99, 0.07, HybridClass::Other, 0.0, false, 0.0, 26.982, 933.0, 2743.0);
        e.bulk_modulus = 76.0e9;
        e.shear_modulus = 26.0e9;
        e
    }

    pub fn h() -> Element {
        build("H", 5.20, 1.50, 2.22, 0.04, HybridClass::Other, 0.0, false, 0.0, 1.008, 14.0, 20.0)
    }

    pub fn o() -> Element {
        build("O", 6.97, 1.70, 4.34, 0.04, HybridClass::Other, 0.0, false, 0.0, 15.999, 54.0, 90.0)
    }

    /// 全部测试元素组成的内存来源
    pub fn source() -> std::sync::Arc<dyn crate::repository::element_repo::ElementSource> {
        std::sync::Arc::new(crate::repository::element_repo::InMemoryElementSource::from_elements([
            fe(),
            c(),
            si(),
            mn(),
            cr(),
            ni(),
            al(),
            h(),
            o(),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_element_is_zeroed() {
        let e = Element::missing("Xx");
        assert!(!e.exists);
        assert_eq!(e.phi, 0.0);
        assert_eq!(e.mass, 0.0);
        assert!(e.molar_volume().is_nan());
    }

    #[test]
    fn test_molar_volume_roundtrip() {
        let fe = fixtures::fe();
        assert!((fe.molar_volume() - 7.09).abs() < 1e-9);
        assert!((fe.v - 7.09_f64.powf(2.0 / 3.0)).abs() < 1e-12);
        assert!((surface_volume(27.0) - 9.0).abs() < 1e-12);
        assert!(fe.has_moduli());
        assert!(!fixtures::c().has_moduli());
    }
}
