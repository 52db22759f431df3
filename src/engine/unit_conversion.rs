// ==========================================
// 合金熔体活度计算 - 相互作用系数口径换算
// ==========================================
// 质量百分数口径 (e, r) ⇄ 摩尔分数口径 (ε, ρ)
// 常数 230 为稀溶液质量百分数与摩尔分数换算的冶金惯例值，必须保持不变
// ==========================================

/// 质量百分数 ⇄ 摩尔分数换算常数
pub const MASS_MOLE_FACTOR: f64 = 230.0;

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// ε_i^j → e_i^j
///
/// e = (ε − 1 + M_j/M_m) · M_m / (230 · M_j)
pub fn mole_to_mass(s: f64, mass_j: f64, mass_matrix: f64) -> f64 {
    if !(mass_j > 0.0 && mass_matrix > 0.0) {
        return f64::NAN;
    }
    (s - 1.0 + mass_j / mass_matrix) * mass_matrix / (MASS_MOLE_FACTOR * mass_j)
}

/// e_i^j → ε_i^j（保留两位小数）
///
/// ε = 230 · e · M_j/M_m + (1 − M_j/M_m)
pub fn mass_to_mole(e: f64, mass_j: f64, mass_matrix: f64) -> f64 {
    if !(mass_j > 0.0 && mass_matrix > 0.0) {
        return f64::NAN;
    }
    let ratio = mass_j / mass_matrix;
    round2(MASS_MOLE_FACTOR * e * ratio + (1.0 - ratio))
}

/// 质量口径互易关系: 由 e_j^i 求 e_i^j
///
/// e_i^j = (M_i/M_j) · e_j^i + (M_j − M_i) / (230 · M_j)
pub fn mass_reciprocal(e_j_i: f64, mass_i: f64, mass_j: f64) -> f64 {
    if !(mass_i > 0.0 && mass_j > 0.0) {
        return f64::NAN;
    }
    (mass_i / mass_j) * e_j_i + (mass_j - mass_i) / (MASS_MOLE_FACTOR * mass_j)
}

/// 二阶系数质量口径 → 摩尔口径
///
/// ρ_i^{j,k} = 230²·M_jM_k/M_m²·r + 230·(M_m−M_k)M_j/M_m²·e_i^j
///           + 230·(M_m−M_j)M_k/M_m²·e_i^k + (M_m−M_j)(M_m−M_k)/M_m²
///
/// j == k 时为 ρ_i^{j} = ½·上式（Lupis 记法 ln γ ⊃ ρ_i^j·x_j²）
pub fn second_order_mass_to_mole(
    r: f64,
    e_i_j: f64,
    e_i_k: f64,
    mass_j: f64,
    mass_k: f64,
    mass_matrix: f64,
    same_solute: bool,
) -> f64 {
    if !(mass_j > 0.0 && mass_k > 0.0 && mass_matrix > 0.0) {
        return f64::NAN;
    }
    let m2 = mass_matrix * mass_matrix;
    let full = MASS_MOLE_FACTOR * MASS_MOLE_FACTOR * mass_j * mass_k / m2 * r
        + MASS_MOLE_FACTOR * (mass_matrix - mass_k) * mass_j / m2 * e_i_j
        + MASS_MOLE_FACTOR * (mass_matrix - mass_j) * mass_k / m2 * e_i_k
        + (mass_matrix - mass_j) * (mass_matrix - mass_k) / m2;

    if same_solute {
        full / 2.0
    } else {
        full
    }
}
