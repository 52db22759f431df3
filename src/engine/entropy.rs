// ==========================================
// 合金熔体活度计算 - 过剩熵适用性判定
// ==========================================
// 规则（纯函数，不产生提示；提示由 API 边界负责）:
// 1. 含 O: 当且仅当另含 {H, B, C, N, Si, P, Ge} 中任一元素时适用
// 2. 不含 O，含 H 或 N: 不适用
// 3. 其余: 适用
// ==========================================

/// 与 O 共存时使过剩熵项适用的元素
pub const OXYGEN_PARTNERS: [&str; 7] = ["H", "B", "C", "N", "Si", "P", "Ge"];

/// 判定过剩熵项是否适用于给定元素集合
pub fn entropy_judge<'a, I>(elements: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    let mut has_oxygen = false;
    let mut has_oxygen_partner = false;
    let mut has_h_or_n = false;

    for symbol in elements {
        match symbol {
            "O" => has_oxygen = true,
            other => {
                if OXYGEN_PARTNERS.contains(&other) {
                    has_oxygen_partner = true;
                }
                if other == "H" || other == "N" {
                    has_h_or_n = true;
                }
            }
        }
    }

    if has_oxygen {
        has_oxygen_partner
    } else {
        !has_h_or_n
    }
}
