// ==========================================
// 合金熔体活度计算 - 三元熔体相互作用系数
// ==========================================
// 职责: 无限稀活度系数 ln γ°、一阶系数 ε_i^j、二阶系数 ρ_i^{j,k}
// 输入: 溶剂/溶质符号 + 计算条件 (温度、物态、外推模型、合金上下文)
// 输出: 无量纲系数；参数缺失时为 NaN
// ==========================================
// 相互作用曲线: 对 (a, b) 二元，x 为 a 的摩尔分数
//   A(x) = V_a·(1 + u_a(1−x)Δφ)   B(x) = V_b·(1 − u_b·x·Δφ)
//   D(x) = x·A + (1−x)·B          Q(x) = f_ab'·A·B / D
//   ΔH = x(1−x)·Q(x)
// ==========================================

use crate::domain::composition::Composition;
use crate::domain::element::Element;
use crate::domain::types::{PhaseState, GAS_CONSTANT};
use crate::engine::binary::{fab, BinaryModel};
use crate::engine::entropy::entropy_judge;
use crate::engine::events::{ContributionMap, ContributionReporter, NoOpReporter};
use crate::engine::extrapolation::ExtrapolationModel;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

// ==========================================
// MeltConditions - 计算条件
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct MeltConditions<'a> {
    pub temperature: f64,
    pub state: PhaseState,
    pub model: ExtrapolationModel,
    /// 完整合金成分（用于过剩熵判定与贡献系数报告）
    pub alloy: Option<&'a Composition>,
}

impl<'a> MeltConditions<'a> {
    pub fn new(temperature: f64, state: PhaseState, model: ExtrapolationModel) -> Self {
        Self {
            temperature,
            state,
            model,
            alloy: None,
        }
    }

    pub fn with_alloy(mut self, alloy: &'a Composition) -> Self {
        self.alloy = Some(alloy);
        self
    }
}

// ==========================================
// InteractionCurve - Q(x) 及其导数（闭式）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionCurve {
    f: f64,
    a0: f64,
    a1: f64,
    b0: f64,
    b1: f64,
}

impl InteractionCurve {
    /// 由有效 f_ab' 与两元素参数构造
    pub fn new(fab_effective: f64, ea: &Element, eb: &Element) -> Self {
        let d_phi = ea.phi - eb.phi;
        Self {
            f: fab_effective,
            a0: ea.v * (1.0 + ea.u * d_phi),
            a1: -ea.v * ea.u * d_phi,
            b0: eb.v,
            b1: -eb.v * eb.u * d_phi,
        }
    }

    fn a(&self, x: f64) -> f64 {
        self.a0 + self.a1 * x
    }

    fn b(&self, x: f64) -> f64 {
        self.b0 + self.b1 * x
    }

    fn d(&self, x: f64) -> f64 {
        x * self.a(x) + (1.0 - x) * self.b(x)
    }

    fn d1(&self, x: f64) -> f64 {
        (self.a0 - self.b0 + self.b1) + 2.0 * (self.a1 - self.b1) * x
    }

    fn d2(&self) -> f64 {
        2.0 * (self.a1 - self.b1)
    }

    /// Q(x)
    pub fn value(&self, x: f64) -> f64 {
        let d = self.d(x);
        if d == 0.0 {
            return f64::NAN;
        }
        self.f * self.a(x) * self.b(x) / d
    }

    /// Q'(x)
    pub fn first_derivative(&self, x: f64) -> f64 {
        let d = self.d(x);
        if d == 0.0 {
            return f64::NAN;
        }
        let n = self.a(x) * self.b(x);
        let n1 = self.a1 * self.b(x) + self.a(x) * self.b1;
        self.f * (n1 * d - n * self.d1(x)) / (d * d)
    }

    /// Q''(x)
    pub fn second_derivative(&self, x: f64) -> f64 {
        let d = self.d(x);
        if d == 0.0 {
            return f64::NAN;
        }
        let q = self.value(x);
        let q1 = self.first_derivative(x);
        let n2 = 2.0 * self.a1 * self.b1;
        (self.f * n2 - 2.0 * q1 * self.d1(x) - q * self.d2()) / d
    }
}

// ==========================================
// TernaryMelts
// ==========================================
pub struct TernaryMelts {
    binary: Arc<BinaryModel>,
    reporter: Arc<dyn ContributionReporter>,
}

impl TernaryMelts {
    pub fn new(binary: Arc<BinaryModel>) -> Self {
        Self {
            binary,
            reporter: Arc::new(NoOpReporter),
        }
    }

    pub fn with_reporter(binary: Arc<BinaryModel>, reporter: Arc<dyn ContributionReporter>) -> Self {
        Self { binary, reporter }
    }

    pub fn binary(&self) -> &BinaryModel {
        &self.binary
    }

    // ==========================================
    // 界面焓与相互作用曲线
    // ==========================================

    pub fn fab_pure(&self, ei: &Element, ej: &Element, state: PhaseState) -> f64 {
        fab(ei, ej, state)
    }

    pub fn fab_with_entropy(
        &self,
        ei: &Element,
        ej: &Element,
        apply_entropy: bool,
        temperature: f64,
        state: PhaseState,
    ) -> f64 {
        self.binary.fab_effective(ei, ej, temperature, state, apply_entropy)
    }

    /// 过剩熵是否生效: 实例开关打开且体系通过判定
    ///
    /// 体系取合金上下文；无上下文时取参与计算的元素
    pub fn entropy_applies(&self, symbols: &[&str], alloy: Option<&Composition>) -> bool {
        if !self.binary.entropy_enabled() {
            return false;
        }
        match alloy {
            Some(composition) => entropy_judge(composition.iter().map(|(s, _)| s)),
            None => entropy_judge(symbols.iter().copied()),
        }
    }

    fn curve(&self, ea: &Element, eb: &Element, temperature: f64, state: PhaseState, apply_entropy: bool) -> InteractionCurve {
        InteractionCurve::new(self.fab_with_entropy(ea, eb, apply_entropy, temperature, state), ea, eb)
    }

    /// Q_ij(x)
    pub fn interaction_curve(&self, ei: &Element, ej: &Element, x: f64, temperature: f64, state: PhaseState, apply_entropy: bool) -> f64 {
        self.curve(ei, ej, temperature, state, apply_entropy).value(x)
    }

    /// Q'_ij(x)
    pub fn first_derivative_qx(&self, ei: &Element, ej: &Element, x: f64, temperature: f64, state: PhaseState, apply_entropy: bool) -> f64 {
        self.curve(ei, ej, temperature, state, apply_entropy).first_derivative(x)
    }

    /// Q''_ij(x)
    pub fn second_derivative_q0(&self, ei: &Element, ej: &Element, x: f64, temperature: f64, state: PhaseState, apply_entropy: bool) -> f64 {
        self.curve(ei, ej, temperature, state, apply_entropy).second_derivative(x)
    }

    // ==========================================
    // 无限稀活度系数
    // ==========================================

    /// ln γ°_solute = 1000·[f'·V_s·(1 + u_s(φ_s − φ_solv)) + ΔH_trans] / (R·T)
    pub fn ln_y0(&self, solvent: &str, solute: &str, cond: &MeltConditions<'_>) -> f64 {
        let frame = match Frame::new(self, solvent, &[solute], cond) {
            Some(frame) => frame,
            None => return f64::NAN,
        };
        let es = frame.element(solute);
        let em = frame.element(solvent);
        let f = self.fab_with_entropy(&es, &em, frame.entropy, cond.temperature, cond.state);
        frame.scale * (f * es.v * (1.0 + es.u * (es.phi - em.phi)) + es.dh_trans)
    }

    // ==========================================
    // 一阶相互作用系数
    // ==========================================

    /// ε_i^j（溶剂 m）
    ///
    /// i ≠ j: 由六个外推贡献系数确定 i-j 二元的等效成分 X0；
    /// i == j: 二元自相互作用 1000·(−2Q_im(0) + 2Q'_im(0))/(R·T)
    pub fn activity_interact_coefficient_1st(&self, solvent: &str, i: &str, j: &str, cond: &MeltConditions<'_>) -> f64 {
        let frame = match Frame::new(self, solvent, &[i, j], cond) {
            Some(frame) => frame,
            None => return f64::NAN,
        };
        if i != j {
            frame.report_first_order(i, j);
        }
        frame.epsilon(i, j)
    }

    /// ε_i^i（溶剂 m）
    pub fn self_interaction(&self, solvent: &str, i: &str, cond: &MeltConditions<'_>) -> f64 {
        self.activity_interact_coefficient_1st(solvent, i, i, cond)
    }

    // ==========================================
    // 二阶相互作用系数（Taylor 记法 ρ_i^{j,k} = ∂²lnγ_i/∂x_j∂x_k）
    // ==========================================

    /// ρ_i^{i,i} = −ε_i^i + 1000·(−6Q'_im(0) + 3Q''_im(0))/(R·T)
    pub fn roui_ii(&self, solvent: &str, i: &str, cond: &MeltConditions<'_>) -> f64 {
        match Frame::new(self, solvent, &[i], cond) {
            Some(frame) => frame.rho(i, i, i),
            None => f64::NAN,
        }
    }

    /// ρ_i^{i,j}
    pub fn roui_ij(&self, solvent: &str, i: &str, j: &str, cond: &MeltConditions<'_>) -> f64 {
        match Frame::new(self, solvent, &[i, j], cond) {
            Some(frame) => frame.rho(i, i, j),
            None => f64::NAN,
        }
    }

    /// ρ_i^{j,j}
    pub fn roui_jj(&self, solvent: &str, i: &str, j: &str, cond: &MeltConditions<'_>) -> f64 {
        match Frame::new(self, solvent, &[i, j], cond) {
            Some(frame) => frame.rho(i, j, j),
            None => f64::NAN,
        }
    }

    /// ρ_i^{j,k}（i、j、k 互不相同）
    pub fn roui_jk(&self, solvent: &str, i: &str, j: &str, k: &str, cond: &MeltConditions<'_>) -> f64 {
        match Frame::new(self, solvent, &[i, j, k], cond) {
            Some(frame) => frame.rho(i, j, k),
            None => f64::NAN,
        }
    }

    /// 二阶系数分派: 按 (i, j, k) 的重合情况选择 ii / ij / jj / jk
    pub fn second_order(&self, solvent: &str, i: &str, j: &str, k: &str, cond: &MeltConditions<'_>) -> f64 {
        if j == i && k == i {
            self.roui_ii(solvent, i, cond)
        } else if j == k {
            self.roui_jj(solvent, i, j, cond)
        } else if j == i {
            self.roui_ij(solvent, i, k, cond)
        } else if k == i {
            self.roui_ij(solvent, i, j, cond)
        } else {
            self.roui_jk(solvent, i, j, k, cond)
        }
    }
}

// ==========================================
// Frame - 单次计算的元素与条件快照
// ==========================================
struct Frame<'a> {
    melts: &'a TernaryMelts,
    cond: MeltConditions<'a>,
    solvent: &'a str,
    entropy: bool,
    /// 1000 / (R·T)
    scale: f64,
    elements: HashMap<String, Element>,
}

impl<'a> Frame<'a> {
    /// 温度非正时返回 None
    fn new(melts: &'a TernaryMelts, solvent: &'a str, solutes: &[&str], cond: &MeltConditions<'a>) -> Option<Self> {
        if !(cond.temperature > 0.0) {
            return None;
        }
        let mut symbols: Vec<&str> = vec![solvent];
        for s in solutes {
            if !symbols.contains(s) {
                symbols.push(s);
            }
        }
        let elements = symbols
            .iter()
            .map(|s| (s.to_string(), melts.binary.element(s)))
            .collect();
        let entropy = melts.entropy_applies(&symbols, cond.alloy);

        Some(Self {
            melts,
            cond: *cond,
            solvent,
            entropy,
            scale: 1000.0 / (GAS_CONSTANT * cond.temperature),
            elements,
        })
    }

    /// 构造时未载入的符号按参数缺失处理
    fn element(&self, symbol: &str) -> Cow<'_, Element> {
        match self.elements.get(symbol) {
            Some(element) => Cow::Borrowed(element),
            None => Cow::Owned(Element::missing(symbol)),
        }
    }

    fn curve(&self, a: &str, b: &str) -> InteractionCurve {
        self.melts
            .curve(&self.element(a), &self.element(b), self.cond.temperature, self.cond.state, self.entropy)
    }

    /// 外推贡献系数: c 对 a-b 二元中 a 的贡献
    fn r(&self, c: &str, a: &str, b: &str) -> f64 {
        self.melts.binary.contribution_with(
            self.cond.model,
            c,
            a,
            b,
            self.cond.temperature,
            self.cond.state,
            self.entropy,
        )
    }

    /// i-j 二元的等效成分 X0 与归一化和 s
    fn pair_point(&self, a: &str, b: &str) -> (f64, f64) {
        let m = self.solvent;
        let (r_a, r_b) = (self.r(m, a, b), self.r(m, b, a));
        if r_a == 0.0 && r_b == 0.0 {
            return (0.5, 1.0);
        }
        let s = r_a + r_b;
        (r_a / s, s)
    }

    /// ε_a^b（已乘 1000/RT）
    fn epsilon(&self, a: &str, b: &str) -> f64 {
        let m = self.solvent;
        let q_am = self.curve(a, m);
        if a == b {
            return self.scale * (-2.0 * q_am.value(0.0) + 2.0 * q_am.first_derivative(0.0));
        }
        let q_bm = self.curve(b, m);
        let (x0, _) = self.pair_point(a, b);
        let chemical = self.curve(a, b).value(x0) - q_am.value(0.0) - q_bm.value(0.0)
            + self.r(b, a, m) * q_am.first_derivative(0.0)
            + self.r(a, b, m) * q_bm.first_derivative(0.0);
        self.scale * chemical
    }

    /// 溶剂-溶质 (a, m) 二元对三阶导数的贡献 P_qr(a)
    fn solvent_pair_term(&self, a: &str, q: &str, r: &str) -> f64 {
        let m = self.solvent;
        let curve = self.curve(a, m);
        let q1 = curve.first_derivative(0.0);
        let q2 = curve.second_derivative(0.0);

        let y = |p: &str| if p == a { 1.0 } else { self.r(p, a, m) };
        let dn = |p: &str| if p == a { 0.0 } else { self.r(p, a, m) + self.r(p, m, a) - 1.0 };
        let (y_q, y_r) = (y(q), y(r));
        let y_qr = -y_q * dn(r) - y_r * dn(q);

        -q1 * (y_q + y_r) + q2 * y_q * y_r + q1 * y_qr
    }

    /// dX_a^{(ab)} / dx_c
    fn pair_slope(&self, a: &str, b: &str, c: &str) -> f64 {
        let (x0, s) = self.pair_point(a, b);
        if c == a {
            (1.0 - x0) / s
        } else if c == b {
            -x0 / s
        } else {
            (self.r(c, a, b) * (1.0 - x0) - x0 * self.r(c, b, a)) / s
        }
    }

    /// 溶质-溶质 (a, b) 二元对三阶导数的贡献 Q'_ab(X0)·dX/dx_c
    fn solute_pair_term(&self, a: &str, b: &str, c: &str) -> f64 {
        let (x0, _) = self.pair_point(a, b);
        self.curve(a, b).first_derivative(x0) * self.pair_slope(a, b, c)
    }

    /// 过剩函数三阶导数 G_{abc}（已乘 1000/RT）
    fn third_derivative(&self, a: &str, b: &str, c: &str) -> f64 {
        let idx = [a, b, c];
        let mut total = 0.0;
        for t in 0..3 {
            let others: Vec<&str> = (0..3).filter(|&u| u != t).map(|u| idx[u]).collect();
            total += self.solvent_pair_term(idx[t], others[0], others[1]);
        }
        for (p, q, u) in [(0, 1, 2), (0, 2, 1), (1, 2, 0)] {
            if idx[p] != idx[q] {
                total += self.solute_pair_term(idx[p], idx[q], idx[u]);
            }
        }
        self.scale * total
    }

    /// ρ_a^{b,c} = G_{abc} − ε_b^c
    fn rho(&self, a: &str, b: &str, c: &str) -> f64 {
        self.third_derivative(a, b, c) - self.epsilon(b, c)
    }

    /// 报告 ε_i^j 用到的六个贡献系数（合金上下文含 ≥3 个元素时）
    fn report_first_order(&self, i: &str, j: &str) {
        let alloy = match self.cond.alloy {
            Some(alloy) if alloy.distinct_elements().len() >= 3 => alloy,
            _ => return,
        };
        let m = self.solvent;
        let mut contributions: ContributionMap = BTreeMap::new();
        for (a, b, c) in [(i, j, m), (i, m, j), (j, m, i)] {
            let mut values = BTreeMap::new();
            values.insert(format!("{}→{}", c, a), self.r(c, a, b));
            values.insert(format!("{}→{}", c, b), self.r(c, b, a));
            contributions.insert(format!("{}-{}", a, b), values);
        }
        let system = format!("{}-{}-{}", m, i, j);
        self.melts.reporter.report(
            &system,
            self.cond.model,
            self.cond.temperature,
            &contributions,
            &alloy.to_string(),
        );
    }
}
