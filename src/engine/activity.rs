// ==========================================
// 合金熔体活度计算 - 多元活度系数引擎
// ==========================================
// 职责: 成分解析 + Wagner / Darken / Elliott 三种封闭形式
// 输入: 成分、溶剂、溶质、温度、物态、外推模型
// 输出: ln γ（校验失败返回 CalcError，参数缺失返回 NaN）
// ==========================================
// Wagner : ln γ_i = ln γ°_i + Σ_j x_j·ε_i^j
// Darken : Wagner − ½·Σ_j Σ_{k≠j} x_j·x_k·ε_j^k
// Elliott: Wagner + ½·Σ_j Σ_{k≠j} ρ_i^{j,k}·x_j·x_k
// （修正项只取不同溶质的交叉项，单溶质体系三者一致）
// ==========================================

use crate::domain::composition::{parse_composition, Composition};
use crate::domain::types::PhaseState;
use crate::engine::binary::BinaryModel;
use crate::engine::error::{CalcError, CalcResult};
use crate::engine::events::ContributionReporter;
use crate::engine::extrapolation::ExtrapolationModel;
use crate::engine::ternary::{MeltConditions, TernaryMelts};
use crate::repository::interaction_repo::FirstOrderEstimator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// ClosureModel - 活度系数封闭形式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosureModel {
    Wagner,
    Darken,
    Elliott,
}

impl ClosureModel {
    pub const ALL: [ClosureModel; 3] = [ClosureModel::Wagner, ClosureModel::Darken, ClosureModel::Elliott];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClosureModel::Wagner => "wagner",
            ClosureModel::Darken => "darken",
            ClosureModel::Elliott => "elliott",
        }
    }
}

impl Default for ClosureModel {
    fn default() -> Self {
        ClosureModel::Wagner
    }
}

impl fmt::Display for ClosureModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ClosureModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wagner" => Ok(ClosureModel::Wagner),
            "darken" => Ok(ClosureModel::Darken),
            "elliott" | "elliot" => Ok(ClosureModel::Elliott),
            other => Err(format!("未知活度模型: {}", other)),
        }
    }
}

/// 计算条件（温度、物态、外推模型）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityConditions {
    pub temperature: f64,
    pub state: PhaseState,
    pub model: ExtrapolationModel,
}

impl ActivityConditions {
    pub fn new(temperature: f64, state: PhaseState, model: ExtrapolationModel) -> Self {
        Self {
            temperature,
            state,
            model,
        }
    }
}

/// 单个溶质的活度计算结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityResult {
    pub closure: ClosureModel,
    pub solvent: String,
    pub solute: String,
    pub conditions: ActivityConditions,
    pub mole_fraction: f64,
    pub ln_gamma: f64,
    pub gamma: f64,
    pub activity: f64,
}

// ==========================================
// ActivityCoefficientEngine
// ==========================================
pub struct ActivityCoefficientEngine {
    melts: TernaryMelts,
}

impl ActivityCoefficientEngine {
    pub fn new(binary: Arc<BinaryModel>) -> Self {
        Self {
            melts: TernaryMelts::new(binary),
        }
    }

    pub fn with_reporter(binary: Arc<BinaryModel>, reporter: Arc<dyn ContributionReporter>) -> Self {
        Self {
            melts: TernaryMelts::with_reporter(binary, reporter),
        }
    }

    pub fn melts(&self) -> &TernaryMelts {
        &self.melts
    }

    /// 成分解析
    pub fn parse_composition(&self, text: &str) -> CalcResult<Composition> {
        Ok(parse_composition(text)?)
    }

    // ==========================================
    // 输入校验
    // ==========================================
    fn validate(&self, composition: &Composition, solvent: &str, solute: &str, cond: &ActivityConditions) -> CalcResult<()> {
        if solute == solvent {
            return Err(CalcError::SoluteIsSolvent(solute.to_string()));
        }
        if composition.len() < 2 {
            return Err(CalcError::TooFewComponents(composition.len()));
        }
        if !composition.contains(solvent) {
            return Err(CalcError::missing_solvent(solvent));
        }
        if !composition.contains(solute) {
            return Err(CalcError::missing_solute(solute));
        }
        if !(cond.temperature > 0.0) {
            return Err(CalcError::InvalidTemperature(cond.temperature));
        }
        Ok(())
    }

    fn melt_conditions<'a>(&self, composition: &'a Composition, cond: &ActivityConditions) -> MeltConditions<'a> {
        MeltConditions::new(cond.temperature, cond.state, cond.model).with_alloy(composition)
    }

    // ==========================================
    // 三种封闭形式
    // ==========================================

    /// Wagner 一阶展开
    pub fn wagner(&self, composition: &Composition, solvent: &str, solute: &str, cond: &ActivityConditions) -> CalcResult<f64> {
        self.validate(composition, solvent, solute, cond)?;
        Ok(self.wagner_unchecked(composition, solvent, solute, &self.melt_conditions(composition, cond)))
    }

    fn wagner_unchecked(&self, composition: &Composition, solvent: &str, solute: &str, melt: &MeltConditions<'_>) -> f64 {
        let ln_y0 = self.melts.ln_y0(solvent, solute, melt);
        composition.solutes(solvent).fold(ln_y0, |acc, (j, x_j)| {
            acc + x_j * self.melts.activity_interact_coefficient_1st(solvent, solute, j, melt)
        })
    }

    /// Darken 二次形式
    pub fn darken(&self, composition: &Composition, solvent: &str, solute: &str, cond: &ActivityConditions) -> CalcResult<f64> {
        self.validate(composition, solvent, solute, cond)?;
        let melt = self.melt_conditions(composition, cond);
        let wagner = self.wagner_unchecked(composition, solvent, solute, &melt);

        let mut correction = 0.0;
        for (j, x_j) in composition.solutes(solvent) {
            for (k, x_k) in composition.solutes(solvent).filter(|(k, _)| *k != j) {
                correction += x_j * x_k * self.melts.activity_interact_coefficient_1st(solvent, j, k, &melt);
            }
        }
        Ok(wagner - 0.5 * correction)
    }

    /// Elliott 二阶展开
    pub fn elliott(&self, composition: &Composition, solvent: &str, solute: &str, cond: &ActivityConditions) -> CalcResult<f64> {
        self.validate(composition, solvent, solute, cond)?;
        let melt = self.melt_conditions(composition, cond);
        let wagner = self.wagner_unchecked(composition, solvent, solute, &melt);

        let mut second = 0.0;
        for (j, x_j) in composition.solutes(solvent) {
            for (k, x_k) in composition.solutes(solvent).filter(|(k, _)| *k != j) {
                second += x_j * x_k * self.melts.second_order(solvent, solute, j, k, &melt);
            }
        }
        Ok(wagner + 0.5 * second)
    }

    /// 按封闭形式计算 ln γ
    pub fn ln_gamma(
        &self,
        closure: ClosureModel,
        composition: &Composition,
        solvent: &str,
        solute: &str,
        cond: &ActivityConditions,
    ) -> CalcResult<f64> {
        match closure {
            ClosureModel::Wagner => self.wagner(composition, solvent, solute, cond),
            ClosureModel::Darken => self.darken(composition, solvent, solute, cond),
            ClosureModel::Elliott => self.elliott(composition, solvent, solute, cond),
        }
    }

    /// 活度 a = γ·x
    #[instrument(skip(self, closure, composition, solvent, solute, cond), fields(
        alloy = %composition,
        solvent = %solvent,
        solute = %solute,
        closure = %closure,
        model = %cond.model,
        temperature = cond.temperature
    ))]
    pub fn activity(
        &self,
        closure: ClosureModel,
        composition: &Composition,
        solvent: &str,
        solute: &str,
        cond: &ActivityConditions,
    ) -> CalcResult<ActivityResult> {
        let ln_gamma = self.ln_gamma(closure, composition, solvent, solute, cond)?;
        let mole_fraction = composition.fraction(solute).unwrap_or(0.0);
        let gamma = ln_gamma.exp();
        tracing::debug!(ln_gamma, gamma, "活度系数计算完成");

        Ok(ActivityResult {
            closure,
            solvent: solvent.to_string(),
            solute: solute.to_string(),
            conditions: *cond,
            mole_fraction,
            ln_gamma,
            gamma,
            activity: gamma * mole_fraction,
        })
    }

    /// 全部溶质两两之间的一阶系数 ε_i^j
    pub fn interaction_matrix(
        &self,
        composition: &Composition,
        solvent: &str,
        cond: &ActivityConditions,
    ) -> CalcResult<BTreeMap<String, BTreeMap<String, f64>>> {
        if composition.len() < 2 {
            return Err(CalcError::TooFewComponents(composition.len()));
        }
        if !composition.contains(solvent) {
            return Err(CalcError::missing_solvent(solvent));
        }
        if !(cond.temperature > 0.0) {
            return Err(CalcError::InvalidTemperature(cond.temperature));
        }

        let melt = self.melt_conditions(composition, cond);
        let mut matrix = BTreeMap::new();
        for (i, _) in composition.solutes(solvent) {
            let row: BTreeMap<String, f64> = composition
                .solutes(solvent)
                .map(|(j, _)| (j.to_string(), self.melts.activity_interact_coefficient_1st(solvent, i, j, &melt)))
                .collect();
            matrix.insert(i.to_string(), row);
        }
        Ok(matrix)
    }
}

// 无实验数据时以 UEM1 计算值补位
impl FirstOrderEstimator for ActivityCoefficientEngine {
    fn estimate_first_order(&self, solvent: &str, solute_i: &str, solute_j: &str, temperature: f64) -> f64 {
        let melt = MeltConditions::new(temperature, PhaseState::Liquid, ExtrapolationModel::Uem1);
        self.melts.activity_interact_coefficient_1st(solvent, solute_i, solute_j, &melt)
    }
}
