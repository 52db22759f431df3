// ==========================================
// 合金熔体活度计算 - 活度计算 API
// ==========================================
// 职责: 输入校验、按当前配置构建引擎、活度/相互作用系数计算、
//       实验值与各外推模型计算值对照
// 说明: 过剩熵不适用的提示在此层给出（引擎层判定为纯函数）
// ==========================================

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::calculation_settings::CalculationSettings;
use crate::config::config_manager::ConfigManager;
use crate::domain::composition::Composition;
use crate::domain::interaction::ComparisonRow;
use crate::domain::types::PhaseState;
use crate::engine::activity::{ActivityCoefficientEngine, ActivityConditions, ActivityResult, ClosureModel};
use crate::engine::binary::BinaryModel;
use crate::engine::entropy::entropy_judge;
use crate::engine::events::{CollectingReporter, ContributionReport, ContributionReporter, NoOpReporter};
use crate::engine::extrapolation::ExtrapolationModel;
use crate::engine::ternary::MeltConditions;
use crate::repository::element_repo::ElementRepository;
use crate::repository::interaction_repo::InteractionParameterStore;

// ==========================================
// 请求 / 响应
// ==========================================

/// 活度计算请求（未给出的条件取配置默认值）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRequest {
    pub composition: String,
    pub solvent: String,
    pub solute: String,
    #[serde(default)]
    pub closure: ClosureModel,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub state: Option<PhaseState>,
    #[serde(default)]
    pub model: Option<ExtrapolationModel>,
}

impl ActivityRequest {
    pub fn new(composition: &str, solvent: &str, solute: &str) -> Self {
        Self {
            composition: composition.to_string(),
            solvent: solvent.to_string(),
            solute: solute.to_string(),
            closure: ClosureModel::default(),
            temperature: None,
            state: None,
            model: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub result: ActivityResult,
    /// 外推贡献系数（合金含 3 个及以上元素时才有）
    pub contributions: Vec<ContributionReport>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionMatrixRequest {
    pub composition: String,
    pub solvent: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub state: Option<PhaseState>,
    #[serde(default)]
    pub model: Option<ExtrapolationModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionMatrixResponse {
    pub solvent: String,
    pub conditions: ActivityConditions,
    /// solute_i → (solute_j → ε_i^j)
    pub matrix: BTreeMap<String, BTreeMap<String, f64>>,
    pub warnings: Vec<String>,
}

// ==========================================
// ActivityApi
// ==========================================

/// 活度计算API
///
/// 职责：
/// 1. 请求校验与默认条件补全
/// 2. 每次请求按 config_kv 当前配置构建 BinaryModel
/// 3. 实验参数与计算值对照
pub struct ActivityApi {
    db_path: String,
    config_manager: Arc<ConfigManager>,
    store: Arc<InteractionParameterStore>,
}

impl ActivityApi {
    pub fn new(db_path: &str, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            db_path: db_path.to_string(),
            config_manager,
            store: Arc::new(InteractionParameterStore::new(db_path)),
        }
    }

    /// 打开参数库并创建 API
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let config_manager = ConfigManager::new(db_path)?;
        Ok(Self::new(db_path, Arc::new(config_manager)))
    }

    pub fn store(&self) -> &InteractionParameterStore {
        &self.store
    }

    /// 当前计算配置
    pub fn settings(&self) -> ApiResult<CalculationSettings> {
        Ok(self.config_manager.load_settings()?)
    }

    fn build_engine(
        &self,
        settings: &CalculationSettings,
        reporter: Arc<dyn ContributionReporter>,
    ) -> ActivityCoefficientEngine {
        let elements = Arc::new(ElementRepository::new(&self.db_path));
        let binary = Arc::new(BinaryModel::new(elements, settings.model_settings()));
        ActivityCoefficientEngine::with_reporter(binary, reporter)
    }

    fn resolve_conditions(
        &self,
        settings: &CalculationSettings,
        temperature: Option<f64>,
        state: Option<PhaseState>,
        model: Option<ExtrapolationModel>,
    ) -> ApiResult<ActivityConditions> {
        let defaults = settings.default_conditions();
        let temperature = temperature.unwrap_or(defaults.temperature);
        if !(temperature > 0.0) || !temperature.is_finite() {
            return Err(ApiError::InvalidInput(format!("温度必须为正值: {}", temperature)));
        }
        Ok(ActivityConditions::new(
            temperature,
            state.unwrap_or(defaults.state),
            model.unwrap_or(defaults.model),
        ))
    }

    /// 过剩熵开启但体系不适用时的提示
    fn entropy_warning(&self, settings: &CalculationSettings, composition: &Composition) -> Option<String> {
        if !settings.entropy_enabled || entropy_judge(composition.iter().map(|(s, _)| s)) {
            return None;
        }
        let message = format!(
            "体系 {} 不适用过剩熵修正，已按不含熵项计算",
            composition.system_name()
        );
        warn!(alloy = %composition, "{}", message);
        Some(message)
    }

    // ==========================================
    // 活度计算
    // ==========================================

    /// 计算单个溶质的活度系数与活度
    pub fn calculate_activity(&self, request: &ActivityRequest) -> ApiResult<ActivityResponse> {
        let solvent = require_symbol("solvent", &request.solvent)?;
        let solute = require_symbol("solute", &request.solute)?;

        let settings = self.settings()?;
        let cond = self.resolve_conditions(&settings, request.temperature, request.state, request.model)?;

        let reporter = CollectingReporter::new();
        let engine = self.build_engine(&settings, reporter.clone());
        let composition = engine.parse_composition(&request.composition)?;
        let warnings: Vec<String> = self.entropy_warning(&settings, &composition).into_iter().collect();

        let result = engine.activity(request.closure, &composition, solvent, solute, &cond)?;
        if !result.ln_gamma.is_finite() {
            warn!(
                alloy = %composition,
                solute,
                "ln γ 非有限值，可能缺少元素参数"
            );
        }
        debug!(activity = result.activity, "活度计算完成");

        Ok(ActivityResponse {
            result,
            contributions: reporter.take(),
            warnings,
        })
    }

    /// 全部闭合形式的计算结果
    pub fn calculate_all_closures(&self, request: &ActivityRequest) -> ApiResult<Vec<ActivityResponse>> {
        ClosureModel::ALL
            .iter()
            .map(|closure| {
                let mut req = request.clone();
                req.closure = *closure;
                self.calculate_activity(&req)
            })
            .collect()
    }

    /// 溶质两两之间的一阶相互作用系数
    pub fn interaction_matrix(&self, request: &InteractionMatrixRequest) -> ApiResult<InteractionMatrixResponse> {
        let solvent = require_symbol("solvent", &request.solvent)?;
        let settings = self.settings()?;
        let cond = self.resolve_conditions(&settings, request.temperature, request.state, request.model)?;

        let engine = self.build_engine(&settings, Arc::new(NoOpReporter));
        let composition = engine.parse_composition(&request.composition)?;
        let warnings: Vec<String> = self.entropy_warning(&settings, &composition).into_iter().collect();
        let matrix = engine.interaction_matrix(&composition, solvent, &cond)?;

        Ok(InteractionMatrixResponse {
            solvent: solvent.to_string(),
            conditions: cond,
            matrix,
            warnings,
        })
    }

    // ==========================================
    // 实验值对照
    // ==========================================

    /// 单个 (溶剂, i, j) 的实验 ε 与六种外推模型计算值
    pub fn compare_first_order(
        &self,
        solvent: &str,
        solute_i: &str,
        solute_j: &str,
        temperature: Option<f64>,
        state: Option<PhaseState>,
    ) -> ApiResult<ComparisonRow> {
        let solvent = require_symbol("solvent", solvent)?;
        let solute_i = require_symbol("solute_i", solute_i)?;
        let solute_j = require_symbol("solute_j", solute_j)?;
        if solute_i == solvent || solute_j == solvent {
            return Err(ApiError::InvalidInput(format!("溶质与溶剂相同: {}", solvent)));
        }

        let settings = self.settings()?;
        let cond = self.resolve_conditions(&settings, temperature, state, None)?;
        let engine = self.build_engine(&settings, Arc::new(NoOpReporter));
        Ok(self.comparison_row(&engine, solvent, solute_i, solute_j, cond.temperature, cond.state))
    }

    /// 参数库中某溶剂全部一阶实验值的对照表
    ///
    /// 固定温度的记录在其记录温度下计算；温度表达式记录在 temperature 下计算
    pub fn compare_with_experiment(&self, solvent: &str, temperature: Option<f64>) -> ApiResult<Vec<ComparisonRow>> {
        let solvent = require_symbol("solvent", solvent)?;
        let settings = self.settings()?;
        let cond = self.resolve_conditions(&settings, temperature, None, None)?;
        let engine = self.build_engine(&settings, Arc::new(NoOpReporter));

        let mut seen = BTreeSet::new();
        let mut rows = Vec::new();
        for record in self.store.first_order_records(solvent)? {
            let t = if record.is_temperature_formula() {
                cond.temperature
            } else {
                match record.temperature.trim().parse::<f64>() {
                    Ok(t) if t > 0.0 => t,
                    _ => {
                        debug!(temperature = %record.temperature, "记录温度无法解析，跳过");
                        continue;
                    }
                }
            };
            let key = (record.solute_i.clone(), record.solute_j.clone(), t.to_bits());
            if !seen.insert(key) {
                continue;
            }
            rows.push(self.comparison_row(&engine, solvent, &record.solute_i, &record.solute_j, t, cond.state));
        }
        Ok(rows)
    }

    fn comparison_row(
        &self,
        engine: &ActivityCoefficientEngine,
        solvent: &str,
        solute_i: &str,
        solute_j: &str,
        temperature: f64,
        state: PhaseState,
    ) -> ComparisonRow {
        let computed = ExtrapolationModel::ALL
            .iter()
            .map(|model| {
                let melt = MeltConditions::new(temperature, state, *model);
                let value = engine
                    .melts()
                    .activity_interact_coefficient_1st(solvent, solute_i, solute_j, &melt);
                (model.as_str().to_string(), value)
            })
            .collect();

        ComparisonRow {
            solvent: solvent.to_string(),
            solute_i: solute_i.to_string(),
            solute_j: solute_j.to_string(),
            temperature,
            experimental: self.store.first_order_in_mole(solvent, solute_i, solute_j, temperature),
            computed,
        }
    }
}

fn require_symbol<'a>(field: &str, value: &'a str) -> ApiResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput(format!("{} 不能为空", field)));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_symbol() {
        assert_eq!(require_symbol("solvent", " Fe ").unwrap(), "Fe");
        assert!(matches!(require_symbol("solvent", "  "), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_request_defaults_from_json() {
        let req: ActivityRequest =
            serde_json::from_str(r#"{"composition":"Fe0.97C0.01Si0.02","solvent":"Fe","solute":"C"}"#).unwrap();
        assert_eq!(req.closure, ClosureModel::Wagner);
        assert!(req.temperature.is_none());
        assert!(req.model.is_none());
    }
}
