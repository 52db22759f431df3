// ==========================================
// 合金熔体活度计算 - 参数与配置 API
// ==========================================
// 职责: 计算配置查询/更新/快照、CSV 参数导入
// ==========================================

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::calculation_settings::CalculationSettings;
use crate::config::config_manager::ConfigManager;
use crate::importer::parameter_importer::{ImportSummary, ParameterImporter};

pub struct ParameterApi {
    config_manager: Arc<ConfigManager>,
    importer: Arc<ParameterImporter>,
}

impl ParameterApi {
    pub fn new(config_manager: Arc<ConfigManager>, importer: Arc<ParameterImporter>) -> Self {
        Self {
            config_manager,
            importer,
        }
    }

    pub fn open(db_path: &str) -> ApiResult<Self> {
        Ok(Self::new(
            Arc::new(ConfigManager::new(db_path)?),
            Arc::new(ParameterImporter::new(db_path)?),
        ))
    }

    // ===== 配置 =====

    pub fn get_settings(&self) -> ApiResult<CalculationSettings> {
        Ok(self.config_manager.load_settings()?)
    }

    /// 整体更新计算配置
    pub fn update_settings(&self, settings: &CalculationSettings) -> ApiResult<()> {
        if !(settings.default_temperature > 0.0) {
            return Err(ApiError::ValidationError(format!(
                "默认温度必须为正值: {}",
                settings.default_temperature
            )));
        }
        if !settings.asymmetry_lambda.is_finite() || settings.asymmetry_lambda < 0.0 {
            return Err(ApiError::ValidationError(format!(
                "非对称参数 λ 必须为非负数: {}",
                settings.asymmetry_lambda
            )));
        }
        if settings.quadrature.panels == 0 || settings.quadrature.points == 0 {
            return Err(ApiError::ValidationError("积分子区间数与节点数必须为正".to_string()));
        }
        if !(settings.hydrogen_tolerance > 0.0) || settings.hydrogen_max_iterations == 0 {
            return Err(ApiError::ValidationError("含 H 体系迭代参数必须为正".to_string()));
        }

        self.config_manager.save_settings(settings)?;
        info!(?settings, "计算配置已更新");
        Ok(())
    }

    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        Ok(self.config_manager.get_config_snapshot()?)
    }

    pub fn restore_config_snapshot(&self, snapshot_json: &str) -> ApiResult<usize> {
        Ok(self.config_manager.restore_config_from_snapshot(snapshot_json)?)
    }

    // ===== 导入 =====

    pub fn import_elements(&self, file_path: &str) -> ApiResult<ImportSummary> {
        Ok(self.importer.import_elements(Path::new(file_path))?)
    }

    pub fn import_first_order(&self, file_path: &str) -> ApiResult<ImportSummary> {
        Ok(self.importer.import_first_order(Path::new(file_path))?)
    }
}
