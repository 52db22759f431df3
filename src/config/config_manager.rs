// ==========================================
// 合金熔体活度计算 - 配置管理器
// ==========================================
// 职责: 计算配置加载、查询、覆写、快照
// 存储: config_kv 表 (key-value, 全局)
// ==========================================

use crate::config::calculation_settings::CalculationSettings;
use crate::db::open_sqlite_connection;
use crate::domain::types::PhaseState;
use crate::engine::extrapolation::ExtrapolationModel;
use crate::engine::quadrature::QuadratureSettings;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.lock()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 读取配置值，不存在时返回默认值
    pub fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::debug!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 读取并解析配置；缺失或格式错误时回退默认值
    fn get_parsed<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr + Display + Copy,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    // ===== 计算配置 =====

    pub fn get_asymmetry_lambda(&self) -> RepositoryResult<f64> {
        self.get_parsed(config_keys::ASYMMETRY_LAMBDA, 0.0)
    }

    pub fn get_entropy_enabled(&self) -> RepositoryResult<bool> {
        let Some(raw) = self.get_config_value(config_keys::ENTROPY_ENABLED)? else {
            return Ok(false);
        };
        match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => {
                tracing::warn!(
                    config_key = config_keys::ENTROPY_ENABLED,
                    raw_value = %raw,
                    "过剩熵开关配置格式错误，使用默认值 false"
                );
                Ok(false)
            }
        }
    }

    /// 默认温度（K），非正值回退 1873
    pub fn get_default_temperature(&self) -> RepositoryResult<f64> {
        let value: f64 = self.get_parsed(config_keys::DEFAULT_TEMPERATURE, 1873.0)?;
        if value > 0.0 && value.is_finite() {
            Ok(value)
        } else {
            tracing::warn!(
                config_key = config_keys::DEFAULT_TEMPERATURE,
                value,
                "默认温度非正，使用 1873 K"
            );
            Ok(1873.0)
        }
    }

    pub fn get_default_state(&self) -> RepositoryResult<PhaseState> {
        self.get_parsed(config_keys::DEFAULT_STATE, PhaseState::Liquid)
    }

    pub fn get_default_extrapolation(&self) -> RepositoryResult<ExtrapolationModel> {
        self.get_parsed(config_keys::DEFAULT_EXTRAPOLATION, ExtrapolationModel::Uem1)
    }

    pub fn get_quadrature_settings(&self) -> RepositoryResult<QuadratureSettings> {
        let defaults = QuadratureSettings::default();
        let panels = self.get_parsed(config_keys::QUADRATURE_PANELS, defaults.panels)?;
        let points = self.get_parsed(config_keys::QUADRATURE_POINTS, defaults.points)?;
        Ok(QuadratureSettings {
            panels: panels.max(1),
            points: points.max(1),
        })
    }

    pub fn get_hydrogen_max_iterations(&self) -> RepositoryResult<usize> {
        self.get_parsed(config_keys::HYDROGEN_MAX_ITERATIONS, 1000)
    }

    pub fn get_hydrogen_tolerance(&self) -> RepositoryResult<f64> {
        self.get_parsed(config_keys::HYDROGEN_TOLERANCE, 1e-6)
    }

    /// 汇总全部计算配置
    pub fn load_settings(&self) -> RepositoryResult<CalculationSettings> {
        Ok(CalculationSettings {
            asymmetry_lambda: self.get_asymmetry_lambda()?,
            entropy_enabled: self.get_entropy_enabled()?,
            default_temperature: self.get_default_temperature()?,
            default_state: self.get_default_state()?,
            default_extrapolation: self.get_default_extrapolation()?,
            quadrature: self.get_quadrature_settings()?,
            hydrogen_max_iterations: self.get_hydrogen_max_iterations()?,
            hydrogen_tolerance: self.get_hydrogen_tolerance()?,
        })
    }

    /// 按 CalculationSettings 整体写回
    pub fn save_settings(&self, settings: &CalculationSettings) -> RepositoryResult<()> {
        self.set_config_value(config_keys::ASYMMETRY_LAMBDA, &settings.asymmetry_lambda.to_string())?;
        self.set_config_value(config_keys::ENTROPY_ENABLED, &settings.entropy_enabled.to_string())?;
        self.set_config_value(config_keys::DEFAULT_TEMPERATURE, &settings.default_temperature.to_string())?;
        self.set_config_value(config_keys::DEFAULT_STATE, settings.default_state.as_str())?;
        self.set_config_value(config_keys::DEFAULT_EXTRAPOLATION, settings.default_extrapolation.as_str())?;
        self.set_config_value(config_keys::QUADRATURE_PANELS, &settings.quadrature.panels.to_string())?;
        self.set_config_value(config_keys::QUADRATURE_POINTS, &settings.quadrature.points.to_string())?;
        self.set_config_value(
            config_keys::HYDROGEN_MAX_ITERATIONS,
            &settings.hydrogen_max_iterations.to_string(),
        )?;
        self.set_config_value(config_keys::HYDROGEN_TOLERANCE, &settings.hydrogen_tolerance.to_string())?;
        Ok(())
    }

    // ===== 快照 =====

    /// 导出全部配置为 JSON 快照
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT key, value FROM config_kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&json!(config_map))
            .map_err(|e| RepositoryError::InternalError(format!("快照序列化失败: {}", e)))
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 覆盖同名配置；`__meta_` 前缀的元信息不回写
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> RepositoryResult<usize> {
        let config_map: BTreeMap<String, String> =
            serde_json::from_str(snapshot_json).map_err(|e| RepositoryError::FieldValueError {
                field: "snapshot_json".to_string(),
                message: e.to_string(),
            })?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            if key.starts_with("__meta_") {
                continue;
            }
            count += tx.execute(
                "INSERT INTO config_kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
                params![key, value],
            )?;
        }

        tx.commit()?;
        tracing::info!(restored = count, "配置快照已恢复");
        Ok(count)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 模型
    pub const ASYMMETRY_LAMBDA: &str = "asymmetry_lambda";
    pub const ENTROPY_ENABLED: &str = "entropy_enabled";

    // 默认计算条件
    pub const DEFAULT_TEMPERATURE: &str = "default_temperature";
    pub const DEFAULT_STATE: &str = "default_state";
    pub const DEFAULT_EXTRAPOLATION: &str = "default_extrapolation";

    // 数值积分
    pub const QUADRATURE_PANELS: &str = "quadrature_panels";
    pub const QUADRATURE_POINTS: &str = "quadrature_points";

    // 含 H 体系体积迭代
    pub const HYDROGEN_MAX_ITERATIONS: &str = "hydrogen_max_iterations";
    pub const HYDROGEN_TOLERANCE: &str = "hydrogen_tolerance";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_empty_table_yields_defaults() {
        let cm = manager();
        assert_eq!(cm.load_settings().unwrap(), CalculationSettings::default());
    }

    #[test]
    fn test_set_and_read_back() {
        let cm = manager();
        cm.set_config_value(config_keys::ASYMMETRY_LAMBDA, "5").unwrap();
        cm.set_config_value(config_keys::ENTROPY_ENABLED, "true").unwrap();
        cm.set_config_value(config_keys::DEFAULT_EXTRAPOLATION, "toop_kohler").unwrap();
        cm.set_config_value(config_keys::DEFAULT_STATE, "solid").unwrap();

        let s = cm.load_settings().unwrap();
        assert_eq!(s.asymmetry_lambda, 5.0);
        assert!(s.entropy_enabled);
        assert_eq!(s.default_extrapolation, ExtrapolationModel::ToopKohler);
        assert_eq!(s.default_state, PhaseState::Solid);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let cm = manager();
        cm.set_config_value(config_keys::ASYMMETRY_LAMBDA, "abc").unwrap();
        cm.set_config_value(config_keys::ENTROPY_ENABLED, "maybe").unwrap();
        cm.set_config_value(config_keys::DEFAULT_TEMPERATURE, "-5").unwrap();
        cm.set_config_value(config_keys::QUADRATURE_PANELS, "0").unwrap();

        assert_eq!(cm.get_asymmetry_lambda().unwrap(), 0.0);
        assert!(!cm.get_entropy_enabled().unwrap());
        assert_eq!(cm.get_default_temperature().unwrap(), 1873.0);
        assert_eq!(cm.get_quadrature_settings().unwrap().panels, 1);
    }

    #[test]
    fn test_default_temperature_rejects_non_finite() {
        let cm = manager();
        assert_eq!(cm.get_default_temperature().unwrap(), 1873.0);

        cm.set_config_value(config_keys::DEFAULT_TEMPERATURE, "1823.5").unwrap();
        assert_eq!(cm.get_default_temperature().unwrap(), 1823.5);

        for raw in ["inf", "NaN", "0"] {
            cm.set_config_value(config_keys::DEFAULT_TEMPERATURE, raw).unwrap();
            assert_eq!(cm.get_default_temperature().unwrap(), 1873.0, "raw = {}", raw);
        }
    }

    #[test]
    fn test_snapshot_restore_skips_meta() {
        let cm = manager();
        cm.save_settings(&CalculationSettings {
            asymmetry_lambda: 8.0,
            ..CalculationSettings::default()
        })
        .unwrap();
        let snapshot = cm.get_config_snapshot().unwrap();

        cm.set_config_value(config_keys::ASYMMETRY_LAMBDA, "0").unwrap();
        let mut map: BTreeMap<String, String> = serde_json::from_str(&snapshot).unwrap();
        map.insert("__meta_label".to_string(), "回滚".to_string());
        let restored = cm
            .restore_config_from_snapshot(&serde_json::to_string(&map).unwrap())
            .unwrap();

        assert_eq!(restored, 9);
        assert_eq!(cm.get_asymmetry_lambda().unwrap(), 8.0);
        assert_eq!(cm.get_config_value("__meta_label").unwrap(), None);
    }

    #[test]
    fn test_restore_rejects_bad_json() {
        let cm = manager();
        assert!(cm.restore_config_from_snapshot("not json").is_err());
    }
}
