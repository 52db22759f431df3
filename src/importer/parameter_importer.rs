// ==========================================
// 合金熔体活度计算 - 参数导入器
// ==========================================
// 职责: 将 CSV 中的 Miedema 元素参数与一阶相互作用参数写入参数库
// 流程: 解析 → 列检查 → 逐行校验 → 单事务写入
// 规则: 校验失败的行记入 violations 并跳过，不中断整批导入
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::interaction::TEMPERATURE_FORMULA_MARKER;
use crate::domain::types::HybridClass;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvParser, RawRecord};
use crate::repository::temperature_formula::TemperatureFormula;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use uuid::Uuid;

const ELEMENT_COLUMNS: [&str; 8] = ["Symbol", "phi", "nws", "V", "u", "mass", "Tm", "Tb"];
const FIRST_ORDER_COLUMNS: [&str; 4] = ["solv", "solui", "soluj", "T"];

// ==========================================
// 导入结果
// ==========================================

/// 单行校验违规
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowViolation {
    pub row_number: usize,          // 文件行号
    pub key: Option<String>,        // 行标识（元素符号或 solv/solui/soluj）
    pub field: String,              // 违规字段
    pub message: String,            // 违规描述
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub batch_id: String,           // 批次 ID（UUID）
    pub imported_at: DateTime<Utc>,
    pub total_rows: usize,
    pub imported: usize,
    pub blocked: usize,
    pub violations: Vec<RowViolation>,
    pub elapsed_ms: u128,
}

// 校验后的行
struct ElementRow {
    symbol: String,
    phi: f64,
    nws: f64,
    v: f64,
    u: f64,
    hybrid: HybridClass,
    hybrid_value: f64,
    is_trans: bool,
    dh_trans: f64,
    mass: f64,
    tm: f64,
    tb: f64,
    bulk_modulus: Option<f64>,
    shear_modulus: Option<f64>,
}

struct FirstOrderRow {
    solvent: String,
    solute_i: String,
    solute_j: String,
    eji: Option<String>,
    sji: Option<String>,
    rank: Option<String>,
    temperature: String,
    reference: Option<String>,
}

// ==========================================
// ParameterImporter
// ==========================================
pub struct ParameterImporter {
    conn: Arc<Mutex<Connection>>,
    parser: CsvParser,
}

impl ParameterImporter {
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            parser: CsvParser,
        }
    }

    /// 导入 MiedemaParameter（同符号覆盖）
    pub fn import_elements(&self, file_path: &Path) -> ImportResult<ImportSummary> {
        let (headers, records) = self.parser.parse_file(file_path)?;
        self.import_element_records(&headers, &records)
    }

    /// 导入一阶相互作用参数（同 solv/solui/soluj/T 覆盖）
    pub fn import_first_order(&self, file_path: &Path) -> ImportResult<ImportSummary> {
        let (headers, records) = self.parser.parse_file(file_path)?;
        self.import_first_order_records(&headers, &records)
    }

    pub fn import_element_records(&self, headers: &[String], records: &[RawRecord]) -> ImportResult<ImportSummary> {
        let started = Instant::now();
        require_columns(headers, &ELEMENT_COLUMNS)?;

        let mut violations = Vec::new();
        let rows: Vec<ElementRow> = records
            .iter()
            .filter_map(|record| match validate_element(record) {
                Ok(row) => Some(row),
                Err(v) => {
                    violations.push(v);
                    None
                }
            })
            .collect();

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;
        for row in &rows {
            tx.execute(
                "INSERT OR REPLACE INTO MiedemaParameter
                    (Symbol, phi, nws, V, u, alpha_beta, hybirdvalue, isTrans, dHtrans, mass, Tm, Tb, B, G)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    row.symbol,
                    row.phi,
                    row.nws,
                    row.v,
                    row.u,
                    row.hybrid.as_str(),
                    row.hybrid_value,
                    row.is_trans as i64,
                    row.dh_trans,
                    row.mass,
                    row.tm,
                    row.tb,
                    row.bulk_modulus,
                    row.shear_modulus,
                ],
            )?;
        }
        tx.commit()
            .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;

        let summary = summarize(records.len(), rows.len(), violations, started);
        tracing::info!(
            total = summary.total_rows,
            imported = summary.imported,
            blocked = summary.blocked,
            "元素参数导入完成"
        );
        Ok(summary)
    }

    pub fn import_first_order_records(&self, headers: &[String], records: &[RawRecord]) -> ImportResult<ImportSummary> {
        let started = Instant::now();
        require_columns(headers, &FIRST_ORDER_COLUMNS)?;

        let mut violations = Vec::new();
        let rows: Vec<FirstOrderRow> = records
            .iter()
            .filter_map(|record| match validate_first_order(record) {
                Ok(row) => Some(row),
                Err(v) => {
                    violations.push(v);
                    None
                }
            })
            .collect();

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;
        for row in &rows {
            tx.execute(
                "INSERT OR REPLACE INTO first_order (solv, solui, soluj, eji, Rank, sji, T, reference)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    row.solvent,
                    row.solute_i,
                    row.solute_j,
                    row.eji,
                    row.rank,
                    row.sji,
                    row.temperature,
                    row.reference,
                ],
            )?;
        }
        tx.commit()
            .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;

        let summary = summarize(records.len(), rows.len(), violations, started);
        tracing::info!(
            total = summary.total_rows,
            imported = summary.imported,
            blocked = summary.blocked,
            "一阶相互作用参数导入完成"
        );
        Ok(summary)
    }

    fn lock(&self) -> ImportResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))
    }
}

fn summarize(total_rows: usize, imported: usize, violations: Vec<RowViolation>, started: Instant) -> ImportSummary {
    ImportSummary {
        batch_id: Uuid::new_v4().to_string(),
        imported_at: Utc::now(),
        total_rows,
        imported,
        blocked: violations.len(),
        violations,
        elapsed_ms: started.elapsed().as_millis(),
    }
}

fn require_columns(headers: &[String], required: &[&str]) -> ImportResult<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == column))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ImportError::MissingColumn(missing.join(", ")))
    }
}

// ==========================================
// 行校验
// ==========================================

fn violation(record: &RawRecord, key: Option<&str>, field: &str, message: impl Into<String>) -> RowViolation {
    RowViolation {
        row_number: record.row_number,
        key: key.map(str::to_string),
        field: field.to_string(),
        message: message.into(),
    }
}

fn required_text<'a>(record: &'a RawRecord, key: Option<&str>, field: &str) -> Result<&'a str, RowViolation> {
    record
        .get(field)
        .ok_or_else(|| violation(record, key, field, "必填字段为空"))
}

fn number(record: &RawRecord, key: Option<&str>, field: &str) -> Result<f64, RowViolation> {
    let raw = required_text(record, key, field)?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(violation(record, key, field, format!("无法解析为数值: {}", raw))),
    }
}

fn positive(record: &RawRecord, key: Option<&str>, field: &str) -> Result<f64, RowViolation> {
    let value = number(record, key, field)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(violation(record, key, field, format!("必须为正数: {}", value)))
    }
}

fn optional_number(record: &RawRecord, key: Option<&str>, field: &str) -> Result<Option<f64>, RowViolation> {
    match record.get(field) {
        None => Ok(None),
        Some(_) => number(record, key, field).map(Some),
    }
}

fn validate_element(record: &RawRecord) -> Result<ElementRow, RowViolation> {
    let symbol = required_text(record, None, "Symbol")?.to_string();
    let key = Some(symbol.as_str());

    let is_trans = match record.get("isTrans").map(str::to_lowercase).as_deref() {
        None | Some("0") | Some("false") => false,
        Some("1") | Some("true") => true,
        Some(other) => {
            return Err(violation(record, key, "isTrans", format!("应为 0/1: {}", other)));
        }
    };

    let tm = number(record, key, "Tm")?;
    let tb = number(record, key, "Tb")?;
    if tm < 0.0 || tb < 0.0 {
        return Err(violation(record, key, "Tm", "熔点/沸点不能为负"));
    }

    Ok(ElementRow {
        phi: positive(record, key, "phi")?,
        nws: positive(record, key, "nws")?,
        v: positive(record, key, "V")?,
        u: number(record, key, "u")?,
        hybrid: HybridClass::from_db_str(record.get("alpha_beta").unwrap_or("other")),
        hybrid_value: optional_number(record, key, "hybirdvalue")?.unwrap_or(0.0),
        is_trans,
        dh_trans: optional_number(record, key, "dHtrans")?.unwrap_or(0.0),
        mass: positive(record, key, "mass")?,
        tm,
        tb,
        bulk_modulus: optional_number(record, key, "B")?,
        shear_modulus: optional_number(record, key, "G")?,
        symbol,
    })
}

fn validate_coefficient(
    record: &RawRecord,
    key: Option<&str>,
    field: &str,
    is_formula: bool,
) -> Result<Option<String>, RowViolation> {
    let Some(raw) = record.get(field) else {
        return Ok(None);
    };
    let valid = if is_formula {
        TemperatureFormula::parse(raw).is_ok()
    } else {
        raw.parse::<f64>().map(f64::is_finite).unwrap_or(false)
    };
    if valid {
        Ok(Some(raw.to_string()))
    } else {
        Err(violation(record, key, field, format!("系数无法解析: {}", raw)))
    }
}

fn validate_first_order(record: &RawRecord) -> Result<FirstOrderRow, RowViolation> {
    let solvent = required_text(record, None, "solv")?.to_string();
    let solute_i = required_text(record, None, "solui")?.to_string();
    let solute_j = required_text(record, None, "soluj")?.to_string();
    let label = format!("{}/{}/{}", solvent, solute_i, solute_j);
    let key = Some(label.as_str());

    if solute_i == solvent || solute_j == solvent {
        return Err(violation(record, key, "solv", "溶质不能与溶剂相同"));
    }

    let temperature = required_text(record, key, "T")?.to_string();
    let is_formula = temperature == TEMPERATURE_FORMULA_MARKER;
    if !is_formula {
        match temperature.parse::<f64>() {
            Ok(t) if t > 0.0 => {}
            _ => {
                return Err(violation(record, key, "T", format!("温度应为正数或 'T': {}", temperature)));
            }
        }
    }

    let eji = validate_coefficient(record, key, "eji", is_formula)?;
    let sji = validate_coefficient(record, key, "sji", is_formula)?;
    if eji.is_none() && sji.is_none() {
        return Err(violation(record, key, "eji", "eji 与 sji 至少填写一项"));
    }

    Ok(FirstOrderRow {
        eji,
        sji,
        rank: record.get("Rank").map(str::to_string),
        temperature,
        reference: record.get("reference").map(str::to_string),
        solvent,
        solute_i,
        solute_j,
    })
}
