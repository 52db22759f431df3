// ==========================================
// 合金熔体活度计算 - 元素参数仓储
// ==========================================
// 表: MiedemaParameter
// 红线: 仓储不含计算逻辑；查询失败降级为 exists=false，不向上抛错
// ==========================================

use crate::db::open_readonly_connection;
use crate::domain::element::{surface_volume, Element};
use crate::domain::types::HybridClass;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;

const SELECT_COLUMNS: &str = r#"
    SELECT Symbol, phi, nws, V, u, alpha_beta, hybirdvalue, isTrans,
           dHtrans, mass, Tm, Tb, B, G
    FROM MiedemaParameter
"#;

// ==========================================
// ElementSource - 元素参数来源
// ==========================================
/// 元素参数来源
///
/// 约定: 永不失败；未知符号或参数库不可用时返回 `Element::missing`
pub trait ElementSource: Send + Sync {
    fn element(&self, symbol: &str) -> Element;

    /// 批量加载（每个符号一份新的 Element）
    fn elements(&self, symbols: &[&str]) -> HashMap<String, Element> {
        symbols
            .iter()
            .map(|s| (s.to_string(), self.element(s)))
            .collect()
    }
}

// ==========================================
// ElementRepository - MiedemaParameter 表仓储
// ==========================================
pub struct ElementRepository {
    db_path: String,
}

impl ElementRepository {
    /// 创建新的 ElementRepository 实例（不立即连接）
    pub fn new(db_path: &str) -> Self {
        Self {
            db_path: db_path.to_string(),
        }
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    fn get_conn(&self) -> RepositoryResult<Connection> {
        open_readonly_connection(&self.db_path).map_err(|e| {
            RepositoryError::DatabaseConnectionError(format!("{}: {}", self.db_path, e))
        })
    }

    /// 按元素符号查询
    ///
    /// # 返回
    /// - Ok(Some(Element)): 找到参数记录
    /// - Ok(None): 无此元素
    /// - Err: 数据库错误
    pub fn find_by_symbol(&self, symbol: &str) -> RepositoryResult<Option<Element>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE Symbol = ?1", SELECT_COLUMNS);
        let element = conn
            .query_row(&sql, params![symbol], map_element_row)
            .optional()?;
        Ok(element)
    }

    /// 查询全部元素符号（按符号排序）
    pub fn list_symbols(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT Symbol FROM MiedemaParameter ORDER BY Symbol")?;
        let symbols = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(symbols)
    }

    /// 查询原子量（换算口径时使用），缺失返回 NaN
    pub fn atomic_mass(&self, symbol: &str) -> f64 {
        let element = self.element(symbol);
        if element.exists && element.mass > 0.0 {
            element.mass
        } else {
            f64::NAN
        }
    }
}

impl ElementSource for ElementRepository {
    fn element(&self, symbol: &str) -> Element {
        match self.find_by_symbol(symbol) {
            Ok(Some(element)) => element,
            Ok(None) => {
                tracing::debug!(symbol, "MiedemaParameter 无此元素，按缺失处理");
                Element::missing(symbol)
            }
            Err(e) => {
                tracing::warn!(symbol, db_path = %self.db_path, error = %e, "元素参数读取失败，按缺失处理");
                Element::missing(symbol)
            }
        }
    }
}

// ==========================================
// InMemoryElementSource - 内存元素表
// ==========================================
/// 不依赖参数库的元素来源（导入预览、离线计算）
#[derive(Debug, Clone, Default)]
pub struct InMemoryElementSource {
    elements: HashMap<String, Element>,
}

impl InMemoryElementSource {
    pub fn from_elements<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = Element>,
    {
        Self {
            elements: elements
                .into_iter()
                .map(|e| (e.symbol.clone(), e))
                .collect(),
        }
    }

    pub fn insert(&mut self, element: Element) {
        self.elements.insert(element.symbol.clone(), element);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl ElementSource for InMemoryElementSource {
    fn element(&self, symbol: &str) -> Element {
        self.elements
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Element::missing(symbol))
    }
}

/// 行映射
fn map_element_row(row: &Row<'_>) -> rusqlite::Result<Element> {
    Ok(Element {
        symbol: row.get(0)?,
        phi: row.get(1)?,
        nws: row.get(2)?,
        v: surface_volume(row.get(3)?),
        u: row.get(4)?,
        hybrid: HybridClass::from_db_str(&row.get::<_, Option<String>>(5)?.unwrap_or_default()),
        hybrid_value: row.get::<_, Option<f64>>(6)?.unwrap_or(0.0),
        is_trans: row.get::<_, Option<i64>>(7)?.unwrap_or(0) != 0,
        dh_trans: row.get::<_, Option<f64>>(8)?.unwrap_or(0.0),
        mass: row.get(9)?,
        tm: row.get(10)?,
        tb: row.get(11)?,
        bulk_modulus: row.get::<_, Option<f64>>(12)?.unwrap_or(0.0),
        shear_modulus: row.get::<_, Option<f64>>(13)?.unwrap_or(0.0),
        exists: true,
    })
}
