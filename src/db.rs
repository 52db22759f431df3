// ==========================================
// 合金熔体活度计算 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一参数库连接的 PRAGMA 与 busy_timeout
// - 参数库只读访问：每次查询一个短连接，无事务要求
// ==========================================

use rusqlite::OptionalExtension;
use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version（与 `sql/schema.sql` 对齐）
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 参数库建表脚本
pub const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

/// 内置参数种子（近似文献值）
pub const SEED_SQL: &str = include_str!("../sql/seed_parameters.sql");

/// 配置 SQLite 连接的统一 PRAGMA
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 以只读方式打开参数库（文件不存在时报错，不会隐式建库）
pub fn open_readonly_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(conn)
}

/// 建表（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

/// 建表并写入内置参数种子
pub fn init_seeded(conn: &Connection) -> rusqlite::Result<()> {
    init_schema(conn)?;
    conn.execute_batch(SEED_SQL)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 默认参数库路径
///
/// 优先级: 环境变量 MIEDEMA_DB_PATH > 用户数据目录 > 当前目录
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var("MIEDEMA_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./miedema_parameters.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("miedema-melts");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("miedema_parameters.db");
        } else {
            tracing::warn!(dir = %dir.display(), "无法创建数据目录，回退到当前目录");
        }
    }

    path.to_string_lossy().to_string()
}
