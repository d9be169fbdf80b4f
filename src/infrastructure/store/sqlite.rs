//! SQLite 存储实现
//!
//! 使用 SQLite 作为后端，对话记录追加写入 `chat_history` 表

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;

use crate::core::store::{ChatRecord, ChatRepository};
use crate::errors::{ChatbotError, Result};

/// 内存数据库的路径标识
pub const IN_MEMORY_PATH: &str = ":memory:";

/// SQLite 存储
///
/// 连接放在互斥锁后，所有数据库操作都在阻塞线程池中执行。
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// 创建新的 SQLite 存储
    ///
    /// 如果数据库文件或其所在目录不存在，会自动创建
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if db_path == Path::new(IN_MEMORY_PATH) {
            return Self::new_in_memory();
        }

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// 创建内存数据库（用于测试）
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// 初始化数据库表结构
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(|e| {
            ChatbotError::StorageError(format!("Failed to acquire database lock: {}", e))
        })?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS chat_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_message TEXT NOT NULL,
                ai_message TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chat_history_created_at ON chat_history(created_at);
            ",
        )?;

        Ok(())
    }

    /// 检查数据库是否可用
    pub async fn ping(&self) -> Result<()> {
        self.execute(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }

    /// 按写入顺序读取最近的记录
    ///
    /// 仅用于校验和排查，不属于存储接口。
    pub async fn load_recent(&self, limit: usize) -> Result<Vec<ChatRecord>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_message, ai_message, created_at FROM (
                    SELECT id, user_message, ai_message, created_at
                    FROM chat_history ORDER BY id DESC LIMIT ?1
                 ) ORDER BY id ASC",
            )?;

            let rows = stmt.query_map([limit as i64], |row| {
                let created_at: String = row.get(2)?;
                let created_at = DateTime::parse_from_rfc3339(&created_at)
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
                    })?
                    .with_timezone(&Utc);

                Ok(ChatRecord {
                    user_message: row.get(0)?,
                    ai_message: row.get(1)?,
                    created_at,
                })
            })?;

            let mut records = Vec::new();
            for record in rows {
                records.push(record?);
            }
            Ok(records)
        })
        .await
    }

    /// 记录总数
    pub async fn count(&self) -> Result<usize> {
        self.execute(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM chat_history", [], |row| row.get(0))?;
            Ok(n as usize)
        })
        .await
    }

    /// 在阻塞线程池中执行数据库操作
    async fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|e| {
                ChatbotError::StorageError(format!("Failed to acquire database lock: {}", e))
            })?;
            f(&mut conn)
        })
        .await?
    }
}

#[async_trait]
impl ChatRepository for SqliteStore {
    async fn save(&self, record: ChatRecord, deadline: Duration) -> Result<()> {
        let insert = self.execute(move |conn| {
            conn.execute(
                "INSERT INTO chat_history (user_message, ai_message, created_at)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![
                    &record.user_message,
                    &record.ai_message,
                    record.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        });

        // 超时后阻塞线程里的写入可能仍会完成
        tokio::time::timeout(deadline, insert)
            .await
            .map_err(|_| ChatbotError::DeadlineExceeded(deadline))?
    }
}
