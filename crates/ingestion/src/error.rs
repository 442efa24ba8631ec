//! Ingestion 错误类型

use std::path::PathBuf;

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 一行无法解析为 IngestEvent
    #[error("line {line}: failed to parse ingest event: {message}")]
    ParseFailed {
        /// 行号 (从 1 开始)
        line: usize,
        /// 错误消息
        message: String,
    },

    /// 读取输入失败
    #[error("failed to read {path}: {source}", path = path.display())]
    Read {
        /// 输入路径
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 读取流失败 (无路径)
    #[error("io error at line {line}: {source}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

impl IngestionError {
    /// 是否为可跳过的单行错误
    pub fn is_parse(&self) -> bool {
        matches!(self, IngestionError::ParseFailed { .. })
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
