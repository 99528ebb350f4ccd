//! LLM 客户端抽象
//!
//! 后端（OpenAI 兼容 / Mock）实现 LlmClient::complete（非流式）；错误统一为 LlmError，
//! 会话层据此区分「AI 不可用」与「AI 已回答但某条子命令失败」。

use async_trait::async_trait;
use thiserror::Error;

use crate::core::Message;
use crate::llm::KeyValidationError;

/// 远端模型服务错误（鉴权、配额、限流、连接等），向会话层上抛
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Connection failed: {0}")]
    Connectivity(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Invalid API key: {0}")]
    InvalidKey(#[from] KeyValidationError),

    #[error("API error: {0}")]
    ApiError(String),
}

/// LLM 客户端 trait：非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// 模型名（日志用）
    fn model_name(&self) -> &str {
        "unknown"
    }
}
