//! 会话层错误
//!
//! 引擎侧错误在分发边界就地恢复为文本，不会出现在这里；只有远端模型调用与 Key 校验会上抛，
//! 使调用方能区分「AI 不可用」和「AI 已回答但某条子命令失败」。

use thiserror::Error;

use crate::llm::{KeyValidationError, LlmError};

/// 服务不可用时附带的降级提示
pub const DIRECT_COMMAND_HINT: &str =
    "You can still use direct commands such as reset_view, switch_to_cartoon or zoom_chain A.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("AI assistant is unavailable: {0}. {}", DIRECT_COMMAND_HINT)]
    Service(#[from] LlmError),

    #[error("Invalid API key format: {0}")]
    Validation(#[from] KeyValidationError),
}

impl SessionError {
    pub fn is_service_failure(&self) -> bool {
        matches!(self, SessionError::Service(_))
    }
}
