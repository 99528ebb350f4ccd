//! AI 助手层：提示词构建、指令提取与编排

pub mod directive;
pub mod orchestrator;
pub mod prompt;

pub use directive::{extract_directives, ParsedReply};
pub use orchestrator::{AssistantOrchestrator, AssistantReply};
pub use prompt::build_system_prompt;

use serde::Serialize;

use crate::viewer::Representation;

/// 调用模型时附带的查看器上下文（每次请求前从控制器取快照）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AssistantContext {
    pub structure_name: Option<String>,
    pub representation: Representation,
    pub has_structure_loaded: bool,
}

/// 能提供助手上下文快照的查看器
pub trait ContextSource: Send + Sync {
    fn assistant_context(&self) -> AssistantContext;
}
