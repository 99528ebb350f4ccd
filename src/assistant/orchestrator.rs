//! AI 编排：拼提示词 -> 调模型 -> 提取指令 -> 逐条复用直接解析器并顺序分发
//!
//! 模型调用失败时直接上抛 LlmError，不分发任何命令；子命令失败只影响自己那一行结果。

use std::sync::Arc;
use std::time::Duration;

use crate::assistant::{build_system_prompt, extract_directives, AssistantContext};
use crate::commands::{CommandExecutor, CommandOutcome, DirectCommandParser};
use crate::core::Message;
use crate::llm::{LlmClient, LlmError};

/// 一次 AI 回合的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub narrative: String,
    pub outcomes: Vec<CommandOutcome>,
    pub commands_executed: Vec<String>,
}

impl AssistantReply {
    /// 叙述 + 空行 + 每条命令结果一行
    pub fn rendered_text(&self) -> String {
        let results = self
            .outcomes
            .iter()
            .map(|o| o.message.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        match (self.narrative.is_empty(), results.is_empty()) {
            (_, true) => self.narrative.clone(),
            (true, false) => results,
            (false, false) => format!("{}\n\n{}", self.narrative, results),
        }
    }
}

pub struct AssistantOrchestrator {
    llm: Arc<dyn LlmClient>,
    executor: Arc<CommandExecutor>,
    parser: Arc<DirectCommandParser>,
    request_timeout: Duration,
}

impl AssistantOrchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        executor: Arc<CommandExecutor>,
        parser: Arc<DirectCommandParser>,
        request_timeout_secs: u64,
    ) -> Self {
        Self {
            llm,
            executor,
            parser,
            request_timeout: Duration::from_secs(request_timeout_secs.max(1)),
        }
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    pub async fn process(
        &self,
        message: &str,
        context: &AssistantContext,
    ) -> Result<AssistantReply, LlmError> {
        let system = build_system_prompt(self.executor.registry(), context);
        let messages = vec![Message::system(system), Message::user(message)];

        let reply = tokio::time::timeout(self.request_timeout, self.llm.complete(&messages))
            .await
            .map_err(|_| LlmError::Timeout(self.request_timeout.as_secs()))??;

        let parsed = extract_directives(&reply);
        tracing::debug!(
            model = self.llm.model_name(),
            directives = parsed.directives.len(),
            "assistant reply received"
        );

        let mut outcomes = Vec::new();
        let mut commands_executed = Vec::new();
        for body in &parsed.directives {
            let Some(command) = self.parser.parse(body) else {
                tracing::debug!(directive = %body, "skipping unrecognized directive");
                continue;
            };
            let outcome = self.executor.dispatch_parsed(&command).await;
            commands_executed.push(command.name);
            outcomes.push(outcome);
        }

        Ok(AssistantReply {
            narrative: parsed.narrative,
            outcomes,
            commands_executed,
        })
    }
}
