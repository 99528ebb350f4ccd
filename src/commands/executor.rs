//! 命令执行器
//!
//! 持有 CommandRegistry、查看器能力与单次超时。dispatch(name, params) 永不返回错误：
//! 未知命令给出帮助文本，执行失败或超时转为该命令自己的失败提示；每次调用输出结构化审计日志（JSON）。

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::time::timeout;

use crate::commands::{CommandParams, CommandRegistry, ParsedCommand};
use crate::viewer::ViewerCapability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Succeeded,
    Failed,
    Unknown,
}

/// 单次分发结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    pub name: String,
    pub status: CommandStatus,
    pub message: String,
}

/// 命令执行器：对每次调用施加超时，并把所有失败恢复为文本
pub struct CommandExecutor {
    registry: Arc<CommandRegistry>,
    viewer: Arc<dyn ViewerCapability>,
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(
        registry: Arc<CommandRegistry>,
        viewer: Arc<dyn ViewerCapability>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            registry,
            viewer,
            timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// 执行并返回结构化结果
    pub async fn dispatch(&self, name: &str, params: &CommandParams) -> CommandOutcome {
        let start = Instant::now();

        let Some(command) = self.registry.get(name) else {
            audit(name, "unknown", start);
            return CommandOutcome {
                name: name.to_string(),
                status: CommandStatus::Unknown,
                message: self.registry.help_text(name),
            };
        };

        let result = timeout(self.timeout, command.execute(self.viewer.as_ref(), params)).await;

        let (status, message, outcome) = match result {
            Ok(Ok(text)) => (CommandStatus::Succeeded, text, "ok"),
            Ok(Err(e)) => {
                tracing::warn!(command = name, error = %e, "command failed");
                (CommandStatus::Failed, command.failure_message(params), "error")
            }
            Err(_) => {
                tracing::warn!(command = name, timeout_secs = self.timeout.as_secs(), "command timed out");
                (CommandStatus::Failed, command.failure_message(params), "timeout")
            }
        };
        audit(name, outcome, start);

        CommandOutcome {
            name: name.to_string(),
            status,
            message,
        }
    }

    pub async fn dispatch_parsed(&self, parsed: &ParsedCommand) -> CommandOutcome {
        self.dispatch(&parsed.name, &parsed.params).await
    }

    /// 执行并只返回给用户看的文本
    pub async fn execute(&self, name: &str, params: &CommandParams) -> String {
        self.dispatch(name, params).await.message
    }
}

fn audit(command: &str, outcome: &str, start: Instant) {
    let audit = serde_json::json!({
        "event": "command_audit",
        "command": command,
        "outcome": outcome,
        "duration_ms": start.elapsed().as_millis() as u64,
    });
    tracing::info!(audit = %audit.to_string(), "command");
}
