//! 命令注册表
//!
//! 所有命令实现 ViewerCommand trait（name / description / 参数形状 / 失败提示 / execute），由 CommandRegistry 按名注册与查找，
//! 保留注册顺序（帮助文本与 AI 命令目录都按此顺序输出）。启动时构建一次，之后只读。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::commands::{CommandParams, ParamKind};
use crate::viewer::{ViewerCapability, ViewerError};

/// 命令 trait：名称、描述（供 AI 目录）、参数形状、失败提示、异步执行
#[async_trait]
pub trait ViewerCommand: Send + Sync {
    /// 命令名（全局唯一）
    fn name(&self) -> &str;

    /// 一行用途描述
    fn description(&self) -> &str;

    fn param_kind(&self) -> ParamKind {
        ParamKind::None
    }

    /// 执行失败时给用户看的一句话（不含原始错误文本）
    fn failure_message(&self, _params: &CommandParams) -> String {
        format!("Failed to run {}.", self.name())
    }

    async fn execute(
        &self,
        viewer: &dyn ViewerCapability,
        params: &CommandParams,
    ) -> Result<String, ViewerError>;
}

/// 命令注册表：按注册顺序存储 Arc<dyn ViewerCommand>，名称索引用于查找
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<dyn ViewerCommand>>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册命令；重名属于编程错误，直接 panic
    pub fn register(&mut self, command: impl ViewerCommand + 'static) {
        let name = command.name().to_string();
        assert!(
            !self.index.contains_key(&name),
            "duplicate command registered: {name}"
        );
        self.index.insert(name, self.commands.len());
        self.commands.push(Arc::new(command));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ViewerCommand>> {
        self.index.get(name).map(|&i| self.commands[i].clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// 按注册顺序返回命令名
    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// 命令目录（每行 `- name: description`，链参数命令附带用法），用于 AI 提示词
    pub fn catalog(&self) -> String {
        self.commands
            .iter()
            .map(|c| match c.param_kind() {
                ParamKind::Chain => format!("- {} <chain>: {}", c.name(), c.description()),
                ParamKind::None => format!("- {}: {}", c.name(), c.description()),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 未知命令时的帮助文本，列出全部已注册命令（顺序固定）
    pub fn help_text(&self, unknown: &str) -> String {
        format!(
            "Unknown command '{}'. Available commands: {}",
            unknown,
            self.names().join(", ")
        )
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
