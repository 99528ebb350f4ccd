//! 会话：一次对话的上下文对象
//!
//! 持有查看器、命令执行器、直接命令解析器、可选的 AI 编排器与会话日志。
//! 输入先尝试直接命令，解析不到且配置了模型时交给 AI；两条路径最终都落到同一个执行器。

use std::sync::Arc;

use crate::assistant::{AssistantOrchestrator, ContextSource};
use crate::commands::{builtin_registry, CommandExecutor, CommandRegistry, DirectCommandParser};
use crate::config::{AppConfig, LlmSection};
use crate::core::{ChatMessage, SessionError, SessionLog};
use crate::llm::{resolve_api_key, validate_api_key, ApiKeyStatus, LlmClient, OpenAiClient};
use crate::viewer::{StructureFormat, ViewerCapability, ViewerError};

/// 会话构建器：统一配置命令注册表、模型客户端与超时
pub struct SessionBuilder {
    config: AppConfig,
    registry: Option<CommandRegistry>,
    llm: Option<Arc<dyn LlmClient>>,
    resolve_key: bool,
}

impl SessionBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            registry: None,
            llm: None,
            resolve_key: true,
        }
    }

    /// 替换内置命令注册表
    pub fn with_registry(mut self, registry: CommandRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// 使用指定的模型客户端（跳过 API Key 解析）
    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self.resolve_key = false;
        self
    }

    /// 不启用 AI（只接受直接命令）
    pub fn without_llm(mut self) -> Self {
        self.llm = None;
        self.resolve_key = false;
        self
    }

    pub fn build<V>(self, viewer: Arc<V>) -> Session
    where
        V: ViewerCapability + ContextSource + 'static,
    {
        let registry = Arc::new(self.registry.unwrap_or_else(builtin_registry));
        let capability: Arc<dyn ViewerCapability> = viewer.clone();
        let executor = Arc::new(CommandExecutor::new(
            registry.clone(),
            capability.clone(),
            self.config.commands.timeout_secs,
        ));
        let parser = Arc::new(DirectCommandParser::new(registry));

        let llm = match self.llm {
            Some(llm) => Some(llm),
            None if self.resolve_key => create_llm_from_config(&self.config.llm),
            None => None,
        };
        let assistant = llm.map(|llm| {
            tracing::info!(model = llm.model_name(), "AI assistant enabled");
            AssistantOrchestrator::new(
                llm,
                executor.clone(),
                parser.clone(),
                self.config.llm.timeouts.request,
            )
        });

        Session {
            viewer: capability,
            context: viewer,
            executor,
            parser,
            assistant,
            log: SessionLog::new(self.config.app.history_limit),
            llm_config: self.config.llm,
        }
    }
}

/// 按配置创建模型客户端：Key 缺失或格式不合法时不启用 AI
pub fn create_llm_from_config(cfg: &LlmSection) -> Option<Arc<dyn LlmClient>> {
    let (key, status) = resolve_api_key(cfg.api_key.as_deref());
    match key {
        Some(key) if status.valid => Some(Arc::new(OpenAiClient::new(
            cfg.base_url.as_deref(),
            &cfg.model,
            &key,
        ))),
        Some(_) => {
            tracing::warn!(source = ?status.source, "API key has an invalid format, AI assistant disabled");
            None
        }
        None => {
            tracing::info!("no API key configured, AI assistant disabled");
            None
        }
    }
}

pub struct Session {
    viewer: Arc<dyn ViewerCapability>,
    context: Arc<dyn ContextSource>,
    executor: Arc<CommandExecutor>,
    parser: Arc<DirectCommandParser>,
    assistant: Option<AssistantOrchestrator>,
    log: SessionLog,
    llm_config: LlmSection,
}

impl Session {
    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn executor(&self) -> &Arc<CommandExecutor> {
        &self.executor
    }

    pub fn has_assistant(&self) -> bool {
        self.assistant.is_some()
    }

    /// 每次调用都重新解析（配置值优先，其次环境变量）
    pub fn api_key_status(&self) -> ApiKeyStatus {
        resolve_api_key(self.llm_config.api_key.as_deref()).1
    }

    /// 处理一条用户输入，返回写入日志的回复消息
    pub async fn handle_input(&mut self, text: &str) -> Result<ChatMessage, SessionError> {
        let text = text.trim();
        self.log.push(ChatMessage::user(text));

        if let Some(parsed) = self.parser.parse(text) {
            tracing::debug!(command = %parsed.name, "direct command");
            let outcome = self.executor.dispatch_parsed(&parsed).await;
            return Ok(self.reply(outcome.message, vec![parsed.name]));
        }

        let Some(assistant) = &self.assistant else {
            let help = format!(
                "{} Configure an API key to ask the AI assistant in plain language.",
                self.executor.registry().help_text(text)
            );
            return Ok(self.reply(help, Vec::new()));
        };

        let context = self.context.assistant_context();
        let result = assistant.process(text, &context).await;
        match result {
            Ok(reply) => {
                let rendered = reply.rendered_text();
                Ok(self.reply(rendered, reply.commands_executed))
            }
            Err(e) => {
                tracing::warn!(error = %e, "AI request failed");
                let err = SessionError::Service(e);
                self.log.push(ChatMessage::system(err.to_string()));
                Err(err)
            }
        }
    }

    /// 加载结构并记录一条系统消息
    pub async fn load_structure(
        &mut self,
        source: &str,
        format: Option<StructureFormat>,
    ) -> Result<(), ViewerError> {
        self.viewer.load_structure(source, format).await?;
        let name = self
            .context
            .assistant_context()
            .structure_name
            .unwrap_or_else(|| source.to_string());
        self.log
            .push(ChatMessage::system(format!("Loaded structure {name}.")));
        Ok(())
    }

    /// 校验当前 Key：先做格式校验，再发一次最小请求
    pub async fn verify_api_key(&self) -> Result<(), SessionError> {
        let (key, _) = resolve_api_key(self.llm_config.api_key.as_deref());
        let key = key.unwrap_or_default();
        validate_api_key(&key)?;
        OpenAiClient::test_key(self.llm_config.base_url.as_deref(), &self.llm_config.model, &key)
            .await?;
        Ok(())
    }

    fn reply(&mut self, text: String, commands_executed: Vec<String>) -> ChatMessage {
        let msg = ChatMessage::assistant(text, commands_executed);
        self.log.push(msg.clone());
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;
    use crate::llm::{KeyValidationError, MockLlmClient};
    use crate::selection::TrackerConfig;
    use crate::viewer::pdb::tests::SAMPLE_PDB;
    use crate::viewer::{HeadlessEngine, ViewerController};

    fn controller() -> (Arc<HeadlessEngine>, Arc<ViewerController>) {
        let engine = Arc::new(HeadlessEngine::new().with_source("sample.pdb", SAMPLE_PDB));
        let controller = Arc::new(ViewerController::new(engine.clone(), TrackerConfig::default()));
        (engine, controller)
    }

    #[tokio::test]
    async fn test_direct_command_bypasses_llm() {
        let (engine, controller) = controller();
        let llm = Arc::new(MockLlmClient::new());
        let mut session = SessionBuilder::new(AppConfig::default())
            .with_llm(llm.clone())
            .build(controller);
        session.load_structure("sample.pdb", None).await.unwrap();

        let reply = session.handle_input("zoom_chain B").await.unwrap();
        assert_eq!(reply.text, "Zoomed to chain B.");
        assert_eq!(reply.commands_executed, vec!["zoom_chain".to_string()]);
        assert_eq!(engine.snapshot().focused_chain.as_deref(), Some("B"));
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_free_text_without_llm_returns_help() {
        let (_, controller) = controller();
        let mut session = SessionBuilder::new(AppConfig::default())
            .without_llm()
            .build(controller);

        let reply = session.handle_input("make it pretty").await.unwrap();
        assert!(reply
            .text
            .starts_with("Unknown command 'make it pretty'. Available commands: enable_water"));
        assert!(!session.has_assistant());
    }

    #[tokio::test]
    async fn test_service_failure_logged_and_returned() {
        let (_, controller) = controller();
        let llm = Arc::new(
            MockLlmClient::new().with_error(crate::llm::LlmError::RateLimited("slow down".into())),
        );
        let mut session = SessionBuilder::new(AppConfig::default())
            .with_llm(llm)
            .build(controller);

        let err = session.handle_input("color it nicely").await.unwrap_err();
        assert!(err.is_service_failure());
        assert!(err.to_string().contains("direct commands"));

        let last = session.log().last().unwrap();
        assert_eq!(last.role, Role::System);
        assert_eq!(session.log().len(), 2);
    }

    #[tokio::test]
    async fn test_verify_rejects_malformed_key() {
        let (_, controller) = controller();
        let mut cfg = AppConfig::default();
        cfg.llm.api_key = Some("not-a-key".into());
        let session = SessionBuilder::new(cfg).without_llm().build(controller);

        let err = session.verify_api_key().await.unwrap_err();
        assert_eq!(err, SessionError::Validation(KeyValidationError::MissingPrefix));
        let status = session.api_key_status();
        assert!(status.present);
        assert!(!status.valid);
    }

    #[tokio::test]
    async fn test_key_status_follows_stored_key() {
        let (_, controller) = controller();
        let mut cfg = AppConfig::default();
        cfg.llm.api_key = Some(format!("sk-{}", "x".repeat(40)));
        let session = SessionBuilder::new(cfg)
            .with_llm(Arc::new(MockLlmClient::new()))
            .build(controller);

        let status = session.api_key_status();
        assert_eq!(status.source, crate::llm::KeySource::Stored);
        assert!(status.valid);
        assert_eq!(session.api_key_status(), status);
    }
}
