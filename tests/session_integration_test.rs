//! 会话集成测试：直接命令、AI 指令、服务失败降级与选区跟踪

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use molchat::assistant::{AssistantContext, ContextSource};
    use molchat::config::AppConfig;
    use molchat::core::{Role, SessionBuilder, SessionError};
    use molchat::llm::{LlmError, MockLlmClient};
    use molchat::selection::{SelectionInfo, TrackerConfig};
    use molchat::viewer::{
        HeadlessEngine, Representation, StructureFormat, ViewerCapability, ViewerController,
        ViewerError,
    };

    const PDB: &str = "\
ATOM      1  N   ALA A  42      11.104   6.134  -6.504  1.00  0.00           N
ATOM      2  CA  ALA A  42      11.639   6.071  -5.147  1.00  0.00           C
ATOM      3  CA  TRP B  10       3.100   2.200   1.300  1.00  0.00           C
HETATM    4  O   HOH A 301       9.000   9.000   9.000  1.00  0.00           O
END
";

    /// 记录调用的查看器替身；water 相关调用按需失败
    #[derive(Default)]
    struct RecordingViewer {
        calls: Mutex<Vec<String>>,
        surface_calls: AtomicUsize,
        fail_water: bool,
    }

    impl RecordingViewer {
        fn failing_water() -> Self {
            Self {
                fail_water: true,
                ..Self::default()
            }
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ViewerCapability for RecordingViewer {
        async fn load_structure(
            &self,
            source: &str,
            _format: Option<StructureFormat>,
        ) -> Result<(), ViewerError> {
            self.record(format!("load {source}"));
            Ok(())
        }

        async fn reset_view(&self) -> Result<(), ViewerError> {
            self.record("reset_view");
            Ok(())
        }

        async fn zoom_in(&self) -> Result<(), ViewerError> {
            self.record("zoom_in");
            Ok(())
        }

        async fn zoom_out(&self) -> Result<(), ViewerError> {
            self.record("zoom_out");
            Ok(())
        }

        async fn set_representation(&self, kind: Representation) -> Result<(), ViewerError> {
            if kind == Representation::Surface {
                self.surface_calls.fetch_add(1, Ordering::SeqCst);
            }
            self.record(format!("representation {kind}"));
            Ok(())
        }

        async fn show_water_molecules(&self) -> Result<(), ViewerError> {
            self.record("show_water");
            if self.fail_water {
                return Err(ViewerError::Engine("internal water failure".into()));
            }
            Ok(())
        }

        async fn hide_water_molecules(&self) -> Result<(), ViewerError> {
            self.record("hide_water");
            Ok(())
        }

        async fn hide_ligands(&self) -> Result<(), ViewerError> {
            self.record("hide_ligands");
            Ok(())
        }

        async fn focus_on_chain(&self, chain_id: &str) -> Result<(), ViewerError> {
            self.record(format!("focus {chain_id}"));
            Ok(())
        }

        async fn highlight_chain(&self, chain_id: &str) -> Result<(), ViewerError> {
            self.record(format!("highlight {chain_id}"));
            Ok(())
        }

        async fn clear_highlights(&self) -> Result<(), ViewerError> {
            self.record("clear_highlights");
            Ok(())
        }

        async fn selection_info(&self) -> Result<String, ViewerError> {
            Ok("nothing".into())
        }

        async fn current_selection(&self) -> Result<Option<SelectionInfo>, ViewerError> {
            Ok(None)
        }

        async fn structure_info(&self) -> Result<String, ViewerError> {
            Ok("Structure: test".into())
        }
    }

    impl ContextSource for RecordingViewer {
        fn assistant_context(&self) -> AssistantContext {
            AssistantContext {
                structure_name: Some("1abc".into()),
                representation: Representation::Cartoon,
                has_structure_loaded: true,
            }
        }
    }

    async fn wait_until(cond: impl Fn() -> bool) -> bool {
        for _ in 0..100 {
            if cond() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cond()
    }

    #[tokio::test]
    async fn test_ai_reply_switches_representation_once() {
        let viewer = Arc::new(RecordingViewer::default());
        let llm = Arc::new(MockLlmClient::new().with_reply("Switching now [COMMAND: switch_to_surface]"));
        let mut session = SessionBuilder::new(AppConfig::default())
            .with_llm(llm.clone())
            .build(viewer.clone());

        let reply = session.handle_input("show me the surface please").await.unwrap();

        assert_eq!(viewer.surface_calls.load(Ordering::SeqCst), 1);
        assert_eq!(reply.commands_executed, vec!["switch_to_surface".to_string()]);
        assert!(reply.text.starts_with("Switching now"));
        assert_eq!(
            reply.text,
            "Switching now\n\nSwitched to surface representation."
        );
        assert_eq!(reply.role, Role::Assistant);

        // 系统提示词里带上了上下文与命令目录
        let requests = llm.requests();
        assert!(requests[0][0].content.contains("Structure name: 1abc"));
        assert!(requests[0][0].content.contains("- switch_to_surface: "));
    }

    #[tokio::test]
    async fn test_failing_command_does_not_abort_batch() {
        let viewer = Arc::new(RecordingViewer::failing_water());
        let llm = Arc::new(MockLlmClient::new().with_reply(
            "Okay. [COMMAND: enable_water] [COMMAND: highlight_chain B] [COMMAND: reset_view]",
        ));
        let mut session = SessionBuilder::new(AppConfig::default())
            .with_llm(llm)
            .build(viewer.clone());

        let reply = session.handle_input("show water and highlight B").await.unwrap();

        assert_eq!(
            reply.commands_executed,
            vec!["enable_water", "highlight_chain", "reset_view"]
        );
        assert_eq!(viewer.calls(), vec!["show_water", "highlight B", "reset_view"]);
        assert!(reply.text.contains("Failed to show water molecules"));
        assert!(!reply.text.contains("internal water failure"));
        assert!(reply.text.ends_with("Highlighted chain B.\nView reset."));
    }

    #[tokio::test]
    async fn test_direct_command_failure_hides_engine_error() {
        let viewer = Arc::new(RecordingViewer::failing_water());
        let mut session = SessionBuilder::new(AppConfig::default())
            .without_llm()
            .build(viewer);

        let reply = session.handle_input("enable_water").await.unwrap();
        assert_eq!(
            reply.text,
            "Failed to show water molecules. Make sure a structure is loaded."
        );
    }

    #[tokio::test]
    async fn test_unknown_directive_is_skipped() {
        let viewer = Arc::new(RecordingViewer::default());
        let llm = Arc::new(MockLlmClient::new().with_reply("Hmm [COMMAND: levitate] done"));
        let mut session = SessionBuilder::new(AppConfig::default())
            .with_llm(llm)
            .build(viewer.clone());

        let reply = session.handle_input("levitate the protein").await.unwrap();
        assert!(reply.commands_executed.is_empty());
        assert_eq!(reply.text, "Hmm  done");
        assert!(viewer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_service_failure_degrades_to_direct_commands() {
        let viewer = Arc::new(RecordingViewer::default());
        let llm = Arc::new(
            MockLlmClient::new().with_error(LlmError::QuotaExceeded("monthly quota".into())),
        );
        let mut session = SessionBuilder::new(AppConfig::default())
            .with_llm(llm)
            .build(viewer.clone());

        let err = session.handle_input("explain this fold").await.unwrap_err();
        assert!(matches!(err, SessionError::Service(LlmError::QuotaExceeded(_))));
        assert!(viewer.calls().is_empty());

        // 直接命令仍可用
        let reply = session.handle_input("reset_view").await.unwrap();
        assert_eq!(reply.text, "View reset.");
    }

    #[tokio::test]
    async fn test_selection_flow_over_headless_engine() {
        let engine = Arc::new(HeadlessEngine::new().with_source("demo.pdb", PDB));
        let controller = Arc::new(ViewerController::new(
            engine.clone(),
            TrackerConfig {
                click_grace: Duration::from_millis(10),
                hover_diagnostics: true,
            },
        ));
        let mut session = SessionBuilder::new(AppConfig::default())
            .without_llm()
            .build(controller.clone());
        session.load_structure("demo.pdb", None).await.unwrap();

        let reply = session.handle_input("what is selected?").await.unwrap();
        assert!(reply.text.starts_with("Nothing is selected yet"));

        engine.select_residue("A", 42);
        assert!(wait_until(|| controller.tracker().current().is_some()).await);

        let reply = session.handle_input("What's selected").await.unwrap();
        assert_eq!(reply.text, "Currently selected: ALA 42 (Chain A) - N atom");

        let reply = session.handle_input("analyze my selection").await.unwrap();
        assert!(reply.text.contains("Alanine (ALA, A)"));
        assert!(reply.text.contains("- Selection size: 2 atom(s)"));

        // 清空选区管理器后点击链 B 的原子：回落到交互高亮
        engine.clear_selection();
        engine.click(Some(2));
        assert!(
            wait_until(|| controller
                .tracker()
                .current()
                .map(|i| i.residue_name.as_deref() == Some("TRP"))
                .unwrap_or(false))
            .await
        );

        let reply = session.handle_input("show_only_selected").await.unwrap();
        assert!(reply.text.starts_with("Showing chain B around TRP 10 (Chain B) - CA atom"));
        assert_eq!(engine.snapshot().focused_chain.as_deref(), Some("B"));

        // 重新加载后选区立即清空
        session.load_structure("demo.pdb", None).await.unwrap();
        assert!(controller.tracker().current().is_none());
        let reply = session.handle_input("what_is_selected").await.unwrap();
        assert!(reply.text.starts_with("Nothing is selected yet"));

        controller.shutdown();
    }
}
