//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `MOLCHAT__*` 覆盖（双下划线表示嵌套，如 `MOLCHAT__LLM__MODEL=gpt-4o`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub commands: CommandsSection,
    #[serde(default)]
    pub selection: SelectionSection,
}

/// [app] 段：应用名、会话日志保留条数
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
    /// 会话日志最多保留的消息条数
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            history_limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> usize {
    200
}

/// [llm] 段：模型、端点、存储的 API Key、超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    /// 存储的 Key（优先于环境变量）
    pub api_key: Option<String>,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
            api_key: None,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

/// [commands] 段：单条命令执行超时（秒）
#[derive(Debug, Clone, Deserialize)]
pub struct CommandsSection {
    #[serde(default = "default_command_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CommandsSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_command_timeout_secs(),
        }
    }
}

fn default_command_timeout_secs() -> u64 {
    30
}

/// [selection] 段：点击后读取选区的宽限期、是否记录悬停诊断
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionSection {
    #[serde(default = "default_click_grace_ms")]
    pub click_grace_ms: u64,
    #[serde(default = "default_hover_diagnostics")]
    pub hover_diagnostics: bool,
}

impl Default for SelectionSection {
    fn default() -> Self {
        Self {
            click_grace_ms: default_click_grace_ms(),
            hover_diagnostics: default_hover_diagnostics(),
        }
    }
}

fn default_click_grace_ms() -> u64 {
    100
}

fn default_hover_diagnostics() -> bool {
    true
}

/// 从 config 目录加载配置，环境变量 MOLCHAT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 MOLCHAT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("MOLCHAT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.selection.click_grace_ms, 100);
        assert!(cfg.selection.hover_diagnostics);
        assert_eq!(cfg.commands.timeout_secs, 30);
        assert_eq!(cfg.llm.timeouts.request, 60);
        assert!(cfg.llm.api_key.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[llm]\nmodel = \"test-model\"\n\n[selection]\nclick_grace_ms = 250\n\n[commands]\ntimeout_secs = 5"
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.llm.model, "test-model");
        assert_eq!(cfg.selection.click_grace_ms, 250);
        assert!(cfg.selection.hover_diagnostics);
        assert_eq!(cfg.commands.timeout_secs, 5);
    }
}
