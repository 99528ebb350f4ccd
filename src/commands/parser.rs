//! 直接命令解析
//!
//! 先做固定短语匹配（大小写不敏感的子串），再按空白切分：首个 token 必须是已注册命令名，
//! 链参数命令取第二个 token 作为链标识（缺省 "A"）。无法识别时返回 None，交给 AI 处理。

use std::sync::Arc;

use crate::commands::{CommandParams, CommandRegistry, ParamKind, ParsedCommand, DEFAULT_CHAIN};

/// 自然语言短语 -> 命令名（按顺序匹配）
const PHRASES: &[(&str, &str)] = &[
    ("what is selected", "what_is_selected"),
    ("what's selected", "what_is_selected"),
    ("what\u{2019}s selected", "what_is_selected"),
    ("analyze selection", "analyze_selection"),
    ("analyze my selection", "analyze_selection"),
];

pub struct DirectCommandParser {
    registry: Arc<CommandRegistry>,
}

impl DirectCommandParser {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    pub fn parse(&self, text: &str) -> Option<ParsedCommand> {
        let lower = text.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }

        if let Some(parsed) = self.fast_match(&lower) {
            return Some(parsed);
        }

        let mut tokens = lower.split_whitespace();
        let name = trim_token(tokens.next()?, |c| c.is_alphanumeric() || c == '_');
        let command = self.registry.get(name)?;

        let params = match command.param_kind() {
            ParamKind::None => CommandParams::None,
            ParamKind::Chain => {
                // 链标识保留原始大小写
                let chain = text
                    .split_whitespace()
                    .nth(1)
                    .map(|t| trim_token(t, char::is_alphanumeric))
                    .filter(|t| !t.is_empty())
                    .unwrap_or(DEFAULT_CHAIN);
                CommandParams::chain(chain)
            }
        };

        Some(ParsedCommand::new(command.name(), params))
    }

    fn fast_match(&self, lower: &str) -> Option<ParsedCommand> {
        PHRASES
            .iter()
            .find(|(phrase, name)| lower.contains(phrase) && self.registry.contains(name))
            .map(|(_, name)| ParsedCommand::new(*name, CommandParams::None))
    }
}

/// 去掉 token 两端的标点（如 "reset_view." 或 "B,"）
fn trim_token(token: &str, keep: impl Fn(char) -> bool) -> &str {
    token.trim_matches(|c: char| !keep(c))
}
