//! 命令参数：按命令族区分的带标签变体（无参数 / 链标识），解析器与执行器在编译期约定形状

/// 链参数缺省值
pub const DEFAULT_CHAIN: &str = "A";

/// 命令接受的参数形状
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    None,
    Chain,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CommandParams {
    #[default]
    None,
    Chain { chain_id: String },
}

impl CommandParams {
    pub fn chain(chain_id: impl Into<String>) -> Self {
        CommandParams::Chain {
            chain_id: chain_id.into(),
        }
    }

    pub fn chain_id(&self) -> Option<&str> {
        match self {
            CommandParams::Chain { chain_id } => Some(chain_id),
            CommandParams::None => None,
        }
    }

    /// 链参数；缺省时回落到 "A"
    pub fn chain_or_default(&self) -> &str {
        self.chain_id().unwrap_or(DEFAULT_CHAIN)
    }
}

/// 解析结果（临时对象）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub params: CommandParams,
}

impl ParsedCommand {
    pub fn new(name: impl Into<String>, params: CommandParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}
