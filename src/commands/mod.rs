//! 命令层：参数、注册表、内置命令、执行器与直接命令解析

pub mod builtin;
pub mod executor;
pub mod params;
pub mod parser;
pub mod registry;

pub use builtin::{analyze, builtin_commands, builtin_registry, BuiltinCommand, NO_SELECTION_GUIDANCE};
pub use executor::{CommandExecutor, CommandOutcome, CommandStatus};
pub use params::{CommandParams, ParamKind, ParsedCommand, DEFAULT_CHAIN};
pub use parser::DirectCommandParser;
pub use registry::{CommandRegistry, ViewerCommand};
