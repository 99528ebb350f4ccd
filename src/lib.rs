//! Molchat - 分子结构查看器的对话控制核心
//!
//! 模块划分：
//! - **assistant**: AI 编排（提示词、`[COMMAND: ...]` 指令提取、顺序分发）
//! - **commands**: 命令注册表、内置命令、执行器与直接命令解析
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 会话上下文、会话日志与错误
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）、API Key 校验
//! - **observability**: 日志初始化
//! - **selection**: 选区跟踪、多策略提取、氨基酸元数据
//! - **viewer**: 查看器能力接口、控制器与无界面引擎

pub mod assistant;
pub mod commands;
pub mod config;
pub mod core;
pub mod llm;
pub mod observability;
pub mod selection;
pub mod viewer;
