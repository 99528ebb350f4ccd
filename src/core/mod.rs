//! 核心层：会话上下文、消息与会话日志、会话错误

pub mod error;
pub mod history;
pub mod session;

pub use error::{SessionError, DIRECT_COMMAND_HINT};
pub use history::{ChatMessage, Message, Role, SessionLog};
pub use session::{create_llm_from_config, Session, SessionBuilder};
