//! LLM 层：客户端抽象、OpenAI 兼容实现、Mock 与 API Key 校验

pub mod key;
pub mod mock;
pub mod openai;
pub mod traits;

pub use key::{
    resolve_api_key, resolve_api_key_with, validate_api_key, ApiKeyStatus, KeySource,
    KeyValidationError, API_KEY_PREFIX, MIN_API_KEY_LEN,
};
pub use mock::MockLlmClient;
pub use openai::OpenAiClient;
pub use traits::{LlmClient, LlmError};
