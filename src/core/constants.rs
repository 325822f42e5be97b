//! Constants for the chat completion endpoint and message roles

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.nuwaapi.com/v1";

/// Path appended to the base URL for chat completions
pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Default target model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default prompt sent when no messages are configured
pub const DEFAULT_PROMPT: &str = "Hello";

/// Default bound on generated tokens
pub const DEFAULT_MAX_TOKENS: u32 = 5;

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 60;

/// Environment variable names
pub mod env {
    /// Location of the TOML configuration file
    pub const CONFIG_PATH: &str = "CONFIG_PATH";

    /// Bearer token, overrides `api.api_key`
    pub const API_KEY: &str = "OPENAI_API_KEY";

    /// Base URL, overrides `api.base_url`
    pub const BASE_URL: &str = "OPENAI_BASE_URL";
}

/// Message role constants
pub mod role {
    /// User role identifier
    pub const USER: &str = "user";

    /// Assistant role identifier
    pub const ASSISTANT: &str = "assistant";

    /// System role identifier
    pub const SYSTEM: &str = "system";
}
