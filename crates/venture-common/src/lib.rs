pub mod canvas;
pub mod mcp_api;
pub mod openai;
pub mod prompts;
