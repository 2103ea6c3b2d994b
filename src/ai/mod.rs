pub mod credentials;
pub mod deepseek;
pub mod gemini;
pub mod http_client;
pub mod orchestrator;
pub mod prompts;
pub mod provider;
pub mod schema;
pub mod utils;

pub use credentials::*;
pub use orchestrator::*;
pub use provider::*;
