//! # modelrelay - One Request Shape, Many Backends
//!
//! A small, pragmatic Rust library that routes OpenAI-format chat-completion
//! requests to pluggable backend adapters and normalizes every backend
//! payload into one stable response graph.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Prefix-based provider dispatch (`"<backend>/<model>"`)
//! - Fail-fast request validation before any network I/O
//! - Streaming support via Server-Sent Events, decoded into typed deltas
//! - Explicit error taxonomy, from credentials to wire decoding
//!
//! ## Architecture
//!
//! A [`Client`] resolves the model identifier's prefix through a
//! [`Registry`] of adapter factories; the resolved [`Provider`] validates
//! the request, builds the backend payload, performs the HTTP exchange and
//! normalizes the result into [`Response`] (or a stream of
//! [`DeltaResponse`] chunks).
//!
//! ## Example
//! ```no_run
//! use modelrelay::{Client, Config, Message, Request};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new().with_api_key("openai", "sk-your-key");
//!     let client = Client::new(config);
//!
//!     let request = Request::new(
//!         "openai/gpt-4o-mini",
//!         vec![Message::user("Hello!")],
//!     )
//!     .with_temperature(0.7);
//!
//!     let response = client.complete(&request).await?;
//!     if let Some(choice) = response.choices.first() {
//!         println!("{}", choice.message.content.as_deref().unwrap_or(""));
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod providers;
pub mod registry;
pub mod sse;
pub mod validate;

// Re-exports for convenience
pub use client::{Client, DeltaStream, Provider};
pub use config::{Config, HttpOptions, RetryPolicy, SecretString};
pub use error::{Error, Result};
pub use model::{
    Choice, Content, ContentPart, Delta, DeltaChoice, DeltaResponse, Message, Request, Response,
    ResponseMessage, Role, Stop, ToolCall, ToolChoice, ToolSpec, Usage,
};
pub use registry::{ProviderFactory, Registry};
