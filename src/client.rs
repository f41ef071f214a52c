//! Provider adapter trait and the dispatching client facade.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::config::Config;
use crate::error::Result;
use crate::model::{DeltaResponse, Request, Response};
use crate::registry::Registry;

/// Lazy, finite, non-restartable sequence of decoded completion chunks,
/// delivered in strict arrival order. Dropping it aborts the underlying
/// connection.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<DeltaResponse>> + Send>>;

/// One backend's adapter: validation, payload construction, transport and
/// response normalization for a single model-serving API.
///
/// Implement this trait to add support for a new backend, then register a
/// factory for it under its prefix (see [`Registry::register`]).
#[async_trait]
pub trait Provider: Send + Sync {
    /// Registry prefix this adapter serves.
    fn name(&self) -> &'static str;

    /// Check every request rule that can fail before the transport is
    /// touched. A failure here means no network call was attempted.
    fn validate(&self, request: &Request) -> Result<()>;

    /// Build the backend wire payload from a validated request.
    ///
    /// The registry prefix is stripped from the model identifier and absent
    /// optional fields are omitted rather than serialized as null.
    fn build_payload(&self, request: &Request, stream: bool) -> Result<serde_json::Value>;

    /// Issue a non-streaming completion.
    async fn complete(&self, request: &Request) -> Result<Response>;

    /// Issue a streaming completion.
    async fn complete_stream(&self, request: &Request) -> Result<DeltaStream>;
}

/// Facade resolving `"<backend>/<model>"` identifiers to adapters and
/// forwarding calls to them.
pub struct Client {
    config: Config,
    registry: Registry,
}

impl Client {
    /// Client with every built-in adapter registered.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: Registry::with_defaults(),
        }
    }

    /// Client with a caller-assembled registry.
    pub fn with_registry(config: Config, registry: Registry) -> Self {
        Self { config, registry }
    }

    /// Resolve and construct the adapter for a model identifier.
    pub fn provider_for(&self, model_id: &str) -> Result<Box<dyn Provider>> {
        let factory = self.registry.resolve(model_id)?;
        factory(&self.config)
    }

    /// Route a completion request to its backend and return the normalized
    /// response.
    pub async fn complete(&self, request: &Request) -> Result<Response> {
        let provider = self.provider_for(&request.model)?;
        tracing::debug!(provider = provider.name(), model = %request.model, "dispatching completion");
        provider.complete(request).await
    }

    /// Route a streaming completion request to its backend.
    pub async fn complete_stream(&self, request: &Request) -> Result<DeltaStream> {
        let provider = self.provider_for(&request.model)?;
        tracing::debug!(provider = provider.name(), model = %request.model, "dispatching streaming completion");
        provider.complete_stream(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::{Choice, Message, ResponseMessage, Role};
    use crate::validate::validate_request;
    use std::sync::Arc;

    /// Canned adapter standing in for a real backend.
    struct DemoProvider;

    #[async_trait]
    impl Provider for DemoProvider {
        fn name(&self) -> &'static str {
            "demo"
        }

        fn validate(&self, request: &Request) -> Result<()> {
            validate_request(request)
        }

        fn build_payload(&self, request: &Request, stream: bool) -> Result<serde_json::Value> {
            Ok(serde_json::json!({
                "model": request.model.split_once('/').map_or(request.model.as_str(), |(_, m)| m),
                "stream": stream,
            }))
        }

        async fn complete(&self, request: &Request) -> Result<Response> {
            self.validate(request)?;
            Ok(Response {
                id: "resp-1".into(),
                created: 1_700_000_000,
                model: request.model.clone(),
                object: "chat.completion".into(),
                system_fingerprint: None,
                choices: vec![Choice {
                    index: 0,
                    message: ResponseMessage {
                        role: Role::Assistant,
                        content: Some("hello".into()),
                        tool_calls: None,
                        function_call: None,
                    },
                    finish_reason: Some("stop".into()),
                    logprobs: None,
                }],
                usage: None,
            })
        }

        async fn complete_stream(&self, request: &Request) -> Result<DeltaStream> {
            self.validate(request)?;
            let stream = futures::stream::empty::<Result<DeltaResponse>>();
            Ok(Box::pin(stream))
        }
    }

    fn demo_client() -> Client {
        let mut registry = Registry::new();
        registry.register(
            "demo",
            Arc::new(|_: &Config| -> Result<Box<dyn Provider>> { Ok(Box::new(DemoProvider)) }),
        );
        Client::with_registry(Config::new(), registry)
    }

    #[tokio::test]
    async fn routes_to_registered_adapter() {
        let client = demo_client();
        let request = Request::new("demo/gpt-x", vec![Message::user("hi")]);

        let response = client.complete(&request).await.unwrap();
        assert_eq!(response.choices[0].message.role, Role::Assistant);
    }

    #[tokio::test]
    async fn unknown_prefix_names_the_prefix() {
        let client = demo_client();
        let request = Request::new("unknown/model", vec![Message::user("hi")]);

        match client.complete(&request).await.unwrap_err() {
            Error::UnknownProvider { prefix } => assert_eq!(prefix, "unknown"),
            other => panic!("expected UnknownProvider, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn validation_failures_surface_before_any_work() {
        let client = demo_client();
        let request = Request::new("demo/gpt-x", vec![]);

        assert!(matches!(
            client.complete(&request).await.unwrap_err(),
            Error::Validation(_)
        ));
    }
}
