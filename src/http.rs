//! HTTP client construction shared by provider adapters.

use reqwest::{Client, RequestBuilder};

use crate::config::HttpOptions;
use crate::error::{Error, Result};

/// Build a configured HTTP client from transport options.
///
/// TLS verification stays enabled; timeouts always apply.
pub fn build_http_client(options: &HttpOptions) -> Result<Client> {
    let mut builder = Client::builder()
        .connect_timeout(options.connect_timeout)
        .timeout(options.timeout);

    if let Some(proxy_url) = &options.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| Error::Configuration(format!("invalid proxy url \"{proxy_url}\": {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(Error::from_transport)
}

/// Add extra headers to a request if specified in transport options.
pub fn add_extra_headers(mut request: RequestBuilder, options: &HttpOptions) -> RequestBuilder {
    if let Some(headers) = &options.extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_defaults() {
        assert!(build_http_client(&HttpOptions::default()).is_ok());
    }

    #[test]
    fn builds_with_proxy() {
        let options = HttpOptions::default().with_proxy("http://proxy.example.com:8080");
        assert!(build_http_client(&options).is_ok());
    }

    #[test]
    fn rejects_malformed_proxy() {
        let options = HttpOptions::default().with_proxy("::not-a-url::");
        assert!(matches!(
            build_http_client(&options),
            Err(Error::Configuration(_))
        ));
    }
}
