//! HTTP transport for page requests.

use futures::TryStreamExt;
use std::time::Duration;
use tokio_util::io::StreamReader;
use url::Url;

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::types::PageBody;

/// Issues one request per page and hands back the response body as a stream
#[async_trait::async_trait]
pub trait PageTransport: Send + Sync {
    /// Fetch `url`. The returned body is owned by the caller.
    async fn get(&self, url: &Url) -> Result<PageBody>;
}

/// [`PageTransport`] backed by a shared `reqwest::Client`
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Wrap an existing client; its own timeout settings apply
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Build a client from the HTTP settings
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn from_config(http: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(http.request_timeout)
            .user_agent(http.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            timeout: Some(http.request_timeout),
        })
    }
}

#[async_trait::async_trait]
impl PageTransport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<PageBody> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            let message = if e.is_timeout() {
                match self.timeout {
                    Some(t) => format!("request timed out after {}s", t.as_secs()),
                    None => "request timed out".to_string(),
                }
            } else if e.is_connect() {
                format!("connection failed: {e}")
            } else {
                e.to_string()
            };
            Error::transport(url.as_str(), message)
        })?;

        // Non-success statuses fail the page instead of storing the error body.
        // A failed status drops the response, releasing its body.
        let response = response
            .error_for_status()
            .map_err(|e| Error::transport(url.as_str(), e))?;

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::pin(StreamReader::new(stream)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn read_all(mut body: PageBody) -> Vec<u8> {
        let mut buf = Vec::new();
        body.read_to_end(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn streams_successful_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/listing"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"page":2}"#))
            .mount(&server)
            .await;

        let transport = HttpTransport::from_config(&HttpConfig::default()).unwrap();
        let url = Url::parse(&format!("{}/listing?page=2", server.uri())).unwrap();
        let body = transport.get(&url).await.unwrap();

        assert_eq!(read_all(body).await, br#"{"page":2}"#);
    }

    #[tokio::test]
    async fn error_status_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(reqwest::Client::new());
        let url = Url::parse(&format!("{}/listing", server.uri())).unwrap();

        match transport.get(&url).await {
            Err(Error::Transport { url: failed, message }) => {
                assert!(failed.ends_with("/listing"));
                assert!(message.contains("503"), "message was {message}");
            }
            Err(other) => panic!("expected transport error, got {other:?}"),
            Ok(_) => panic!("expected transport error, got a body"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        // Bind then drop a listener to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = HttpTransport::new(reqwest::Client::new());
        let url = Url::parse(&format!("http://127.0.0.1:{port}/listing")).unwrap();

        let err = transport.get(&url).await.err().unwrap();
        assert_eq!(err.error_code(), "transport_error");
    }
}
