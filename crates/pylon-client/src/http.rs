//! reqwest-backed implementation of the backend collaborators

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use pylon_session::{ApiError, AuthApi, Credentials, PermMenu, ProfileApi, TokenGrant, UserProfile};

use crate::envelope::{Envelope, DEFAULT_SUCCESS_CODE};
use crate::proxy::ProxyRule;

pub const LOGIN_PATH: &str = "/api/admin/base/open/login";
pub const PERSON_PATH: &str = "/api/admin/base/comm/person";
pub const PERMMENU_PATH: &str = "/api/admin/base/comm/permmenu";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Resolves `/api/...` paths to the backend origin
    pub proxy: ProxyRule,
    pub success_code: i64,
    pub timeout_secs: u64,
    /// Honour `HTTP_PROXY`-style environment settings
    #[serde(default = "default_system_proxy")]
    pub system_proxy: bool,
}

fn default_system_proxy() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            proxy: ProxyRule::default(),
            success_code: DEFAULT_SUCCESS_CODE,
            timeout_secs: 30,
            system_proxy: true,
        }
    }
}

pub struct HttpApi {
    config: ApiConfig,
    http_client: reqwest::Client,
}

impl HttpApi {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if !config.system_proxy {
            builder = builder.no_proxy();
        }

        let http_client = builder
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Resolves a console path through the proxy rule.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let resolved = self
            .config
            .proxy
            .rewrite(path)
            .ok_or_else(|| ApiError::InvalidUrl(format!("{path} is not under the proxy prefix")))?;

        Url::parse(&resolved).map_err(|e| ApiError::InvalidUrl(format!("{resolved}: {e}")))
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            // Prefer the backend's own message when the body is an envelope
            let rejected = match serde_json::from_str::<Envelope<serde_json::Value>>(&body) {
                Ok(envelope) => ApiError::Rejected {
                    code: envelope.code,
                    message: envelope.message,
                },
                Err(_) => ApiError::Rejected {
                    code: i64::from(status.as_u16()),
                    message: body,
                },
            };
            return Err(rejected);
        }

        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        envelope.into_result(self.config.success_code)
    }

    async fn get_authorized<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        tracing::debug!(url = %url, "GET");

        let request = self
            .http_client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, token);
        self.send(request).await
    }
}

#[async_trait]
impl AuthApi for HttpApi {
    async fn login(&self, credentials: &Credentials) -> Result<TokenGrant, ApiError> {
        let url = self.endpoint(LOGIN_PATH)?;
        tracing::debug!(url = %url, username = %credentials.username, "POST login");

        let request = self.http_client.post(url).json(credentials);
        self.send(request).await
    }
}

#[async_trait]
impl ProfileApi for HttpApi {
    async fn person(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.get_authorized(PERSON_PATH, token).await
    }

    async fn perm_menu(&self, token: &str) -> Result<PermMenu, ApiError> {
        self.get_authorized(PERMMENU_PATH, token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves one canned response and hands back the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);

                let text = String::from_utf8_lossy(&raw);
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&raw).into_owned()
        });

        let target = Url::parse(&format!("http://{addr}/")).unwrap();
        (target, handle)
    }

    fn api_for(target: Url) -> HttpApi {
        HttpApi::new(ApiConfig {
            proxy: ProxyRule::new("/api", target),
            success_code: DEFAULT_SUCCESS_CODE,
            timeout_secs: 5,
            system_proxy: false,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_resolution() {
        let api = HttpApi::new(ApiConfig::default()).unwrap();

        assert_eq!(
            api.endpoint(LOGIN_PATH).unwrap().as_str(),
            "http://localhost:3120/admin/base/open/login"
        );
        assert!(matches!(
            api.endpoint("/admin/base/open/login"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_login_posts_credentials() {
        let (target, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"code":1000,"message":"success","data":{"token":"T1","refreshToken":"R1","expire":3600,"refreshExpire":604800}}"#,
        )
        .await;
        let api = api_for(target);

        let grant = api.login(&Credentials::new("u", "p")).await.unwrap();
        assert_eq!(grant.token, "T1");
        assert_eq!(grant.refresh_expire, 604800);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /admin/base/open/login "));
        assert!(request.contains(r#""username":"u""#));
    }

    #[tokio::test]
    async fn test_person_sends_raw_token() {
        let (target, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"code":1000,"data":{"id":1,"username":"admin","nickName":"Ada"}}"#,
        )
        .await;
        let api = api_for(target);

        let person = api.person("T1").await.unwrap();
        assert_eq!(person.display_name(), "Ada");

        let request = server.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /admin/base/comm/person "));
        assert!(request.contains("authorization: t1\r\n"));
    }

    #[tokio::test]
    async fn test_backend_rejection() {
        let (target, server) =
            serve_once("HTTP/1.1 200 OK", r#"{"code":1001,"message":"bad password"}"#).await;
        let api = api_for(target);

        let err = api.login(&Credentials::new("u", "x")).await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Rejected {
                code: 1001,
                message: "bad password".to_string()
            }
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unauthorized_status() {
        let (target, server) = serve_once("HTTP/1.1 401 Unauthorized", "{}").await;
        let api = api_for(target);

        let err = api.perm_menu("expired").await.unwrap_err();
        assert_eq!(err, ApiError::Unauthorized);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_server_error_without_envelope() {
        let (target, server) = serve_once("HTTP/1.1 502 Bad Gateway", "upstream down").await;
        let api = api_for(target);

        let err = api.perm_menu("T1").await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Rejected {
                code: 502,
                message: "upstream down".to_string()
            }
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let (target, server) = serve_once("HTTP/1.1 200 OK", "<html>").await;
        let api = api_for(target);

        let err = api.person("T1").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = api_for(Url::parse(&format!("http://{addr}/")).unwrap());
        let err = api.person("T1").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
