//! HTTP dispatch against the JD router and OAuth endpoints.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{error, info, warn};
use url::Url;

pub mod auth;
pub mod decode;
pub mod envelope;

pub use envelope::{error_response, is_token_expired, lookup_path, ErrorEnvelope};

use crate::db::Database;
use crate::entity::{JdlConfig, DEFAULT_TOKEN_ID};
use crate::error::{JdlError, Result};
use crate::request::{RequestBuilder, SignedRequest};
use crate::settings::{EndpointSettings, HttpSettings, Settings};
use crate::store::{ConfigStore, TokenStore};

/// Milliseconds since `start`, rounded to two decimals.
pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    (start.elapsed().as_secs_f64() * 100_000.0).round() / 100.0
}

fn create_http_client(http: &HttpSettings, redirects: Policy) -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
        .timeout(Duration::from_secs(http.request_timeout_secs))
        .redirect(redirects)
        .build()
        .map_err(|e| JdlError::ApiTransport {
            message: "Failed to create HTTP client".to_string(),
            source: e,
        })
}

/// Signs and sends JD API calls.
///
/// The active config and the access token are resolved from the injected
/// stores on every call.
pub struct ApiGateway {
    client: Client,
    auth_client: Client,
    endpoints: EndpointSettings,
    configs: Arc<dyn ConfigStore>,
    tokens: Arc<dyn TokenStore>,
}

impl ApiGateway {
    pub fn new(
        configs: Arc<dyn ConfigStore>,
        tokens: Arc<dyn TokenStore>,
        settings: &Settings,
    ) -> Result<Self> {
        Ok(Self {
            client: create_http_client(&settings.http, Policy::default())?,
            auth_client: create_http_client(&settings.http, Policy::none())?,
            endpoints: settings.endpoints.clone(),
            configs,
            tokens,
        })
    }

    /// Gateway backed by one database for both configs and tokens.
    pub fn from_database(db: &Database, settings: &Settings) -> Result<Self> {
        Self::new(Arc::new(db.clone()), Arc::new(db.clone()), settings)
    }

    pub fn configs(&self) -> &Arc<dyn ConfigStore> {
        &self.configs
    }

    /// Lowest-id active config.
    pub fn default_config(&self) -> Result<JdlConfig> {
        self.configs
            .default_config()?
            .ok_or_else(|| JdlError::ConfigMissing("未找到京东配置".to_string()))
    }

    /// The access token stored under the fixed id.
    fn access_token(&self) -> Result<String> {
        self.tokens
            .find(DEFAULT_TOKEN_ID)?
            .map(|token| token.access_token)
            .ok_or_else(|| JdlError::TokenMissing("Failed to get access token".to_string()))
    }

    /// Calls `method` signed with the default config.
    pub async fn request(&self, method: &str, params: &Map<String, Value>) -> Result<Value> {
        let config = self.default_config()?;
        self.request_with(&config, method, params).await
    }

    /// Calls `method` signed with an explicitly resolved config.
    ///
    /// Returns the decoded body. JD failure envelopes are returned as-is;
    /// interpreting them is up to the caller.
    pub async fn request_with(
        &self,
        config: &JdlConfig,
        method: &str,
        params: &Map<String, Value>,
    ) -> Result<Value> {
        let start = Instant::now();
        let access_token = self.access_token()?;
        let request = RequestBuilder::new(Some(config), &access_token).build(method, params)?;

        match self.dispatch(config, &request, start).await {
            Ok(body) => Ok(body),
            Err(e) => {
                error!(
                    url = %self.endpoints.router_url,
                    method = "POST",
                    api_method = method,
                    duration_ms = elapsed_ms(start),
                    error = %e,
                    exception = e.kind(),
                    "京东API请求失败"
                );
                Err(e)
            }
        }
    }

    async fn dispatch(
        &self,
        config: &JdlConfig,
        request: &SignedRequest,
        start: Instant,
    ) -> Result<Value> {
        let transport = |message: &str| {
            let message = message.to_string();
            move |source| JdlError::ApiTransport { message, source }
        };

        let response = self
            .client
            .post(&self.endpoints.router_url)
            .form(&request.form_fields())
            .send()
            .await
            .map_err(transport("京东API请求发送失败"))?
            .error_for_status()
            .map_err(transport("京东API返回错误状态"))?;

        let status = response.status();
        let content = response
            .text()
            .await
            .map_err(transport("京东API响应读取失败"))?;

        info!(
            url = %self.endpoints.router_url,
            method = "POST",
            api_method = request.method(),
            duration_ms = elapsed_ms(start),
            request_params = ?request.redacted(),
            response_code = status.as_u16(),
            response_size = content.len(),
            "京东API请求"
        );

        let body = decode::decode_body(&content, config.format)?;

        if is_token_expired(&body) {
            let envelope = error_response(&body).unwrap_or_default();
            warn!(
                api_method = request.method(),
                error_code = envelope.code.as_deref().unwrap_or_default(),
                error_msg = envelope.zh_desc.as_deref().unwrap_or("未知错误"),
                "京东API Token过期"
            );
        }

        Ok(body)
    }

    /// Requests an OAuth authorization code for the default config.
    ///
    /// The code is read from the redirect target; redirects are not followed.
    pub async fn get_auth_code(&self) -> Result<String> {
        let start = Instant::now();
        let config = self.default_config()?;

        match self.fetch_auth_code(&config, start).await {
            Ok(code) => Ok(code),
            Err(e) => {
                error!(
                    url = %self.endpoints.oauth_url,
                    method = "GET",
                    duration_ms = elapsed_ms(start),
                    error = %e,
                    exception = e.kind(),
                    "京东授权码请求失败"
                );
                Err(e)
            }
        }
    }

    async fn fetch_auth_code(&self, config: &JdlConfig, start: Instant) -> Result<String> {
        let state = auth::new_state();
        let response = self
            .auth_client
            .get(&self.endpoints.oauth_url)
            .query(&auth::auth_query(config, &state))
            .send()
            .await
            .map_err(|e| JdlError::ApiTransport {
                message: "京东授权码请求发送失败".to_string(),
                source: e,
            })?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        info!(
            url = %self.endpoints.oauth_url,
            method = "GET",
            duration_ms = elapsed_ms(start),
            response_code = response.status().as_u16(),
            "京东授权码请求"
        );

        let base: &Url = response.url();
        auth::extract_auth_code(location.as_deref(), base)
    }
}
