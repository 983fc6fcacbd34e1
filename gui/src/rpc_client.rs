/// JSON-RPC client for the Cowork backend
///
/// Carries the shell's one-shot commands to the backend over HTTP. Each call
/// is a single attempt: no retries and no request timeout, the backend owns
/// timeout policy for long-running commands such as a run launch.
use async_trait::async_trait;
use cowork_core::{CommandTransport, GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error, info};

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcResponse {
    /// Split a response into its result or the backend's rejection
    pub fn into_result(self) -> GatewayResult<Value> {
        if let Some(error) = self.error {
            return Err(GatewayError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// RPC Client configuration
#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    /// Server URL (e.g., "http://127.0.0.1:8080")
    pub url: String,
    /// Bearer token sent with every call
    pub auth_token: Option<String>,
    /// Connection pool size
    pub pool_size: usize,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        RpcClientConfig {
            url: "http://127.0.0.1:8080".to_string(),
            auth_token: None,
            pool_size: 10,
        }
    }
}

impl RpcClientConfig {
    pub fn new(url: &str) -> Self {
        RpcClientConfig {
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn with_auth(mut self, token: String) -> Self {
        self.auth_token = Some(token);
        self
    }
}

/// HTTP JSON-RPC transport for shell commands
pub struct RpcClient {
    config: RpcClientConfig,
    http_client: reqwest::Client,
    request_id: AtomicU64,
}

impl RpcClient {
    pub fn new(config: RpcClientConfig) -> GatewayResult<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(config.pool_size)
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| {
                GatewayError::Connection(format!("Failed to create HTTP client: {}", e))
            })?;

        info!("RPC client created for {}", config.url);

        Ok(RpcClient {
            config,
            http_client,
            request_id: AtomicU64::new(1),
        })
    }

    pub fn with_url(url: &str) -> GatewayResult<Self> {
        Self::new(RpcClientConfig::new(url))
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn build_request(&self, method: &str, params: Value) -> RpcRequest {
        let request_id = self.request_id.fetch_add(1, Ordering::Relaxed);
        RpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params: Some(params),
            id: Some(json!(request_id)),
        }
    }

    async fn send_request(&self, request: &RpcRequest) -> GatewayResult<RpcResponse> {
        let mut req = self
            .http_client
            .post(&self.config.url)
            .header("Content-Type", "application/json")
            .json(request);

        if let Some(ref token) = self.config.auth_token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let response = req
            .send()
            .await
            .map_err(|e| GatewayError::Connection(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Connection(format!(
                "HTTP error {}: {}",
                status, body
            )));
        }

        response.json::<RpcResponse>().await.map_err(|e| {
            GatewayError::Serialization(format!("Failed to parse response: {}", e))
        })
    }
}

#[async_trait]
impl CommandTransport for RpcClient {
    async fn invoke(&self, command: &str, args: Value) -> GatewayResult<Value> {
        let request = self.build_request(command, args);
        debug!("RPC call: {} (id: {:?})", command, request.id);

        let result = self
            .send_request(&request)
            .await
            .and_then(RpcResponse::into_result);

        if let Err(ref e) = result {
            error!("RPC call {} failed: {}", command, e);
        }
        result
    }
}
