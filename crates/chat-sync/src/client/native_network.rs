use crate::error::{ChatError, Result};
use crate::traits::ChatNetwork;
use crate::types::{ApiRequest, ApiResponse};
use async_trait::async_trait;
use reqwest::Client;

pub struct NativeNetwork {
    client: Client,
}

impl NativeNetwork {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ChatNetwork for NativeNetwork {
    async fn execute(
        &self,
        url: &str,
        request: ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse> {
        let method = http::Method::from_bytes(request.method.to_uppercase().as_bytes())
            .map_err(|e| ChatError::Config(format!("Invalid method {}: {}", request.method, e)))?;

        let mut req_builder = self
            .client
            .request(method.clone(), url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        for (k, v) in &request.extra_headers {
            req_builder = req_builder.header(k, v);
        }

        if let Some(token) = bearer {
            req_builder = req_builder.bearer_auth(token);
        }

        if let Some(body) = &request.body {
            req_builder = req_builder.body(serde_json::to_vec(body)?);
        }

        tracing::debug!(
            "[ChatHTTP-Out] {} {} auth={} headers: {:?}",
            method,
            url,
            bearer.is_some(),
            request.extra_headers
        );

        let response = req_builder
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let mut headers = std::collections::BTreeMap::new();
        for (k, v) in response.headers() {
            if let Ok(val) = v.to_str() {
                headers.insert(k.as_str().to_string(), val.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
