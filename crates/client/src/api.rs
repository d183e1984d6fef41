//! REST API client
//!
//! Attaches the persisted token to every request and reports 401 answers
//! back through the [`Credentials`] seam it was built with. It never
//! navigates or touches session state itself.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use tm_core::session::Credentials;

use crate::error::{ApiError, Result};

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Arc<dyn Credentials>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn Credentials>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!("API URL: {}", base_url);

        Self {
            client: Client::builder()
                .default_headers(headers)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url,
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.credentials.token().await {
            Some(token) => builder.header(AUTHORIZATION, format!("Token {}", token)),
            None => builder,
        }
    }

    /// Send and sort the answer: 2xx passes, 401 invalidates the session,
    /// anything else becomes `ApiError::Status` with its JSON body if any.
    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            warn!("Request to {} was unauthorized", response.url().path());
            self.credentials.invalidate().await;
            return Err(ApiError::Unauthorized);
        }

        let body = response.json::<serde_json::Value>().await.ok();
        Err(ApiError::Status { status, body })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request(Method::GET, path).await).await?;
        Ok(response.json().await?)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path).await.json(body);
        let response = self.send(builder).await?;
        Ok(response.json().await?)
    }

    /// POST whose success body is not needed
    pub async fn post_unit<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + Sync + ?Sized,
    {
        let builder = self.request(Method::POST, path).await.json(body);
        self.send(builder).await?;
        Ok(())
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::PATCH, path).await.json(body);
        let response = self.send(builder).await?;
        Ok(response.json().await?)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, path).await).await?;
        Ok(())
    }
}
