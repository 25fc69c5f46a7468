use std::fmt::Display;

use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::DbError;

/// PostgREST client for the clinic database.
///
/// One instance is built at start-up and shared; `reqwest::Client` pools
/// connections internally.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

/// `eq.<value>` filter with the value percent-encoded.
pub fn eq<V: Display>(value: V) -> String {
    format!("eq.{}", urlencoding::encode(&value.to_string()))
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, DbError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.service_key)
            .map_err(|_| DbError::InvalidRequest("Service key is not a valid header value".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.service_key))
            .map_err(|_| DbError::InvalidRequest("Service key is not a valid header value".to_string()))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!("API error ({}): {}", status, text);
            return Err(DbError::from_response(status.as_u16(), &text));
        }

        // 204 and `return=minimal` answers carry no body
        let data = if text.trim().is_empty() {
            serde_json::from_value(Value::Null)?
        } else {
            serde_json::from_str(&text)?
        };

        Ok(data)
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    /// `GET /rest/v1/{query}` returning all matching rows.
    pub async fn select<T>(&self, query: &str) -> Result<Vec<T>, DbError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::GET, &format!("/rest/v1/{}", query), None).await
    }

    /// Single-row select; `None` when nothing matched.
    pub async fn select_one<T>(&self, query: &str) -> Result<Option<T>, DbError>
    where
        T: DeserializeOwned,
    {
        let rows: Vec<T> = self.select(query).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row into `table` and return it as stored.
    pub async fn insert<T>(&self, table: &str, row: Value) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        let rows: Vec<T> = self.request_with_headers(
            Method::POST,
            &format!("/rest/v1/{}", table),
            Some(row),
            Some(Self::representation_headers()),
        ).await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| DbError::InvalidRequest(format!("Insert into {} returned no row", table)))
    }

    /// `PATCH /rest/v1/{query}` returning every updated row.
    pub async fn update<T>(&self, query: &str, changes: Value) -> Result<Vec<T>, DbError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(
            Method::PATCH,
            &format!("/rest/v1/{}", query),
            Some(changes),
            Some(Self::representation_headers()),
        ).await
    }

    /// Call a database function; each call runs in a single transaction.
    pub async fn rpc<T>(&self, function: &str, args: Value) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::POST, &format!("/rest/v1/rpc/{}", function), Some(args)).await
    }
}
