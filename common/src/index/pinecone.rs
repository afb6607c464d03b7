use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{error::AppError, types::policy_chunk::PolicyChunk};

use super::{IndexEmbedConfig, IndexStats, VectorIndexProvider};

const API_VERSION: &str = "2025-01";

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
}

/// Reqwest-backed client for a Pinecone-style index provider.
///
/// Index management goes through the control plane; record writes and
/// statistics reads go to the per-index data-plane host, which is resolved
/// from the control plane once and cached for the life of the client.
pub struct PineconeClient {
    http: reqwest::Client,
    api_key: String,
    control_plane_url: String,
    hosts: Mutex<HashMap<String, String>>,
}

impl PineconeClient {
    pub fn new(api_key: &str, control_plane_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_owned(),
            control_plane_url: control_plane_url.trim_end_matches('/').to_owned(),
            hosts: Mutex::new(HashMap::new()),
        }
    }

    fn control_url(&self, path: &str) -> String {
        format!("{}{}", self.control_plane_url, path)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn data_plane_host(&self, index: &str) -> Result<String, AppError> {
        if let Some(host) = self.hosts.lock().await.get(index) {
            return Ok(host.clone());
        }

        let response = self
            .request(self.http.get(self.control_url(&format!("/indexes/{index}"))))
            .send()
            .await?
            .error_for_status()?;

        let description: IndexDescription = response.json().await?;
        let host = if description.host.starts_with("http") {
            description.host
        } else {
            format!("https://{}", description.host)
        };

        self.hosts
            .lock()
            .await
            .insert(index.to_owned(), host.clone());

        Ok(host)
    }
}

#[async_trait]
impl VectorIndexProvider for PineconeClient {
    async fn has_index(&self, name: &str) -> Result<bool, AppError> {
        let response = self
            .request(self.http.get(self.control_url(&format!("/indexes/{name}"))))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(AppError::Index(format!(
                "unexpected status {status} describing index '{name}'"
            ))),
        }
    }

    async fn create_index_for_model(
        &self,
        name: &str,
        cloud: &str,
        region: &str,
        embed: IndexEmbedConfig,
    ) -> Result<(), AppError> {
        let body = json!({
            "name": name,
            "cloud": cloud,
            "region": region,
            "embed": embed,
        });

        let response = self
            .request(self.http.post(self.control_url("/indexes/create-for-model")))
            .json(&body)
            .send()
            .await?;

        // Another writer may have created the index between the existence
        // check and this call.
        if response.status() == StatusCode::CONFLICT {
            debug!(index = %name, "index already exists");
            return Ok(());
        }

        response.error_for_status()?;
        Ok(())
    }

    async fn upsert_records(
        &self,
        index: &str,
        namespace: &str,
        records: &[PolicyChunk],
    ) -> Result<(), AppError> {
        if records.is_empty() {
            return Ok(());
        }

        let host = self.data_plane_host(index).await?;

        // The records endpoint takes newline-delimited JSON.
        let mut body = String::new();
        for record in records {
            body.push_str(&serde_json::to_string(record)?);
            body.push('\n');
        }

        self.request(
            self.http
                .post(format!("{host}/records/namespaces/{namespace}/upsert")),
        )
        .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
        .body(body)
        .send()
        .await?
        .error_for_status()?;

        Ok(())
    }

    async fn describe_index_stats(&self, index: &str) -> Result<IndexStats, AppError> {
        let host = self.data_plane_host(index).await?;

        let response = self
            .request(self.http.post(format!("{host}/describe_index_stats")))
            .json(&json!({}))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    async fn delete_index(&self, name: &str) -> Result<(), AppError> {
        let response = self
            .request(self.http.delete(self.control_url(&format!("/indexes/{name}"))))
            .send()
            .await?;

        // Deleting an absent index is a no-op.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }

        response.error_for_status()?;
        self.hosts.lock().await.remove(name);

        Ok(())
    }
}
