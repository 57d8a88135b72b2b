//! Supabase (PostgREST) vector store.
//!
//! Similarity search goes through a `match_documents`-style SQL function
//! exposed as an RPC endpoint; rows live in a `documents` table with
//! `content`, `metadata` (JSON, holding `source`) and `embedding` columns.

use super::{Document, SearchResult, VectorStore};
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Vector store backed by a Supabase project.
pub struct SupabaseVectorStore {
    client: reqwest::Client,
    rest_url: String,
    table_name: String,
    query_name: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Metadata {
    #[serde(default)]
    source: String,
}

#[derive(Debug, Deserialize)]
struct MatchRow {
    #[serde(default)]
    id: Option<serde_json::Value>,
    content: String,
    #[serde(default)]
    metadata: Option<Metadata>,
    #[serde(default)]
    similarity: f32,
}

#[derive(Serialize)]
struct InsertRow<'a> {
    id: String,
    content: &'a str,
    metadata: Metadata,
    embedding: &'a [f32],
}

impl SupabaseVectorStore {
    pub fn new(url: &str, service_key: &str, table_name: &str, query_name: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(service_key)
            .map_err(|e| SvarError::Config(format!("Invalid Supabase key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", service_key))
            .map_err(|e| SvarError::Config(format!("Invalid Supabase key: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            table_name: table_name.to_string(),
            query_name: query_name.to_string(),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SvarError::VectorStore(format!(
            "Supabase returned {}: {}",
            status, body
        )))
    }

    /// Parse the total out of a `Content-Range` header such as `0-0/42` or `*/0`.
    fn parse_content_range(value: &str) -> Option<usize> {
        value.rsplit('/').next()?.trim().parse().ok()
    }
}

#[async_trait]
impl VectorStore for SupabaseVectorStore {
    #[instrument(skip(self, docs), fields(count = docs.len()))]
    async fn add_documents(&self, docs: &[Document]) -> Result<usize> {
        if docs.is_empty() {
            return Ok(0);
        }

        let rows: Vec<InsertRow<'_>> = docs
            .iter()
            .map(|doc| InsertRow {
                id: doc.id.to_string(),
                content: &doc.content,
                metadata: Metadata {
                    source: doc.source.clone(),
                },
                embedding: &doc.embedding,
            })
            .collect();

        let response = self
            .client
            .post(format!("{}/{}", self.rest_url, self.table_name))
            .header("Prefer", "return=minimal,resolution=merge-duplicates")
            .json(&rows)
            .send()
            .await?;
        Self::check(response).await?;

        info!("Inserted {} documents into {}", docs.len(), self.table_name);
        Ok(docs.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .post(format!("{}/rpc/{}", self.rest_url, self.query_name))
            .query(&[("limit", k)])
            .json(&json!({ "query_embedding": query_embedding, "filter": {} }))
            .send()
            .await?;
        let rows: Vec<MatchRow> = Self::check(response).await?.json().await?;

        debug!("Supabase returned {} matches", rows.len());

        let results = rows
            .into_iter()
            .take(k)
            .map(|row| SearchResult {
                document: Document {
                    id: row
                        .id
                        .as_ref()
                        .and_then(|v| v.as_str())
                        .and_then(|s| Uuid::parse_str(s).ok())
                        .unwrap_or_default(),
                    source: row.metadata.unwrap_or_default().source,
                    content: row.content,
                    embedding: Vec::new(),
                    indexed_at: Utc::now(),
                },
                score: row.similarity,
            })
            .collect();

        Ok(results)
    }

    async fn document_count(&self) -> Result<usize> {
        let response = self
            .client
            .get(format!("{}/{}", self.rest_url, self.table_name))
            .query(&[("select", "id")])
            .header("Prefer", "count=exact")
            .header("Range", "0-0")
            .send()
            .await?;
        let response = Self::check(response).await?;

        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse_content_range)
            .ok_or_else(|| SvarError::VectorStore("Missing Content-Range header".to_string()))
    }
}
