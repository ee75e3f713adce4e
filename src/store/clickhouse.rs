//! ClickHouse backend over the HTTP interface.
//!
//! Inserts are sent as `JSONCompactEachRow`: one JSON array per row, values
//! in table column order. Single-row writes ask the server to buffer them
//! (`async_insert=1`) and return without waiting for the flush.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};

use super::{check_columns, schema, Batch, Store, StoreError, Table, Value};

const FORMAT: &str = "JSONCompactEachRow";

/// Connection settings for the ClickHouse HTTP endpoint.
#[derive(Debug, Clone)]
pub struct ClickHouseConfig {
    /// Base URL, e.g. `http://127.0.0.1:8123`.
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    /// Pings attempted before giving up at startup.
    pub connect_attempts: u32,
    pub connect_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8123".to_string(),
            user: None,
            password: None,
            database: None,
            connect_attempts: 10,
            connect_delay: Duration::from_secs(3),
            request_timeout: Duration::from_secs(30),
        }
    }
}

pub struct ClickHouseStore {
    client: Client,
    config: ClickHouseConfig,
}

impl ClickHouseStore {
    /// Build the client and wait for the server to answer a ping.
    pub async fn connect(config: ClickHouseConfig) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let store = Self { client, config };

        let attempts = store.config.connect_attempts.max(1);
        for attempt in 1..=attempts {
            match store.ping().await {
                Ok(()) => {
                    tracing::info!(url = %store.config.url, "ClickHouse is reachable");
                    return Ok(store);
                }
                Err(e) if attempt < attempts => {
                    tracing::warn!(attempt, "ClickHouse ping failed: {e}");
                    tokio::time::sleep(store.config.connect_delay).await;
                }
                Err(e) => {
                    return Err(StoreError::Unavailable(format!(
                        "{} after {attempt} attempts: {e}",
                        store.config.url
                    )));
                }
            }
        }
        Err(StoreError::Unavailable(store.config.url.clone()))
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        let url = format!("{}/ping", self.config.url.trim_end_matches('/'));
        let response = self.client.get(url).send().await?;
        read_body(response).await.map(|_| ())
    }

    /// Run one statement that returns no rows.
    pub async fn execute(&self, sql: &str) -> Result<(), StoreError> {
        let response = self.post(&[]).body(sql.to_string()).send().await?;
        read_body(response).await.map(|_| ())
    }

    /// Create every table that does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for table in Table::ALL {
            self.execute(schema::create_table(table)).await?;
            tracing::debug!(%table, "table ready");
        }
        Ok(())
    }

    fn post(&self, settings: &[(&str, &str)]) -> RequestBuilder {
        let mut request = self.client.post(&self.config.url);
        if let Some(database) = &self.config.database {
            request = request.query(&[("database", database.as_str())]);
        }
        if let Some(user) = &self.config.user {
            request = request.header("X-ClickHouse-User", user);
        }
        if let Some(password) = &self.config.password {
            request = request.header("X-ClickHouse-Key", password);
        }
        request.query(settings)
    }

    async fn insert(
        &self,
        table: Table,
        rows: &[Vec<Value>],
        settings: &[(&str, &str)],
    ) -> Result<(), StoreError> {
        let query = insert_query(table);
        let mut params = vec![("query", query.as_str())];
        params.extend_from_slice(settings);

        let response = self.post(&params).body(encode_rows(rows)?).send().await?;
        read_body(response).await.map(|_| ())
    }
}

#[async_trait]
impl Store for ClickHouseStore {
    async fn send_batch(&self, batch: Batch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.insert(batch.table(), batch.rows(), &[]).await?;
        tracing::debug!(table = %batch.table(), rows = batch.len(), "batch sent");
        Ok(())
    }

    async fn async_insert(&self, table: Table, values: Vec<Value>) -> Result<(), StoreError> {
        check_columns(table, &values)?;
        self.insert(
            table,
            std::slice::from_ref(&values),
            &[("async_insert", "1"), ("wait_for_async_insert", "0")],
        )
        .await
    }
}

// ============================================================================
// Encoding helpers
// ============================================================================

pub fn insert_query(table: Table) -> String {
    let columns: Vec<String> = table.columns().iter().map(|c| format!("`{c}`")).collect();
    format!(
        "INSERT INTO {} ({}) FORMAT {FORMAT}",
        table.name(),
        columns.join(", ")
    )
}

pub fn encode_rows(rows: &[Vec<Value>]) -> Result<String, StoreError> {
    let mut body = String::new();
    for row in rows {
        let line = serde_json::to_string(row).map_err(|e| StoreError::Encoding(e.to_string()))?;
        body.push_str(&line);
        body.push('\n');
    }
    Ok(body)
}

async fn read_body(response: Response) -> Result<String, StoreError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(StoreError::Server {
            status: status.as_u16(),
            body: body.trim().to_string(),
        })
    }
}
