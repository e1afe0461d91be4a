//! [`RestStore`]: a [`RemoteStore`] over a PostgREST-compatible API.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use vitrine_core::{
  entity::{Identity, RecordId, Row, Table},
  store::{AuditEntry, NewAuditEntry, RemoteStore},
};

use crate::{Error, Result};

const AUDIT_TABLE: &str = "admin_logs";

/// Connection settings for the hosted row store.
#[derive(Debug, Clone, Deserialize)]
pub struct RestConfig {
  /// Project URL, without the `/rest/v1` suffix.
  pub url:     String,
  /// Public ("anon") API key.
  pub api_key: String,
}

/// Async client for the hosted row store.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct RestStore {
  client: Client,
  config: RestConfig,
}

impl RestStore {
  pub fn new(config: RestConfig) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, table: &str) -> String {
    format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), table)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    req
      .header("apikey", &self.config.api_key)
      .bearer_auth(&self.config.api_key)
  }

  async fn send(
    &self,
    method: &'static str,
    table: &'static str,
    req: RequestBuilder,
  ) -> Result<Response> {
    let resp = self.auth(req).send().await?;
    let status = resp.status();
    if status.is_success() {
      debug!(method, table, %status, "remote store request");
      return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Status { method, table, status, body })
  }
}

// ─── Query building ──────────────────────────────────────────────────────────

/// `order=` parameter; ties are broken by the identity column.
fn order_param(table: Table) -> String {
  let dir = |descending| if descending { "desc" } else { "asc" };
  let field = table.order.field();
  let primary = format!("{field}.{}", dir(table.order.is_descending()));
  if field == table.id_field {
    primary
  } else {
    format!("{primary},{}.asc", table.id_field)
  }
}

/// Horizontal filter selecting one row by identity, e.g. `("id", "eq.4")`.
fn id_filter(table: Table, id: &RecordId) -> (&'static str, String) {
  (table.id_field, format!("eq.{id}"))
}

/// Whether a `return=representation` response carries any row.
async fn matched(resp: Response) -> Result<bool> {
  let rows: Vec<Value> = resp.json().await?;
  Ok(!rows.is_empty())
}

/// The `Prefer` header for inserts. Keyed tables replace an existing key.
fn insert_preference(table: Table) -> &'static str {
  match table.identity {
    Identity::Serial => "return=representation",
    Identity::Key => "resolution=merge-duplicates,return=representation",
  }
}

// ─── RemoteStore impl ────────────────────────────────────────────────────────

impl RemoteStore for RestStore {
  type Error = Error;

  /// `GET /rest/v1/{table}?select=*&order=…`
  async fn select(&self, table: Table) -> Result<Vec<Row>> {
    let req = self
      .client
      .get(self.url(table.name))
      .query(&[("select", "*".to_owned()), ("order", order_param(table))]);
    let resp = self.send("GET", table.name, req).await?;
    Ok(resp.json().await?)
  }

  /// `POST /rest/v1/{table}` returning the stored row.
  async fn insert(&self, table: Table, row: Row) -> Result<Row> {
    if table.identity == Identity::Key && !row.contains_key(table.id_field) {
      return Err(Error::MissingId(table.name));
    }
    let mut req = self
      .client
      .post(self.url(table.name))
      .header("Prefer", insert_preference(table))
      .json(&row);
    if table.identity == Identity::Key {
      req = req.query(&[("on_conflict", table.id_field)]);
    }
    let resp = self.send("POST", table.name, req).await?;
    let rows: Vec<Row> = resp.json().await?;
    rows
      .into_iter()
      .next()
      .ok_or(Error::EmptyResponse(table.name))
  }

  /// `PATCH /rest/v1/{table}?{id}=eq.{value}`
  async fn update(&self, table: Table, id: RecordId, row: Row) -> Result<bool> {
    let req = self
      .client
      .patch(self.url(table.name))
      .query(&[id_filter(table, &id)])
      .header("Prefer", "return=representation")
      .json(&row);
    let resp = self.send("PATCH", table.name, req).await?;
    matched(resp).await
  }

  /// `DELETE /rest/v1/{table}?{id}=eq.{value}`
  async fn delete(&self, table: Table, id: RecordId) -> Result<bool> {
    let req = self
      .client
      .delete(self.url(table.name))
      .query(&[id_filter(table, &id)])
      .header("Prefer", "return=representation");
    let resp = self.send("DELETE", table.name, req).await?;
    matched(resp).await
  }

  /// `POST /rest/v1/{table}?on_conflict={id}` with merge-duplicates.
  async fn upsert(&self, table: Table, rows: Vec<Row>) -> Result<()> {
    let has_ids = rows
      .iter()
      .all(|r| r.get(table.id_field).is_some_and(|v| !v.is_null()));
    if !has_ids {
      return Err(Error::MissingId(table.name));
    }
    let req = self
      .client
      .post(self.url(table.name))
      .query(&[("on_conflict", table.id_field)])
      .header("Prefer", "resolution=merge-duplicates")
      .json(&rows);
    self.send("POST", table.name, req).await?;
    Ok(())
  }

  /// `GET /rest/v1/settings?select=key&limit=1`
  async fn health_check(&self) -> Result<()> {
    let req = self
      .client
      .get(self.url("settings"))
      .query(&[("select", "key"), ("limit", "1")]);
    let resp = self.send("GET", "settings", req).await?;
    resp.json::<Value>().await?;
    Ok(())
  }

  async fn append_audit(&self, entry: NewAuditEntry) -> Result<AuditEntry> {
    let req = self
      .client
      .post(self.url(AUDIT_TABLE))
      .header("Prefer", "return=representation")
      .json(&entry);
    let resp = self.send("POST", AUDIT_TABLE, req).await?;
    let entries: Vec<AuditEntry> = resp.json().await?;
    entries
      .into_iter()
      .next()
      .ok_or(Error::EmptyResponse(AUDIT_TABLE))
  }

  async fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
    let req = self.client.get(self.url(AUDIT_TABLE)).query(&[
      ("select", "*".to_owned()),
      ("order", "id.desc".to_owned()),
      ("limit", limit.to_string()),
    ]);
    let resp = self.send("GET", AUDIT_TABLE, req).await?;
    Ok(resp.json().await?)
  }
}
