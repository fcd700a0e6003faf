//! HTTP gateway for a PostgREST-style REST endpoint (`/rest/v1/<table>`).

use serde_json::Value as JsonValue;

use pharmloc_inventory::InventoryRecord;

use crate::change::ChangeSubscription;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::InventoryGateway;
use crate::poll::PollingChangeFeed;
use crate::query::SelectQuery;

/// Gateway over HTTP.
///
/// Selects map to `GET /rest/v1/<table>?select=*&col=eq.v&order=...`. The
/// REST surface has no push channel, so change notifications come from a
/// `PollingChangeFeed` over the configured table.
#[derive(Debug)]
pub struct PostgrestGateway {
    client: reqwest::Client,
    config: GatewayConfig,
    changes: PollingChangeFeed,
}

impl PostgrestGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let changes = PollingChangeFeed::new(config.poll_interval);
        Ok(Self {
            client,
            config,
            changes,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn ensure_table(&self, table: &str) -> Result<(), GatewayError> {
        if table != self.config.table {
            return Err(GatewayError::UnknownTable(table.to_string()));
        }
        Ok(())
    }
}

/// Run `query` and return the raw JSON rows.
async fn fetch_rows(
    client: &reqwest::Client,
    config: &GatewayConfig,
    query: &SelectQuery,
) -> Result<Vec<JsonValue>, GatewayError> {
    let url = config.table_url(&query.table);
    let resp = client
        .get(&url)
        .query(&query.to_query_pairs())
        .header("apikey", &config.api_key)
        .bearer_auth(&config.api_key)
        .send()
        .await
        .map_err(|e| GatewayError::Transport(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(GatewayError::Status {
            status: status.as_u16(),
            body: resp.text().await.unwrap_or_default(),
        });
    }

    resp.json::<Vec<JsonValue>>()
        .await
        .map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Decode raw rows into records. One bad row fails the whole response.
pub fn decode_rows(rows: Vec<JsonValue>) -> Result<Vec<InventoryRecord>, GatewayError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| GatewayError::Decode(e.to_string())))
        .collect()
}

#[async_trait::async_trait]
impl InventoryGateway for PostgrestGateway {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<InventoryRecord>, GatewayError> {
        self.ensure_table(&query.table)?;
        tracing::debug!(table = %query.table, filters = query.filters.len(), "gateway select");
        let rows = fetch_rows(&self.client, &self.config, query).await?;
        decode_rows(rows)
    }

    fn subscribe(&self, table: &str) -> Result<ChangeSubscription, GatewayError> {
        self.ensure_table(table)?;
        let client = self.client.clone();
        let config = self.config.clone();
        let query = SelectQuery::from(table);
        self.changes.subscribe(table, move || {
            let client = client.clone();
            let config = config.clone();
            let query = query.clone();
            async move { fetch_rows(&client, &config, &query).await }
        })
    }
}
