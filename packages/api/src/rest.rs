//! Record store over the hosted REST interface (`/rest/v1/<table>`).

use serde::de::DeserializeOwned;
use serde::Serialize;
use store::{Error, Filter, Order, RecordChange, RecordStore, Result, Subscription};

use crate::client::{send, HostedBackend};
use crate::realtime;

/// Query parameters of a select: every column, the filter, then the ordering.
fn select_query(filter: &Filter, order: Option<&Order>) -> Vec<(String, String)> {
    let mut query = vec![("select".to_string(), "*".to_string())];
    query.extend(filter.to_query_pairs());
    if let Some(order) = order {
        query.push(("order".to_string(), order.to_query_value()));
    }
    query
}

/// Updates and deletes must name their rows.
fn require_filter(filter: &Filter, operation: &str) -> Result<()> {
    if filter.is_empty() {
        return Err(Error::Mutation(format!("{operation} requires a filter")));
    }
    Ok(())
}

impl HostedBackend {
    fn table_url(&self, table: &str) -> String {
        self.config.endpoint(&format!("/rest/v1/{table}"))
    }
}

impl RecordStore for HostedBackend {
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filter: &Filter,
        order: Option<&Order>,
    ) -> Result<Vec<T>> {
        tracing::debug!(table, "select");
        let request = self
            .authorize(self.http.get(self.table_url(table)))
            .await?
            .query(&select_query(filter, order));
        let response = send(request, Error::Fetch).await?;
        response.json().await.map_err(|e| Error::Fetch(e.to_string()))
    }

    async fn insert<R: Serialize>(&self, table: &str, record: &R) -> Result<()> {
        tracing::debug!(table, "insert");
        let request = self
            .authorize(self.http.post(self.table_url(table)))
            .await?
            .header("Prefer", "return=minimal")
            .json(record);
        send(request, Error::Mutation).await?;
        Ok(())
    }

    async fn update<R: Serialize>(&self, table: &str, filter: &Filter, fields: &R) -> Result<()> {
        require_filter(filter, "update")?;
        tracing::debug!(table, "update");
        let request = self
            .authorize(self.http.patch(self.table_url(table)))
            .await?
            .query(&filter.to_query_pairs())
            .header("Prefer", "return=minimal")
            .json(fields);
        send(request, Error::Mutation).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<()> {
        require_filter(filter, "delete")?;
        tracing::debug!(table, "delete");
        let request = self
            .authorize(self.http.delete(self.table_url(table)))
            .await?
            .query(&filter.to_query_pairs());
        send(request, Error::Mutation).await?;
        Ok(())
    }

    async fn subscribe(&self, table: &str, filter: &Filter) -> Result<Subscription<RecordChange>> {
        let channel = self
            .channel
            .clone()
            .unwrap_or_else(|| format!("{table}-channel"));
        let token = self.access_token().await?;
        let join = realtime::join_message(&channel, table, filter, &token, "1");
        let leave = realtime::leave_message(&channel, "2");
        tracing::debug!(table, %channel, "subscribing to changes");
        realtime::connect(&self.config.realtime_url(), join, leave)
    }
}
