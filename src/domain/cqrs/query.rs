//! CQRS query handler for the case directory projection.

use super::CaseAggregate;
use crate::domain::view::CaseDirectory;
use async_trait::async_trait;
use cqrs_es::Query;
use std::sync::Arc;
use tokio::sync::RwLock;

/// CQRS query handler that keeps the shared `CaseDirectory` current.
pub struct CaseDirectoryQuery {
    pub projection: Arc<RwLock<CaseDirectory>>,
}

impl CaseDirectoryQuery {
    pub fn new(projection: Arc<RwLock<CaseDirectory>>) -> Self {
        Self { projection }
    }
}

#[async_trait]
impl Query<CaseAggregate> for CaseDirectoryQuery {
    async fn dispatch(&self, aggregate_id: &str, events: &[cqrs_es::EventEnvelope<CaseAggregate>]) {
        let mut view = self.projection.write().await;
        for event in events {
            view.apply_event(aggregate_id, &event.payload, event.sequence as u64);
        }
    }
}

#[cfg(test)]
#[path = "../tests/query_tests.rs"]
mod tests;
