//! Case directory projection for reads and worklists.
//!
//! The `CaseDirectory` is derived from `CaseEvent` only (no direct mutation)
//! and holds every case this process knows about. Reads (`getSessions`, the
//! aggregation queries) are served from it so they never touch the aggregate.

use crate::domain::case::Case;
use crate::domain::types::CaseId;
use crate::domain::{CaseAggregate, CaseEvent};
use cqrs_es::EventEnvelope;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One case plus the last event sequence folded into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub case: Case,
    pub last_event_sequence: u64,
}

/// Read-only view of all cases derived from events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseDirectory {
    cases: BTreeMap<CaseId, CaseRecord>,
}

impl CaseDirectory {
    /// Apply an event to update the view.
    pub fn apply_event(&mut self, aggregate_id: &str, event: &CaseEvent, sequence: u64) {
        let case_id = match CaseId::from_string(aggregate_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Invalid aggregate ID '{}': {}", aggregate_id, e);
                return;
            }
        };

        if let Some(record) = self.cases.get_mut(&case_id) {
            if sequence <= record.last_event_sequence {
                tracing::debug!(
                    "Skipping already applied event {} for case {}",
                    sequence,
                    case_id
                );
                return;
            }
            if sequence > record.last_event_sequence + 1 {
                tracing::warn!(
                    "Case {} jumped from sequence {} to {}; waiting for a rebuild",
                    case_id,
                    record.last_event_sequence,
                    sequence
                );
                return;
            }
            record.case.apply(event);
            record.last_event_sequence = sequence;
            return;
        }

        match Case::opened(event) {
            Some(case) => {
                self.cases.insert(
                    case_id,
                    CaseRecord {
                        case,
                        last_event_sequence: sequence,
                    },
                );
            }
            None => tracing::warn!(
                "Event at sequence {} for unknown case {} ignored",
                sequence,
                case_id
            ),
        }
    }

    /// Replaces one case with a fold of its complete stored history.
    ///
    /// Used when other writers may have appended events this directory never
    /// saw. An empty history removes the case.
    pub fn rebuild_case(&mut self, case_id: CaseId, events: &[EventEnvelope<CaseAggregate>]) {
        self.cases.remove(&case_id);

        let mut history = events.iter();
        let Some(first) = history.next() else {
            return;
        };
        let Some(mut case) = Case::opened(&first.payload) else {
            tracing::warn!("History of case {} does not start with CaseOpened", case_id);
            return;
        };
        let mut last_event_sequence = first.sequence as u64;
        for envelope in history {
            case.apply(&envelope.payload);
            last_event_sequence = envelope.sequence as u64;
        }

        self.cases.insert(
            case_id,
            CaseRecord {
                case,
                last_event_sequence,
            },
        );
    }

    pub fn get(&self, case_id: CaseId) -> Option<&CaseRecord> {
        self.cases.get(&case_id)
    }

    /// All cases, ordered by case id.
    pub fn cases(&self) -> impl Iterator<Item = &Case> {
        self.cases.values().map(|record| &record.case)
    }

    /// Cases that take part in worklists.
    pub fn active_cases(&self) -> impl Iterator<Item = &Case> {
        self.cases().filter(|case| !case.is_archived())
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
