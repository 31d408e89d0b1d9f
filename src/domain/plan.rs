use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::client_entry::{serialize_number, ClientEntry};
use crate::domain::value_objects::{Fingerprint, Locator};

/// Batch operation requested from the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanAction {
    Update,
}

/// How the source copy of a plan was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceChoice {
    /// The caller named a locator and it was found in the sub-group.
    Explicit,
    /// The top-ranked candidate was used.
    Recommended,
}

/// Addressing data for one copy to overwrite.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTarget {
    pub locator: Locator,
    pub server_id: String,
    pub server_name: String,
    pub inbound_id: i64,
    pub protocol: String,
    /// The target's own email, to help the executor find the client.
    pub email: String,
    /// The target's own identifier; the executor updates by this key.
    pub client_identifier: String,
}

/// Values written to every target: the source's comparable fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanClient {
    pub id: String,
    pub password: String,
    pub email: String,
    #[serde(rename = "totalGB", serialize_with = "serialize_number")]
    pub total_gb: f64,
    #[serde(serialize_with = "serialize_number")]
    pub expiry_time: f64,
    pub enable: bool,
    pub tg_id: Value,
    pub sub_id: String,
    #[serde(serialize_with = "serialize_number")]
    pub limit_ip: f64,
    pub flow: String,
}

/// Overwrite every non-source copy of one protocol sub-group with the
/// source's values.
///
/// Built on demand and handed straight to a batch executor. `based_on` is
/// the fingerprint of the snapshot the plan was derived from. It covers entry
/// order too: reordered copies with tied scores may rank another source first,
/// so a reordered snapshot does not match.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationPlan {
    pub action: PlanAction,
    pub based_on: Fingerprint,
    pub source_locator: Locator,
    pub source_choice: SourceChoice,
    pub targets: Vec<PlanTarget>,
    pub client: PlanClient,
    #[serde(skip)]
    pub source_entry: ClientEntry,
}

/// Result of planning a sub-group.
///
/// "Nothing to do" is a normal outcome, not an error, but it is a distinct
/// variant so it can never be mistaken for an applicable plan.
#[derive(Debug, Clone)]
pub enum PlanOutcome {
    Ready(ReconciliationPlan),
    /// Every copy already equals the source; there are no targets.
    AlreadyConverged,
    /// The chosen source has no value in its credential field, so applying it
    /// would wipe credentials on every target.
    MissingCredential { source: Locator },
}

impl PlanOutcome {
    pub fn plan(&self) -> Option<&ReconciliationPlan> {
        match self {
            PlanOutcome::Ready(plan) => Some(plan),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PlanOutcome::Ready(_))
    }
}

/// Caller input that cannot be planned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("source locator {0} is not a member of the {1} sub-group")]
    UnknownSource(Locator, String),

    #[error("no conflicting identity {0:?} in the report")]
    UnknownIdentity(String),

    #[error("identity {identity:?} has no conflicting {protocol} sub-group")]
    UnknownProtocol { identity: String, protocol: String },
}
