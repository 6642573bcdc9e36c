//! Fingerprint lifecycle
//!
//! Runs once per process: load a stored fingerprint, check it against live
//! hardware, regenerate it when nothing trustworthy was stored, derive the
//! public identifier and write the fingerprint back to every location.
//!
//! ```text
//! NoId -> Loading -> Validating -> Valid -------------> Persisted
//!                        |          ^
//!                        v          |
//!                    Regenerating --+
//! ```
//!
//! Nothing here is fatal. Unreadable locations are skipped, unwritable ones
//! are logged, and the worst case is a fresh fingerprint on every run.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregate::generate;
use crate::bloom::BloomValue;
use crate::config::IdentityConfig;
use crate::consistency::{validate, CheckReport};
use crate::derive::derive_public_id;
use crate::sources::{CandidateSource, PlatformSource};
use crate::storage::{load_record, store_record, FileLocation, FingerprintRecord, StorageLocation};

/// Lifecycle states, in the order a run passes through them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    NoId,
    Loading,
    Validating,
    Regenerating,
    Valid,
    Persisted,
}

/// Where the accepted fingerprint came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentityOrigin {
    /// Loaded from storage and corroborated by live hardware
    Stored(FingerprintRecord),
    /// Built from the identifiers currently visible
    Generated,
}

/// Storage locations in load order
pub type Locations = Vec<Box<dyn StorageLocation>>;

/// Fingerprint state owned by the identification subsystem
///
/// Callers must serialize access themselves; the context is built once during
/// startup and only read afterwards.
#[derive(Debug)]
pub struct IdentityContext {
    raw: BloomValue,
    public_id: String,
    custom_id: Option<String>,
    origin: IdentityOrigin,
    last_check: Option<CheckReport>,
    persisted_to: Vec<String>,
    history: Vec<LifecycleState>,
}

impl IdentityContext {
    /// Run the full lifecycle against `source` and `locations`
    pub fn initialize<S>(source: &S, locations: &[Box<dyn StorageLocation>]) -> Self
    where
        S: CandidateSource + ?Sized,
    {
        let mut history = vec![LifecycleState::NoId, LifecycleState::Loading];
        let mut last_check = None;
        let mut accepted = None;

        for location in locations {
            let record = match load_record(location.as_ref()) {
                Ok(Some(record)) => record,
                Ok(None) => {
                    debug!(location = %location.describe(), "No fingerprint stored");
                    continue;
                }
                Err(e) => {
                    debug!(location = %location.describe(), error = %e, "Could not load fingerprint");
                    continue;
                }
            };

            history.push(LifecycleState::Validating);
            let report = validate(record.raw, source);
            last_check = Some(report);

            if report.accepted {
                accepted = Some(record);
                break;
            }

            debug!(
                location = %record.origin,
                weight = report.weight,
                matches = report.matches,
                required = report.required,
                "Stored fingerprint not corroborated, discarding"
            );
        }

        let (raw, origin) = match accepted {
            Some(record) => (record.raw, IdentityOrigin::Stored(record)),
            None => {
                history.push(LifecycleState::Regenerating);
                (generate(source), IdentityOrigin::Generated)
            }
        };
        history.push(LifecycleState::Valid);

        let public_id = derive_public_id(raw);

        let mut persisted_to = Vec::new();
        for location in locations {
            match store_record(location.as_ref(), raw) {
                Ok(()) => persisted_to.push(location.describe()),
                Err(e) => debug!(location = %location.describe(), error = %e, "Could not persist fingerprint"),
            }
        }
        history.push(LifecycleState::Persisted);

        match &origin {
            IdentityOrigin::Stored(record) => info!(
                location = %record.origin,
                weight = raw.weight(),
                persisted = persisted_to.len(),
                "Using stored hardware fingerprint"
            ),
            IdentityOrigin::Generated => info!(
                weight = raw.weight(),
                persisted = persisted_to.len(),
                "Generated new hardware fingerprint"
            ),
        }

        Self {
            raw,
            public_id,
            custom_id: None,
            origin,
            last_check,
            persisted_to,
            history,
        }
    }

    /// Run the lifecycle with the platform collectors and configured files
    pub fn from_config(config: &IdentityConfig) -> Self {
        let source = PlatformSource::from_config(config);
        let locations = file_locations(config);
        Self::initialize(&source, &locations)
    }

    /// The public identifier: 32 lowercase hex characters
    pub fn public_id(&self) -> &str {
        &self.public_id
    }

    /// Record an operator-supplied identifier
    ///
    /// Kept for compatibility only: it is not served by [`Self::public_id`].
    pub fn set_custom_id(&mut self, id: impl Into<String>) {
        self.custom_id = Some(id.into());
    }

    pub fn custom_id(&self) -> Option<&str> {
        self.custom_id.as_deref()
    }

    /// The accepted raw fingerprint
    pub fn raw(&self) -> BloomValue {
        self.raw
    }

    pub fn origin(&self) -> &IdentityOrigin {
        &self.origin
    }

    /// The stored record that was accepted, if any
    pub fn record(&self) -> Option<&FingerprintRecord> {
        match &self.origin {
            IdentityOrigin::Stored(record) => Some(record),
            IdentityOrigin::Generated => None,
        }
    }

    /// Report of the last stored fingerprint checked, accepted or not
    pub fn last_check(&self) -> Option<CheckReport> {
        self.last_check
    }

    /// Locations the fingerprint was written to
    pub fn persisted_to(&self) -> &[String] {
        &self.persisted_to
    }

    pub fn state(&self) -> LifecycleState {
        self.history
            .last()
            .copied()
            .unwrap_or(LifecycleState::NoId)
    }

    /// Every state this run passed through
    pub fn history(&self) -> &[LifecycleState] {
        &self.history
    }

    /// Snapshot suitable for printing
    pub fn status(&self) -> IdentityStatus {
        IdentityStatus {
            state: self.state(),
            public_id: self.public_id.clone(),
            raw: self.raw.to_string(),
            weight: self.raw.weight(),
            origin: self.origin.clone(),
            last_check: self.last_check,
            persisted_to: self.persisted_to.clone(),
            custom_id: self.custom_id.clone(),
        }
    }

    /// Drop the fingerprint state, returning the raw value it held
    pub fn teardown(self) -> BloomValue {
        debug!(weight = self.raw.weight(), "Tearing down identity context");
        self.raw
    }
}

/// Serializable view of an initialized context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityStatus {
    pub state: LifecycleState,
    pub public_id: String,
    pub raw: String,
    pub weight: u32,
    pub origin: IdentityOrigin,
    pub last_check: Option<CheckReport>,
    pub persisted_to: Vec<String>,
    pub custom_id: Option<String>,
}

/// File-backed locations for the configured storage entries
pub fn file_locations(config: &IdentityConfig) -> Locations {
    config
        .storage_entries()
        .into_iter()
        .map(|entry| Box::new(FileLocation::new(entry.path, entry.scope)) as Box<dyn StorageLocation>)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
