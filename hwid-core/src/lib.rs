//! hwid Core Library
//!
//! Drift-tolerant, hardware-bound device identifiers.
//!
//! # Features
//!
//! - **Bloom Encoding**: Each hardware identifier becomes a sparse 64-bit filter
//! - **Plausibility Checks**: Placeholder and fake serials are rejected before encoding
//! - **Partial-Change Tolerance**: Stored fingerprints survive losing a device or two
//! - **Scoped Persistence**: Records are masked per storage scope and written everywhere
//!
//! # Module Structure
//!
//! - `sources/` - Candidate collectors (sysfs, helper processes, in-memory)
//! - `bloom`, `plausibility` - Encoding and filtering of single identifiers
//! - `aggregate`, `consistency` - Composite generation and re-checking
//! - `storage`, `derive`, `lifecycle` - Persistence and the public identifier
//!
//! # Example
//!
//! ```no_run
//! use hwid_core::{IdentityConfig, IdentityContext};
//!
//! let config = IdentityConfig::load(None).unwrap();
//! let ctx = IdentityContext::from_config(&config);
//! println!("{}", ctx.public_id());
//! ```

// Grouped modules
pub mod sources;

// Standalone modules
pub mod aggregate;
pub mod bloom;
pub mod config;
pub mod consistency;
pub mod constants;
pub mod derive;
pub mod diagnostics;
pub mod error;
pub mod lifecycle;
pub mod plausibility;
pub mod storage;

// Re-export error types
pub use error::{HwidError, Result};

// Re-export encoding primitives
pub use bloom::BloomValue;
pub use plausibility::{verify_lenient, verify_strict, Plausibility};

// Re-export collectors
pub use sources::{
    CandidateSource, PlatformSource, ProcessSource, SourceTag, StaticSource, SysfsSource,
};

// Re-export fingerprint engine
pub use aggregate::{generate, Candidate};
pub use consistency::{accepts, check, required_matches, validate, CheckReport};

// Re-export persistence
pub use config::{IdentityConfig, StorageEntry};
pub use storage::{
    encode_record, load_record, parse_record, store_record, FileLocation, FingerprintRecord,
    StorageLocation, StorageScope,
};

// Re-export lifecycle
pub use derive::derive_public_id;
pub use lifecycle::{
    file_locations, IdentityContext, IdentityOrigin, IdentityStatus, LifecycleState, Locations,
};

// Re-export diagnostics
pub use diagnostics::{
    bloom_report, probe_cpu_serial, verify_report, BloomReport, CpuSerialProbe, Verdict,
};
