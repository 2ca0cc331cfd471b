//! Directory client subsystem.
//!
//! # Data Flow
//! ```text
//! BackendResolver
//!     → Filter (field path + exact/contains clauses, ANDed)
//!     → Directory::find_one
//!         → mongo.rs (MongoDB `cpes` collection, production)
//!         → memory.rs (static records, tests)
//!     → Option<BackendRecord>
//! ```
//!
//! # Design Decisions
//! - The directory is owned externally; this crate only reads records
//! - Implementations never retry and never swallow errors
//! - `Contains` is a literal substring match on every implementation

pub mod memory;
pub mod mongo;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use memory::InMemoryDirectory;
pub use mongo::MongoDirectory;

/// Schema paths of the fields the proxy queries or reads.
pub mod fields {
    pub const ID: &str = "_id";
    pub const TUNNEL_TYPE: &str = "state.l2tp_state.tunnel_type";
    pub const LOCAL_ADDR: &str = "state.l2tp_state.local_addr";
}

/// Errors surfaced by a directory implementation.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("mongodb: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("directory did not answer within {0:?}")]
    Timeout(Duration),

    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of the directory that maps identifiers to backend records.
pub trait Directory: Send + Sync {
    /// Returns the first record matching every clause of `filter`.
    fn find_one(
        &self,
        filter: &Filter,
    ) -> BoxFuture<'static, Result<Option<BackendRecord>, DirectoryError>>;
}

/// How a single field is compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Match {
    /// Field equals the value.
    Exact(String),
    /// Field contains the value as a literal substring.
    Contains(String),
}

impl Match {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Match::Exact(expected) => value == expected,
            Match::Contains(needle) => value.contains(needle.as_str()),
        }
    }
}

/// One `field <op> value` constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub field: String,
    pub matcher: Match,
}

/// A conjunction of field constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exact(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.clauses.push(Clause {
            field: field.into(),
            matcher: Match::Exact(value.into()),
        });
        self
    }

    pub fn contains(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.clauses.push(Clause {
            field: field.into(),
            matcher: Match::Contains(value.into()),
        });
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Evaluates the filter against a record. Unknown or absent fields never match.
    pub fn matches(&self, record: &BackendRecord) -> bool {
        self.clauses.iter().all(|clause| {
            record
                .field(&clause.field)
                .map(|value| clause.matcher.matches(value))
                .unwrap_or(false)
        })
    }
}

/// A CPE entry in the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendRecord {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(default)]
    pub state: RecordState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordState {
    #[serde(rename = "l2tp_state", default)]
    pub tunnel: TunnelState,
}

/// Negotiated tunnel parameters published by the CPE.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelState {
    #[serde(default)]
    pub local_addr: Option<String>,

    #[serde(default)]
    pub tunnel_type: Option<String>,
}

impl BackendRecord {
    pub fn new(
        id: impl Into<String>,
        tunnel_type: impl Into<String>,
        local_addr: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            state: RecordState {
                tunnel: TunnelState {
                    local_addr: Some(local_addr.into()),
                    tunnel_type: Some(tunnel_type.into()),
                },
            },
        }
    }

    /// Tunnel address the backend is reachable at, if published.
    pub fn address(&self) -> Option<&str> {
        self.state.tunnel.local_addr.as_deref()
    }

    /// Looks up a field by its schema path.
    pub fn field(&self, path: &str) -> Option<&str> {
        match path {
            fields::ID => Some(self.id.as_str()),
            fields::TUNNEL_TYPE => self.state.tunnel.tunnel_type.as_deref(),
            fields::LOCAL_ADDR => self.state.tunnel.local_addr.as_deref(),
            _ => None,
        }
    }
}
