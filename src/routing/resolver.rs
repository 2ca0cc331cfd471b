//! Identifier → backend address resolution.
//!
//! # Responsibilities
//! - Shape the directory query (identifier + tunnel type)
//! - Bound the lookup with a timeout
//! - Extract the tunnel address from the matched record
//!
//! # Design Decisions
//! - No caching and no retries; callers may resolve repeatedly
//! - A record without an address resolves to `""`, not an error
//! - An empty identifier is never sent to the directory; as a substring it
//!   would match every record

use std::sync::Arc;
use std::time::Duration;

use crate::config::{DirectoryConfig, RoutingConfig};
use crate::directory::{fields, Directory, DirectoryError, Filter};
use crate::observability::metrics;

/// Resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("directory lookup for '{identifier}' failed: {source}")]
    Directory {
        identifier: String,
        #[source]
        source: DirectoryError,
    },

    #[error("no backend record matches '{identifier}'")]
    NotFound { identifier: String },
}

/// Translates client identifiers into backend addresses.
pub struct BackendResolver {
    directory: Arc<dyn Directory>,
    tunnel_type: String,
    exact_identifier: bool,
    query_timeout: Duration,
}

impl BackendResolver {
    pub fn new(
        directory: Arc<dyn Directory>,
        routing: &RoutingConfig,
        directory_config: &DirectoryConfig,
    ) -> Self {
        Self {
            directory,
            tunnel_type: routing.tunnel_type.clone(),
            exact_identifier: routing.exact_identifier,
            query_timeout: directory_config.query_timeout(),
        }
    }

    /// The directory query issued for `identifier`.
    pub fn query(&self, identifier: &str) -> Filter {
        let filter = if self.exact_identifier {
            Filter::new().exact(fields::ID, identifier)
        } else {
            Filter::new().contains(fields::ID, identifier)
        };
        filter.contains(fields::TUNNEL_TYPE, self.tunnel_type.as_str())
    }

    /// Resolve `identifier` to the tunnel address of its record.
    pub async fn resolve(&self, identifier: &str) -> Result<String, ResolveError> {
        if identifier.is_empty() {
            metrics::record_resolution("not_found");
            return Err(ResolveError::NotFound {
                identifier: String::new(),
            });
        }

        let filter = self.query(identifier);
        let lookup = self.directory.find_one(&filter);

        let found = match tokio::time::timeout(self.query_timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(DirectoryError::Timeout(self.query_timeout)),
        };

        match found {
            Ok(Some(record)) => {
                metrics::record_resolution("found");
                Ok(record.address().unwrap_or_default().to_string())
            }
            Ok(None) => {
                metrics::record_resolution("not_found");
                Err(ResolveError::NotFound {
                    identifier: identifier.to_string(),
                })
            }
            Err(source) => {
                metrics::record_resolution("error");
                Err(ResolveError::Directory {
                    identifier: identifier.to_string(),
                    source,
                })
            }
        }
    }
}

impl std::fmt::Debug for BackendResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendResolver")
            .field("tunnel_type", &self.tunnel_type)
            .field("exact_identifier", &self.exact_identifier)
            .field("query_timeout", &self.query_timeout)
            .finish_non_exhaustive()
    }
}
