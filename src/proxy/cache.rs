//! Pipeline cache.
//!
//! # Responsibilities
//! - Map client identifiers to their forwarding pipeline
//! - Build a pipeline on first sight of an identifier
//! - Share that pipeline with every later request
//!
//! # State per identifier
//! ```text
//! absent ──first request──▶ present   (never evicted)
//! ```
//!
//! # Design Decisions
//! - Construction happens under the shard write lock of the entry, so N
//!   simultaneous first requests build exactly one pipeline
//! - Hits take only a shard read lock
//! - A cached pipeline keeps its original target even if the directory
//!   later publishes a different address for the identifier

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::pipeline::{ForwardError, Pipeline, Transport};
use crate::observability::metrics;

/// Process-lifetime map of identifier → pipeline.
#[derive(Debug)]
pub struct PipelineCache {
    pipelines: DashMap<String, Arc<Pipeline>>,
    transport: Transport,
    constructed: AtomicUsize,
}

impl PipelineCache {
    pub fn new(transport: Transport) -> Self {
        Self {
            pipelines: DashMap::new(),
            transport,
            constructed: AtomicUsize::new(0),
        }
    }

    /// Return the pipeline for `identifier`, building one toward `address`
    /// if none exists. `address` is ignored on a hit.
    pub fn get_or_create(
        &self,
        identifier: &str,
        address: &str,
    ) -> Result<Arc<Pipeline>, ForwardError> {
        if let Some(pipeline) = self.get(identifier) {
            return Ok(pipeline);
        }

        let pipeline = match self.pipelines.entry(identifier.to_string()) {
            Entry::Occupied(entry) => return Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let pipeline = Arc::new(Pipeline::new(identifier, address, &self.transport)?);
                self.constructed.fetch_add(1, Ordering::Relaxed);
                entry.insert(Arc::clone(&pipeline));
                pipeline
            }
        };

        let size = self.pipelines.len();
        metrics::record_pipeline_constructed(size);
        tracing::info!(
            identifier = %pipeline.identifier(),
            backend = %pipeline.target(),
            cached = size,
            "Pipeline created"
        );

        Ok(pipeline)
    }

    pub fn get(&self, identifier: &str) -> Option<Arc<Pipeline>> {
        self.pipelines
            .get(identifier)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Number of pipelines ever built.
    pub fn constructed(&self) -> usize {
        self.constructed.load(Ordering::Relaxed)
    }
}
