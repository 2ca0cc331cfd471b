//! MongoDB-backed directory.

use futures_util::future::{BoxFuture, FutureExt};
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use std::time::Duration;

use super::{BackendRecord, Directory, DirectoryError, Filter, Match};
use crate::config::DirectoryConfig;

/// Directory client over a single MongoDB collection.
#[derive(Debug, Clone)]
pub struct MongoDirectory {
    collection: Collection<BackendRecord>,
}

impl MongoDirectory {
    /// Connect to the directory described by `config`.
    ///
    /// The driver connects lazily; this only fails on a malformed URI or
    /// unresolvable SRV record.
    pub async fn connect(config: &DirectoryConfig) -> Result<Self, DirectoryError> {
        let uri = connection_uri(&config.uri);
        let mut options = ClientOptions::parse(uri.as_str()).await?;
        options.app_name = Some("cpe-proxy".to_string());
        options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
        options.server_selection_timeout = Some(Duration::from_secs(config.connect_timeout_secs));

        let client = Client::with_options(options)?;
        let collection = client
            .database(&config.database)
            .collection::<BackendRecord>(&config.collection);

        tracing::info!(
            uri = %config.uri,
            database = %config.database,
            collection = %config.collection,
            "Directory client configured"
        );

        Ok(Self { collection })
    }
}

impl Directory for MongoDirectory {
    fn find_one(
        &self,
        filter: &Filter,
    ) -> BoxFuture<'static, Result<Option<BackendRecord>, DirectoryError>> {
        let collection = self.collection.clone();
        let query = filter_document(filter);
        async move {
            tracing::trace!(query = %query, "Directory query");
            collection.find_one(query).await.map_err(DirectoryError::from)
        }
        .boxed()
    }
}

/// Accepts either a bare `host[:port]` or a full connection string.
pub fn connection_uri(addr: &str) -> String {
    if addr.starts_with("mongodb://") || addr.starts_with("mongodb+srv://") {
        addr.to_string()
    } else {
        format!("mongodb://{}", addr)
    }
}

/// Render a [`Filter`] as a MongoDB query document.
pub fn filter_document(filter: &Filter) -> Document {
    let mut query = Document::new();
    for clause in filter.clauses() {
        let value = match &clause.matcher {
            Match::Exact(value) => Bson::String(value.clone()),
            Match::Contains(value) => Bson::Document(doc! { "$regex": regex::escape(value) }),
        };
        query.insert(clause.field.clone(), value);
    }
    query
}
