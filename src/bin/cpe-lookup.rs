//! Resolve a client identifier against the directory the way the proxy does.

use clap::Parser;
use std::sync::Arc;

use cpe_proxy::config::{DirectoryConfig, RoutingConfig};
use cpe_proxy::directory::MongoDirectory;
use cpe_proxy::proxy::tls::install_crypto_provider;
use cpe_proxy::routing::{extract_identifier, BackendResolver};

#[derive(Parser)]
#[command(name = "cpe-lookup")]
#[command(about = "Resolve a CPE identifier or hostname to its tunnel address", long_about = None)]
struct Cli {
    /// Identifier, or a full hostname whose first label is the identifier.
    target: String,

    /// MongoDB host or connection string.
    #[arg(short, long, env = "MONGO_ADDR", default_value = "db")]
    uri: String,

    #[arg(long, default_value = "cpe")]
    database: String,

    #[arg(long, default_value = "cpes")]
    collection: String,

    /// Substring the record's tunnel type must contain.
    #[arg(short, long, default_value = "ipsec")]
    tunnel_type: String,

    /// Match any record id containing the identifier instead of requiring
    /// equality.
    #[arg(long)]
    substring: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    install_crypto_provider();

    let directory_config = DirectoryConfig {
        uri: cli.uri,
        database: cli.database,
        collection: cli.collection,
        ..DirectoryConfig::default()
    };
    let routing = RoutingConfig {
        tunnel_type: cli.tunnel_type,
        exact_identifier: !cli.substring,
    };

    let directory = MongoDirectory::connect(&directory_config).await?;
    let resolver = BackendResolver::new(Arc::new(directory), &routing, &directory_config);

    let identifier = extract_identifier(&cli.target);
    let address = resolver.resolve(identifier).await?;
    if address.is_empty() {
        eprintln!("{}: record found but no tunnel address published", identifier);
        std::process::exit(1);
    }

    println!("{}", address);
    Ok(())
}
