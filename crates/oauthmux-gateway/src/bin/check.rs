//! Load the configured OAuth server definitions and print the resulting
//! route table without serving it.
//!
//! Exits non-zero when the definition store cannot be read.

use std::sync::Arc;

use anyhow::Result;
use oauthmux_gateway::{logging, DefaultManagerFactory, InMemoryRouteTable, LoaderConfig, OAuthLoader};
use oauthmux_storage::FileSystemOAuthServerRepository;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = LoaderConfig::from_env();
    let _guard = logging::init(&config.log_filter, config.log_dir.as_deref())?;

    info!(
        dir = %config.definitions_dir.display(),
        "[Check] Loading OAuth server definitions"
    );

    let table = Arc::new(InMemoryRouteTable::new());
    let loader = OAuthLoader::new(table.clone(), Arc::new(DefaultManagerFactory::new()), &config);
    let repo = FileSystemOAuthServerRepository::new(&config.definitions_dir);
    let summary = loader.load(&repo).await?;

    for route in table.routes() {
        let methods = if route.endpoint.allows_any_method() {
            "ALL".to_string()
        } else {
            route.endpoint.methods.join(",")
        };
        let links: Vec<String> = route.chain.kinds().iter().map(ToString::to_string).collect();
        println!(
            "{:<24} {:<14} {:<12} {:<32} [{}]",
            route.server,
            route.kind.as_str(),
            methods,
            route.endpoint.listen_path,
            links.join(" > ")
        );
    }

    for skipped in &summary.skipped_servers {
        println!("skipped {}: {}", skipped.name, skipped.reason);
    }
    for server in summary.servers.iter().filter(|s| s.invalid > 0) {
        println!("{}: {} invalid endpoint(s)", server.name, server.invalid);
    }

    info!(
        routes = summary.registered_routes(),
        skipped = summary.skipped_servers.len(),
        "[Check] Done"
    );
    Ok(())
}
