//! Users service binary.
//!
//! ```text
//! RUST_LOG=roster=debug cargo run -- --addr 127.0.0.1:3333 --db db.json
//!
//! curl -X POST localhost:3333/users -d '{"name":"Ana","email":"ana@x.com"}'
//! curl 'localhost:3333/users?search=an'
//! curl -X PUT localhost:3333/users/<id> -d '{"name":"Bia","email":"b@x.com"}'
//! curl -X DELETE localhost:3333/users/<id>
//! ```

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use roster::{users, Config, Server, Store};

#[tokio::main]
async fn main() -> Result<(), roster::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roster=info")),
        )
        .init();

    let config = Config::parse();
    let store = Arc::new(Store::open(&config.db_path).await);

    Server::bind(config.addr)
        .max_body(config.max_body)
        .serve(users::routes(store))
        .await
}
