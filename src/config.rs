//! Process configuration from flags and environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::server::DEFAULT_MAX_BODY;

/// Runtime settings for the users service.
#[derive(Clone, Debug, Parser)]
#[command(name = "roster", version, about = "Users CRUD over a JSON-file store")]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "ROSTER_ADDR", default_value = "0.0.0.0:3333")]
    pub addr: SocketAddr,

    /// Path of the JSON document that holds every table.
    #[arg(long = "db", env = "ROSTER_DB", default_value = "db.json")]
    pub db_path: PathBuf,

    /// Largest accepted request body, in bytes.
    #[arg(long, env = "ROSTER_MAX_BODY", default_value_t = DEFAULT_MAX_BODY)]
    pub max_body: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from(["roster", "--addr", "127.0.0.1:8080", "--db", "/tmp/x.json"]).unwrap();
        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.json"));
        assert_eq!(config.max_body, DEFAULT_MAX_BODY);

        let config = Config::try_parse_from(["roster", "--max-body", "512"]).unwrap();
        assert_eq!(config.max_body, 512);
    }

    #[test]
    fn rejects_bad_address() {
        assert!(Config::try_parse_from(["roster", "--addr", "nope"]).is_err());
    }
}
