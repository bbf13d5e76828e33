//! Layered configuration for long-running services.
//!
//! A configuration is resolved once, from up to three layers:
//! - a YAML, JSON or TOML file (or raw bytes in a known format)
//! - the environment, through `${NAME:-DEFAULT}` references in string values
//!   and `PREFIX_KEY` variables that replace loaded values
//! - `key=value` override flags, which win over everything else
//!
//! The resolved tree is then decoded on demand into typed structs with
//! serde. Strings decode into [`uuid::Uuid`], `chrono::DateTime`,
//! [`std::time::Duration`] (`"1h30m"`) and comma-separated lists.
//!
//! # Example
//!
//! ```no_run
//! use configwise::Configurer;
//! use serde::Deserialize;
//! use std::time::Duration;
//!
//! #[derive(Deserialize)]
//! struct Pool {
//!     num_workers: u16,
//!     allocate_timeout: Duration,
//! }
//!
//! # fn main() -> Result<(), configwise::ConfigError> {
//! let cfg = Configurer::builder()
//!     .with_path(".rr.yaml")
//!     .with_prefix("rr")
//!     .with_flags(["http.pool.num_workers=8"])
//!     .build()?;
//!
//! let pool: Pool = cfg.unmarshal_key("http.pool")?;
//! println!("{} workers", pool.num_workers);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```yaml
//! rpc:
//!   listen: tcp://127.0.0.1:${RPC_PORT:-6001}
//!
//! http:
//!   address: 0.0.0.0:8080
//!   middleware: ["${MIDDLEWARE:-gzip}", "headers"]
//!   pool:
//!     num_workers: 4
//!     allocate_timeout: 60s
//! ```
//!
//! # Environment Variable Overrides
//!
//! With prefix `rr`, `RR_HTTP_ADDRESS=0.0.0.0:9000` replaces `http.address`.
//! Dots and dashes in keys become underscores. Variables only replace keys
//! present in the file; they never add new ones.

#![warn(missing_docs)]

mod configurer;
mod decode;
mod duration;
mod env;
mod error;
mod expand;
mod flag;
mod loader;
mod resolve;
mod tree;

pub use configurer::{Configurer, ConfigurerBuilder};
pub use decode::{decode, DecodeError, Decoder, DecoderConfig};
pub use duration::{parse_duration, DurationError};
pub use env::{dotenv_table, Environment, Layered, MapEnv, ProcessEnv};
pub use error::{ConfigError, ErrorKind, Op};
pub use expand::expand;
pub use flag::{parse_flag, FlagError};
pub use loader::{load_file, Format, SourceLocation, DEFAULT_CONFIG_NAME};
pub use resolve::{apply_flags, expand_leaves, LeafKind};
pub use tree::ConfigTree;
