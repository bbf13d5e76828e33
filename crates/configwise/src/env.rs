//! Environment lookups used by expansion and prefixed value overrides.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::error::{ConfigError, ErrorKind, Op};

/// Source of environment variables.
///
/// The process environment is the default; tests and embedders can supply
/// their own table without touching global process state.
pub trait Environment: fmt::Debug + Send + Sync {
    /// Value of `name`, or `None` when it is not defined.
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        // Non-unicode values are treated as undefined.
        std::env::var(name).ok()
    }
}

/// In-memory environment table.
///
/// # Example
///
/// ```
/// use configwise::{Environment, MapEnv};
///
/// let env = MapEnv::new().with("RPC_PORT", "9000");
/// assert_eq!(env.var("RPC_PORT").as_deref(), Some("9000"));
/// assert_eq!(env.var("OTHER"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a variable.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for MapEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Environment for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// An environment consulted first, falling back to a second one.
#[derive(Debug)]
pub struct Layered<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> Layered<P, F> {
    /// `primary` wins over `fallback` for names defined in both.
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: Environment, F: Environment> Environment for Layered<P, F> {
    fn var(&self, name: &str) -> Option<String> {
        self.primary.var(name).or_else(|| self.fallback.var(name))
    }
}

impl Environment for Box<dyn Environment> {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}

/// Read a `.env` file into a [`MapEnv`] without modifying the process
/// environment.
///
/// A missing file yields an empty table.
pub fn dotenv_table(path: &Path) -> Result<MapEnv, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No .env file, skipping");
        return Ok(MapEnv::new());
    }

    let parse_error = |e: dotenvy::Error| {
        ConfigError::new(
            Op::New,
            ErrorKind::Parse {
                format: "dotenv",
                message: e.to_string(),
            },
        )
    };

    let mut vars = HashMap::new();
    for item in dotenvy::from_path_iter(path).map_err(parse_error)? {
        let (name, value) = item.map_err(parse_error)?;
        vars.insert(name, value);
    }

    tracing::debug!(path = %path.display(), count = vars.len(), "Loaded .env file");
    Ok(MapEnv { vars })
}

/// Environment variable name for `key` under `prefix`.
///
/// `PREFIX_` followed by the key path uppercased, with `.` and `-` mapped to
/// `_`.
pub(crate) fn prefixed_name(prefix: &str, key: &str) -> String {
    let mut name = String::with_capacity(prefix.len() + key.len() + 1);
    name.push_str(prefix);
    name.push('_');
    name.push_str(key);
    name.replace(['.', '-'], "_").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_prefixed_name() {
        assert_eq!(prefixed_name("rr", "rpc.listen"), "RR_RPC_LISTEN");
        assert_eq!(prefixed_name("RR", "http.max-request"), "RR_HTTP_MAX_REQUEST");
        assert_eq!(prefixed_name("app", "top"), "APP_TOP");
    }

    #[test]
    fn test_layered_prefers_primary() {
        let env = Layered::new(
            MapEnv::new().with("A", "primary"),
            MapEnv::new().with("A", "fallback").with("B", "fallback"),
        );
        assert_eq!(env.var("A").as_deref(), Some("primary"));
        assert_eq!(env.var("B").as_deref(), Some("fallback"));
        assert_eq!(env.var("C"), None);
    }

    #[test]
    fn test_map_env_from_iter() {
        let env: MapEnv = [("A", "1"), ("B", "")].into_iter().collect();
        assert_eq!(env.var("A").as_deref(), Some("1"));
        assert_eq!(env.var("B").as_deref(), Some(""));
    }

    #[test]
    fn test_dotenv_table_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "RPC_PORT=7000").unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "NAME=\"quoted value\"").unwrap();

        let env = dotenv_table(file.path()).unwrap();
        assert_eq!(env.var("RPC_PORT").as_deref(), Some("7000"));
        assert_eq!(env.var("NAME").as_deref(), Some("quoted value"));
    }

    #[test]
    fn test_dotenv_table_missing_file_is_empty() {
        let env = dotenv_table(Path::new("/nonexistent/.env")).unwrap();
        assert_eq!(env.var("ANYTHING"), None);
    }
}
