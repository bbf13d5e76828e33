//! The configuration engine.
//!
//! A [`Configurer`] is built once from its sources and then queried. Building
//! runs, in order: source loading, `${...}` expansion of every string leaf,
//! and the override flags. Decoding never re-expands, so repeated decodes of
//! the same key always agree.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::decode::{decode, DecoderConfig};
use crate::env::{dotenv_table, Environment, Layered, ProcessEnv};
use crate::error::{ConfigError, Op};
use crate::loader::{load_file, Format, SourceLocation};
use crate::resolve::{apply_flags, expand_leaves};
use crate::tree::{is_valid_key, ConfigTree};

/// Builder for a [`Configurer`].
///
/// # Example
///
/// ```no_run
/// use configwise::Configurer;
///
/// # fn main() -> Result<(), configwise::ConfigError> {
/// let cfg = Configurer::builder()
///     .with_path(".rr.yaml")
///     .with_prefix("rr")
///     .with_flags(["rpc.listen=tcp://127.0.0.1:6001"])
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigurerBuilder {
    path: Option<PathBuf>,
    prefix: Option<String>,
    format: Option<String>,
    read_in_config: Option<Vec<u8>>,
    flags: Vec<String>,
    env: Option<Box<dyn Environment>>,
    dotenv: Option<PathBuf>,
    decoder: DecoderConfig,
}

impl ConfigurerBuilder {
    /// Create a builder with no sources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the configuration from this file instead of searching for one.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Environment prefix for per-key overrides (`PREFIX_RPC_LISTEN`).
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Source format tag (`yaml`, `yml`, `json`, `toml`).
    ///
    /// Required for raw configuration; for files it overrides the extension.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Parse these bytes as the whole configuration.
    ///
    /// Together with [`with_format`](Self::with_format) this bypasses file
    /// search, the environment and the override flags entirely.
    #[must_use]
    pub fn with_read_in_config(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.read_in_config = Some(bytes.into());
        self
    }

    /// `key=value` overrides, applied in order after expansion.
    #[must_use]
    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    /// Environment used for expansion and prefixed overrides. Defaults to
    /// the process environment.
    #[must_use]
    pub fn with_env(mut self, env: impl Environment + 'static) -> Self {
        self.env = Some(Box::new(env));
        self
    }

    /// Consult this `.env` file for names the environment does not define.
    /// A missing file is ignored.
    #[must_use]
    pub fn with_dotenv(mut self, path: impl Into<PathBuf>) -> Self {
        self.dotenv = Some(path.into());
        self
    }

    /// Decoding settings for every [`Configurer::unmarshal`] call.
    #[must_use]
    pub fn with_decoder(mut self, decoder: DecoderConfig) -> Self {
        self.decoder = decoder;
        self
    }

    /// Load, expand and overlay the configuration.
    pub fn build(self) -> Result<Configurer, ConfigError> {
        let format = self.format.as_deref().map(str::parse::<Format>).transpose()?;

        if let Some(bytes) = &self.read_in_config {
            let Some(format) = format else {
                return Err(ConfigError::missing_format());
            };
            let tree = ConfigTree::from_value(format.parse(bytes)?);
            tracing::debug!(%format, keys = tree.len(), "Loaded raw configuration");
            return Ok(Configurer {
                tree,
                source: None,
                prefix: self.prefix,
                format,
                flags: self.flags,
                decoder: self.decoder,
            });
        }

        let Some(prefix) = self.prefix.filter(|p| !p.is_empty()) else {
            return Err(ConfigError::missing_prefix());
        };

        let location = match self.path {
            Some(path) => SourceLocation::Path(path),
            None => SourceLocation::default_search()?,
        };
        let path = location.resolve()?;
        let (value, format) = load_file(&path, format)?;
        let mut tree = ConfigTree::from_value(value);
        tracing::debug!(path = %path.display(), %format, keys = tree.len(), "Loaded configuration file");

        let process: Box<dyn Environment> = self.env.unwrap_or_else(|| Box::new(ProcessEnv));
        let env: Box<dyn Environment> = match &self.dotenv {
            Some(dotenv) => Box::new(Layered::new(process, dotenv_table(dotenv)?)),
            None => process,
        };

        let expanded = expand_leaves(&mut tree, &prefix, env.as_ref());
        tracing::debug!(expanded, "Expanded environment references");

        apply_flags(&mut tree, &self.flags, env.as_ref())?;

        Ok(Configurer {
            tree,
            source: Some(path),
            prefix: Some(prefix),
            format,
            flags: self.flags,
            decoder: self.decoder,
        })
    }
}

/// Resolved configuration with typed access.
///
/// # Example
///
/// ```
/// use configwise::Configurer;
/// use serde::Deserialize;
/// use std::time::Duration;
///
/// #[derive(Deserialize)]
/// struct Rpc {
///     listen: String,
///     timeout: Duration,
/// }
///
/// let cfg = Configurer::builder()
///     .with_format("yaml")
///     .with_read_in_config("rpc:\n  listen: tcp://127.0.0.1:6001\n  timeout: 5s\n")
///     .build()
///     .unwrap();
///
/// let rpc: Rpc = cfg.unmarshal_key("rpc").unwrap();
/// assert_eq!(rpc.listen, "tcp://127.0.0.1:6001");
/// assert_eq!(rpc.timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct Configurer {
    tree: ConfigTree,
    source: Option<PathBuf>,
    prefix: Option<String>,
    format: Format,
    flags: Vec<String>,
    decoder: DecoderConfig,
}

impl Configurer {
    /// Start building a configurer.
    #[must_use]
    pub fn builder() -> ConfigurerBuilder {
        ConfigurerBuilder::new()
    }

    /// Decode the value at `key` into `T`.
    ///
    /// A missing key decodes like an empty value: `Option`s are `None` and
    /// structs get their `#[serde(default)]` fields.
    pub fn unmarshal_key<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self.tree.get(key).cloned().unwrap_or(Value::Null);
        decode(value, &key.to_lowercase(), self.decoder)
            .map_err(|e| ConfigError::new(Op::UnmarshalKey, e))
    }

    /// Decode the whole configuration into `T`.
    pub fn unmarshal<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        decode(self.tree.to_value(), "", self.decoder)
            .map_err(|e| ConfigError::new(Op::Unmarshal, e))
    }

    /// Store values verbatim, replacing whatever is at each key.
    ///
    /// No expansion is applied. Every key is checked first, so an invalid
    /// key leaves the configuration unchanged.
    pub fn overwrite<I, K>(&mut self, values: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let values: Vec<(K, Value)> = values.into_iter().collect();
        if let Some((key, _)) = values.iter().find(|(k, _)| !is_valid_key(k.as_ref())) {
            return Err(ConfigError::invalid_key(key.as_ref()));
        }

        for (key, value) in values {
            if !self.tree.set(key.as_ref(), value) {
                return Err(ConfigError::invalid_key(key.as_ref()));
            }
        }
        Ok(())
    }

    /// Raw value at `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.tree.get(key)
    }

    /// Whether `key` is set.
    pub fn has(&self, key: &str) -> bool {
        self.tree.has(key)
    }

    /// The resolved tree.
    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// File the configuration was read from; `None` for raw configuration.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Environment prefix, if one was configured.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Format the source was parsed as.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Override flags as given to the builder.
    pub fn flags(&self) -> &[String] {
        &self.flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use crate::error::ErrorKind;
    use crate::flag::FlagError;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashMap;
    use std::fs;
    use std::time::Duration;

    const YAML: &str = "\
rpc:
  listen: tcp://127.0.0.1:${RPC_PORT:-6001}
http:
  address: 127.0.0.1:8080
  middleware: [\"${MW:-gzip}\", headers]
  pool:
    num_workers: 4
    allocate_timeout: 60s
x: 1
";

    fn write_config(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn build_with(env: MapEnv, flags: &[&str]) -> Configurer {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, ".rr.yaml", YAML);
        Configurer::builder()
            .with_path(path)
            .with_prefix("rr")
            .with_env(env)
            .with_flags(flags.iter().copied())
            .build()
            .unwrap()
    }

    #[test]
    fn test_file_values_expanded_with_defaults() {
        let cfg = build_with(MapEnv::new(), &[]);
        assert_eq!(cfg.get("rpc.listen"), Some(&json!("tcp://127.0.0.1:6001")));
        assert_eq!(cfg.get("http.middleware"), Some(&json!(["gzip", "headers"])));
        assert_eq!(cfg.get("x"), Some(&json!(1)));
        assert_eq!(cfg.format(), Format::Yaml);
        assert_eq!(cfg.prefix(), Some("rr"));
    }

    #[test]
    fn test_file_values_expanded_from_env() {
        let env = MapEnv::new().with("RPC_PORT", "9000").with("MW", "static");
        let cfg = build_with(env, &[]);
        assert_eq!(cfg.get("rpc.listen"), Some(&json!("tcp://127.0.0.1:9000")));
        assert_eq!(cfg.get("http.middleware"), Some(&json!(["static", "headers"])));
    }

    #[test]
    fn test_prefixed_env_overrides_file_value() {
        let env = MapEnv::new().with("RR_HTTP_ADDRESS", "0.0.0.0:${PORT:-80}");
        let cfg = build_with(env, &[]);
        assert_eq!(cfg.get("http.address"), Some(&json!("0.0.0.0:80")));
    }

    #[test]
    fn test_flat_dotted_keys_in_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "config.json",
            r#"{"rpc.addr": "tcp://127.0.0.1:${RPC_PORT:-6001}"}"#,
        );
        let build = |env: MapEnv| {
            Configurer::builder()
                .with_path(&path)
                .with_prefix("rr")
                .with_env(env)
                .build()
                .unwrap()
        };

        let cfg = build(MapEnv::new());
        assert_eq!(cfg.get("rpc.addr"), Some(&json!("tcp://127.0.0.1:6001")));
        assert_eq!(
            cfg.unmarshal_key::<String>("rpc.addr").unwrap(),
            "tcp://127.0.0.1:6001"
        );

        let cfg = build(MapEnv::new().with("RPC_PORT", "9000"));
        assert_eq!(cfg.get("rpc.addr"), Some(&json!("tcp://127.0.0.1:9000")));

        let cfg = build(MapEnv::new().with("RR_RPC_ADDR", "tcp://0.0.0.0:1"));
        assert_eq!(cfg.get("rpc.addr"), Some(&json!("tcp://0.0.0.0:1")));
    }

    #[test]
    fn test_flags_win_over_file_and_env() {
        let env = MapEnv::new().with("RR_X", "from-env").with("PORT", "7000");
        let cfg = build_with(env, &["x=2", "rpc.listen=tcp://0.0.0.0:${PORT}"]);
        assert_eq!(cfg.get("x"), Some(&json!("2")));
        assert_eq!(cfg.unmarshal_key::<u32>("x").unwrap(), 2);
        assert_eq!(cfg.get("rpc.listen"), Some(&json!("tcp://0.0.0.0:7000")));
    }

    #[test]
    fn test_flag_can_add_new_key() {
        let cfg = build_with(MapEnv::new(), &["logs.level=debug"]);
        assert!(cfg.has("logs.level"));
        assert_eq!(cfg.flags(), ["logs.level=debug"]);
    }

    #[test]
    fn test_malformed_flag_aborts_construction() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "config.yaml", YAML);
        let err = Configurer::builder()
            .with_path(path)
            .with_prefix("rr")
            .with_env(MapEnv::new())
            .with_flags(["x=2", "=oops"])
            .build()
            .unwrap_err();
        assert_eq!(err.op(), Op::New);
        assert!(matches!(err.kind(), ErrorKind::Flag(FlagError::EmptyKey)));
    }

    #[test]
    fn test_missing_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "config.yaml", YAML);
        let err = Configurer::builder().with_path(path).build().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MissingPrefix));

        let err = Configurer::builder().with_prefix("").build().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MissingPrefix));
    }

    #[test]
    fn test_explicit_path_not_found() {
        let err = Configurer::builder()
            .with_path("/nonexistent/.rr.yaml")
            .with_prefix("rr")
            .build()
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::SourceNotFound { .. }));
    }

    #[test]
    fn test_unparsable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "config.json", "{not json");
        let err = Configurer::builder()
            .with_path(path)
            .with_prefix("rr")
            .build()
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Parse { format: "json", .. }));
    }

    #[test]
    fn test_format_tag_overrides_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "settings.conf", "[rpc]\nlisten = \"tcp://a\"\n");
        let cfg = Configurer::builder()
            .with_path(&path)
            .with_prefix("rr")
            .with_format("toml")
            .with_env(MapEnv::new())
            .build()
            .unwrap();
        assert_eq!(cfg.format(), Format::Toml);
        assert_eq!(cfg.source(), Some(path.as_path()));
        assert_eq!(cfg.get("rpc.listen"), Some(&json!("tcp://a")));
    }

    #[test]
    fn test_raw_mode_skips_prefix_env_and_flags() {
        let cfg = Configurer::builder()
            .with_format("yaml")
            .with_read_in_config("a: ${RAW_ONLY:-default}\n")
            .with_flags(["a=flag"])
            .with_env(MapEnv::new().with("RAW_ONLY", "env"))
            .build()
            .unwrap();
        assert_eq!(cfg.get("a"), Some(&json!("${RAW_ONLY:-default}")));
        assert_eq!(cfg.source(), None);
    }

    #[test]
    fn test_raw_mode_requires_format() {
        let err = Configurer::builder()
            .with_prefix("rr")
            .with_read_in_config("a: 1\n")
            .build()
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MissingFormat));
    }

    #[test]
    fn test_unsupported_format_tag() {
        let err = Configurer::builder()
            .with_format("ini")
            .with_read_in_config("a=1")
            .build()
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_dotenv_layer_under_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "config.yaml", YAML);
        let dotenv = write_config(&dir, ".env", "RPC_PORT=7100\nMW=from-dotenv\n");

        let cfg = Configurer::builder()
            .with_path(path)
            .with_prefix("rr")
            .with_env(MapEnv::new().with("MW", "from-env"))
            .with_dotenv(dotenv)
            .build()
            .unwrap();
        assert_eq!(cfg.get("rpc.listen"), Some(&json!("tcp://127.0.0.1:7100")));
        assert_eq!(cfg.get("http.middleware"), Some(&json!(["from-env", "headers"])));
    }

    #[derive(Debug, Deserialize)]
    struct Pool {
        num_workers: u16,
        allocate_timeout: Duration,
    }

    #[derive(Debug, Deserialize)]
    struct Http {
        address: String,
        middleware: Vec<String>,
        pool: Pool,
    }

    #[derive(Debug, Deserialize)]
    struct Root {
        http: Http,
        #[serde(default)]
        missing: Option<String>,
    }

    #[test]
    fn test_unmarshal_key_and_whole() {
        let cfg = build_with(MapEnv::new(), &["http.pool.num_workers=8"]);

        let http: Http = cfg.unmarshal_key("http").unwrap();
        assert_eq!(http.address, "127.0.0.1:8080");
        assert_eq!(http.middleware, vec!["gzip", "headers"]);
        assert_eq!(http.pool.num_workers, 8);
        assert_eq!(http.pool.allocate_timeout, Duration::from_secs(60));

        let root: Root = cfg.unmarshal().unwrap();
        assert_eq!(root.http.pool.num_workers, 8);
        assert_eq!(root.missing, None);
    }

    #[test]
    fn test_repeated_decodes_agree() {
        let cfg = build_with(MapEnv::new().with("RPC_PORT", "9000"), &[]);
        let first: String = cfg.unmarshal_key("rpc.listen").unwrap();
        let second: String = cfg.unmarshal_key("RPC.Listen").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unmarshal_key_error_is_tagged() {
        let cfg = build_with(MapEnv::new(), &["http.pool.num_workers=lots"]);
        let err = cfg.unmarshal_key::<Http>("http").unwrap_err();
        assert_eq!(err.op(), Op::UnmarshalKey);
        match err.kind() {
            ErrorKind::Decode(decode) => assert_eq!(decode.path(), "http.pool.num_workers"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unmarshal_missing_key_uses_defaults() {
        #[derive(Debug, Default, Deserialize, PartialEq)]
        #[serde(default)]
        struct Metrics {
            address: String,
            enabled: bool,
        }

        let cfg = build_with(MapEnv::new(), &[]);
        assert_eq!(cfg.unmarshal_key::<Metrics>("metrics").unwrap(), Metrics::default());
        assert_eq!(cfg.unmarshal_key::<Option<String>>("metrics.address").unwrap(), None);
    }

    #[test]
    fn test_overwrite_stores_verbatim() {
        let mut cfg = build_with(MapEnv::new(), &[]);
        let mut values = HashMap::new();
        values.insert("rpc.listen".to_string(), json!("${NOT_EXPANDED}"));
        values.insert("Server.Command".to_string(), json!(["php", "worker.php"]));
        cfg.overwrite(values).unwrap();

        assert_eq!(cfg.get("rpc.listen"), Some(&json!("${NOT_EXPANDED}")));
        assert_eq!(cfg.get("server.command"), Some(&json!(["php", "worker.php"])));
    }

    #[test]
    fn test_overwrite_rejects_invalid_key_atomically() {
        let mut cfg = build_with(MapEnv::new(), &[]);
        let err = cfg
            .overwrite([("a", json!(1)), ("b..c", json!(2))])
            .unwrap_err();
        assert_eq!(err.op(), Op::Overwrite);
        assert!(!cfg.has("a"));
    }

    #[test]
    fn test_has_and_get() {
        let cfg = build_with(MapEnv::new(), &[]);
        assert!(cfg.has("http.pool"));
        assert!(cfg.has("HTTP.POOL.NUM_WORKERS"));
        assert!(!cfg.has("http.pool.max_jobs"));
        assert_eq!(cfg.get("nothing"), None);
    }
}
