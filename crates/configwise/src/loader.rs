//! Locating and parsing the base configuration source.
//!
//! Sources are parsed into a [`serde_json::Value`] tree. YAML and TOML are
//! converted node by node so that their extra scalar kinds (TOML datetimes,
//! YAML non-string keys and tags) become plain strings and objects.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{ConfigError, ErrorKind, Op};

/// Base name of the file looked up by the default search.
pub const DEFAULT_CONFIG_NAME: &str = "config";

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// YAML (`yaml` or `yml`).
    Yaml,
    /// JSON.
    Json,
    /// TOML.
    Toml,
}

impl Format {
    /// Every format, in default search order.
    pub const ALL: [Format; 3] = [Format::Yaml, Format::Json, Format::Toml];

    /// Canonical tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }

    /// File extensions recognised for this format.
    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Yaml => &["yaml", "yml"],
            Self::Json => &["json"],
            Self::Toml => &["toml"],
        }
    }

    /// Format implied by a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        extension.parse()
    }

    /// Parse `bytes` into a tree whose root is an object.
    pub fn parse(self, bytes: &[u8]) -> Result<Value, ConfigError> {
        let value = match self {
            Self::Json => serde_json::from_slice(bytes).map_err(|e| self.parse_error(e))?,
            Self::Yaml => {
                let yaml: serde_yaml::Value =
                    serde_yaml::from_slice(bytes).map_err(|e| self.parse_error(e))?;
                from_yaml(yaml)
            }
            Self::Toml => {
                let text = std::str::from_utf8(bytes).map_err(|e| self.parse_error(e))?;
                let table: toml::Table = text.parse().map_err(|e| self.parse_error(e))?;
                from_toml(toml::Value::Table(table))
            }
        };

        match value {
            Value::Object(_) => Ok(value),
            // An empty YAML document.
            Value::Null => Ok(Value::Object(Map::new())),
            other => Err(self.parse_error(format!(
                "top level must be a mapping, found {}",
                kind_name(&other)
            ))),
        }
    }

    fn parse_error(self, err: impl fmt::Display) -> ConfigError {
        ConfigError::new(
            Op::New,
            ErrorKind::Parse {
                format: self.as_str(),
                message: err.to_string(),
            },
        )
    }
}

impl FromStr for Format {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            _ => Err(ConfigError::new(
                Op::New,
                ErrorKind::UnsupportedFormat {
                    format: s.to_string(),
                },
            )),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the base configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// A file named explicitly by the caller.
    Path(PathBuf),
    /// Search these directories for `config.<ext>`, in order.
    Search(Vec<PathBuf>),
}

impl SourceLocation {
    /// Default search: the executable's directory, then `/etc/<exe-name>/`.
    pub fn default_search() -> Result<Self, ConfigError> {
        let exe = std::env::current_exe()
            .map_err(|e| ConfigError::new(Op::New, ErrorKind::Executable(e)))?;
        Ok(Self::Search(search_dirs(&exe)))
    }

    /// Find the file this location refers to.
    pub fn resolve(&self) -> Result<PathBuf, ConfigError> {
        match self {
            Self::Path(path) => {
                if path.is_file() {
                    Ok(path.clone())
                } else {
                    Err(ConfigError::source_not_found(vec![path.clone()]))
                }
            }
            Self::Search(dirs) => {
                let mut searched = Vec::new();
                for dir in dirs {
                    for format in Format::ALL {
                        for ext in format.extensions() {
                            let candidate = dir.join(format!("{DEFAULT_CONFIG_NAME}.{ext}"));
                            if candidate.is_file() {
                                return Ok(candidate);
                            }
                            searched.push(candidate);
                        }
                    }
                }
                Err(ConfigError::source_not_found(searched))
            }
        }
    }
}

fn search_dirs(exe: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::with_capacity(2);
    if let Some(parent) = exe.parent() {
        dirs.push(parent.to_path_buf());
    }
    if let Some(name) = exe.file_name() {
        dirs.push(Path::new("/etc").join(name));
    }
    dirs
}

/// Read and parse the file at `path`. `format` overrides the extension.
pub fn load_file(path: &Path, format: Option<Format>) -> Result<(Value, Format), ConfigError> {
    let format = match format {
        Some(format) => format,
        None => Format::from_path(path)?,
    };

    let bytes = fs::read(path).map_err(|source| {
        ConfigError::new(
            Op::New,
            ErrorKind::Read {
                path: path.to_path_buf(),
                source,
            },
        )
    })?;

    Ok((format.parse(&bytes)?, format))
}

fn from_yaml(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Value::from(u)
            } else if let Some(i) = n.as_i64() {
                Value::from(i)
            } else {
                n.as_f64().map_or(Value::Null, Value::from)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => Value::Array(seq.into_iter().map(from_yaml).collect()),
        serde_yaml::Value::Mapping(mapping) => Value::Object(
            mapping
                .into_iter()
                .map(|(k, v)| (yaml_key(k), from_yaml(v)))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match from_yaml(key) {
        Value::String(s) => s,
        Value::Null => "~".to_string(),
        other => other.to_string(),
    }
}

fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::from(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, from_toml(v)))
                .collect(),
        ),
    }
}

pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
