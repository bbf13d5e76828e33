//! Environment expansion and flag overlay over a loaded tree.

use serde_json::Value;

use crate::env::{prefixed_name, Environment};
use crate::error::{ConfigError, ErrorKind, Op};
use crate::expand::expand;
use crate::flag::parse_flag;
use crate::tree::ConfigTree;

/// How a leaf takes part in expansion.
#[derive(Debug, PartialEq)]
pub enum LeafKind<'a> {
    /// A string, expanded as a whole.
    Scalar(&'a str),
    /// A non-empty sequence of strings, expanded element by element.
    StringSequence(Vec<&'a str>),
    /// Anything else, including empty and mixed sequences. Left unchanged.
    Other,
}

impl<'a> LeafKind<'a> {
    /// Classify `value`.
    pub fn of(value: &'a Value) -> Self {
        match value {
            Value::String(s) => Self::Scalar(s),
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .map(Value::as_str)
                .collect::<Option<Vec<_>>>()
                .map_or(Self::Other, Self::StringSequence),
            _ => Self::Other,
        }
    }

    /// The expanded replacement for this leaf, or `None` to keep it as is.
    fn expanded(&self, env: &dyn Environment) -> Option<Value> {
        let lookup = |name: &str| env.var(name);
        match self {
            Self::Scalar(s) => Some(Value::String(expand(s, lookup))),
            Self::StringSequence(items) => Some(Value::Array(
                items
                    .iter()
                    .map(|item| Value::String(expand(item, lookup)))
                    .collect(),
            )),
            Self::Other => None,
        }
    }
}

/// Expand every string and string-sequence leaf of `tree` once.
///
/// For each leaf the environment variable `PREFIX_KEY` replaces the loaded
/// value when set. Names inside `${...}` are looked up without the prefix.
/// Returns the number of leaves rewritten.
pub fn expand_leaves(tree: &mut ConfigTree, prefix: &str, env: &dyn Environment) -> usize {
    let mut rewritten = 0;

    for key in tree.leaf_keys() {
        let env_name = prefixed_name(prefix, &key);
        let from_env = env.var(&env_name).map(Value::String);
        if from_env.is_some() {
            tracing::trace!(key = %key, var = %env_name, "Value taken from environment");
        }

        let replacement = match (&from_env, tree.get(&key)) {
            (Some(value), _) | (None, Some(value)) => LeafKind::of(value).expanded(env),
            (None, None) => None,
        };

        if let Some(value) = replacement.or(from_env) {
            tree.set(&key, value);
            rewritten += 1;
        }
    }

    rewritten
}

/// Parse and apply override flags in order. Values are expanded against
/// `env`; later flags for the same key win.
pub fn apply_flags<S: AsRef<str>>(
    tree: &mut ConfigTree,
    flags: &[S],
    env: &dyn Environment,
) -> Result<(), ConfigError> {
    for flag in flags {
        let (key, value) =
            parse_flag(flag.as_ref()).map_err(|e| ConfigError::new(Op::New, e))?;
        let value = expand(&value, |name| env.var(name));

        if !tree.set(&key, Value::String(value)) {
            return Err(ConfigError::new(Op::New, ErrorKind::InvalidKey { key }));
        }
        tracing::debug!(key = %key, "Applied override flag");
    }

    Ok(())
}
