//! Parsing of `key=value` override flags.

use thiserror::Error;

/// Characters stripped from the start of the whole flag.
const FLAG_LEADING: &[char] = &[' ', '"', '\'', '`'];

/// Whitespace trimmed around the key and the value.
const FIELD_WHITESPACE: &[char] = &[' ', '\n', '\t'];

/// Characters that turn a value into a quoted value.
const QUOTES: &[char] = &['"', '\'', '`'];

/// A malformed override flag.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    /// The flag has no `=` separator.
    #[error("invalid flag `{flag}`, usage: -o key=value")]
    Malformed {
        /// The flag as given.
        flag: String,
    },

    /// Nothing before the `=`.
    #[error("key should not be empty")]
    EmptyKey,

    /// Nothing after the `=`.
    #[error("value should not be empty")]
    EmptyValue,
}

/// Parse one override flag into its key and value.
///
/// The flag is split on the first `=`. A value starting with a quote
/// character is unquoted and its escaped quotes are unescaped. No `${...}`
/// expansion happens here.
///
/// # Example
///
/// ```
/// use configwise::parse_flag;
///
/// assert_eq!(parse_flag("rpc.listen=tcp://127.0.0.1:6001").unwrap(),
///            ("rpc.listen".to_string(), "tcp://127.0.0.1:6001".to_string()));
/// assert_eq!(parse_flag(r#"msg="hello \"world\"""#).unwrap().1, r#"hello "world""#);
/// assert!(parse_flag("novalue").is_err());
/// ```
pub fn parse_flag(flag: &str) -> Result<(String, String), FlagError> {
    let Some((key, value)) = flag.trim_start_matches(FLAG_LEADING).split_once('=') else {
        return Err(FlagError::Malformed {
            flag: flag.to_string(),
        });
    };

    let key = key.trim_matches(FIELD_WHITESPACE);
    if key.is_empty() {
        return Err(FlagError::EmptyKey);
    }

    let value = value.trim_matches(FIELD_WHITESPACE);
    if value.is_empty() {
        return Err(FlagError::EmptyValue);
    }

    Ok((key.to_string(), unquote(value)))
}

/// Remove the quotes around `value` when its first character is a quote.
///
/// The first character alone picks the quote. A trailing quote preceded by a
/// backslash belongs to the value. There is no check that a closing quote
/// exists.
fn unquote(value: &str) -> String {
    let Some(quote) = value.chars().next().filter(|c| QUOTES.contains(c)) else {
        return value.to_string();
    };

    let mut inner = value.trim_start_matches(quote);
    while let Some(stripped) = inner.strip_suffix(quote) {
        if stripped.ends_with('\\') {
            break;
        }
        inner = stripped;
    }

    let mut escaped = String::with_capacity(2);
    escaped.push('\\');
    escaped.push(quote);
    inner.replace(&escaped, quote.encode_utf8(&mut [0; 4]))
}
