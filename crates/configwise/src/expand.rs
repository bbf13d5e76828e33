//! `${NAME}` / `${NAME:-DEFAULT}` expansion.
//!
//! The expander is pure: it only sees the input string and a lookup
//! function, so callers decide where names are resolved from (see
//! [`Environment`](crate::Environment)).

const OPEN: &str = "${";
const CLOSE: char = '}';
const DEFAULT_SEPARATOR: &str = ":-";

/// Expand every `${NAME}` and `${NAME:-DEFAULT}` token in `input`.
///
/// A defined name (the lookup returns `Some`, even `Some("")`) is replaced by
/// its value. An undefined name is replaced by `DEFAULT` when the `:-` form is
/// used and by the empty string otherwise. Text that does not match the
/// grammar, such as a bare `$`, an unterminated `${` or `${}`, is kept
/// verbatim. Tokens do not nest: a token ends at the first `}`.
///
/// # Example
///
/// ```
/// use configwise::expand;
///
/// let lookup = |name: &str| (name == "RPC_PORT").then(|| "9000".to_string());
/// assert_eq!(expand("tcp://127.0.0.1:${RPC_PORT:-6001}", lookup), "tcp://127.0.0.1:9000");
/// assert_eq!(expand("tcp://127.0.0.1:${RPC_HOST:-6001}", lookup), "tcp://127.0.0.1:6001");
/// ```
pub fn expand<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find(OPEN) {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];

        let Some(end) = after_open.find(CLOSE) else {
            // Unterminated, emit the remainder untouched.
            result.push_str(&rest[start..]);
            return result;
        };

        let token = &after_open[..end];
        match substitute(token, &lookup) {
            Some(value) => result.push_str(&value),
            None => {
                result.push_str(OPEN);
                result.push_str(token);
                result.push(CLOSE);
            }
        }
        rest = &after_open[end + CLOSE.len_utf8()..];
    }

    result.push_str(rest);
    result
}

/// Resolve the inside of one `${...}` token. `None` means the token is not
/// valid grammar and must be kept as written.
fn substitute<F>(token: &str, lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let (name, default) = match token.split_once(DEFAULT_SEPARATOR) {
        Some((name, default)) => (name, Some(default)),
        None => (token, None),
    };

    if name.is_empty() {
        return None;
    }

    Some(
        lookup(name)
            .or_else(|| default.map(str::to_string))
            .unwrap_or_default(),
    )
}
