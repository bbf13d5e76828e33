//! Typed decoding of the resolved tree.
//!
//! [`Decoder`] is a [`serde::Deserializer`] over a [`serde_json::Value`]. On
//! top of plain structural decoding it applies a fixed chain of conversion
//! hooks, chosen by the shape the target type asks for:
//!
//! 1. string -> [`uuid::Uuid`]: the text is checked with [`Uuid::try_parse`]
//!    before the target sees it. Failures are reported as identifier errors.
//! 2. string -> `chrono::DateTime`: the target requests a string and parses
//!    RFC 3339.
//! 3. string -> [`std::time::Duration`]: unit-suffixed syntax, see
//!    [`parse_duration`]. An integer is taken as nanoseconds.
//! 4. string -> sequence: split on `,`. The empty string is an empty sequence.
//!
//! Struct fields and enum variants match keys case-insensitively. With weakly
//! typed input (the default) strings, numbers and booleans convert into each
//! other and null decodes to the zero value of a primitive.

use std::fmt;
use std::time::Duration;

use serde::de::{
    self, value::StringDeserializer, DeserializeOwned, DeserializeSeed, EnumAccess,
    IntoDeserializer, MapAccess, SeqAccess, Unexpected, VariantAccess, Visitor,
};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use crate::duration::parse_duration;

/// What `uuid`'s string visitors say they expect.
const UUID_EXPECTATION: &str = "UUID";

const LIST_DELIMITER: char = ',';

/// How `std::time::Duration` presents itself to a deserializer.
const DURATION_NAME: &str = "Duration";
const DURATION_FIELDS: [&str; 2] = ["secs", "nanos"];

/// Per-instance decoding settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    weakly_typed: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self { weakly_typed: true }
    }
}

impl DecoderConfig {
    /// Weakly typed decoding, the default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only exact type matches (plus the conversion hooks) are accepted.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            weakly_typed: false,
        }
    }

    /// Whether scalar types convert into each other.
    pub fn weakly_typed(&self) -> bool {
        self.weakly_typed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Value,
    Identifier,
}

/// A value could not be decoded into the target type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    path: String,
    message: String,
    failure: Failure,
}

impl DecodeError {
    /// Dotted path of the offending value, empty for the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// What went wrong.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the failure came from the UUID conversion.
    pub fn is_identifier(&self) -> bool {
        self.failure == Failure::Identifier
    }

    fn identifier(text: &str, err: &uuid::Error) -> Self {
        Self {
            path: String::new(),
            message: format!("invalid UUID `{text}`: {err}"),
            failure: Failure::Identifier,
        }
    }

    /// Attach `path` unless a deeper path is already recorded.
    fn at(mut self, path: &str) -> Self {
        if self.path.is_empty() {
            self.path = path.to_string();
        }
        self
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "'{}': {}", self.path, self.message)
        }
    }
}

impl std::error::Error for DecodeError {}

impl de::Error for DecodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self {
            path: String::new(),
            message: msg.to_string(),
            failure: Failure::Value,
        }
    }
}

/// Decode `value` into `T`. `path` names the value in error messages.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use configwise::{decode, DecoderConfig};
/// use serde::Deserialize;
/// use serde_json::json;
///
/// #[derive(Deserialize)]
/// struct Pool {
///     num_workers: u16,
///     allocate_timeout: Duration,
/// }
///
/// let pool: Pool = decode(
///     json!({"num_workers": "4", "allocate_timeout": "60s"}),
///     "pool",
///     DecoderConfig::default(),
/// ).unwrap();
/// assert_eq!(pool.num_workers, 4);
/// assert_eq!(pool.allocate_timeout, Duration::from_secs(60));
/// ```
pub fn decode<T: DeserializeOwned>(
    value: Value,
    path: &str,
    config: DecoderConfig,
) -> Result<T, DecodeError> {
    T::deserialize(Decoder::new(value, path.to_string(), config)).map_err(|e| e.at(path))
}

/// Deserializer over one node of the tree.
#[derive(Debug)]
pub struct Decoder {
    value: Value,
    path: String,
    config: DecoderConfig,
}

impl Decoder {
    /// Decoder for `value` found at `path`.
    pub fn new(value: Value, path: String, config: DecoderConfig) -> Self {
        Self {
            value,
            path,
            config,
        }
    }

    fn decode_integer<'de, V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        let weak = self.config.weakly_typed;
        match &self.value {
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    visitor.visit_u64(u)
                } else if let Some(i) = n.as_i64() {
                    visitor.visit_i64(i)
                } else {
                    // Floats truncate toward zero.
                    #[allow(clippy::cast_possible_truncation)]
                    let truncated = n.as_f64().unwrap_or_default().trunc() as i128;
                    visit_integer(truncated, visitor)
                }
            }
            Value::String(s) if weak => match parse_integer(s) {
                Some(n) => visit_integer(n, visitor),
                None => Err(de::Error::invalid_value(Unexpected::Str(s), &visitor)),
            },
            Value::Bool(b) if weak => visitor.visit_u64(u64::from(*b)),
            Value::Null if weak => visitor.visit_u64(0),
            other => Err(invalid_type(other, &visitor)),
        }
    }

    fn decode_float<'de, V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        let weak = self.config.weakly_typed;
        match &self.value {
            Value::Number(n) => visitor.visit_f64(n.as_f64().unwrap_or_default()),
            Value::String(s) if weak && s.is_empty() => visitor.visit_f64(0.0),
            Value::String(s) if weak => match s.parse::<f64>() {
                Ok(f) => visitor.visit_f64(f),
                Err(_) => Err(de::Error::invalid_value(Unexpected::Str(s), &visitor)),
            },
            Value::Bool(b) if weak => visitor.visit_f64(if *b { 1.0 } else { 0.0 }),
            Value::Null if weak => visitor.visit_f64(0.0),
            other => Err(invalid_type(other, &visitor)),
        }
    }

    /// The value as the text a string target would see, if it has one.
    fn text(&self) -> Option<String> {
        let weak = self.config.weakly_typed;
        match &self.value {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) if weak => Some(String::from(if *b { "1" } else { "0" })),
            Value::Number(n) if weak => Some(n.to_string()),
            Value::Null if weak => Some(String::new()),
            _ => None,
        }
    }

    /// Duration hook. `None` means the value is not in a hooked form.
    fn duration(&self) -> Option<Result<Duration, DecodeError>> {
        match &self.value {
            Value::String(s) => Some(parse_duration(s).map_err(de::Error::custom)),
            Value::Number(n) => n.as_u64().map(|nanos| Ok(Duration::from_nanos(nanos))),
            _ => None,
        }
    }
}

impl<'de> de::Deserializer<'de> for Decoder {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    visitor.visit_u64(u)
                } else if let Some(i) = n.as_i64() {
                    visitor.visit_i64(i)
                } else {
                    visitor.visit_f64(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => visitor.visit_string(s),
            Value::Array(items) => visit_array(items, &self.path, self.config, visitor),
            Value::Object(map) => visit_object(map, None, &self.path, self.config, visitor),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        let weak = self.config.weakly_typed;
        match &self.value {
            Value::Bool(b) => visitor.visit_bool(*b),
            Value::String(s) if weak => match parse_bool(s) {
                Some(b) => visitor.visit_bool(b),
                None => Err(de::Error::invalid_value(Unexpected::Str(s), &visitor)),
            },
            Value::Number(n) if weak => visitor.visit_bool(!is_zero(n)),
            Value::Null if weak => visitor.visit_bool(false),
            other => Err(invalid_type(other, &visitor)),
        }
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.decode_integer(visitor)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.decode_integer(visitor)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.decode_integer(visitor)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.decode_integer(visitor)
    }

    fn deserialize_i128<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.decode_integer(visitor)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.decode_integer(visitor)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.decode_integer(visitor)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.decode_integer(visitor)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.decode_integer(visitor)
    }

    fn deserialize_u128<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.decode_integer(visitor)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.decode_float(visitor)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.decode_float(visitor)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_string(visitor)
    }

    // `Uuid` and `DateTime` both ask for a string. Identifiers are checked
    // here; timestamps are parsed by the target.
    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        if expects_identifier(&visitor) {
            if let Some(text) = self.text() {
                if let Err(err) = Uuid::try_parse(&text) {
                    return Err(DecodeError::identifier(&text, &err));
                }
            }
        }
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        let weak = self.config.weakly_typed;
        match self.value {
            Value::String(s) => visitor.visit_string(s),
            Value::Bool(b) if weak => visitor.visit_str(if b { "1" } else { "0" }),
            Value::Number(n) if weak => visitor.visit_string(n.to_string()),
            Value::Null if weak => visitor.visit_str(""),
            other => Err(invalid_type(&other, &visitor)),
        }
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::String(s) => visitor.visit_byte_buf(s.into_bytes()),
            Value::Array(items) => visit_array(items, &self.path, self.config, visitor),
            other => Err(invalid_type(&other, &visitor)),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            other => Err(invalid_type(&other, &visitor)),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        let weak = self.config.weakly_typed;
        match self.value {
            Value::Array(items) => visit_array(items, &self.path, self.config, visitor),
            // Delimited list hook.
            Value::String(s) => visit_array(split_list(&s), &self.path, self.config, visitor),
            Value::Null => visit_array(Vec::new(), &self.path, self.config, visitor),
            other if weak && !other.is_object() => {
                visit_array(vec![other], &self.path, self.config, visitor)
            }
            other => Err(invalid_type(&other, &visitor)),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::Object(map) => visit_object(map, None, &self.path, self.config, visitor),
            Value::Null => visit_object(Map::new(), None, &self.path, self.config, visitor),
            other => Err(invalid_type(&other, &visitor)),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        if name == DURATION_NAME && fields == DURATION_FIELDS {
            if let Some(duration) = self.duration() {
                let duration = duration?;
                let parts = vec![
                    Value::from(duration.as_secs()),
                    Value::from(duration.subsec_nanos()),
                ];
                return visit_array(parts, &self.path, self.config, visitor);
            }
        }

        match self.value {
            Value::Object(map) => visit_object(map, Some(fields), &self.path, self.config, visitor),
            Value::Null => visit_object(Map::new(), Some(fields), &self.path, self.config, visitor),
            Value::Array(items) => visit_array(items, &self.path, self.config, visitor),
            other => Err(invalid_type(&other, &visitor)),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::String(s) => visitor.visit_enum(EnumDecoder {
                variant: match_name(s, variants),
                value: None,
                path: self.path,
                config: self.config,
            }),
            Value::Object(map) => {
                let mut entries = map.into_iter();
                match (entries.next(), entries.next()) {
                    (Some((variant, value)), None) => visitor.visit_enum(EnumDecoder {
                        variant: match_name(variant, variants),
                        value: Some(value),
                        path: self.path,
                        config: self.config,
                    }),
                    _ => Err(de::Error::invalid_value(
                        Unexpected::Map,
                        &"a map with a single key",
                    )),
                }
            }
            other => Err(invalid_type(&other, &visitor)),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        visitor.visit_unit()
    }
}

fn visit_array<'de, V: Visitor<'de>>(
    items: Vec<Value>,
    path: &str,
    config: DecoderConfig,
    visitor: V,
) -> Result<V::Value, DecodeError> {
    let len = items.len();
    let mut seq = SeqDecoder {
        iter: items.into_iter(),
        index: 0,
        path: path.to_string(),
        config,
    };
    let value = visitor.visit_seq(&mut seq)?;
    if seq.iter.len() == 0 {
        Ok(value)
    } else {
        Err(de::Error::invalid_length(len, &"fewer elements in sequence"))
    }
}

fn visit_object<'de, V: Visitor<'de>>(
    map: Map<String, Value>,
    fields: Option<&'static [&'static str]>,
    path: &str,
    config: DecoderConfig,
    visitor: V,
) -> Result<V::Value, DecodeError> {
    visitor.visit_map(MapDecoder {
        iter: map.into_iter(),
        pending: None,
        fields,
        path: path.to_string(),
        config,
    })
}

struct SeqDecoder {
    iter: std::vec::IntoIter<Value>,
    index: usize,
    path: String,
    config: DecoderConfig,
}

impl<'de> SeqAccess<'de> for SeqDecoder {
    type Error = DecodeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, DecodeError> {
        let Some(value) = self.iter.next() else {
            return Ok(None);
        };
        let path = format!("{}[{}]", self.path, self.index);
        self.index += 1;
        seed.deserialize(Decoder::new(value, path.clone(), self.config))
            .map(Some)
            .map_err(|e| e.at(&path))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDecoder {
    iter: serde_json::map::IntoIter,
    pending: Option<(String, Value)>,
    fields: Option<&'static [&'static str]>,
    path: String,
    config: DecoderConfig,
}

impl<'de> MapAccess<'de> for MapDecoder {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DecodeError> {
        let Some((key, value)) = self.iter.next() else {
            return Ok(None);
        };
        let name = match self.fields {
            Some(fields) => match_name(key.clone(), fields),
            None => key.clone(),
        };
        self.pending = Some((key, value));

        let name: StringDeserializer<DecodeError> = name.into_deserializer();
        seed.deserialize(name).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, DecodeError> {
        let Some((key, value)) = self.pending.take() else {
            return Err(de::Error::custom("map value requested before its key"));
        };
        let path = join_path(&self.path, &key);
        seed.deserialize(Decoder::new(value, path.clone(), self.config))
            .map_err(|e| e.at(&path))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDecoder {
    variant: String,
    value: Option<Value>,
    path: String,
    config: DecoderConfig,
}

impl<'de> EnumAccess<'de> for EnumDecoder {
    type Error = DecodeError;
    type Variant = VariantDecoder;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, VariantDecoder), DecodeError> {
        let variant: StringDeserializer<DecodeError> = self.variant.into_deserializer();
        let tag = seed.deserialize(variant)?;
        Ok((
            tag,
            VariantDecoder {
                value: self.value,
                path: self.path,
                config: self.config,
            },
        ))
    }
}

struct VariantDecoder {
    value: Option<Value>,
    path: String,
    config: DecoderConfig,
}

impl VariantDecoder {
    fn payload(self, expected: &'static str) -> Result<Decoder, DecodeError> {
        match self.value {
            Some(value) => Ok(Decoder::new(value, self.path, self.config)),
            None => Err(de::Error::invalid_type(Unexpected::UnitVariant, &expected)),
        }
    }
}

impl<'de> VariantAccess<'de> for VariantDecoder {
    type Error = DecodeError;

    fn unit_variant(self) -> Result<(), DecodeError> {
        match self.value {
            None | Some(Value::Null) => Ok(()),
            Some(other) => Err(invalid_type(&other, &"unit variant")),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(
        self,
        seed: T,
    ) -> Result<T::Value, DecodeError> {
        seed.deserialize(self.payload("newtype variant")?)
    }

    fn tuple_variant<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        de::Deserializer::deserialize_seq(self.payload("tuple variant")?, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        de::Deserializer::deserialize_struct(self.payload("struct variant")?, "", fields, visitor)
    }
}

fn expects_identifier(expected: &dyn de::Expected) -> bool {
    expected.to_string().contains(UUID_EXPECTATION)
}

/// The declared name matching `name` ignoring case, or `name` itself.
fn match_name(name: String, declared: &'static [&'static str]) -> String {
    match declared.iter().find(|d| d.eq_ignore_ascii_case(&name)) {
        Some(d) => (*d).to_string(),
        None => name,
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn split_list(s: &str) -> Vec<Value> {
    if s.is_empty() {
        return Vec::new();
    }
    s.split(LIST_DELIMITER)
        .map(|item| Value::String(item.to_string()))
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" | "" => Some(false),
        _ => None,
    }
}

/// Integer literal with an optional sign and `0x`/`0o`/`0b` radix prefix.
/// The empty string is zero.
fn parse_integer(s: &str) -> Option<i128> {
    if s.is_empty() {
        return Some(0);
    }
    let (negative, body) = match s.strip_prefix('-') {
        Some(body) => (true, body),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (radix, digits) = match body.get(..2) {
        Some("0x" | "0X") => (16, &body[2..]),
        Some("0o" | "0O") => (8, &body[2..]),
        Some("0b" | "0B") => (2, &body[2..]),
        _ => (10, body),
    };
    if digits.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = i128::from(u64::from_str_radix(digits, radix).ok()?);
    Some(if negative { -magnitude } else { magnitude })
}

fn visit_integer<'de, V: Visitor<'de>>(n: i128, visitor: V) -> Result<V::Value, DecodeError> {
    if let Ok(u) = u64::try_from(n) {
        visitor.visit_u64(u)
    } else if let Ok(i) = i64::try_from(n) {
        visitor.visit_i64(i)
    } else {
        Err(de::Error::custom(format!("integer {n} out of range")))
    }
}

fn is_zero(n: &Number) -> bool {
    n.as_u64() == Some(0)
        || n.as_i64() == Some(0)
        || n.as_f64().is_some_and(|f| f.abs() < f64::EPSILON)
}

fn invalid_type(value: &Value, expected: &dyn de::Expected) -> DecodeError {
    de::Error::invalid_type(unexpected(value), expected)
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Unexpected::Unsigned(u)
            } else if let Some(i) = n.as_i64() {
                Unexpected::Signed(i)
            } else {
                Unexpected::Float(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}
