//! Type-preserving JSON codec.
//!
//! Serialized forms are plain JSON, but the values flowing through fields are
//! richer than JSON scalars: chrono temporal types, tuples, and external
//! entity references. The codec tags those on the way out and restores the
//! matching [`Value`] kind on the way in:
//!
//! - temporal values → `{"obj": "date"|"time"|"datetime", "value": <iso>}`
//! - tuples          → `{"tuple": [...]}` (recursive)
//! - entity refs     → `{"obj": "<kind>", "id": "<id>"}`, resolved through a
//!   caller-supplied [`EntityResolver`] on decode
//! - everything else passes through unchanged.
//!
//! Round-trip contract: `decode(encode(v)) == v` for every supported kind
//! under the [`PassthroughResolver`].

use crate::error::CodecError;
use crate::value::{Payload, Value};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::json;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Resolves an external-entity reference back into a value.
///
/// The lookup mechanism itself (database, cache, service) lives outside the
/// core; only this seam is injected.
pub trait EntityResolver {
    fn resolve(&self, kind: &str, id: &str) -> Result<Value, CodecError>;
}

/// Default resolver: returns the reference itself, unresolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughResolver;

impl EntityResolver for PassthroughResolver {
    fn resolve(&self, kind: &str, id: &str) -> Result<Value, CodecError> {
        Ok(Value::entity(kind, id))
    }
}

/// Encode one value into its JSON wire shape.
pub fn encode_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Bool(b) => json!(b),
        Value::Integer(n) => json!(n),
        Value::Float(x) => json!(x),
        Value::Text(s) => json!(s),
        Value::Date(d) => json!({"obj": "date", "value": d.format(DATE_FORMAT).to_string()}),
        Value::Time(t) => json!({"obj": "time", "value": t.format(TIME_FORMAT).to_string()}),
        Value::DateTime(dt) => json!({"obj": "datetime", "value": dt.to_rfc3339()}),
        Value::Tuple(items) => {
            json!({"tuple": items.iter().map(encode_value).collect::<Vec<_>>()})
        }
        Value::Entity { kind, id } => json!({"obj": kind, "id": id}),
    }
}

/// Encode a sequence pointwise into a JSON array.
pub fn encode_values(values: &[Value]) -> serde_json::Value {
    serde_json::Value::Array(values.iter().map(encode_value).collect())
}

/// Encode a whole payload mapping.
pub fn encode_payload(payload: &Payload) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (name, values) in payload.iter() {
        map.insert(name.to_string(), encode_values(values));
    }
    serde_json::Value::Object(map)
}

/// Decode one JSON wire value back into a [`Value`].
pub fn decode_value(
    raw: &serde_json::Value,
    resolver: &dyn EntityResolver,
) -> Result<Value, CodecError> {
    match raw {
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(CodecError::Unsupported(n.to_string()))
            }
        }
        serde_json::Value::Object(map) => decode_tagged(map, resolver),
        other => Err(CodecError::Unsupported(other.to_string())),
    }
}

fn decode_tagged(
    map: &serde_json::Map<String, serde_json::Value>,
    resolver: &dyn EntityResolver,
) -> Result<Value, CodecError> {
    if let Some(serde_json::Value::Array(items)) = map.get("tuple") {
        let decoded = items
            .iter()
            .map(|item| decode_value(item, resolver))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::Tuple(decoded));
    }

    let Some(serde_json::Value::String(tag)) = map.get("obj") else {
        return Err(CodecError::Unsupported(
            serde_json::Value::Object(map.clone()).to_string(),
        ));
    };

    match tag.as_str() {
        "date" | "time" | "datetime" => {
            let raw = map
                .get("value")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            decode_temporal(tag, raw)
        }
        kind => {
            let id = map
                .get("id")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            resolver.resolve(kind, id)
        }
    }
}

fn decode_temporal(tag: &str, raw: &str) -> Result<Value, CodecError> {
    match tag {
        "date" => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|_| CodecError::InvalidTemporal {
                kind: "date",
                raw: raw.to_string(),
            }),
        "time" => NaiveTime::parse_from_str(raw, TIME_FORMAT)
            .map(Value::Time)
            .map_err(|_| CodecError::InvalidTemporal {
                kind: "time",
                raw: raw.to_string(),
            }),
        _ => DateTime::parse_from_rfc3339(raw)
            .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
            .map_err(|_| CodecError::InvalidTemporal {
                kind: "datetime",
                raw: raw.to_string(),
            }),
    }
}

/// Decode a JSON array pointwise; a bare scalar decodes as a one-element
/// sequence (legacy payloads stored scalars unwrapped).
pub fn decode_values(
    raw: &serde_json::Value,
    resolver: &dyn EntityResolver,
) -> Result<Vec<Value>, CodecError> {
    match raw {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| decode_value(item, resolver))
            .collect(),
        serde_json::Value::Null => Ok(Vec::new()),
        scalar => Ok(vec![decode_value(scalar, resolver)?]),
    }
}

/// Decode a whole payload mapping.
pub fn decode_payload(
    raw: &serde_json::Value,
    resolver: &dyn EntityResolver,
) -> Result<Payload, CodecError> {
    let serde_json::Value::Object(map) = raw else {
        return Err(CodecError::Unsupported(raw.to_string()));
    };
    let mut payload = Payload::new();
    for (name, value) in map {
        payload.insert(name.clone(), decode_values(value, resolver)?);
    }
    Ok(payload)
}
