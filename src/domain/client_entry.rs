use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// One copy of a logical client as seen on one backend inbound.
///
/// Produced by an inventory source, consumed read-only by the engine.
/// Decoding is lenient the way panel exports are: numeric fields accept
/// numbers or numeric strings (anything else, or a non-finite value,
/// becomes `0`; fractions are kept), string fields
/// accept numbers, and `null` falls back to the field default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub server_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub server_name: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub inbound_id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub inbound_remark: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub protocol: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub password: String,
    /// Epoch milliseconds, `0` = never expires.
    #[serde(
        default,
        deserialize_with = "lenient_number",
        serialize_with = "serialize_number"
    )]
    pub expiry_time: f64,
    /// Quota in bytes, `0` = unlimited.
    #[serde(
        rename = "totalGB",
        default,
        deserialize_with = "lenient_number",
        serialize_with = "serialize_number"
    )]
    pub total_gb: f64,
    /// `None` when the record carried no flag; treated as enabled.
    #[serde(default, deserialize_with = "lenient_opt_bool")]
    pub enable: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        serialize_with = "serialize_number"
    )]
    pub limit_ip: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub flow: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sub_id: String,
    /// Passed through untouched to reconciliation plans.
    #[serde(default)]
    pub tg_id: Value,
}

impl ClientEntry {
    /// A missing flag means enabled; only an explicit `false` disables.
    pub fn is_enabled(&self) -> bool {
        self.enable != Some(false)
    }
}

// ─── Lenient decoders ────────────────────────────────────────────────────────

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().map(coerce_i64).unwrap_or(0))
}

fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().map(coerce_number).unwrap_or(0.0))
}

/// Integral values go out as JSON integers, fractions as floats.
pub(crate) fn serialize_number<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    if v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < i64::MAX as f64 {
        s.serialize_i64(*v as i64)
    } else {
        s.serialize_f64(*v)
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(coerce_string).unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(coerce_string))
}

fn lenient_opt_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(coerce_bool))
}

/// Coerce a JSON value to a number. NaN, infinities and non-numeric values
/// become `0`.
pub(crate) fn coerce_number(v: &Value) -> f64 {
    let f = match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if f.is_finite() {
        f
    } else {
        0.0
    }
}

/// Integer ids: the number, truncated; `0` when it does not fit.
fn coerce_i64(v: &Value) -> i64 {
    if let Value::Number(n) = v {
        if let Some(i) = n.as_i64() {
            return i;
        }
    }
    let f = coerce_number(v);
    if f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        f.trunc() as i64
    } else {
        0
    }
}

fn coerce_string(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn coerce_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().map(|f| f != 0.0).unwrap_or(true)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "false" | "0" | "" => Some(false),
            _ => Some(true),
        },
        _ => None,
    }
}
