use crate::allocation::{InvalidItemError, InvalidReason};
use crate::fees::FeeError;
use crate::ipc::error::err;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;

/// Largest magnitude accepted for a top-level amount (target, collected,
/// total marks); far beyond any fee or mark total.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<InvalidItemError> for HandlerErr {
    fn from(e: InvalidItemError) -> Self {
        Self {
            code: "invalid_item",
            message: e.to_string(),
            details: Some(json!({
                "label": e.label,
                "reason": e.reason.code(),
            })),
        }
    }
}

impl From<FeeError> for HandlerErr {
    fn from(e: FeeError) -> Self {
        match e {
            FeeError::InvalidItem(e) => e.into(),
            FeeError::BadPeriod(m) => Self {
                code: "bad_period",
                message: m,
                details: None,
            },
            e @ FeeError::MissingQuantity(_) => Self::bad_params(e.to_string()),
        }
    }
}

pub fn to_result<T: serde::Serialize>(v: &T) -> Result<Value, HandlerErr> {
    serde_json::to_value(v).map_err(|e| HandlerErr {
        code: "internal",
        message: e.to_string(),
        details: None,
    })
}

pub fn required_array<'a>(params: &'a Value, key: &str) -> Result<&'a Vec<Value>, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_array())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {key}")))
}

pub fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {key}")))
}

pub fn label_of(obj: &Value, key: &str, at: &str) -> Result<String, HandlerErr> {
    match obj.get(key).and_then(|v| v.as_str()).map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(HandlerErr::bad_params(format!("{at}.{key} must be a non-empty string"))),
    }
}

/// JSON numbers go through their text form so `0.1` stays `0.1`.
fn number_to_decimal(n: &serde_json::Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn parse_decimal_text(s: &str) -> Option<Decimal> {
    let t = s.trim();
    Decimal::from_str(t)
        .or_else(|_| Decimal::from_scientific(t))
        .ok()
}

/// Decimal `key` of item `label`.
///
/// Strings are parsed the way a form would; text that isn't a number is a
/// parameter error. Anything else that isn't a number (null, bool, missing)
/// is an invalid item.
pub fn item_decimal(obj: &Value, key: &str, label: &str) -> Result<Decimal, HandlerErr> {
    match obj.get(key) {
        Some(Value::Number(n)) => number_to_decimal(n)
            .ok_or_else(|| InvalidItemError::new(label, InvalidReason::Overflow).into()),
        Some(Value::String(s)) => parse_decimal_text(s).ok_or_else(|| HandlerErr {
            code: "bad_params",
            message: format!("{key} of \"{label}\" is not a number: {s:?}"),
            details: Some(json!({ "label": label, "field": key })),
        }),
        _ => Err(InvalidItemError::new(label, InvalidReason::NonNumeric(key.to_string())).into()),
    }
}

/// Like `item_decimal`, but an absent or null field reads as zero.
pub fn item_decimal_or_zero(obj: &Value, key: &str, label: &str) -> Result<Decimal, HandlerErr> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(Decimal::ZERO),
        Some(_) => item_decimal(obj, key, label),
    }
}

pub fn item_quantity(obj: &Value, key: &str, label: &str) -> Result<i64, HandlerErr> {
    let invalid = |reason| -> HandlerErr { InvalidItemError::new(label, reason).into() };
    match obj.get(key) {
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            if n.as_u64().is_some() {
                return Err(invalid(InvalidReason::Overflow));
            }
            match n.as_f64() {
                // i64::MAX as f64 rounds up to 2^63, which is out of range.
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                    Ok(f as i64)
                }
                Some(f) if f.fract() == 0.0 => Err(invalid(InvalidReason::Overflow)),
                _ => Err(invalid(InvalidReason::NonInteger)),
            }
        }
        Some(Value::String(s)) => match parse_decimal_text(s) {
            Some(d) if d.fract().is_zero() => {
                d.to_i64().ok_or_else(|| invalid(InvalidReason::Overflow))
            }
            Some(_) => Err(invalid(InvalidReason::NonInteger)),
            None => Err(HandlerErr {
                code: "bad_params",
                message: format!("{key} of \"{label}\" is not a number: {s:?}"),
                details: Some(json!({ "label": label, "field": key })),
            }),
        },
        _ => Err(invalid(InvalidReason::NonNumeric(key.to_string()))),
    }
}

/// Top-level amount such as a target; not tied to an item.
pub fn required_decimal(params: &Value, key: &str) -> Result<Decimal, HandlerErr> {
    let v = match params.get(key) {
        Some(Value::Number(n)) => number_to_decimal(n),
        Some(Value::String(s)) => parse_decimal_text(s),
        _ => None,
    };
    let v = v.ok_or_else(|| HandlerErr::bad_params(format!("{key} must be a number")))?;
    if v.abs() > Decimal::from(MAX_AMOUNT) {
        return Err(HandlerErr::bad_params(format!(
            "{key} is out of range (at most {MAX_AMOUNT} either way)"
        )));
    }
    Ok(v)
}

pub fn optional_decimal(params: &Value, key: &str) -> Result<Option<Decimal>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => required_decimal(params, key).map(Some),
    }
}
