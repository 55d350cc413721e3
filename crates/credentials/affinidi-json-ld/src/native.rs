//! Lexicalization of native values into RDF literal forms.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde_json::{Number, Value};

use crate::model::{Literal, NamedNode, xsd};

/// A value with a native representation and a fixed XSD datatype.
#[derive(Clone, Debug, PartialEq)]
pub enum Native {
    Boolean(bool),
    Integer(i128),
    Double(f64),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(DateTime<FixedOffset>),
}

impl Native {
    /// Classify a JSON scalar. Strings and non-scalars are not native.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Boolean(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Integer(i.into()))
                } else if let Some(u) = n.as_u64() {
                    Some(Self::Integer(u.into()))
                } else {
                    n.as_f64().map(Self::Double)
                }
            }
            _ => None,
        }
    }

    pub fn lexical_form(&self) -> String {
        match self {
            Self::Boolean(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Double(d) => canonical_double(*d),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Time(t) => t.format("%H:%M:%S%.f").to_string(),
            Self::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }

    pub fn datatype(&self) -> &'static str {
        match self {
            Self::Boolean(_) => xsd::BOOLEAN,
            Self::Integer(_) => xsd::INTEGER,
            Self::Double(_) => xsd::DOUBLE,
            Self::Date(_) => xsd::DATE,
            Self::Time(_) => xsd::TIME,
            Self::DateTime(_) => xsd::DATE_TIME,
        }
    }

    pub fn to_literal(&self) -> Literal {
        Literal::typed(self.lexical_form(), NamedNode::new(self.datatype()))
    }

    /// The JSON form of booleans and numbers; `None` for temporal values.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::Boolean(b) => Some(Value::Bool(*b)),
            Self::Integer(i) => i64::try_from(*i)
                .map(|i| Value::Number(i.into()))
                .or_else(|_| u64::try_from(*i).map(|u| Value::Number(u.into())))
                .ok(),
            Self::Double(d) => Number::from_f64(*d).map(Value::Number),
            _ => None,
        }
    }

    /// Recover a JSON native from a typed lexical form, but only when the form is
    /// canonical so that lexicalizing the result reproduces it exactly.
    pub fn from_lexical(lexical: &str, datatype: &str) -> Option<Value> {
        let native = match datatype {
            xsd::BOOLEAN => match lexical {
                "true" => Self::Boolean(true),
                "false" => Self::Boolean(false),
                _ => return None,
            },
            xsd::INTEGER => Self::Integer(lexical.parse().ok()?),
            xsd::DOUBLE => Self::Double(lexical.parse().ok()?),
            _ => return None,
        };
        if native.lexical_form() == lexical {
            native.to_json()
        } else {
            None
        }
    }
}

/// Shortest round-trip decimal form, switching to exponent notation for very
/// large or very small magnitudes.
fn canonical_double(d: f64) -> String {
    if d.is_nan() {
        return "NaN".to_string();
    }
    if d.is_infinite() {
        return if d > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    let abs = d.abs();
    if abs != 0.0 && !(1e-6..1e21).contains(&abs) {
        let formatted = format!("{d:E}");
        return match formatted.split_once('E') {
            Some((mantissa, exponent)) if !mantissa.contains('.') => format!("{mantissa}.0E{exponent}"),
            _ => formatted,
        };
    }
    let s = d.to_string();
    if s.contains('.') { s } else { format!("{s}.0") }
}

impl From<bool> for Native {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for Native {
    fn from(i: i64) -> Self {
        Self::Integer(i.into())
    }
}

impl From<f64> for Native {
    fn from(d: f64) -> Self {
        Self::Double(d)
    }
}

impl From<NaiveDate> for Native {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<NaiveTime> for Native {
    fn from(t: NaiveTime) -> Self {
        Self::Time(t)
    }
}

impl From<DateTime<FixedOffset>> for Native {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self::DateTime(dt)
    }
}

impl From<DateTime<Utc>> for Native {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt.fixed_offset())
    }
}
