//! Field value validation.
//!
//! Every value assigned to a record field passes through [`FieldValidator`],
//! which checks it against the field's kind and returns the canonical value
//! to store. ISO-8601 text is parsed into temporal values, and temporal
//! values are truncated to whole seconds.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use scdb_proto::Value;

use crate::catalog::{Catalog, EnumDef, FieldDef, FieldKind, ScalarKind};
use crate::error::{Error, SchemaError, ValidationError};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Validates values against field definitions.
pub struct FieldValidator<'a> {
    catalog: &'a Catalog,
}

impl<'a> FieldValidator<'a> {
    /// Create a validator over a catalog.
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Validate a value for `table.field`, returning its canonical form.
    pub fn validate(&self, table: &str, field: &FieldDef, value: Value) -> Result<Value, Error> {
        let enum_def = match &field.kind {
            FieldKind::Enum { enum_name } => Some(
                self.catalog
                    .enum_def(enum_name)
                    .ok_or_else(|| SchemaError::UnknownEnum(enum_name.clone()))?,
            ),
            _ => None,
        };

        check_field(field, value, enum_def).map_err(|source| Error::Validation {
            table: table.to_string(),
            field: field.name.clone(),
            source,
        })
    }
}

/// Check a value against a field, honoring nullability.
pub fn check_field(
    field: &FieldDef,
    value: Value,
    enum_def: Option<&EnumDef>,
) -> Result<Value, ValidationError> {
    if value.is_null() {
        return if field.nullable {
            Ok(Value::Null)
        } else {
            Err(ValidationError::Null)
        };
    }
    check_kind(&field.kind, value, enum_def)
}

/// Check a non-null value against a field kind.
pub fn check_kind(
    kind: &FieldKind,
    value: Value,
    enum_def: Option<&EnumDef>,
) -> Result<Value, ValidationError> {
    match kind {
        FieldKind::String { max_length } => check_string(value, *max_length),
        FieldKind::Integer { min, max } => check_integer(value, *min, *max),
        FieldKind::Float { min, max } => check_float(value, *min, *max),
        FieldKind::Boolean => match value {
            Value::Boolean(_) => Ok(value),
            other => Err(mismatch("boolean", &other)),
        },
        FieldKind::Date => check_date(value),
        FieldKind::Time => check_time(value),
        FieldKind::DateTime => check_datetime(value),
        FieldKind::Array {
            item_kind,
            max_length,
        } => check_array(value, *item_kind, *max_length),
        FieldKind::Relation { .. } | FieldKind::ForeignKey { .. } => check_key(value),
        FieldKind::ManyToMany { .. } => check_key_array(value),
        FieldKind::Enum { enum_name } => check_enum(value, enum_name, enum_def),
    }
}

fn mismatch(expected: &'static str, got: &Value) -> ValidationError {
    ValidationError::TypeMismatch {
        expected,
        got: got.kind_name(),
    }
}

fn check_string(value: Value, max_length: Option<usize>) -> Result<Value, ValidationError> {
    let Value::String(s) = value else {
        return Err(mismatch("string", &value));
    };
    if let Some(max) = max_length {
        let actual = s.chars().count();
        if actual > max {
            return Err(ValidationError::Length { max, actual });
        }
    }
    Ok(Value::String(s))
}

fn check_integer(
    value: Value,
    min: Option<i64>,
    max: Option<i64>,
) -> Result<Value, ValidationError> {
    let Value::Integer(i) = value else {
        return Err(mismatch("integer", &value));
    };
    let below = min.is_some_and(|m| i < m);
    let above = max.is_some_and(|m| i > m);
    if below || above {
        return Err(ValidationError::Range {
            min: min.map(|m| m.to_string()),
            max: max.map(|m| m.to_string()),
            actual: i.to_string(),
        });
    }
    Ok(value)
}

fn check_float(value: Value, min: Option<f64>, max: Option<f64>) -> Result<Value, ValidationError> {
    let Value::Float(f) = value else {
        return Err(mismatch("float", &value));
    };
    // NaN fails any declared bound.
    let below = min.is_some_and(|m| !(f >= m));
    let above = max.is_some_and(|m| !(f <= m));
    if below || above {
        return Err(ValidationError::Range {
            min: min.map(|m| m.to_string()),
            max: max.map(|m| m.to_string()),
            actual: f.to_string(),
        });
    }
    Ok(value)
}

fn check_date(value: Value) -> Result<Value, ValidationError> {
    let date = match value {
        Value::Date(d) => d,
        Value::String(s) => s.parse::<NaiveDate>().map_err(|_| ValidationError::Format {
            expected: "date (YYYY-MM-DD)",
            input: s,
        })?,
        other => return Err(mismatch("date", &other)),
    };
    check_year(&date)?;
    Ok(Value::Date(date))
}

fn check_time(value: Value) -> Result<Value, ValidationError> {
    match value {
        Value::Time(t) => Ok(Value::Time(truncate_time(t))),
        Value::String(s) => match s.parse::<NaiveTime>() {
            Ok(t) => Ok(Value::Time(truncate_time(t))),
            Err(_) => Err(ValidationError::Format {
                expected: "time (HH:MM:SS)",
                input: s,
            }),
        },
        other => Err(mismatch("time", &other)),
    }
}

fn check_datetime(value: Value) -> Result<Value, ValidationError> {
    let dt = match value {
        Value::DateTime(dt) => dt,
        Value::String(s) => parse_datetime(&s).ok_or(ValidationError::Format {
            expected: "datetime (YYYY-MM-DDTHH:MM:SS)",
            input: s,
        })?,
        other => return Err(mismatch("datetime", &other)),
    };
    check_year(&dt.date())?;
    Ok(Value::DateTime(truncate_datetime(dt)))
}

/// Years are stored unsigned.
fn check_year(date: &NaiveDate) -> Result<(), ValidationError> {
    if date.year() < 0 {
        return Err(ValidationError::Range {
            min: Some("0".to_string()),
            max: None,
            actual: date.year().to_string(),
        });
    }
    Ok(())
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn truncate_time(t: NaiveTime) -> NaiveTime {
    t.with_nanosecond(0).unwrap_or(t)
}

fn truncate_datetime(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(0).unwrap_or(dt)
}

fn check_array(
    value: Value,
    item_kind: ScalarKind,
    max_length: Option<usize>,
) -> Result<Value, ValidationError> {
    let Value::Array(items) = value else {
        return Err(mismatch("array", &value));
    };
    if let Some(max) = max_length {
        if items.len() > max {
            return Err(ValidationError::Length {
                max,
                actual: items.len(),
            });
        }
    }

    let kind = item_kind.field_kind();
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let checked = if item.is_null() {
                Err(ValidationError::Null)
            } else {
                check_kind(&kind, item, None)
            };
            checked.map_err(|cause| ValidationError::ArrayElement {
                index,
                cause: Box::new(cause),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn check_key(value: Value) -> Result<Value, ValidationError> {
    match value {
        Value::Integer(_) | Value::String(_) => Ok(value),
        other => Err(mismatch("record key", &other)),
    }
}

fn check_key_array(value: Value) -> Result<Value, ValidationError> {
    let Value::Array(items) = value else {
        return Err(mismatch("array of record keys", &value));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            check_key(item).map_err(|cause| ValidationError::ArrayElement {
                index,
                cause: Box::new(cause),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn check_enum(
    value: Value,
    enum_name: &str,
    enum_def: Option<&EnumDef>,
) -> Result<Value, ValidationError> {
    match enum_def {
        Some(def) if def.contains(&value) => Ok(value),
        _ => Err(ValidationError::EnumMembership {
            enum_name: enum_name.to_string(),
            value: value.to_string(),
        }),
    }
}
