//! Tag-length-value primitives for the persisted byte stream.
//!
//! Conventions shared by every section of the stream:
//! - all multi-byte integers are big-endian
//! - strings are a `u32` byte length followed by UTF-8 bytes
//! - values are one tag byte followed by a tag-specific payload
//!
//! ```text
//! tag  payload
//! 0x01 u32 len + utf-8            string
//! 0x02 i64                        integer
//! 0x03 f64                        float
//! 0x04 u8                         boolean
//! 0x05 -                          null
//! 0x06 string + i64               legacy object reference (reserved)
//! 0x07 u32 y, m, d                date
//! 0x08 u32 h, mi, s               time
//! 0x09 u32 y, m, d, h, mi, s      datetime
//! 0x0A u32 count + values         array
//! 0x0B string + string(json)      enum reference
//! ```

use bytes::{Buf, BufMut};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::value::Value;

/// Type tag for encoded values.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTag {
    String = 0x01,
    Integer = 0x02,
    Float = 0x03,
    Boolean = 0x04,
    Null = 0x05,
    ObjectRef = 0x06,
    Date = 0x07,
    Time = 0x08,
    DateTime = 0x09,
    Array = 0x0A,
    EnumRef = 0x0B,
}

impl TryFrom<u8> for ValueTag {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(ValueTag::String),
            0x02 => Ok(ValueTag::Integer),
            0x03 => Ok(ValueTag::Float),
            0x04 => Ok(ValueTag::Boolean),
            0x05 => Ok(ValueTag::Null),
            0x06 => Ok(ValueTag::ObjectRef),
            0x07 => Ok(ValueTag::Date),
            0x08 => Ok(ValueTag::Time),
            0x09 => Ok(ValueTag::DateTime),
            0x0A => Ok(ValueTag::Array),
            0x0B => Ok(ValueTag::EnumRef),
            other => Err(Error::UnrecognizedTag(other)),
        }
    }
}

/// Upper bounds applied while reading untrusted bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    /// Maximum byte length of a single string.
    pub max_string_len: usize,
    /// Maximum element count of any counted collection (arrays, sections).
    pub max_collection_len: usize,
    /// Maximum array nesting depth.
    pub max_depth: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            max_string_len: 64 * 1024 * 1024,
            max_collection_len: 16 * 1024 * 1024,
            max_depth: 32,
        }
    }
}

/// A reference to one member of a named enum.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumRef {
    /// Name of the enum the member belongs to.
    pub enum_name: String,
    /// Member label.
    pub label: String,
    /// Member scalar value.
    pub value: Value,
}

/// One decoded tagged item.
#[derive(Debug, Clone, PartialEq)]
pub enum Tagged {
    /// A plain value (tags 0x01-0x05, 0x07-0x0A).
    Value(Value),
    /// An enum member reference (tag 0x0B).
    EnumRef(EnumRef),
    /// A legacy object reference (tag 0x06). Parsed so the stream stays
    /// aligned; interpreting it is left to the caller.
    ObjectRef { table: String, key: i64 },
}

/// Convert a JSON scalar (integer or string) into a [`Value`].
pub fn json_scalar(json: &JsonValue) -> Option<Value> {
    match json {
        JsonValue::Number(n) => n.as_i64().map(Value::Integer),
        JsonValue::String(s) => Some(Value::String(s.clone())),
        _ => None,
    }
}

/// Append-only writer for the byte stream.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the writer and return the bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.put_u32(v);
    }

    pub fn put_i64(&mut self, v: i64) {
        self.buf.put_i64(v);
    }

    pub fn put_f64(&mut self, v: f64) {
        self.buf.put_f64(v);
    }

    /// Write a collection length as `u32`.
    pub fn put_len(&mut self, context: &'static str, len: usize) -> Result<()> {
        let len = u32::try_from(len).map_err(|_| Error::Oversized { context, len })?;
        self.buf.put_u32(len);
        Ok(())
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn put_string(&mut self, s: &str) -> Result<()> {
        self.put_len("string", s.len())?;
        self.buf.put_slice(s.as_bytes());
        Ok(())
    }

    /// Write a JSON object as a length-prefixed string.
    pub fn put_json_object(&mut self, object: &Map<String, JsonValue>) -> Result<()> {
        let text = serde_json::to_string(object).map_err(|source| Error::Json {
            context: "json object",
            source,
        })?;
        self.put_string(&text)
    }

    /// Write a tagged value.
    pub fn put_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.put_tag(ValueTag::Null),
            Value::String(s) => {
                self.put_tag(ValueTag::String);
                self.put_string(s)?;
            }
            Value::Integer(n) => {
                self.put_tag(ValueTag::Integer);
                self.put_i64(*n);
            }
            Value::Float(f) => {
                self.put_tag(ValueTag::Float);
                self.put_f64(*f);
            }
            Value::Boolean(b) => {
                self.put_tag(ValueTag::Boolean);
                self.put_u8(u8::from(*b));
            }
            Value::Date(d) => {
                self.put_tag(ValueTag::Date);
                self.put_date(d)?;
            }
            Value::Time(t) => {
                self.put_tag(ValueTag::Time);
                self.put_time(t);
            }
            Value::DateTime(dt) => {
                self.put_tag(ValueTag::DateTime);
                self.put_date(&dt.date())?;
                self.put_time(&dt.time());
            }
            Value::Array(items) => {
                self.put_tag(ValueTag::Array);
                self.put_len("array", items.len())?;
                for item in items {
                    self.put_value(item)?;
                }
            }
        }
        Ok(())
    }

    /// Write an enum member reference: enum name, then `{label: value}` as JSON.
    pub fn put_enum_ref(&mut self, enum_name: &str, label: &str, value: &Value) -> Result<()> {
        let json = serde_json::to_value(value).map_err(|source| Error::Json {
            context: "enum reference",
            source,
        })?;
        let mut mapping = Map::new();
        mapping.insert(label.to_string(), json);

        self.put_tag(ValueTag::EnumRef);
        self.put_string(enum_name)?;
        self.put_json_object(&mapping)
    }

    fn put_tag(&mut self, tag: ValueTag) {
        self.buf.put_u8(tag as u8);
    }

    fn put_date(&mut self, date: &NaiveDate) -> Result<()> {
        let year = u32::try_from(date.year()).map_err(|_| Error::InvalidTemporal {
            kind: "date",
            components: vec![date.year() as i64],
        })?;
        self.put_u32(year);
        self.put_u32(date.month());
        self.put_u32(date.day());
        Ok(())
    }

    fn put_time(&mut self, time: &NaiveTime) {
        self.put_u32(time.hour());
        self.put_u32(time.minute());
        self.put_u32(time.second());
    }
}

/// Forward-only reader over an encoded byte stream.
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    total: usize,
    limits: ReadLimits,
}

impl<'a> WireReader<'a> {
    /// Create a reader with default limits.
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_limits(buf, ReadLimits::default())
    }

    /// Create a reader with explicit limits.
    pub fn with_limits(buf: &'a [u8], limits: ReadLimits) -> Self {
        Self {
            buf,
            total: buf.len(),
            limits,
        }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.total - self.buf.remaining()
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Check if the whole stream has been consumed.
    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    fn need(&self, needed: usize, context: &'static str) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(Error::Truncated {
                context,
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn get_u8(&mut self, context: &'static str) -> Result<u8> {
        self.need(1, context)?;
        Ok(self.buf.get_u8())
    }

    pub fn get_u32(&mut self, context: &'static str) -> Result<u32> {
        self.need(4, context)?;
        Ok(self.buf.get_u32())
    }

    pub fn get_i64(&mut self, context: &'static str) -> Result<i64> {
        self.need(8, context)?;
        Ok(self.buf.get_i64())
    }

    pub fn get_f64(&mut self, context: &'static str) -> Result<f64> {
        self.need(8, context)?;
        Ok(self.buf.get_f64())
    }

    /// Read a `u32` element count, bounded by the collection limit.
    pub fn get_count(&mut self, context: &'static str) -> Result<usize> {
        let count = self.get_u32(context)? as usize;
        if count > self.limits.max_collection_len {
            return Err(Error::LimitExceeded {
                context,
                limit: self.limits.max_collection_len,
                actual: count,
            });
        }
        Ok(count)
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn get_string(&mut self, context: &'static str) -> Result<String> {
        let len = self.get_u32(context)? as usize;
        if len > self.limits.max_string_len {
            return Err(Error::LimitExceeded {
                context,
                limit: self.limits.max_string_len,
                actual: len,
            });
        }
        self.need(len, context)?;
        let s = std::str::from_utf8(&self.buf[..len])
            .map_err(|_| Error::InvalidUtf8 { context })?
            .to_string();
        self.buf.advance(len);
        Ok(s)
    }

    /// Read a length-prefixed JSON object.
    pub fn get_json_object(&mut self, context: &'static str) -> Result<Map<String, JsonValue>> {
        let text = self.get_string(context)?;
        serde_json::from_str(&text).map_err(|source| Error::Json { context, source })
    }

    /// Read one tagged item.
    pub fn get_tagged(&mut self) -> Result<Tagged> {
        self.read_tagged(0)
    }

    /// Read one tagged item that must be a plain value.
    pub fn get_value(&mut self, context: &'static str) -> Result<Value> {
        match self.read_tagged(0)? {
            Tagged::Value(v) => Ok(v),
            Tagged::EnumRef(_) => Err(Error::UnexpectedTag {
                tag: ValueTag::EnumRef as u8,
                context,
            }),
            Tagged::ObjectRef { .. } => Err(Error::UnexpectedTag {
                tag: ValueTag::ObjectRef as u8,
                context,
            }),
        }
    }

    fn read_tagged(&mut self, depth: usize) -> Result<Tagged> {
        let tag = ValueTag::try_from(self.get_u8("value tag")?)?;

        let value = match tag {
            ValueTag::Null => Value::Null,
            ValueTag::String => Value::String(self.get_string("string value")?),
            ValueTag::Integer => Value::Integer(self.get_i64("integer value")?),
            ValueTag::Float => Value::Float(self.get_f64("float value")?),
            ValueTag::Boolean => Value::Boolean(self.get_u8("boolean value")? != 0),
            ValueTag::Date => Value::Date(self.get_date()?),
            ValueTag::Time => Value::Time(self.get_time()?),
            ValueTag::DateTime => {
                let date = self.get_date()?;
                let time = self.get_time()?;
                Value::DateTime(NaiveDateTime::new(date, time))
            }
            ValueTag::Array => {
                if depth >= self.limits.max_depth {
                    return Err(Error::DepthExceeded(self.limits.max_depth));
                }
                let count = self.get_count("array length")?;
                // Every element occupies at least its tag byte.
                self.need(count, "array elements")?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    match self.read_tagged(depth + 1)? {
                        Tagged::Value(v) => items.push(v),
                        Tagged::EnumRef(_) => {
                            return Err(Error::UnexpectedTag {
                                tag: ValueTag::EnumRef as u8,
                                context: "array element",
                            })
                        }
                        Tagged::ObjectRef { .. } => {
                            return Err(Error::UnexpectedTag {
                                tag: ValueTag::ObjectRef as u8,
                                context: "array element",
                            })
                        }
                    }
                }
                Value::Array(items)
            }
            ValueTag::ObjectRef => {
                let table = self.get_string("object reference table")?;
                let key = self.get_i64("object reference key")?;
                return Ok(Tagged::ObjectRef { table, key });
            }
            ValueTag::EnumRef => return self.get_enum_ref().map(Tagged::EnumRef),
        };

        Ok(Tagged::Value(value))
    }

    fn get_enum_ref(&mut self) -> Result<EnumRef> {
        let enum_name = self.get_string("enum reference name")?;
        let mapping = self.get_json_object("enum reference mapping")?;
        if mapping.len() != 1 {
            return Err(Error::InvalidEnumRef {
                enum_name,
                reason: "mapping must hold exactly one member",
            });
        }
        let Some((label, json)) = mapping.into_iter().next() else {
            return Err(Error::InvalidEnumRef {
                enum_name,
                reason: "mapping must hold exactly one member",
            });
        };
        let Some(value) = json_scalar(&json) else {
            return Err(Error::InvalidEnumRef {
                enum_name,
                reason: "member value must be an integer or string",
            });
        };
        Ok(EnumRef {
            enum_name,
            label,
            value,
        })
    }

    fn get_date(&mut self) -> Result<NaiveDate> {
        let y = self.get_u32("date year")?;
        let m = self.get_u32("date month")?;
        let d = self.get_u32("date day")?;
        i32::try_from(y)
            .ok()
            .and_then(|y| NaiveDate::from_ymd_opt(y, m, d))
            .ok_or_else(|| Error::InvalidTemporal {
                kind: "date",
                components: vec![y as i64, m as i64, d as i64],
            })
    }

    fn get_time(&mut self) -> Result<NaiveTime> {
        let h = self.get_u32("time hour")?;
        let mi = self.get_u32("time minute")?;
        let s = self.get_u32("time second")?;
        NaiveTime::from_hms_opt(h, mi, s).ok_or_else(|| Error::InvalidTemporal {
            kind: "time",
            components: vec![h as i64, mi as i64, s as i64],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: Value) -> Value {
        let mut writer = WireWriter::new();
        writer.put_value(&value).unwrap();
        let bytes = writer.into_inner();
        let mut reader = WireReader::new(&bytes);
        let decoded = reader.get_value("test").unwrap();
        assert!(reader.is_empty());
        decoded
    }

    #[test]
    fn test_integer_is_big_endian() {
        let mut writer = WireWriter::new();
        writer.put_value(&Value::Integer(1)).unwrap();
        assert_eq!(writer.into_inner(), vec![0x02, 0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_string_layout() {
        let mut writer = WireWriter::new();
        writer.put_value(&Value::String("hi".into())).unwrap();
        assert_eq!(writer.into_inner(), vec![0x01, 0, 0, 0, 2, b'h', b'i']);
    }

    #[test]
    fn test_temporal_values() {
        let date = NaiveDate::from_ymd_opt(2024, 9, 25).unwrap();
        let time = NaiveTime::from_hms_opt(14, 35, 0).unwrap();
        assert_eq!(roundtrip(Value::Date(date)), Value::Date(date));
        assert_eq!(roundtrip(Value::Time(time)), Value::Time(time));
        let dt = NaiveDateTime::new(date, time);
        assert_eq!(roundtrip(Value::DateTime(dt)), Value::DateTime(dt));
    }

    #[test]
    fn test_nested_array() {
        let value = Value::Array(vec![
            Value::Integer(1),
            Value::Null,
            Value::Array(vec![Value::String("x".into())]),
        ]);
        assert_eq!(roundtrip(value.clone()), value);
    }

    #[test]
    fn test_float_bits_preserved() {
        let f = 0.1 + 0.2;
        let decoded = roundtrip(Value::Float(f));
        assert_eq!(decoded.as_f64().unwrap().to_bits(), f.to_bits());
    }

    #[test]
    fn test_unrecognized_tag() {
        let mut reader = WireReader::new(&[0x0C]);
        assert!(matches!(
            reader.get_tagged(),
            Err(Error::UnrecognizedTag(0x0C))
        ));
    }

    #[test]
    fn test_truncated_integer() {
        let mut reader = WireReader::new(&[0x02, 0, 0, 1]);
        assert!(matches!(reader.get_tagged(), Err(Error::Truncated { .. })));
    }

    #[test]
    fn test_truncated_string() {
        let mut reader = WireReader::new(&[0x01, 0, 0, 0, 5, b'a']);
        assert!(matches!(reader.get_tagged(), Err(Error::Truncated { .. })));
    }

    #[test]
    fn test_string_limit() {
        let limits = ReadLimits {
            max_string_len: 2,
            ..ReadLimits::default()
        };
        let mut reader = WireReader::with_limits(&[0x01, 0, 0, 0, 3, b'a', b'b', b'c'], limits);
        assert!(matches!(
            reader.get_tagged(),
            Err(Error::LimitExceeded { actual: 3, .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let limits = ReadLimits {
            max_depth: 1,
            ..ReadLimits::default()
        };
        let mut writer = WireWriter::new();
        writer
            .put_value(&Value::Array(vec![Value::Array(vec![])]))
            .unwrap();
        let bytes = writer.into_inner();
        let mut reader = WireReader::with_limits(&bytes, limits);
        assert!(matches!(reader.get_tagged(), Err(Error::DepthExceeded(1))));
    }

    #[test]
    fn test_enum_ref_roundtrip() {
        let mut writer = WireWriter::new();
        writer
            .put_enum_ref("Title", "Dr", &Value::Integer(3))
            .unwrap();
        let bytes = writer.into_inner();
        let mut reader = WireReader::new(&bytes);
        match reader.get_tagged().unwrap() {
            Tagged::EnumRef(r) => {
                assert_eq!(r.enum_name, "Title");
                assert_eq!(r.label, "Dr");
                assert_eq!(r.value, Value::Integer(3));
            }
            other => panic!("Expected EnumRef, got {other:?}"),
        }
    }

    #[test]
    fn test_enum_ref_rejected_as_plain_value() {
        let mut writer = WireWriter::new();
        writer
            .put_enum_ref("Title", "Mr", &Value::Integer(1))
            .unwrap();
        let bytes = writer.into_inner();
        let mut reader = WireReader::new(&bytes);
        assert!(matches!(
            reader.get_value("default"),
            Err(Error::UnexpectedTag { tag: 0x0B, .. })
        ));
    }

    #[test]
    fn test_object_ref_is_parsed() {
        let mut bytes = vec![0x06, 0, 0, 0, 4];
        bytes.extend_from_slice(b"User");
        bytes.extend_from_slice(&7i64.to_be_bytes());
        let mut reader = WireReader::new(&bytes);
        assert_eq!(
            reader.get_tagged().unwrap(),
            Tagged::ObjectRef {
                table: "User".into(),
                key: 7
            }
        );
        assert!(reader.is_empty());
    }

    #[test]
    fn test_invalid_date_components() {
        let mut bytes = vec![0x07];
        for part in [2024u32, 13, 1] {
            bytes.extend_from_slice(&part.to_be_bytes());
        }
        let mut reader = WireReader::new(&bytes);
        assert!(matches!(
            reader.get_tagged(),
            Err(Error::InvalidTemporal { kind: "date", .. })
        ));
    }
}
