use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Decoded primitive or string.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
	/// Boolean stored as one byte.
	Bool(bool),
	/// Signed 8-bit integer.
	I8(i8),
	/// Unsigned 8-bit integer.
	U8(u8),
	/// Single byte character, rendered numerically.
	Char(u8),
	/// Signed 16-bit integer.
	I16(i16),
	/// Unsigned 16-bit integer.
	U16(u16),
	/// Signed 32-bit integer.
	I32(i32),
	/// Unsigned 32-bit integer.
	U32(u32),
	/// Signed 64-bit integer.
	I64(i64),
	/// Unsigned 64-bit integer.
	U64(u64),
	/// 32-bit float.
	F32(f32),
	/// 64-bit float.
	F64(f64),
	/// Length-prefixed text.
	String(Box<str>),
}

impl Scalar {
	/// Integer value widened to `i64`, if this is an integer that fits.
	pub fn as_i64(&self) -> Option<i64> {
		match *self {
			Self::I8(v) => Some(i64::from(v)),
			Self::U8(v) | Self::Char(v) => Some(i64::from(v)),
			Self::I16(v) => Some(i64::from(v)),
			Self::U16(v) => Some(i64::from(v)),
			Self::I32(v) => Some(i64::from(v)),
			Self::U32(v) => Some(i64::from(v)),
			Self::I64(v) => Some(v),
			Self::U64(v) => i64::try_from(v).ok(),
			Self::Bool(_) | Self::F32(_) | Self::F64(_) | Self::String(_) => None,
		}
	}

	/// Text payload, if this is a string.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(v) => Some(v),
			_ => None,
		}
	}
}

impl fmt::Display for Scalar {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bool(true) => f.write_str("True"),
			Self::Bool(false) => f.write_str("False"),
			Self::I8(v) => write!(f, "{v}"),
			Self::U8(v) | Self::Char(v) => write!(f, "{v}"),
			Self::I16(v) => write!(f, "{v}"),
			Self::U16(v) => write!(f, "{v}"),
			Self::I32(v) => write!(f, "{v}"),
			Self::U32(v) => write!(f, "{v}"),
			Self::I64(v) => write!(f, "{v}"),
			Self::U64(v) => write!(f, "{v}"),
			Self::F32(v) => write_float(f, &v.to_string(), &format!("{v:E}"), 7),
			Self::F64(v) => write_float(f, &v.to_string(), &format!("{v:E}"), 15),
			Self::String(v) => f.write_str(v),
		}
	}
}

/// Shortest round-trip digits, switching to `1.5E+07` notation when the
/// decimal exponent is below -5 or at least `precision`.
fn write_float(f: &mut fmt::Formatter<'_>, plain: &str, scientific: &str, precision: i32) -> fmt::Result {
	match plain {
		"inf" => return f.write_str("Infinity"),
		"-inf" => return f.write_str("-Infinity"),
		_ => {}
	}

	let Some((mantissa, exponent)) = scientific.split_once('E') else {
		return f.write_str(plain);
	};
	match exponent.parse::<i32>() {
		Ok(exponent) if !(-5..precision).contains(&exponent) => {
			let sign = if exponent < 0 { '-' } else { '+' };
			write!(f, "{mantissa}E{sign}{:02}", exponent.abs())
		}
		_ => f.write_str(plain),
	}
}

/// Structured value produced by type tree decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	/// Primitive or string.
	Scalar(Scalar),
	/// Named fields in schema order; names are unique.
	Map(Vec<Field>),
	/// Array elements.
	List(ArrayValue),
	/// Large scalar array that was stepped over without decoding.
	Skipped(SkippedArray),
	/// Managed reference payload with the "unknown" sentinel id.
	UnknownRef,
	/// Managed reference payload with the "null" sentinel id.
	NullRef,
}

impl Value {
	/// Field value by name, if this is a map.
	pub fn get(&self, name: &str) -> Option<&Value> {
		match self {
			Self::Map(fields) => fields.iter().find(|field| field.name.as_ref() == name).map(|field| &field.value),
			_ => None,
		}
	}

	/// Elements, if this is a list.
	pub fn items(&self) -> Option<&[Value]> {
		match self {
			Self::List(array) => Some(&array.items),
			_ => None,
		}
	}

	/// Scalar payload, if this is a scalar.
	pub fn as_scalar(&self) -> Option<&Scalar> {
		match self {
			Self::Scalar(scalar) => Some(scalar),
			_ => None,
		}
	}

	/// Short kind label for diagnostics.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Scalar(_) => "scalar",
			Self::Map(_) => "map",
			Self::List(_) => "list",
			Self::Skipped(_) => "skipped",
			Self::UnknownRef => "unknown",
			Self::NullRef => "null",
		}
	}
}

/// One named, typed entry of a map (or a labeled root record).
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
	/// Field name, or the type name for a root record.
	pub name: Box<str>,
	/// Declared type name.
	pub type_name: Box<str>,
	/// Decoded payload.
	pub value: Value,
}

impl Field {
	/// Build a field.
	pub fn new(name: &str, type_name: &str, value: Value) -> Self {
		Self {
			name: name.into(),
			type_name: type_name.into(),
			value,
		}
	}
}

/// Decoded array with its element schema labels.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
	/// Element field name (usually `data`).
	pub elem_name: Box<str>,
	/// Element type name.
	pub elem_type: Box<str>,
	/// Whether elements came from a single bulk scalar read.
	pub bulk: bool,
	/// Elements in stream order.
	pub items: Vec<Value>,
}

/// Placeholder for a scalar array left undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedArray {
	/// Element type name.
	pub elem_type: Box<str>,
	/// Element count read from the stream.
	pub count: usize,
}

/// Insert or replace a field, keeping the first position of a repeated name.
pub(crate) fn insert_field(fields: &mut Vec<Field>, field: Field) {
	match fields.iter_mut().find(|item| item.name == field.name) {
		Some(slot) => *slot = field,
		None => fields.push(field),
	}
}

impl Serialize for Scalar {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		match self {
			Self::Bool(v) => serializer.serialize_bool(*v),
			Self::I8(v) => serializer.serialize_i8(*v),
			Self::U8(v) | Self::Char(v) => serializer.serialize_u8(*v),
			Self::I16(v) => serializer.serialize_i16(*v),
			Self::U16(v) => serializer.serialize_u16(*v),
			Self::I32(v) => serializer.serialize_i32(*v),
			Self::U32(v) => serializer.serialize_u32(*v),
			Self::I64(v) => serializer.serialize_i64(*v),
			Self::U64(v) => serializer.serialize_u64(*v),
			Self::F32(v) => serializer.serialize_f32(*v),
			Self::F64(v) => serializer.serialize_f64(*v),
			Self::String(v) => serializer.serialize_str(v),
		}
	}
}

impl Serialize for Value {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		match self {
			Self::Scalar(scalar) => scalar.serialize(serializer),
			Self::Map(fields) => {
				let mut map = serializer.serialize_map(Some(fields.len()))?;
				for field in fields {
					map.serialize_entry(field.name.as_ref(), &field.value)?;
				}
				map.end()
			}
			Self::List(array) => {
				let mut seq = serializer.serialize_seq(Some(array.items.len()))?;
				for item in &array.items {
					seq.serialize_element(item)?;
				}
				seq.end()
			}
			Self::Skipped(skipped) => {
				let mut map = serializer.serialize_map(Some(1))?;
				map.serialize_entry("skipped", &skipped.count)?;
				map.end()
			}
			Self::UnknownRef => serializer.serialize_str("unknown"),
			Self::NullRef => serializer.serialize_none(),
		}
	}
}
