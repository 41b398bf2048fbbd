use crate::unity::bytes::{Cursor, Endianness};
use crate::unity::{DumpError, ObjectReader, Result, Scalar, TypeTreeNode};

/// Closed set of fixed-width primitive kinds a leaf can decode as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
	/// `SInt8`.
	I8,
	/// `UInt8`.
	U8,
	/// `char`.
	Char,
	/// `bool`.
	Bool,
	/// `SInt16`, `short`.
	I16,
	/// `UInt16`, `unsigned short`.
	U16,
	/// `SInt32`, `int`.
	I32,
	/// `UInt32`, `unsigned int`.
	U32,
	/// `SInt64`, `long long`.
	I64,
	/// `UInt64`, `unsigned long long`, `FileSize`.
	U64,
	/// `float`.
	F32,
	/// `double`.
	F64,
}

impl ScalarKind {
	/// Resolve the kind from a declared type name.
	pub fn from_type_name(type_name: &str) -> Option<Self> {
		Some(match type_name {
			"SInt8" => Self::I8,
			"UInt8" => Self::U8,
			"char" => Self::Char,
			"bool" => Self::Bool,
			"SInt16" | "short" => Self::I16,
			"UInt16" | "unsigned short" => Self::U16,
			"SInt32" | "int" => Self::I32,
			"UInt32" | "unsigned int" => Self::U32,
			"SInt64" | "long long" => Self::I64,
			"UInt64" | "unsigned long long" | "FileSize" => Self::U64,
			"float" => Self::F32,
			"double" => Self::F64,
			_ => return None,
		})
	}

	/// Resolve the kind of a basic leaf, checking its declared size.
	pub fn for_node(node: &TypeTreeNode) -> Result<Self> {
		Self::from_type_name(&node.type_name)
			.filter(|kind| i32::try_from(kind.width()).is_ok_and(|width| width == node.byte_size))
			.ok_or_else(|| DumpError::UnresolvedScalarKind {
				type_name: node.type_name.to_string(),
				size: node.byte_size,
			})
	}

	/// Encoded width in bytes.
	pub fn width(self) -> usize {
		match self {
			Self::I8 | Self::U8 | Self::Char | Self::Bool => 1,
			Self::I16 | Self::U16 => 2,
			Self::I32 | Self::U32 | Self::F32 => 4,
			Self::I64 | Self::U64 | Self::F64 => 8,
		}
	}

	/// Decode one value at `at`.
	pub fn read(self, reader: &ObjectReader<'_>, at: usize) -> Result<Scalar> {
		let bytes = reader.read_bytes(at, self.width())?;
		self.decode(&mut Cursor::new(bytes, reader.endianness()))
	}

	/// Decode `count` consecutive values from one bulk slice.
	pub fn decode_bulk(self, bytes: &[u8], endianness: Endianness) -> Result<Vec<Scalar>> {
		let mut cursor = Cursor::new(bytes, endianness);
		let mut out = Vec::with_capacity(bytes.len() / self.width());
		while cursor.remaining() >= self.width() {
			out.push(self.decode(&mut cursor)?);
		}
		Ok(out)
	}

	fn decode(self, cursor: &mut Cursor<'_>) -> Result<Scalar> {
		Ok(match self {
			Self::I8 => Scalar::I8(cursor.read_u8()? as i8),
			Self::U8 => Scalar::U8(cursor.read_u8()?),
			Self::Char => Scalar::Char(cursor.read_u8()?),
			Self::Bool => Scalar::Bool(cursor.read_bool()?),
			Self::I16 => Scalar::I16(cursor.read_i16()?),
			Self::U16 => Scalar::U16(cursor.read_u16()?),
			Self::I32 => Scalar::I32(cursor.read_i32()?),
			Self::U32 => Scalar::U32(cursor.read_u32()?),
			Self::I64 => Scalar::I64(cursor.read_i64()?),
			Self::U64 => Scalar::U64(cursor.read_u64()?),
			Self::F32 => Scalar::F32(cursor.read_f32()?),
			Self::F64 => Scalar::F64(cursor.read_f64()?),
		})
	}
}
