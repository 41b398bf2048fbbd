use crate::unity::bytes::{Cursor, Endianness};
use crate::unity::{DumpError, Result};

/// Random-access reader over the raw bytes that hold object data.
///
/// Every read takes an absolute offset; the reader itself is stateless, so
/// the decode cursor is owned and threaded by the caller.
#[derive(Debug, Clone, Copy)]
pub struct ObjectReader<'a> {
	bytes: &'a [u8],
	endianness: Endianness,
}

macro_rules! read_at {
	($name:ident, $inner:ident, $ty:ty) => {
		#[doc = concat!("Read a `", stringify!($ty), "` at `at`.")]
		pub fn $name(&self, at: usize) -> Result<$ty> {
			self.cursor(at)?.$inner()
		}
	};
}

impl<'a> ObjectReader<'a> {
	/// Wrap raw bytes with the byte order used for typed reads.
	pub fn new(bytes: &'a [u8], endianness: Endianness) -> Self {
		Self { bytes, endianness }
	}

	/// Total addressable length.
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	/// Whether the reader has no bytes.
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	/// Byte order of typed reads.
	pub fn endianness(&self) -> Endianness {
		self.endianness
	}

	/// Borrow `len` raw bytes starting at `at`.
	pub fn read_bytes(&self, at: usize, len: usize) -> Result<&'a [u8]> {
		self.cursor(at)?.read_exact(len)
	}

	/// Read a 4-byte length prefix followed by that many bytes as lossy UTF-8.
	///
	/// Returns the text and the offset just past the string bytes (unaligned).
	pub fn read_string(&self, at: usize) -> Result<(Box<str>, usize)> {
		let mut cursor = self.cursor(at)?;
		let len = cursor.read_i32()?;
		let len = usize::try_from(len).map_err(|_| DumpError::InvalidArrayCount { at, count: len })?;
		let raw = cursor.read_exact(len)?;
		Ok((String::from_utf8_lossy(raw).into_owned().into_boxed_str(), cursor.pos()))
	}

	read_at!(read_u8, read_u8, u8);
	read_at!(read_i16, read_i16, i16);
	read_at!(read_u16, read_u16, u16);
	read_at!(read_i32, read_i32, i32);
	read_at!(read_u32, read_u32, u32);
	read_at!(read_i64, read_i64, i64);
	read_at!(read_u64, read_u64, u64);
	read_at!(read_f32, read_f32, f32);
	read_at!(read_f64, read_f64, f64);

	fn cursor(&self, at: usize) -> Result<Cursor<'a>> {
		if at > self.bytes.len() {
			return Err(DumpError::UnexpectedEof { at, need: 0, rem: 0 });
		}
		Ok(Cursor::at(self.bytes, at, self.endianness))
	}
}
