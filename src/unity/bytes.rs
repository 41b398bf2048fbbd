use crate::unity::{DumpError, Result};

/// Byte order of a serialized file's metadata and object data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
	/// Little-endian byte order (header flag `0`).
	Little,
	/// Big-endian byte order (header flag `1`).
	Big,
}

impl Endianness {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Little => "little",
			Self::Big => "big",
		}
	}
}

macro_rules! read_fixed {
	($name:ident, $ty:ty, $len:expr) => {
		#[doc = concat!("Read a `", stringify!($ty), "` in the cursor's byte order.")]
		pub fn $name(&mut self) -> Result<$ty> {
			let raw = self.read_exact($len)?;
			let mut buf = [0_u8; $len];
			buf.copy_from_slice(raw);
			Ok(match self.endianness {
				Endianness::Little => <$ty>::from_le_bytes(buf),
				Endianness::Big => <$ty>::from_be_bytes(buf),
			})
		}
	};
}

/// Bounded cursor over an immutable byte slice.
pub struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
	endianness: Endianness,
}

impl<'a> Cursor<'a> {
	/// Create a cursor at position 0.
	pub fn new(bytes: &'a [u8], endianness: Endianness) -> Self {
		Self { bytes, pos: 0, endianness }
	}

	/// Create a cursor at an absolute position.
	pub fn at(bytes: &'a [u8], pos: usize, endianness: Endianness) -> Self {
		Self { bytes, pos, endianness }
	}

	/// Return current byte offset.
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Return remaining unread bytes.
	pub fn remaining(&self) -> usize {
		self.bytes.len().saturating_sub(self.pos)
	}

	/// Read exactly `n` bytes and advance cursor.
	pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
		if n > self.remaining() {
			return Err(DumpError::UnexpectedEof {
				at: self.pos,
				need: n,
				rem: self.remaining(),
			});
		}

		let start = self.pos;
		self.pos += n;
		Ok(&self.bytes[start..self.pos])
	}

	/// Read a fixed-size byte array.
	pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
		let raw = self.read_exact(N)?;
		let mut out = [0_u8; N];
		out.copy_from_slice(raw);
		Ok(out)
	}

	/// Read one byte.
	pub fn read_u8(&mut self) -> Result<u8> {
		Ok(self.read_exact(1)?[0])
	}

	/// Read one byte as a boolean (nonzero = true).
	pub fn read_bool(&mut self) -> Result<bool> {
		Ok(self.read_u8()? != 0)
	}

	read_fixed!(read_i16, i16, 2);
	read_fixed!(read_u16, u16, 2);
	read_fixed!(read_i32, i32, 4);
	read_fixed!(read_u32, u32, 4);
	read_fixed!(read_i64, i64, 8);
	read_fixed!(read_u64, u64, 8);
	read_fixed!(read_f32, f32, 4);
	read_fixed!(read_f64, f64, 8);

	/// Advance to the next 4-byte aligned position.
	pub fn align4(&mut self) -> Result<()> {
		let skip = align4(self.pos) - self.pos;
		let _ = self.read_exact(skip)?;
		Ok(())
	}

	/// Read a zero-terminated byte string without the terminator.
	pub fn read_cstring_bytes(&mut self) -> Result<&'a [u8]> {
		let start = self.pos;
		let rem = self.bytes.get(self.pos..).unwrap_or(&[]);
		let Some(rel_end) = rem.iter().position(|byte| *byte == 0) else {
			return Err(DumpError::UnexpectedEof {
				at: self.pos,
				need: 1,
				rem: self.remaining(),
			});
		};

		let end = start + rel_end;
		self.pos = end + 1;
		Ok(&self.bytes[start..end])
	}

	/// Read a zero-terminated string, replacing invalid UTF-8.
	pub fn read_cstring(&mut self) -> Result<Box<str>> {
		let bytes = self.read_cstring_bytes()?;
		Ok(String::from_utf8_lossy(bytes).into_owned().into_boxed_str())
	}
}

/// Round `pos` up to the next multiple of 4.
pub fn align4(pos: usize) -> usize {
	(pos + 3) & !3
}
