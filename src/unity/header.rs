use crate::unity::bytes::{Cursor, Endianness};
use crate::unity::{DumpError, Result};

/// Parsed serialized file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializedHeader {
	/// Size of the metadata section in bytes.
	pub metadata_size: u64,
	/// Total file size recorded in the header.
	pub file_size: u64,
	/// Container format version.
	pub version: u32,
	/// Absolute offset of the object data section.
	pub data_offset: u64,
	/// Byte order of metadata and object data.
	pub endianness: Endianness,
	/// Total header size; metadata starts here.
	pub header_size: usize,
}

impl SerializedHeader {
	/// Oldest format version with an endianness byte in the header.
	pub const MIN_VERSION: u32 = 9;
	/// Newest format version this parser understands.
	pub const MAX_VERSION: u32 = 22;
	/// Header size before the 64-bit extension.
	pub const BASE_SIZE: usize = 20;
	/// Header size with the 64-bit extension (version >= 22).
	pub const EXTENDED_SIZE: usize = 48;

	/// Parse the big-endian header at the start of `bytes`.
	pub fn parse(bytes: &[u8]) -> Result<Self> {
		if bytes.len() < Self::BASE_SIZE {
			return Err(DumpError::InvalidHeader);
		}

		let mut cursor = Cursor::new(bytes, Endianness::Big);
		let mut metadata_size = u64::from(cursor.read_u32()?);
		let mut file_size = u64::from(cursor.read_u32()?);
		let version = cursor.read_u32()?;
		let mut data_offset = u64::from(cursor.read_u32()?);

		if !(Self::MIN_VERSION..=Self::MAX_VERSION).contains(&version) {
			return Err(DumpError::UnsupportedFormatVersion { version });
		}

		let endianness = match cursor.read_u8()? {
			0 => Endianness::Little,
			1 => Endianness::Big,
			_ => return Err(DumpError::InvalidHeader),
		};
		let _reserved = cursor.read_array::<3>()?;

		if version >= 22 {
			metadata_size = u64::from(cursor.read_u32()?);
			file_size = cursor.read_u64()?;
			data_offset = cursor.read_u64()?;
			let _unknown = cursor.read_u64()?;
		}

		let header_size = cursor.pos();
		if data_offset < header_size as u64 || data_offset > bytes.len() as u64 {
			return Err(DumpError::InvalidHeader);
		}

		Ok(Self {
			metadata_size,
			file_size,
			version,
			data_offset,
			endianness,
			header_size,
		})
	}
}

#[cfg(test)]
mod tests {
	use ttdump_testkit::ByteWriter;

	use super::SerializedHeader;
	use crate::unity::DumpError;
	use crate::unity::bytes::Endianness;

	#[test]
	fn version_22_reads_the_extended_fields() {
		let mut out = ByteWriter::big();
		out.u32(0).u32(0).u32(22).u32(0).u8(0).bytes(&[0; 3]);
		out.u32(100).u64(300).u64(160).u64(0);
		out.bytes(&[0; 300 - 48]);

		let header = SerializedHeader::parse(out.as_slice()).expect("header parses");

		assert_eq!(header.version, 22);
		assert_eq!(header.metadata_size, 100);
		assert_eq!(header.file_size, 300);
		assert_eq!(header.data_offset, 160);
		assert_eq!(header.header_size, SerializedHeader::EXTENDED_SIZE);
		assert_eq!(header.endianness, Endianness::Little);
	}

	#[test]
	fn version_17_uses_the_base_layout() {
		let mut out = ByteWriter::big();
		out.u32(40).u32(64).u32(17).u32(64).u8(1).bytes(&[0; 3]);
		out.bytes(&[0; 44]);

		let header = SerializedHeader::parse(out.as_slice()).expect("header parses");

		assert_eq!(header.header_size, SerializedHeader::BASE_SIZE);
		assert_eq!(header.data_offset, 64);
		assert_eq!(header.endianness, Endianness::Big);
	}

	#[test]
	fn old_versions_are_rejected() {
		let mut out = ByteWriter::big();
		out.u32(0).u32(0).u32(8).u32(0).bytes(&[0; 8]);

		let err = SerializedHeader::parse(out.as_slice()).expect_err("version 8");

		assert!(matches!(err, DumpError::UnsupportedFormatVersion { version: 8 }));
	}

	#[test]
	fn short_input_is_invalid() {
		let err = SerializedHeader::parse(&[0; 12]).expect_err("too short");

		assert!(matches!(err, DumpError::InvalidHeader));
	}
}
