use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::unity::bytes::{Cursor, align4};
use crate::unity::{
	DecodeOptions, DumpError, Field, ObjectReader, Result, SchemaOracle, SchemaTable, SerializedHeader, TypeIdentity, TypeTreeNode, Walker,
};

/// Class id of `MonoBehaviour`, whose types carry a script id.
const MONO_BEHAVIOUR_CLASS_ID: i32 = 114;

/// One entry of the type table (object types or reference types).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedType {
	/// Engine class id.
	pub class_id: i32,
	/// Whether the type was stripped at build time.
	pub stripped: bool,
	/// Index into the script type table, `-1` when none.
	pub script_type_index: i16,
	/// Script hash for script-backed types.
	pub script_id: Option<[u8; 16]>,
	/// Type hash (version >= 13).
	pub type_hash: Option<[u8; 16]>,
	/// Type indices this type depends on (version >= 21, object types only).
	pub dependencies: Vec<i32>,
	/// Runtime identity of a reference type (version >= 21).
	pub identity: Option<TypeIdentity>,
	tree: Option<usize>,
}

/// One object table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
	/// Object identifier within the file.
	pub path_id: i64,
	/// Absolute offset of the object payload.
	pub byte_start: u64,
	/// Payload size in bytes.
	pub byte_size: u32,
	/// Index into the type table.
	pub type_index: i32,
	/// Engine class id.
	pub class_id: i32,
}

/// Script type table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptReference {
	/// File index (0 for this file).
	pub file_index: i32,
	/// Path id of the script object.
	pub path_id: i64,
}

/// 16-byte asset GUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid(pub [u8; 16]);

impl fmt::Display for Guid {
	/// Each byte prints its low nibble first.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for byte in self.0 {
			write!(f, "{:x}{:x}", byte & 0x0F, byte >> 4)?;
		}
		Ok(())
	}
}

impl Serialize for Guid {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

/// Reference to another serialized file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalReference {
	/// Asset GUID.
	pub guid: Guid,
	/// Reference kind.
	pub kind: i32,
	/// Referenced path.
	pub path: Box<str>,
}

/// Parsed uncompressed serialized file.
///
/// Owns the file bytes; object payloads are decoded on demand through
/// [`SerializedFile::decode_object`].
#[derive(Debug)]
pub struct SerializedFile {
	/// Parsed header.
	pub header: SerializedHeader,
	/// Engine version string that wrote the file.
	pub unity_version: Box<str>,
	/// Build target platform id.
	pub target_platform: i32,
	/// Whether types carry type trees.
	pub type_tree_enabled: bool,
	/// Object type table.
	pub types: Vec<SerializedType>,
	/// Object table in file order.
	pub objects: Vec<ObjectInfo>,
	/// Script type table.
	pub scripts: Vec<ScriptReference>,
	/// External file references.
	pub externals: Vec<ExternalReference>,
	/// Managed reference type table.
	pub ref_types: Vec<SerializedType>,
	/// Trailing user information string.
	pub user_information: Box<str>,
	schemas: SchemaTable,
	bytes: Vec<u8>,
}

impl SerializedFile {
	/// Read and parse a serialized file from disk.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let bytes = fs::read(path)?;
		Self::parse(bytes)
	}

	/// Parse a serialized file from owned bytes.
	pub fn parse(bytes: Vec<u8>) -> Result<Self> {
		let header = SerializedHeader::parse(&bytes)?;
		let version = header.version;
		let mut cursor = Cursor::at(&bytes, header.header_size, header.endianness);
		let mut schemas = SchemaTable::new();

		let unity_version = if version >= 7 { cursor.read_cstring()? } else { Box::from("") };
		let target_platform = if version >= 8 { cursor.read_i32()? } else { 0 };
		let type_tree_enabled = if version >= 13 { cursor.read_bool()? } else { true };

		let type_count = read_count(&mut cursor)?;
		let mut types = Vec::with_capacity(type_count.min(4096));
		for _ in 0..type_count {
			types.push(read_type(&mut cursor, version, type_tree_enabled, false, &mut schemas)?);
		}

		let big_ids = (7..14).contains(&version) && cursor.read_i32()? != 0;

		let object_count = read_count(&mut cursor)?;
		let mut objects = Vec::with_capacity(object_count.min(65536));
		for _ in 0..object_count {
			let object = read_object(&mut cursor, &header, big_ids, &types)?;
			if let Some(handle) = type_for_object(&types, version, object.type_index).and_then(|item| item.tree) {
				schemas.bind_object(object.path_id, handle);
			}
			objects.push(object);
		}

		let mut scripts = Vec::new();
		if version >= 11 {
			let count = read_count(&mut cursor)?;
			scripts.reserve(count.min(4096));
			for _ in 0..count {
				let file_index = cursor.read_i32()?;
				let path_id = if version < 14 {
					i64::from(cursor.read_i32()?)
				} else {
					cursor.align4()?;
					cursor.read_i64()?
				};
				scripts.push(ScriptReference { file_index, path_id });
			}
		}

		let external_count = read_count(&mut cursor)?;
		let mut externals = Vec::with_capacity(external_count.min(4096));
		for _ in 0..external_count {
			if version >= 6 {
				let _empty = cursor.read_cstring_bytes()?;
			}
			let (guid, kind) = if version >= 5 {
				(Guid(cursor.read_array::<16>()?), cursor.read_i32()?)
			} else {
				(Guid([0; 16]), 0)
			};
			let path = cursor.read_cstring()?;
			externals.push(ExternalReference { guid, kind, path });
		}

		let mut ref_types = Vec::new();
		if version >= 20 {
			let count = read_count(&mut cursor)?;
			ref_types.reserve(count.min(4096));
			for _ in 0..count {
				let item = read_type(&mut cursor, version, type_tree_enabled, true, &mut schemas)?;
				if let (Some(identity), Some(handle)) = (&item.identity, item.tree) {
					schemas.bind_identity(identity.clone(), handle);
				}
				ref_types.push(item);
			}
		}

		let user_information = if version >= 5 { cursor.read_cstring()? } else { Box::from("") };

		debug!(
			version,
			unity_version = %unity_version,
			types = types.len(),
			objects = objects.len(),
			externals = externals.len(),
			ref_types = ref_types.len(),
			"parsed serialized file metadata"
		);

		Ok(Self {
			header,
			unity_version,
			target_platform,
			type_tree_enabled,
			types,
			objects,
			scripts,
			externals,
			ref_types,
			user_information,
			schemas,
			bytes,
		})
	}

	/// Reader over the whole file in the file's byte order.
	pub fn reader(&self) -> ObjectReader<'_> {
		ObjectReader::new(&self.bytes, self.header.endianness)
	}

	/// Schema table built from the type tables.
	pub fn schemas(&self) -> &SchemaTable {
		&self.schemas
	}

	/// Object table entry by path id.
	pub fn object(&self, path_id: i64) -> Option<&ObjectInfo> {
		self.objects.iter().find(|object| object.path_id == path_id)
	}

	/// Type tree of an object or reference type entry, if the file carries one.
	pub fn type_tree(&self, item: &SerializedType) -> Option<&TypeTreeNode> {
		item.tree.and_then(|handle| self.schemas.tree(handle))
	}

	/// Decode one object's payload into a root field labeled by its type name.
	pub fn decode_object(&self, object: &ObjectInfo, options: &DecodeOptions) -> Result<Field> {
		let root = self.schema_for_object(object.path_id)?;
		let start = usize::try_from(object.byte_start).map_err(|_| DumpError::ObjectOutOfRange { path_id: object.path_id })?;
		let size = object.byte_size as usize;
		if start.checked_add(size).is_none_or(|end| end > self.bytes.len()) {
			return Err(DumpError::ObjectOutOfRange { path_id: object.path_id });
		}

		let walker = Walker::new(self.reader(), self, options.clone());
		let (field, end) = walker.decode_root(root, start)?;
		let consumed = end - start;
		if align4(consumed) != align4(size) {
			warn!(
				path_id = object.path_id,
				class_id = object.class_id,
				consumed,
				declared = size,
				"object decode did not consume its declared size"
			);
		}
		debug!(path_id = object.path_id, class_id = object.class_id, consumed, "decoded object");
		Ok(field)
	}
}

impl SchemaOracle for SerializedFile {
	fn schema_for_object(&self, path_id: i64) -> Result<&TypeTreeNode> {
		self.schemas.schema_for_object(path_id)
	}

	fn schema_for_type(&self, identity: &TypeIdentity) -> Result<&TypeTreeNode> {
		self.schemas.schema_for_type(identity)
	}
}

fn read_count(cursor: &mut Cursor<'_>) -> Result<usize> {
	let at = cursor.pos();
	let count = cursor.read_i32()?;
	usize::try_from(count).map_err(|_| DumpError::InvalidArrayCount { at, count })
}

fn read_type(cursor: &mut Cursor<'_>, version: u32, type_tree_enabled: bool, is_ref: bool, schemas: &mut SchemaTable) -> Result<SerializedType> {
	let class_id = cursor.read_i32()?;
	let stripped = version >= 16 && cursor.read_u8()? != 0;
	let script_type_index = if version >= 17 { cursor.read_i16()? } else { -1 };

	let mut script_id = None;
	let mut type_hash = None;
	if version >= 13 {
		let has_script_id = (is_ref && script_type_index >= 0)
			|| (version < 16 && class_id < 0)
			|| (version >= 16 && class_id == MONO_BEHAVIOUR_CLASS_ID);
		if has_script_id {
			script_id = Some(cursor.read_array::<16>()?);
		}
		type_hash = Some(cursor.read_array::<16>()?);
	}

	let mut tree = None;
	let mut dependencies = Vec::new();
	let mut identity = None;
	if type_tree_enabled {
		if version < 10 || version == 11 {
			return Err(DumpError::UnsupportedFormatVersion { version });
		}
		tree = Some(schemas.insert_tree(TypeTreeNode::parse_blob(cursor, version)?));

		if version >= 21 {
			if is_ref {
				let class_name = cursor.read_cstring()?;
				let namespace = cursor.read_cstring()?;
				let assembly = cursor.read_cstring()?;
				identity = Some(TypeIdentity {
					class_name,
					namespace,
					assembly,
				});
			} else {
				let count = read_count(cursor)?;
				dependencies.reserve(count.min(4096));
				for _ in 0..count {
					dependencies.push(cursor.read_i32()?);
				}
			}
		}
	}

	Ok(SerializedType {
		class_id,
		stripped,
		script_type_index,
		script_id,
		type_hash,
		dependencies,
		identity,
		tree,
	})
}

fn read_object(cursor: &mut Cursor<'_>, header: &SerializedHeader, big_ids: bool, types: &[SerializedType]) -> Result<ObjectInfo> {
	let version = header.version;
	let path_id = if big_ids {
		cursor.read_i64()?
	} else if version < 14 {
		i64::from(cursor.read_i32()?)
	} else {
		cursor.align4()?;
		cursor.read_i64()?
	};

	let byte_start = if version >= 22 {
		let raw = cursor.read_i64()?;
		u64::try_from(raw).map_err(|_| DumpError::ObjectOutOfRange { path_id })?
	} else {
		u64::from(cursor.read_u32()?)
	};
	let byte_start = byte_start
		.checked_add(header.data_offset)
		.ok_or(DumpError::ObjectOutOfRange { path_id })?;
	let byte_size = cursor.read_u32()?;
	let type_index = cursor.read_i32()?;

	let class_id = if version < 16 {
		i32::from(cursor.read_u16()?)
	} else {
		let item = type_for_object(types, version, type_index).ok_or(DumpError::TypeTreeIndexOutOfRange {
			kind: "object type",
			idx: i64::from(type_index),
			max: types.len() as i64 - 1,
		})?;
		item.class_id
	};

	if version < 11 {
		let _destroyed = cursor.read_u16()?;
	}
	if (11..17).contains(&version) {
		let _script_type_index = cursor.read_i16()?;
	}
	if version == 15 || version == 16 {
		let _stripped = cursor.read_u8()?;
	}

	Ok(ObjectInfo {
		path_id,
		byte_start,
		byte_size,
		type_index,
		class_id,
	})
}

/// Type entry of an object: by index from version 16, by class id before.
fn type_for_object(types: &[SerializedType], version: u32, type_index: i32) -> Option<&SerializedType> {
	if version >= 16 {
		usize::try_from(type_index).ok().and_then(|index| types.get(index))
	} else {
		types.iter().find(|item| item.class_id == type_index)
	}
}
