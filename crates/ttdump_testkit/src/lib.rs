//! Shared test helpers: byte writers and synthetic serialized files.

use std::collections::HashMap;

/// Type flag marking an array node.
pub const ARRAY: u8 = 0x01;
/// Type flag marking a managed reference registry node.
pub const REGISTRY: u8 = 0x04;
/// Meta flag requesting 4-byte alignment after a node.
pub const ALIGN: u32 = 0x4000;
/// Meta flag set on nodes with an aligning descendant.
pub const CHILD_ALIGN: u32 = 0x8000;
/// Marker for type tree string offsets into the common string table.
pub const COMMON_FLAG: u32 = 0x8000_0000;

/// Growable byte buffer with endian-aware typed writes.
///
/// Alignment is relative to the start of the buffer.
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
	buf: Vec<u8>,
	big_endian: bool,
}

macro_rules! put {
	($name:ident, $ty:ty) => {
		#[doc = concat!("Append a `", stringify!($ty), "`.")]
		pub fn $name(&mut self, value: $ty) -> &mut Self {
			if self.big_endian {
				self.buf.extend_from_slice(&value.to_be_bytes());
			} else {
				self.buf.extend_from_slice(&value.to_le_bytes());
			}
			self
		}
	};
}

impl ByteWriter {
	/// Little-endian writer.
	pub fn little() -> Self {
		Self::default()
	}

	/// Big-endian writer.
	pub fn big() -> Self {
		Self {
			buf: Vec::new(),
			big_endian: true,
		}
	}

	/// Switch byte order for subsequent writes.
	pub fn set_big_endian(&mut self, big_endian: bool) -> &mut Self {
		self.big_endian = big_endian;
		self
	}

	put!(i8, i8);
	put!(u8, u8);
	put!(i16, i16);
	put!(u16, u16);
	put!(i32, i32);
	put!(u32, u32);
	put!(i64, i64);
	put!(u64, u64);
	put!(f32, f32);
	put!(f64, f64);

	/// Append a one-byte boolean.
	pub fn bool(&mut self, value: bool) -> &mut Self {
		self.u8(u8::from(value))
	}

	/// Append raw bytes.
	pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
		self.buf.extend_from_slice(bytes);
		self
	}

	/// Append a NUL-terminated string.
	pub fn cstring(&mut self, text: &str) -> &mut Self {
		self.buf.extend_from_slice(text.as_bytes());
		self.buf.push(0);
		self
	}

	/// Append a 4-byte length prefix and the string bytes, unaligned.
	pub fn string(&mut self, text: &str) -> &mut Self {
		let len = i32::try_from(text.len()).expect("string fits i32");
		self.i32(len).bytes(text.as_bytes())
	}

	/// Append a length-prefixed string and pad to 4 bytes.
	pub fn aligned_string(&mut self, text: &str) -> &mut Self {
		self.string(text).align4()
	}

	/// Pad with zeros to the next multiple of 4.
	pub fn align4(&mut self) -> &mut Self {
		self.pad_to(4)
	}

	/// Pad with zeros to the next multiple of `align`.
	pub fn pad_to(&mut self, align: usize) -> &mut Self {
		while self.buf.len() % align != 0 {
			self.buf.push(0);
		}
		self
	}

	/// Overwrite a big-endian `u32` at `at`.
	pub fn patch_u32_be(&mut self, at: usize, value: u32) -> &mut Self {
		self.buf[at..at + 4].copy_from_slice(&value.to_be_bytes());
		self
	}

	/// Overwrite a big-endian `u64` at `at`.
	pub fn patch_u64_be(&mut self, at: usize, value: u64) -> &mut Self {
		self.buf[at..at + 8].copy_from_slice(&value.to_be_bytes());
		self
	}

	/// Bytes written so far.
	pub fn len(&self) -> usize {
		self.buf.len()
	}

	/// Whether nothing has been written.
	pub fn is_empty(&self) -> bool {
		self.buf.is_empty()
	}

	/// Borrow the written bytes.
	pub fn as_slice(&self) -> &[u8] {
		&self.buf
	}

	/// Take the written bytes.
	pub fn into_bytes(self) -> Vec<u8> {
		self.buf
	}
}

/// One flat type tree node record, as stored in a type tree blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
	/// Nesting level, 0 for the root.
	pub level: u8,
	/// Declared type name.
	pub type_name: String,
	/// Field name.
	pub name: String,
	/// Declared byte size.
	pub byte_size: i32,
	/// Raw type flags.
	pub type_flags: u8,
	/// Raw meta flags.
	pub meta_flags: u32,
	/// Use this common string table offset for the type name instead of the local buffer.
	pub common_type_offset: Option<u32>,
}

impl NodeSpec {
	/// Node with no flags.
	pub fn new(level: u8, type_name: &str, name: &str, byte_size: i32) -> Self {
		Self {
			level,
			type_name: type_name.to_owned(),
			name: name.to_owned(),
			byte_size,
			type_flags: 0,
			meta_flags: 0,
			common_type_offset: None,
		}
	}

	/// Add type flags.
	pub fn flags(mut self, flags: u8) -> Self {
		self.type_flags |= flags;
		self
	}

	/// Add meta flags.
	pub fn meta(mut self, flags: u32) -> Self {
		self.meta_flags |= flags;
		self
	}

	/// Reference the type name through the common string table.
	pub fn common_type(mut self, offset: u32) -> Self {
		self.common_type_offset = Some(offset);
		self
	}
}

/// Nodes of a `string` field at `level`: `string { Array { int size; char data } }`.
pub fn string_nodes(level: u8, name: &str) -> Vec<NodeSpec> {
	vec![
		NodeSpec::new(level, "string", name, -1).meta(CHILD_ALIGN),
		NodeSpec::new(level + 1, "Array", "Array", -1).flags(ARRAY).meta(ALIGN),
		NodeSpec::new(level + 2, "int", "size", 4),
		NodeSpec::new(level + 2, "char", "data", 1),
	]
}

/// Nodes of a `vector` field at `level` whose element is a fixed-width scalar.
pub fn scalar_vector_nodes(level: u8, name: &str, elem_type: &str, elem_size: i32) -> Vec<NodeSpec> {
	vec![
		NodeSpec::new(level, "vector", name, -1).meta(CHILD_ALIGN),
		NodeSpec::new(level + 1, "Array", "Array", -1).flags(ARRAY).meta(ALIGN),
		NodeSpec::new(level + 2, "int", "size", 4),
		NodeSpec::new(level + 2, elem_type, "data", elem_size),
	]
}

/// Append a type tree blob for `nodes` (format version >= 12).
pub fn write_type_tree_blob(out: &mut ByteWriter, nodes: &[NodeSpec], format_version: u32) {
	let mut strings: Vec<u8> = Vec::new();
	let mut offsets: HashMap<String, u32> = HashMap::new();
	let mut intern = |text: &str| -> u32 {
		if let Some(offset) = offsets.get(text) {
			return *offset;
		}
		let offset = u32::try_from(strings.len()).expect("offset fits u32");
		strings.extend_from_slice(text.as_bytes());
		strings.push(0);
		offsets.insert(text.to_owned(), offset);
		offset
	};

	let mut records = Vec::with_capacity(nodes.len());
	for (index, node) in nodes.iter().enumerate() {
		let type_offset = match node.common_type_offset {
			Some(offset) => offset | COMMON_FLAG,
			None => intern(&node.type_name),
		};
		let name_offset = intern(&node.name);
		records.push((index, node, type_offset, name_offset));
	}

	out.i32(i32::try_from(nodes.len()).expect("node count fits i32"));
	out.i32(i32::try_from(strings.len()).expect("string size fits i32"));
	for (index, node, type_offset, name_offset) in records {
		out.u16(1)
			.u8(node.level)
			.u8(node.type_flags)
			.u32(type_offset)
			.u32(name_offset)
			.i32(node.byte_size)
			.i32(i32::try_from(index).expect("index fits i32"))
			.u32(node.meta_flags);
		if format_version >= 19 {
			out.u64(0);
		}
	}
	out.bytes(&strings);
}

/// One object type entry.
#[derive(Debug, Clone)]
pub struct TypeSpec {
	/// Engine class id.
	pub class_id: i32,
	/// Script type index (`-1` for none).
	pub script_type_index: i16,
	/// Flat type tree.
	pub nodes: Vec<NodeSpec>,
}

/// One reference type entry.
#[derive(Debug, Clone)]
pub struct RefTypeSpec {
	/// Class name.
	pub class_name: String,
	/// Namespace.
	pub namespace: String,
	/// Assembly name.
	pub assembly: String,
	/// Flat type tree.
	pub nodes: Vec<NodeSpec>,
}

/// One object entry with its payload.
#[derive(Debug, Clone)]
pub struct ObjectSpec {
	/// Path id.
	pub path_id: i64,
	/// Index into the type list.
	pub type_index: i32,
	/// Raw object payload.
	pub data: Vec<u8>,
}

/// One external reference entry.
#[derive(Debug, Clone)]
pub struct ExternalSpec {
	/// Raw GUID bytes.
	pub guid: [u8; 16],
	/// Reference kind.
	pub kind: i32,
	/// Referenced path.
	pub path: String,
}

/// Builder for uncompressed serialized files (format versions 17 through 22).
#[derive(Debug, Clone)]
pub struct SerializedFileBuilder {
	version: u32,
	big_endian: bool,
	unity_version: String,
	target_platform: i32,
	types: Vec<TypeSpec>,
	ref_types: Vec<RefTypeSpec>,
	objects: Vec<ObjectSpec>,
	externals: Vec<ExternalSpec>,
	user_information: String,
}

impl SerializedFileBuilder {
	/// Little-endian builder for format `version`.
	pub fn new(version: u32) -> Self {
		assert!((17..=22).contains(&version), "builder supports format versions 17..=22");
		Self {
			version,
			big_endian: false,
			unity_version: "2022.3.10f1".to_owned(),
			target_platform: 19,
			types: Vec::new(),
			ref_types: Vec::new(),
			objects: Vec::new(),
			externals: Vec::new(),
			user_information: String::new(),
		}
	}

	/// Write metadata and object payloads big-endian.
	pub fn big_endian(mut self) -> Self {
		self.big_endian = true;
		self
	}

	/// Set the engine version string.
	pub fn unity_version(mut self, version: &str) -> Self {
		self.unity_version = version.to_owned();
		self
	}

	/// Add an object type and return its index.
	pub fn add_type(&mut self, class_id: i32, nodes: Vec<NodeSpec>) -> i32 {
		self.types.push(TypeSpec {
			class_id,
			script_type_index: -1,
			nodes,
		});
		i32::try_from(self.types.len() - 1).expect("type index fits i32")
	}

	/// Add a reference type keyed by its identity.
	pub fn add_ref_type(&mut self, class_name: &str, namespace: &str, assembly: &str, nodes: Vec<NodeSpec>) {
		self.ref_types.push(RefTypeSpec {
			class_name: class_name.to_owned(),
			namespace: namespace.to_owned(),
			assembly: assembly.to_owned(),
			nodes,
		});
	}

	/// Add an object payload.
	pub fn add_object(&mut self, path_id: i64, type_index: i32, data: Vec<u8>) {
		self.objects.push(ObjectSpec { path_id, type_index, data });
	}

	/// Add an external reference.
	pub fn add_external(&mut self, guid: [u8; 16], kind: i32, path: &str) {
		self.externals.push(ExternalSpec {
			guid,
			kind,
			path: path.to_owned(),
		});
	}

	/// Set the trailing user information string.
	pub fn user_information(mut self, text: &str) -> Self {
		self.user_information = text.to_owned();
		self
	}

	/// Object payload writer using the file's byte order.
	pub fn payload_writer(&self) -> ByteWriter {
		if self.big_endian { ByteWriter::big() } else { ByteWriter::little() }
	}

	/// Serialize the file.
	pub fn build(&self) -> Vec<u8> {
		let version = self.version;
		let mut out = ByteWriter::big();

		out.u32(0).u32(0).u32(version).u32(0);
		out.u8(u8::from(self.big_endian)).bytes(&[0; 3]);
		if version >= 22 {
			out.u32(0).u64(0).u64(0).u64(0);
		}
		let metadata_start = out.len();

		out.set_big_endian(self.big_endian);
		out.cstring(&self.unity_version);
		out.i32(self.target_platform);
		out.bool(true);

		out.i32(len_i32(self.types.len()));
		for item in &self.types {
			out.i32(item.class_id).u8(0).i16(item.script_type_index);
			if item.class_id == 114 {
				out.bytes(&[0; 16]);
			}
			out.bytes(&[0; 16]);
			write_type_tree_blob(&mut out, &item.nodes, version);
			if version >= 21 {
				out.i32(0);
			}
		}

		let mut data = ByteWriter::default();
		let mut placements = Vec::with_capacity(self.objects.len());
		for object in &self.objects {
			data.pad_to(8);
			placements.push(data.len());
			data.bytes(&object.data);
		}

		out.i32(len_i32(self.objects.len()));
		for (object, start) in self.objects.iter().zip(&placements) {
			out.align4();
			out.i64(object.path_id);
			if version >= 22 {
				out.i64(i64::try_from(*start).expect("start fits i64"));
			} else {
				out.u32(u32::try_from(*start).expect("start fits u32"));
			}
			out.u32(u32::try_from(object.data.len()).expect("size fits u32"));
			out.i32(object.type_index);
		}

		out.i32(0);

		out.i32(len_i32(self.externals.len()));
		for external in &self.externals {
			out.cstring("").bytes(&external.guid).i32(external.kind).cstring(&external.path);
		}

		if version >= 20 {
			out.i32(len_i32(self.ref_types.len()));
			for item in &self.ref_types {
				out.i32(114).u8(0).i16(0);
				out.bytes(&[0; 16]).bytes(&[0; 16]);
				write_type_tree_blob(&mut out, &item.nodes, version);
				if version >= 21 {
					out.cstring(&item.class_name).cstring(&item.namespace).cstring(&item.assembly);
				}
			}
		}

		out.cstring(&self.user_information);
		let metadata_size = out.len() - metadata_start;

		out.pad_to(16);
		let data_offset = out.len();
		out.bytes(data.as_slice());
		let file_size = out.len();

		if version >= 22 {
			out.patch_u32_be(20, u32::try_from(metadata_size).expect("metadata fits u32"));
			out.patch_u64_be(24, file_size as u64);
			out.patch_u64_be(32, data_offset as u64);
		} else {
			out.patch_u32_be(0, u32::try_from(metadata_size).expect("metadata fits u32"));
			out.patch_u32_be(4, u32::try_from(file_size).expect("file fits u32"));
			out.patch_u32_be(12, u32::try_from(data_offset).expect("offset fits u32"));
		}
		out.into_bytes()
	}
}

fn len_i32(len: usize) -> i32 {
	i32::try_from(len).expect("count fits i32")
}
