use thiserror::Error;

use crate::unity::TypeIdentity;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, DumpError>;

/// Errors produced while reading serialized files and decoding objects.
#[derive(Debug, Error)]
pub enum DumpError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Not enough bytes remained for a requested read.
	#[error("unexpected eof at offset {at}, need {need} bytes, remaining {rem}")]
	UnexpectedEof {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// Malformed serialized file header.
	#[error("invalid serialized file header")]
	InvalidHeader,
	/// Serialized file format version outside the supported range.
	#[error("unsupported serialized file format version {version}")]
	UnsupportedFormatVersion {
		/// Parsed format version.
		version: u32,
	},
	/// Out-of-range index inside type metadata.
	#[error("type tree index out of range for {kind}: idx={idx}, max={max}")]
	TypeTreeIndexOutOfRange {
		/// Logical index kind being validated.
		kind: &'static str,
		/// Offending index value.
		idx: i64,
		/// Maximum valid index.
		max: i64,
	},
	/// Type tree blob could not be rebuilt into a node tree.
	#[error("invalid type tree: {reason}")]
	InvalidTypeTree {
		/// Human-readable description of the defect.
		reason: String,
	},
	/// Object payload range lies outside the file.
	#[error("object {path_id} data lies outside the file")]
	ObjectOutOfRange {
		/// Object path id.
		path_id: i64,
	},
	/// Decoding one object failed; wraps the cause with the object's identity.
	#[error("object {path_id} (class {class_id}): {source}")]
	Object {
		/// Object path id.
		path_id: i64,
		/// Engine class id of the object.
		class_id: i32,
		/// Underlying failure.
		#[source]
		source: Box<DumpError>,
	},
	/// No type in the type table has the requested class id.
	#[error("no type with class id {class_id}")]
	UnknownClassId {
		/// Requested class id.
		class_id: i32,
	},
	/// No schema is known for the requested object.
	#[error("no type tree for object {path_id}")]
	MissingObjectSchema {
		/// Object path id.
		path_id: i64,
	},
	/// Schema shape does not match what decoding requires.
	#[error("schema violation at {node}: {reason}")]
	SchemaViolation {
		/// Name of the offending schema node.
		node: String,
		/// What was expected.
		reason: &'static str,
	},
	/// Managed reference registry version is not 1 or 2.
	#[error("unsupported managed reference registry version {version}")]
	UnsupportedSchemaVersion {
		/// Version read from the stream.
		version: i64,
	},
	/// Basic leaf declares a type with no scalar decoder.
	#[error("no scalar decoder for type {type_name} (size {size})")]
	UnresolvedScalarKind {
		/// Declared type name.
		type_name: String,
		/// Declared byte size.
		size: i32,
	},
	/// Schema oracle has no type tree for a runtime type identity.
	#[error("no reference type tree for {identity}")]
	UnresolvedPayloadSchema {
		/// Identity read from the stream.
		identity: TypeIdentity,
	},
	/// Array count read from the stream is negative.
	#[error("invalid array count {count} at offset {at}")]
	InvalidArrayCount {
		/// Byte offset of the count field.
		at: usize,
		/// Parsed signed count.
		count: i32,
	},
	/// Decoder recursion depth exceeded configured limit.
	#[error("decode depth exceeded (max={max_depth})")]
	DecodeDepthExceeded {
		/// Configured depth ceiling.
		max_depth: u32,
	},
	/// Decompressed blob length differs from the declared length.
	#[error("decompressed size mismatch: declared={declared}, actual={actual}")]
	DecompressionSizeMismatch {
		/// Length declared by the object.
		declared: usize,
		/// Length the decompressor produced or required.
		actual: usize,
	},
	/// Declared decompressed length is above the extraction limit.
	#[error("declared decompressed length {declared} exceeds limit {limit}")]
	DecompressedTooLarge {
		/// Length declared by the object.
		declared: usize,
		/// Configured byte ceiling.
		limit: usize,
	},
	/// Compressed blob is not a valid LZ4 block.
	#[error("corrupt compressed blob: {reason}")]
	CorruptBlob {
		/// Decompressor diagnostic.
		reason: String,
	},
	/// Shader field is missing or has an unexpected shape.
	#[error("shader field {path}: {reason}")]
	ShaderField {
		/// Field path inside the decoded shader.
		path: String,
		/// What was expected.
		reason: &'static str,
	},
}

impl DumpError {
	/// Whether the error only invalidates shader extraction for one object.
	pub fn is_object_local(&self) -> bool {
		matches!(
			self,
			Self::DecompressionSizeMismatch { .. } | Self::DecompressedTooLarge { .. } | Self::CorruptBlob { .. } | Self::ShaderField { .. }
		)
	}

	/// Attach the identity of the object being decoded.
	pub fn in_object(self, path_id: i64, class_id: i32) -> Self {
		Self::Object {
			path_id,
			class_id,
			source: Box::new(self),
		}
	}

	pub(crate) fn schema(node: &str, reason: &'static str) -> Self {
		Self::SchemaViolation {
			node: node.to_owned(),
			reason,
		}
	}
}
