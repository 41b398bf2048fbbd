mod bytes;
mod common_strings;
mod decode;
mod dump;
mod emit;
mod error;
mod file;
mod header;
mod oracle;
mod reader;
mod registry;
mod scalar;
mod shader;
mod typetree;
mod value;

/// Bounded byte cursor and byte order.
pub use bytes::{Cursor, Endianness};
/// Built-in type tree string table.
pub use common_strings::{COMMON_STRING_FLAG, COMMON_STRINGS, common_string, common_string_offset};
/// Type tree walker and its options.
pub use decode::{DecodeOptions, Walker};
/// Whole-file dump pipeline.
pub use dump::{DumpOptions, ObjectDump, dump_object, write_dump, write_external_references};
/// Indented text rendering of decoded values.
pub use emit::{render_field, write_field};
/// Error and result aliases.
pub use error::{DumpError, Result};
/// Serialized file container types.
pub use file::{ExternalReference, Guid, ObjectInfo, ScriptReference, SerializedFile, SerializedType};
/// Serialized file header.
pub use header::SerializedHeader;
/// Schema lookup seam and its in-memory implementation.
pub use oracle::{SchemaOracle, SchemaTable, TypeIdentity};
/// Random-access primitive reader.
pub use reader::ObjectReader;
/// Managed reference registry decoding.
pub use registry::{NULL_RID, RefPayload, ReferencedRecord, Registry, UNKNOWN_RID, decode_registry, is_terminator};
/// Fixed-width scalar kinds.
pub use scalar::ScalarKind;
/// Shader metadata extraction and blob decompression.
pub use shader::{PassInfo, ProgramInfo, SHADER_CLASS_ID, ShaderInfo, SubShaderInfo, VariantInfo, decompress_blob, extract_shader};
/// Type tree schema nodes and flag constants.
pub use typetree::{META_ALIGN_BYTES, META_ANY_CHILD_USES_ALIGN_BYTES, TYPE_FLAG_ARRAY, TYPE_FLAG_MANAGED_REFERENCE_REGISTRY, TypeTreeNode};
/// Decoded value tree.
pub use value::{ArrayValue, Field, Scalar, SkippedArray, Value};
