use std::io::Write;

use tracing::debug;

use crate::unity::{DecodeOptions, ExternalReference, Field, ObjectInfo, Result, SerializedFile, render_field};

/// Options for dumping a serialized file.
#[derive(Debug, Clone, Default)]
pub struct DumpOptions {
	/// Walker options applied to every object.
	pub decode: DecodeOptions,
}

/// One decoded object with its text rendering.
#[derive(Debug, Clone)]
pub struct ObjectDump {
	/// Object table entry.
	pub object: ObjectInfo,
	/// Decoded root record.
	pub root: Field,
	/// Rendered text, without the `ID:` prefix.
	pub text: String,
}

/// Decode and render one object; failures carry the object's path and class id.
pub fn dump_object(file: &SerializedFile, object: &ObjectInfo, options: &DumpOptions) -> Result<ObjectDump> {
	let root = file
		.decode_object(object, &options.decode)
		.map_err(|err| err.in_object(object.path_id, object.class_id))?;
	let text = render_field(&root);
	Ok(ObjectDump { object: *object, root, text })
}

/// Write the external reference header block, numbering paths from 1.
pub fn write_external_references<W: Write>(out: &mut W, externals: &[ExternalReference]) -> Result<()> {
	writeln!(out, "External References")?;
	for (index, external) in externals.iter().enumerate() {
		writeln!(
			out,
			"path({}): \"{}\" GUID: {} Type: {}",
			index + 1,
			external.path,
			external.guid,
			external.kind
		)?;
	}
	writeln!(out)?;
	Ok(())
}

/// Write the full text dump of `file`, calling `visit` after each object is written.
///
/// The first object that fails to decode aborts the dump; objects already
/// written stay in `out`.
pub fn write_dump<W, F>(file: &SerializedFile, out: &mut W, options: &DumpOptions, mut visit: F) -> Result<()>
where
	W: Write,
	F: FnMut(&ObjectDump) -> Result<()>,
{
	write_external_references(out, &file.externals)?;

	for object in &file.objects {
		debug!(path_id = object.path_id, class_id = object.class_id, "dumping object");
		let dump = dump_object(file, object, options)?;
		write!(out, "ID: {} (ClassID: {}) ", object.path_id, object.class_id)?;
		out.write_all(dump.text.as_bytes())?;
		writeln!(out)?;
		visit(&dump)?;
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use ttdump_testkit::{NodeSpec, SerializedFileBuilder, string_nodes};

	use super::{DumpOptions, write_dump};
	use crate::unity::{DumpError, SerializedFile};

	#[test]
	fn dump_lists_externals_then_objects() {
		let mut builder = SerializedFileBuilder::new(22);
		let mut nodes = vec![NodeSpec::new(0, "GameObject", "Base", -1).meta(ttdump_testkit::CHILD_ALIGN)];
		nodes.extend(string_nodes(1, "m_Name"));
		let item = builder.add_type(1, nodes);
		builder.add_external([0; 16], 0, "library/other.asset");
		let mut payload = builder.payload_writer();
		payload.aligned_string("Cube");
		builder.add_object(3, item, payload.into_bytes());
		let file = SerializedFile::parse(builder.build()).expect("file parses");

		let mut out = Vec::new();
		let mut visited = Vec::new();
		write_dump(&file, &mut out, &DumpOptions::default(), |dump| {
			visited.push(dump.object.path_id);
			Ok(())
		})
		.expect("dump succeeds");

		let text = String::from_utf8(out).expect("utf8 output");
		assert_eq!(
			text,
			"External References\n\
			 path(1): \"library/other.asset\" GUID: 00000000000000000000000000000000 Type: 0\n\
			 \n\
			 ID: 3 (ClassID: 1) GameObject\n  m_Name (string) Cube\n\n"
		);
		assert_eq!(visited, [3]);
	}

	#[test]
	fn decode_failure_names_the_object() {
		let mut builder = SerializedFileBuilder::new(22);
		let good = builder.add_type(1, vec![NodeSpec::new(0, "GameObject", "Base", -1), NodeSpec::new(1, "int", "m_Layer", 4)]);
		let bad = builder.add_type(
			21,
			vec![NodeSpec::new(0, "Material", "Base", -1), NodeSpec::new(1, "Matrix4x4f", "m_Matrix", 64)],
		);
		builder.add_object(1, good, vec![0; 4]);
		builder.add_object(42, bad, vec![0; 64]);
		let file = SerializedFile::parse(builder.build()).expect("file parses");

		let mut out = Vec::new();
		let err = write_dump(&file, &mut out, &DumpOptions::default(), |_| Ok(())).expect_err("object 42 has no scalar decoder");

		match &err {
			DumpError::Object { path_id, class_id, source } => {
				assert_eq!((*path_id, *class_id), (42, 21));
				assert!(matches!(**source, DumpError::UnresolvedScalarKind { .. }));
			}
			other => panic!("unexpected error: {other}"),
		}
		assert!(err.to_string().starts_with("object 42 (class 21): no scalar decoder for type Matrix4x4f"));
		let text = String::from_utf8(out).expect("utf8 output");
		assert!(text.contains("ID: 1 (ClassID: 1) GameObject\n"));
		assert!(!text.contains("ID: 42"));
	}
}
