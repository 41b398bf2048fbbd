use crate::unity::{ArrayValue, DumpError, Field, Scalar, SkippedArray, Value, decompress_blob, extract_shader};

const PATTERN: [u8; 16] = *b"0123456789abcdef";

fn map(fields: Vec<(&str, Value)>) -> Value {
	Value::Map(fields.into_iter().map(|(name, value)| Field::new(name, "", value)).collect())
}

fn list(items: Vec<Value>) -> Value {
	Value::List(ArrayValue {
		elem_name: "data".into(),
		elem_type: "".into(),
		bulk: false,
		items,
	})
}

fn text(value: &str) -> Value {
	Value::Scalar(Scalar::String(value.into()))
}

fn uint(value: u32) -> Value {
	Value::Scalar(Scalar::U32(value))
}

fn bytes(data: &[u8]) -> Value {
	list(data.iter().map(|byte| Value::Scalar(Scalar::U8(*byte))).collect())
}

fn variant(blob_index: u32, keywords: &[u16]) -> Value {
	map(vec![
		("m_BlobIndex", uint(blob_index)),
		("m_KeywordIndices", list(keywords.iter().map(|index| Value::Scalar(Scalar::U16(*index))).collect())),
	])
}

fn stage(variants: Vec<Value>) -> Value {
	map(vec![("m_PlayerSubPrograms", list(vec![list(variants)]))])
}

fn shader_root(keyword_index: u16, blob: Value, tail: Vec<(&str, Value)>) -> Field {
	let pass = map(vec![
		("progVertex", stage(vec![variant(7, &[keyword_index])])),
		("progFragment", stage(vec![variant(9, &[0, 1])])),
	]);
	let parsed = map(vec![
		(
			"m_PropInfo",
			map(vec![(
				"m_Props",
				list(vec![map(vec![("m_Name", text("_Color"))]), map(vec![("m_Name", text("_MainTex"))])]),
			)]),
		),
		("m_Name", text("Custom/Test")),
		("m_SubShaders", list(vec![map(vec![("m_Passes", list(vec![pass]))])])),
		("m_KeywordNames", list(vec![text("FOO"), text("BAR")])),
	]);

	let mut fields = vec![("m_ParsedForm", parsed), ("compressedBlob", blob)];
	fields.extend(tail);
	Field::new("Shader", "Shader", map(fields))
}

fn lengths(value: u32) -> Value {
	list(vec![list(vec![uint(value)])])
}

#[test]
fn shader_report_lists_variants_per_stage() {
	let compressed = lz4_flex::block::compress(&PATTERN);
	let root = shader_root(0, bytes(&compressed), vec![("decompressedLengths", lengths(16))]);

	let info = extract_shader(&root).expect("shader extracts");

	assert_eq!(info.blob, PATTERN);
	assert_eq!(info.props, ["_Color", "_MainTex"]);
	assert_eq!(
		info.to_string(),
		"Shader:\n  Custom/Test\nProps:\n  _Color\n  _MainTex\nKeywords:\n  FOO\n  BAR\n\n\
		 ====================================\n\n\
		 SubShaders\n#SubShader 0\n#Pass 0\nVS\n  +7 FOO\nPS\n  +9 FOO BAR\n\n\n"
	);
}

#[test]
fn first_chunk_is_sliced_by_offset_and_length() {
	let compressed = lz4_flex::block::compress(&PATTERN);
	let mut blob = vec![0xAB; 5];
	blob.extend_from_slice(&compressed);
	blob.extend_from_slice(&[0xCD; 7]);
	let chunk_len = u32::try_from(compressed.len()).expect("small blob");
	let root = shader_root(
		1,
		bytes(&blob),
		vec![
			("offsets", lengths(5)),
			("compressedLengths", lengths(chunk_len)),
			("decompressedLengths", lengths(16)),
		],
	);

	let info = extract_shader(&root).expect("shader extracts");

	assert_eq!(info.blob, PATTERN);
	let vertex = &info.sub_shaders[0].passes[0].vertex[0].variants[0];
	assert_eq!(vertex.to_string(), "+7 BAR");
}

#[test]
fn short_output_is_a_size_mismatch() {
	let compressed = lz4_flex::block::compress(&PATTERN);

	let err = decompress_blob(&compressed, 20).expect_err("only 16 bytes decompress");

	assert!(matches!(err, DumpError::DecompressionSizeMismatch { declared: 20, actual: 16 }));
	assert!(err.is_object_local());
}

#[test]
fn undersized_declared_length_is_a_size_mismatch() {
	let compressed = lz4_flex::block::compress(&PATTERN);

	let err = decompress_blob(&compressed, 8).expect_err("16 bytes do not fit in 8");

	assert!(matches!(err, DumpError::DecompressionSizeMismatch { declared: 8, .. }));
}

#[test]
fn truncated_block_is_object_local() {
	let err = decompress_blob(&[0x10], 16).expect_err("literal byte is missing");

	assert!(err.is_object_local());
}

#[test]
fn keyword_index_out_of_range_names_the_field() {
	let compressed = lz4_flex::block::compress(&PATTERN);
	let root = shader_root(5, bytes(&compressed), vec![("decompressedLengths", lengths(16))]);

	let err = extract_shader(&root).expect_err("keyword 5 does not exist");

	match err {
		DumpError::ShaderField { path, reason } => {
			assert!(path.ends_with("progVertex.m_PlayerSubPrograms[0][0].m_KeywordIndices[0]"), "path was {path}");
			assert_eq!(reason, "keyword index out of range");
		}
		other => panic!("unexpected error: {other}"),
	}
}

#[test]
fn skipped_blob_cannot_be_extracted() {
	let skipped = Value::Skipped(SkippedArray {
		elem_type: "UInt8".into(),
		count: 4096,
	});
	let root = shader_root(0, skipped, vec![("decompressedLengths", lengths(16))]);

	let err = extract_shader(&root).expect_err("blob was not decoded");

	assert!(matches!(err, DumpError::ShaderField { ref path, reason: "array was skipped" } if path == "compressedBlob"));
}

#[test]
fn missing_field_reports_its_path() {
	let root = Field::new("Shader", "Shader", map(vec![("m_ParsedForm", map(Vec::new()))]));

	let err = extract_shader(&root).expect_err("m_Name is missing");

	assert!(matches!(err, DumpError::ShaderField { ref path, reason: "missing field" } if path == "m_ParsedForm.m_Name"));
}
