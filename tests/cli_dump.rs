#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use ttdump_testkit::{ALIGN, ARRAY, CHILD_ALIGN, NodeSpec, SerializedFileBuilder, scalar_vector_nodes, string_nodes};

const PATTERN: [u8; 16] = *b"0123456789abcdef";

/// `vector` wrapper, its `Array` node and the size field; element nodes go at `level + 2`.
fn vector_head(level: u8, name: &str) -> Vec<NodeSpec> {
	vec![
		NodeSpec::new(level, "vector", name, -1).meta(CHILD_ALIGN),
		NodeSpec::new(level + 1, "Array", "Array", -1).flags(ARRAY).meta(ALIGN),
		NodeSpec::new(level + 2, "int", "size", 4),
	]
}

fn program_nodes(level: u8, name: &str) -> Vec<NodeSpec> {
	let mut nodes = vec![NodeSpec::new(level, "SerializedProgram", name, -1).meta(CHILD_ALIGN)];
	nodes.extend(vector_head(level + 1, "m_PlayerSubPrograms"));
	nodes.extend(vector_head(level + 3, "data"));
	nodes.push(NodeSpec::new(level + 5, "SerializedPlayerSubProgram", "data", -1).meta(CHILD_ALIGN));
	nodes.push(NodeSpec::new(level + 6, "UInt32", "m_BlobIndex", 4));
	nodes.extend(scalar_vector_nodes(level + 6, "m_KeywordIndices", "UInt16", 2));
	nodes
}

fn shader_nodes() -> Vec<NodeSpec> {
	let mut nodes = vec![
		NodeSpec::new(0, "Shader", "Base", -1).meta(CHILD_ALIGN),
		NodeSpec::new(1, "SerializedShader", "m_ParsedForm", -1).meta(CHILD_ALIGN),
		NodeSpec::new(2, "SerializedProperties", "m_PropInfo", -1).meta(CHILD_ALIGN),
	];
	nodes.extend(vector_head(3, "m_Props"));
	nodes.push(NodeSpec::new(5, "SerializedProperty", "data", -1).meta(CHILD_ALIGN));
	nodes.extend(string_nodes(6, "m_Name"));

	nodes.extend(vector_head(2, "m_SubShaders"));
	nodes.push(NodeSpec::new(4, "SerializedSubShader", "data", -1).meta(CHILD_ALIGN));
	nodes.extend(vector_head(5, "m_Passes"));
	nodes.push(NodeSpec::new(7, "SerializedPass", "data", -1).meta(CHILD_ALIGN));
	nodes.extend(program_nodes(8, "progVertex"));
	nodes.extend(program_nodes(8, "progFragment"));

	nodes.extend(vector_head(2, "m_KeywordNames"));
	nodes.extend(string_nodes(4, "data"));
	nodes.extend(string_nodes(2, "m_Name"));

	nodes.extend(vector_head(1, "decompressedLengths"));
	nodes.extend(scalar_vector_nodes(3, "data", "UInt32", 4));
	nodes.extend(scalar_vector_nodes(1, "compressedBlob", "UInt8", 1));
	nodes
}

fn sample_file(declared_length: u32, shader_ids: &[i64]) -> Vec<u8> {
	let mut builder = SerializedFileBuilder::new(22);
	let mut game_object = vec![NodeSpec::new(0, "GameObject", "Base", -1).meta(CHILD_ALIGN)];
	game_object.extend(string_nodes(1, "m_Name"));
	game_object.push(NodeSpec::new(1, "UInt16", "m_Layer", 2));
	let game_object = builder.add_type(1, game_object);
	let shader = builder.add_type(48, shader_nodes());
	builder.add_external([0; 16], 0, "Library/unity default resources");

	let mut payload = builder.payload_writer();
	payload.aligned_string("Cube").u16(8);
	builder.add_object(1, game_object, payload.into_bytes());

	for path_id in shader_ids {
		let payload = shader_payload(&builder, declared_length);
		builder.add_object(*path_id, shader, payload);
	}

	builder.build()
}

fn shader_payload(builder: &SerializedFileBuilder, declared_length: u32) -> Vec<u8> {
	let compressed = lz4_flex::block::compress(&PATTERN);
	let mut payload = builder.payload_writer();
	payload.i32(1).aligned_string("_Color");
	payload.i32(1).i32(1);
	payload.i32(1).i32(1).u32(7).i32(1).u16(0).align4();
	payload.i32(1).i32(1).u32(9).i32(2).u16(0).u16(1);
	payload.i32(2).aligned_string("FOO").aligned_string("BAR");
	payload.aligned_string("Custom/Test");
	payload.i32(1).i32(1).u32(declared_length);
	payload.i32(i32::try_from(compressed.len()).expect("small blob")).bytes(&compressed).align4();
	payload.into_bytes()
}

fn write_sample(dir: &Path, declared_length: u32) -> PathBuf {
	write_sample_with_shaders(dir, declared_length, &[5])
}

fn write_sample_with_shaders(dir: &Path, declared_length: u32, shader_ids: &[i64]) -> PathBuf {
	let path = dir.join("sample.assets");
	fs::write(&path, sample_file(declared_length, shader_ids)).expect("sample file is written");
	path
}

fn run_ttdump(args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_ttdump")).args(args).output().expect("ttdump executes")
}

fn run_ok(args: &[&str]) -> Output {
	let output = run_ttdump(args);
	assert!(
		output.status.success(),
		"ttdump failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	output
}

#[test]
fn dump_writes_text_and_shader_artifacts() {
	let input = tempfile::tempdir().expect("temp dir");
	let output = tempfile::tempdir().expect("temp dir");
	let path = write_sample(input.path(), 16);
	let path = path.to_string_lossy().into_owned();
	let out_dir = output.path().to_string_lossy().into_owned();

	run_ok(&["dump", &path, "-o", &out_dir]);

	let text = fs::read_to_string(output.path().join("sample.assets.txt")).expect("text dump exists");
	assert!(text.starts_with(
		"External References\npath(1): \"Library/unity default resources\" GUID: 00000000000000000000000000000000 Type: 0\n\n"
	));
	assert!(text.contains("ID: 1 (ClassID: 1) GameObject\n  m_Name (string) Cube\n  m_Layer (UInt16) 8\n"));
	assert!(text.contains("ID: 5 (ClassID: 48) Shader\n"));

	let report = fs::read_to_string(output.path().join("sample.assets.shader.txt")).expect("shader report exists");
	assert!(report.contains("VS\n  +7 FOO\nPS\n  +9 FOO BAR\n"), "report was {report}");
	let source = fs::read(output.path().join("sample.assets.shader_source.txt")).expect("shader source exists");
	assert_eq!(source, PATTERN);
}

#[test]
fn second_shader_artifacts_carry_the_path_id() {
	let dir = tempfile::tempdir().expect("temp dir");
	let path = write_sample_with_shaders(dir.path(), 16, &[5, 9]);
	let path = path.to_string_lossy().into_owned();

	run_ok(&["dump", &path]);

	assert!(dir.path().join("sample.assets.shader.txt").exists());
	assert_eq!(fs::read(dir.path().join("sample.assets.shader_source.txt")).expect("first source"), PATTERN);
	assert!(dir.path().join("sample.assets.9.shader.txt").exists());
	assert_eq!(fs::read(dir.path().join("sample.assets.9.shader_source.txt")).expect("second source"), PATTERN);
	assert!(!dir.path().join("sample.assets.5.shader.txt").exists());
}

#[test]
fn dump_json_contains_every_object() {
	let dir = tempfile::tempdir().expect("temp dir");
	let path = write_sample(dir.path(), 16);
	let path = path.to_string_lossy().into_owned();

	run_ok(&["dump", &path, "--json"]);

	let json: Value = serde_json::from_slice(&fs::read(dir.path().join("sample.assets.json")).expect("json dump exists")).expect("valid json");
	let objects = json["objects"].as_array().expect("objects array");
	assert_eq!(objects.len(), 2);
	assert_eq!(objects[0]["path_id"], 1);
	assert_eq!(objects[0]["value"]["m_Name"], "Cube");
	assert_eq!(objects[1]["class_id"], 48);
	assert_eq!(objects[1]["value"]["m_ParsedForm"]["m_Name"], "Custom/Test");
}

#[test]
fn shader_failure_only_warns() {
	let dir = tempfile::tempdir().expect("temp dir");
	let path = write_sample(dir.path(), 20);
	let path = path.to_string_lossy().into_owned();

	let output = run_ok(&["dump", &path]);

	assert!(dir.path().join("sample.assets.txt").exists());
	assert!(!dir.path().join("sample.assets.shader.txt").exists());
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("skipping shader extraction"), "stderr was {stderr}");
}

#[test]
fn info_json_reports_counts() {
	let dir = tempfile::tempdir().expect("temp dir");
	let path = write_sample(dir.path(), 16);
	let path = path.to_string_lossy().into_owned();

	let output = run_ok(&["info", &path, "--json"]);

	let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be valid json");
	assert_eq!(json["format_version"], 22);
	assert_eq!(json["endianness"], "little");
	assert_eq!(json["object_count"], 2);
	assert_eq!(json["type_count"], 2);
	assert_eq!(json["externals"][0]["path"], "Library/unity default resources");
	assert_eq!(json["classes"], serde_json::json!([{ "class_id": 1, "count": 1 }, { "class_id": 48, "count": 1 }]));
}

#[test]
fn types_prints_one_tree() {
	let dir = tempfile::tempdir().expect("temp dir");
	let path = write_sample(dir.path(), 16);
	let path = path.to_string_lossy().into_owned();

	let output = run_ok(&["types", &path, "--class-id", "1"]);

	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(stdout.starts_with("GameObject Base size=-1"), "stdout was {stdout}");
	assert!(stdout.contains("\n  UInt16 m_Layer size=2 flags=0x0 meta=0x0\n"));

	let output = run_ttdump(&["types", &path, "--class-id", "999"]);
	assert_eq!(output.status.code(), Some(1));
	assert!(String::from_utf8_lossy(&output.stderr).contains("error: no type with class id 999"));
}

#[test]
fn unreadable_input_exits_with_error() {
	let dir = tempfile::tempdir().expect("temp dir");
	let path = dir.path().join("broken.assets");
	fs::write(&path, [0_u8; 8]).expect("broken file is written");
	let path = path.to_string_lossy().into_owned();

	let output = run_ttdump(&["dump", &path]);

	assert_eq!(output.status.code(), Some(1));
	assert!(String::from_utf8_lossy(&output.stderr).starts_with("error: invalid serialized file header"));
}

#[test]
fn decode_failure_reports_the_object() {
	let mut builder = SerializedFileBuilder::new(22);
	let item = builder.add_type(21, vec![NodeSpec::new(0, "Material", "Base", -1), NodeSpec::new(1, "Matrix4x4f", "m_Matrix", 64)]);
	builder.add_object(42, item, vec![0; 64]);
	let dir = tempfile::tempdir().expect("temp dir");
	let path = dir.path().join("broken.assets");
	fs::write(&path, builder.build()).expect("file is written");
	let path = path.to_string_lossy().into_owned();

	let output = run_ttdump(&["dump", &path]);

	assert_eq!(output.status.code(), Some(1));
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("error: object 42 (class 21): no scalar decoder"), "stderr was {stderr}");
}
