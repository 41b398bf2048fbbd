use crate::unity::{ArrayValue, Field, Scalar, SkippedArray, Value, render_field, write_field};

fn scalar(name: &str, type_name: &str, value: Scalar) -> Field {
	Field::new(name, type_name, Value::Scalar(value))
}

fn list(elem_name: &str, elem_type: &str, bulk: bool, items: Vec<Value>) -> Value {
	Value::List(ArrayValue {
		elem_name: elem_name.into(),
		elem_type: elem_type.into(),
		bulk,
		items,
	})
}

#[test]
fn nested_fields_render_two_spaces_per_level() {
	let root = Field::new(
		"MonoBehaviour",
		"MonoBehaviour",
		Value::Map(vec![
			scalar("m_Enabled", "UInt8", Scalar::U8(1)),
			scalar("m_Name", "string", Scalar::String("cube".into())),
			Field::new(
				"m_Pos",
				"Vector3f",
				Value::Map(vec![scalar("x", "float", Scalar::F32(1.0)), scalar("y", "float", Scalar::F32(2.5))]),
			),
		]),
	);

	let text = render_field(&root);

	assert_eq!(
		text,
		"MonoBehaviour\n  m_Enabled (UInt8) 1\n  m_Name (string) cube\n  m_Pos (Vector3f)\n    x (float) 1\n    y (float) 2.5\n"
	);
}

#[test]
fn arrays_render_header_then_elements() {
	let root = Field::new(
		"Mesh",
		"Mesh",
		Value::Map(vec![
			Field::new(
				"m_Data",
				"vector",
				list(
					"data",
					"UInt8",
					true,
					vec![Value::Scalar(Scalar::U8(1)), Value::Scalar(Scalar::U8(2)), Value::Scalar(Scalar::U8(3))],
				),
			),
			Field::new(
				"m_Items",
				"vector",
				list("data", "Item", false, vec![Value::Map(vec![scalar("id", "int", Scalar::I32(7))])]),
			),
			Field::new("m_Empty", "vector", list("data", "UInt8", true, Vec::new())),
			Field::new(
				"m_Big",
				"vector",
				Value::Skipped(SkippedArray {
					elem_type: "float".into(),
					count: 300,
				}),
			),
			Field::new("Array", "Array", list("data", "int", true, vec![Value::Scalar(Scalar::I32(4))])),
		]),
	);

	let text = render_field(&root);

	let expected = [
		"Mesh",
		"  m_Data (vector)",
		"    Array<UInt8>[3]",
		"      1, 2, 3",
		"  m_Items (vector)",
		"    Array<Item>[1]",
		"      data[0] (Item)",
		"        id (int) 7",
		"  m_Empty (vector)",
		"    Array<UInt8>[0]",
		"  m_Big (vector)",
		"    Array<float>[300]",
		"      <Skipped>",
		"  Array<int>[1]",
		"    4",
	];
	assert_eq!(text.lines().collect::<Vec<_>>(), expected);
}

#[test]
fn nested_lists_indent_each_array_level() {
	let inner = list("data", "int", true, vec![Value::Scalar(Scalar::I32(5))]);
	let root = Field::new(
		"Shader",
		"Shader",
		Value::Map(vec![Field::new("m_Programs", "vector", list("data", "vector", false, vec![inner]))]),
	);

	let text = render_field(&root);

	let expected = [
		"Shader",
		"  m_Programs (vector)",
		"    Array<vector>[1]",
		"      data[0] (vector)",
		"        Array<int>[1]",
		"          5",
	];
	assert_eq!(text.lines().collect::<Vec<_>>(), expected);
}

#[test]
fn registry_records_render_sentinel_markers() {
	let identity = Value::Map(vec![
		scalar("class", "string", Scalar::String("".into())),
		scalar("ns", "string", Scalar::String("".into())),
		scalar("asm", "string", Scalar::String("".into())),
	]);
	let record = |rid: i64, data: Value| {
		Field::new(
			&format!("rid({rid})"),
			"ReferencedObject",
			Value::Map(vec![
				Field::new("type", "ReferencedManagedType", identity.clone()),
				Field::new("data", "ReferencedObjectData", data),
			]),
		)
	};
	let root = Field::new(
		"Holder",
		"Holder",
		Value::Map(vec![Field::new(
			"references",
			"ManagedReferencesRegistry",
			Value::Map(vec![scalar("version", "int", Scalar::I32(2)), record(-1, Value::UnknownRef), record(-2, Value::NullRef)]),
		)]),
	);

	let text = render_field(&root);

	let expected = [
		"Holder",
		"  references (ManagedReferencesRegistry)",
		"    version (int) 2",
		"    rid(-1) ReferencedObject",
		"      type (ReferencedManagedType)",
		"        class (string) ",
		"        ns (string) ",
		"        asm (string) ",
		"      data ReferencedObjectData",
		"        unknown",
		"    rid(-2) ReferencedObject",
		"      type (ReferencedManagedType)",
		"        class (string) ",
		"        ns (string) ",
		"        asm (string) ",
		"      data ReferencedObjectData",
		"        null",
	];
	assert_eq!(text.lines().collect::<Vec<_>>(), expected);
}

#[test]
fn write_field_streams_into_any_writer() {
	let root = Field::new("Texture2D", "Texture2D", Value::Map(vec![scalar("m_Width", "int", Scalar::I32(64))]));
	let mut out = Vec::new();

	write_field(&mut out, &root).expect("vec writer");

	assert_eq!(out, b"Texture2D\n  m_Width (int) 64\n");
}
