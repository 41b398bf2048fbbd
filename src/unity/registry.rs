use tracing::debug;

use crate::unity::bytes::align4;
use crate::unity::value::insert_field;
use crate::unity::{DumpError, Field, ObjectReader, Result, Scalar, TypeIdentity, TypeTreeNode, Value, Walker};

/// Record id marking a reference whose target type is unknown.
pub const UNKNOWN_RID: i64 = -1;
/// Record id marking a null reference.
pub const NULL_RID: i64 = -2;

const TERMINUS_CLASS: &str = "Terminus";
const TERMINUS_NAMESPACE: &str = "UnityEngine.DMAT";
const TERMINUS_ASSEMBLY: &str = "FAKE_ASM";

/// Payload of one managed reference.
#[derive(Debug, Clone, PartialEq)]
pub enum RefPayload {
	/// Sentinel id `-1`.
	Unknown,
	/// Sentinel id `-2`.
	Null,
	/// Fields decoded with the payload type's own type tree.
	Data(Vec<Field>),
}

/// One entry of a managed reference registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencedRecord {
	/// Record id; the implicit index for version 1 registries.
	pub rid: i64,
	/// Runtime type identity read from the stream.
	pub identity: TypeIdentity,
	/// Decoded payload or sentinel marker.
	pub payload: RefPayload,
}

/// Decoded managed reference registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
	/// Registry format version (1 or 2).
	pub version: i64,
	/// The decoded version field.
	pub version_field: Field,
	/// Records in stream order.
	pub records: Vec<ReferencedRecord>,
	labels: RecordLabels,
}

impl Registry {
	/// Fold the registry into a map: the version field, then one `rid(<id>)` entry per record.
	pub fn into_value(self) -> Value {
		let mut fields = Vec::with_capacity(self.records.len() + 1);
		fields.push(self.version_field);
		for record in self.records {
			insert_field(&mut fields, self.labels.fold(record));
		}
		Value::Map(fields)
	}
}

#[derive(Debug, Clone, PartialEq)]
struct Label {
	name: Box<str>,
	type_name: Box<str>,
}

impl Label {
	fn of(node: &TypeTreeNode) -> Self {
		Self {
			name: node.name.clone(),
			type_name: node.type_name.clone(),
		}
	}

	fn field(&self, value: Value) -> Field {
		Field::new(&self.name, &self.type_name, value)
	}
}

/// Schema labels shared by every record of one registry.
#[derive(Debug, Clone, PartialEq)]
struct RecordLabels {
	record_type: Box<str>,
	type_field: Label,
	identity: [Label; 3],
	data_field: Label,
}

impl RecordLabels {
	/// Read labels from a `ReferencedObject` node whose type and data children start at `first`.
	fn from_object_node(object: &TypeTreeNode, first: usize) -> Result<Self> {
		let (Some(type_node), Some(data_node)) = (object.children.get(first), object.children.get(first + 1)) else {
			return Err(DumpError::schema(&object.name, "referenced object needs type and data children"));
		};
		let [class, namespace, assembly, ..] = type_node.children.as_slice() else {
			return Err(DumpError::schema(&type_node.name, "referenced type needs class, namespace and assembly"));
		};

		Ok(Self {
			record_type: object.type_name.clone(),
			type_field: Label::of(type_node),
			identity: [Label::of(class), Label::of(namespace), Label::of(assembly)],
			data_field: Label::of(data_node),
		})
	}

	fn fold(&self, record: ReferencedRecord) -> Field {
		let ReferencedRecord { rid, identity, payload } = record;
		let [class, namespace, assembly] = &self.identity;
		let type_value = Value::Map(vec![
			class.field(Value::Scalar(Scalar::String(identity.class_name))),
			namespace.field(Value::Scalar(Scalar::String(identity.namespace))),
			assembly.field(Value::Scalar(Scalar::String(identity.assembly))),
		]);
		let data_value = match payload {
			RefPayload::Unknown => Value::UnknownRef,
			RefPayload::Null => Value::NullRef,
			RefPayload::Data(fields) => Value::Map(fields),
		};

		Field::new(
			&format!("rid({rid})"),
			&self.record_type,
			Value::Map(vec![self.type_field.field(type_value), self.data_field.field(data_value)]),
		)
	}
}

/// Whether `identity` is the end-of-registry marker of version 1 registries.
///
/// A real payload type with this identity would end the registry early.
pub fn is_terminator(identity: &TypeIdentity) -> bool {
	identity.class_name.as_ref() == TERMINUS_CLASS
		&& identity.namespace.as_ref() == TERMINUS_NAMESPACE
		&& identity.assembly.as_ref() == TERMINUS_ASSEMBLY
}

/// Decode a managed reference registry node starting at `at`.
pub fn decode_registry(walker: &Walker<'_>, node: &TypeTreeNode, at: usize) -> Result<(Registry, usize)> {
	decode_registry_at(walker, node, at, 0)
}

pub(crate) fn decode_registry_at(walker: &Walker<'_>, node: &TypeTreeNode, at: usize, depth: u32) -> Result<(Registry, usize)> {
	let [version_node, body, ..] = node.children.as_slice() else {
		return Err(DumpError::schema(&node.name, "registry needs a version field and a body"));
	};

	let (version_value, mut pos) = walker.decode_node(version_node, at, depth + 1)?;
	let version = version_value
		.as_scalar()
		.and_then(Scalar::as_i64)
		.ok_or_else(|| DumpError::schema(&version_node.name, "registry version must be an integer"))?;
	let version_field = Field::new(&version_node.name, &version_node.type_name, version_value);

	let reader = walker.reader();
	let mut records = Vec::new();
	let labels = match version {
		1 => {
			let labels = RecordLabels::from_object_node(body, 0)?;
			let mut index = 0_i64;
			loop {
				let (identity, next) = read_identity(reader, pos)?;
				pos = next;
				if is_terminator(&identity) {
					break;
				}

				let (payload, next) = decode_payload(walker, index, &identity, pos, depth)?;
				pos = next;
				records.push(ReferencedRecord {
					rid: index,
					identity,
					payload,
				});
				index += 1;
			}
			labels
		}
		2 => {
			if body.name.as_ref() != "RefIds" {
				return Err(DumpError::schema(&body.name, "version 2 registry body must be RefIds"));
			}
			let Some(array) = body.children.first().filter(|item| item.is_array() && item.children.len() == 2) else {
				return Err(DumpError::schema(&body.name, "RefIds must wrap a two-child array"));
			};
			let labels = RecordLabels::from_object_node(&array.children[1], 1)?;

			let raw = reader.read_i32(pos)?;
			let count = usize::try_from(raw).map_err(|_| DumpError::InvalidArrayCount { at: pos, count: raw })?;
			pos += 4;

			records.reserve(count.min(4096));
			for _ in 0..count {
				let rid = reader.read_i64(pos)?;
				pos += 8;
				let (identity, next) = read_identity(reader, pos)?;
				pos = next;
				let (payload, next) = decode_payload(walker, rid, &identity, pos, depth)?;
				pos = next;
				records.push(ReferencedRecord { rid, identity, payload });
			}
			labels
		}
		other => return Err(DumpError::UnsupportedSchemaVersion { version: other }),
	};

	Ok((
		Registry {
			version,
			version_field,
			records,
			labels,
		},
		pos,
	))
}

/// Read class, namespace and assembly strings, aligning after each one.
fn read_identity(reader: &ObjectReader<'_>, at: usize) -> Result<(TypeIdentity, usize)> {
	let (class_name, end) = reader.read_string(at)?;
	let (namespace, end) = reader.read_string(align4(end))?;
	let (assembly, end) = reader.read_string(align4(end))?;
	Ok((
		TypeIdentity {
			class_name,
			namespace,
			assembly,
		},
		align4(end),
	))
}

fn decode_payload(walker: &Walker<'_>, rid: i64, identity: &TypeIdentity, at: usize, depth: u32) -> Result<(RefPayload, usize)> {
	match rid {
		UNKNOWN_RID => return Ok((RefPayload::Unknown, at)),
		NULL_RID => return Ok((RefPayload::Null, at)),
		_ => {}
	}

	debug!(rid, %identity, offset = at, "decoding managed reference");
	let root = walker.oracle().schema_for_type(identity)?;
	let mut fields = Vec::with_capacity(root.children.len());
	let mut pos = at;
	for child in &root.children {
		let (value, next) = walker.decode_node(child, pos, depth + 1)?;
		insert_field(&mut fields, Field::new(&child.name, &child.type_name, value));
		pos = next;
	}
	Ok((RefPayload::Data(fields), pos))
}
