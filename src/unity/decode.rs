use crate::unity::bytes::align4;
use crate::unity::registry::decode_registry_at;
use crate::unity::scalar::ScalarKind;
use crate::unity::value::insert_field;
use crate::unity::{ArrayValue, DumpError, Field, ObjectReader, Result, Scalar, SchemaOracle, SkippedArray, TypeTreeNode, Value};

/// Runtime limits and behavior switches for type tree decoding.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
	/// Step over large scalar arrays instead of materializing them.
	pub skip_large_arrays: bool,
	/// Element count above which a scalar array counts as large.
	pub large_array_threshold: usize,
	/// Maximum recursive node nesting depth.
	pub max_depth: u32,
}

impl Default for DecodeOptions {
	fn default() -> Self {
		Self {
			skip_large_arrays: false,
			large_array_threshold: 256,
			max_depth: 64,
		}
	}
}

/// Recursive type tree decoder over one reader.
///
/// The walker never holds a position: every call takes the offset to start
/// at and returns the offset just past the node, including its trailing
/// alignment padding.
pub struct Walker<'a> {
	reader: ObjectReader<'a>,
	oracle: &'a dyn SchemaOracle,
	options: DecodeOptions,
}

impl<'a> Walker<'a> {
	/// Create a walker reading from `reader` and resolving payload types through `oracle`.
	pub fn new(reader: ObjectReader<'a>, oracle: &'a dyn SchemaOracle, options: DecodeOptions) -> Self {
		Self { reader, oracle, options }
	}

	/// Underlying reader.
	pub fn reader(&self) -> &ObjectReader<'a> {
		&self.reader
	}

	/// Schema oracle used for managed reference payloads.
	pub fn oracle(&self) -> &'a dyn SchemaOracle {
		self.oracle
	}

	/// Decode a top-level record, labeled by its declared type name.
	pub fn decode_root(&self, root: &TypeTreeNode, at: usize) -> Result<(Field, usize)> {
		let (value, end) = self.decode_node(root, at, 0)?;
		Ok((Field::new(&root.type_name, &root.type_name, value), end))
	}

	/// Decode one node starting at `at`.
	pub fn decode(&self, node: &TypeTreeNode, at: usize) -> Result<(Value, usize)> {
		self.decode_node(node, at, 0)
	}

	pub(crate) fn decode_node(&self, node: &TypeTreeNode, at: usize, depth: u32) -> Result<(Value, usize)> {
		if depth > self.options.max_depth {
			return Err(DumpError::DecodeDepthExceeded {
				max_depth: self.options.max_depth,
			});
		}

		let (value, end) = if node.is_array() {
			self.decode_array(node, at, depth)?
		} else if node.is_basic_scalar() {
			let kind = ScalarKind::for_node(node)?;
			(Value::Scalar(kind.read(&self.reader, at)?), at + kind.width())
		} else if node.is_string() {
			let (text, end) = self.reader.read_string(at)?;
			(Value::Scalar(Scalar::String(text)), end)
		} else if node.is_managed_reference_registry() {
			let (registry, end) = decode_registry_at(self, node, at, depth)?;
			(registry.into_value(), end)
		} else {
			self.decode_composite(node, at, depth)?
		};

		let end = if node.aligns_after() { align4(end) } else { end };
		Ok((value, end))
	}

	fn decode_composite(&self, node: &TypeTreeNode, at: usize, depth: u32) -> Result<(Value, usize)> {
		// vector/map/staticvector wrappers take the array's list as their own value
		if let [only] = node.children.as_slice() {
			if only.is_array() {
				return self.decode_node(only, at, depth + 1);
			}
		}

		let mut fields = Vec::with_capacity(node.children.len());
		let mut pos = at;
		for child in &node.children {
			let (value, next) = self.decode_node(child, pos, depth + 1)?;
			insert_field(&mut fields, Field::new(&child.name, &child.type_name, value));
			pos = next;
		}
		Ok((Value::Map(fields), pos))
	}

	fn decode_array(&self, node: &TypeTreeNode, at: usize, depth: u32) -> Result<(Value, usize)> {
		let [size_node, elem] = node.children.as_slice() else {
			return Err(DumpError::schema(&node.name, "array must have a size and a data child"));
		};
		if size_node.byte_size != 4 || !size_node.is_leaf() {
			return Err(DumpError::schema(&node.name, "array size field must be a 4-byte leaf"));
		}

		let raw = self.reader.read_i32(at)?;
		let count = usize::try_from(raw).map_err(|_| DumpError::InvalidArrayCount { at, count: raw })?;
		let mut pos = at + 4;

		if elem.is_basic_scalar() {
			if count == 0 {
				return Ok((Value::List(array_value(elem, true, Vec::new())), pos));
			}

			let kind = ScalarKind::for_node(elem)?;
			let span = count.checked_mul(kind.width()).ok_or(DumpError::InvalidArrayCount { at, count: raw })?;
			if self.options.skip_large_arrays && count > self.options.large_array_threshold {
				let skipped = SkippedArray {
					elem_type: elem.type_name.clone(),
					count,
				};
				return Ok((Value::Skipped(skipped), pos + span));
			}

			let bytes = self.reader.read_bytes(pos, span)?;
			let items = kind
				.decode_bulk(bytes, self.reader.endianness())?
				.into_iter()
				.map(Value::Scalar)
				.collect();
			return Ok((Value::List(array_value(elem, true, items)), pos + span));
		}

		let mut items = Vec::with_capacity(count.min(4096));
		for _ in 0..count {
			let (value, next) = self.decode_node(elem, pos, depth + 1)?;
			items.push(value);
			pos = next;
		}
		Ok((Value::List(array_value(elem, false, items)), pos))
	}
}

fn array_value(elem: &TypeTreeNode, bulk: bool, items: Vec<Value>) -> ArrayValue {
	ArrayValue {
		elem_name: elem.name.clone(),
		elem_type: elem.type_name.clone(),
		bulk,
		items,
	}
}
