use crate::unity::bytes::Cursor;
use crate::unity::common_strings::{COMMON_STRING_FLAG, common_string};
use crate::unity::{DumpError, Result};

/// Node describes an array: children are `[size, data]`.
pub const TYPE_FLAG_ARRAY: u8 = 0x01;
/// Node is a managed reference registry.
pub const TYPE_FLAG_MANAGED_REFERENCE_REGISTRY: u8 = 0x04;

/// Cursor must be 4-byte aligned after this node.
pub const META_ALIGN_BYTES: u32 = 0x4000;
/// Some descendant aligns, so the cursor must be aligned after this node.
pub const META_ANY_CHILD_USES_ALIGN_BYTES: u32 = 0x8000;

/// One node of a type tree: the schema for a field and its layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTreeNode {
	/// Field name.
	pub name: Box<str>,
	/// Declared type name.
	pub type_name: Box<str>,
	/// Declared byte size, `-1` for variable-size nodes.
	pub byte_size: i32,
	/// Raw type flags (`TYPE_FLAG_*`).
	pub type_flags: u8,
	/// Raw meta flags (`META_*`).
	pub meta_flags: u32,
	/// Child nodes in serialization order.
	pub children: Vec<TypeTreeNode>,
}

impl TypeTreeNode {
	/// Create a childless node with no flags.
	pub fn new(type_name: &str, name: &str, byte_size: i32) -> Self {
		Self {
			name: name.into(),
			type_name: type_name.into(),
			byte_size,
			type_flags: 0,
			meta_flags: 0,
			children: Vec::new(),
		}
	}

	/// Array node with the conventional `Array { int size; <elem> data }` shape.
	pub fn array(elem: TypeTreeNode) -> Self {
		let mut node = Self::new("Array", "Array", -1).with_children(vec![Self::new("int", "size", 4), elem]);
		node.type_flags |= TYPE_FLAG_ARRAY;
		node
	}

	/// `vector` wrapper around an array of `elem`, aligned after its content.
	pub fn vector(name: &str, elem: TypeTreeNode) -> Self {
		Self::new("vector", name, -1).with_children(vec![Self::array(elem).aligned()])
	}

	/// Length-prefixed string field.
	pub fn string(name: &str) -> Self {
		Self::new("string", name, -1).with_children(vec![Self::array(Self::new("char", "data", 1)).aligned()])
	}

	/// Replace children, marking the node when any descendant aligns.
	pub fn with_children(mut self, children: Vec<TypeTreeNode>) -> Self {
		if children.iter().any(|child| child.requires_alignment() || child.any_child_aligns()) {
			self.meta_flags |= META_ANY_CHILD_USES_ALIGN_BYTES;
		}
		self.children = children;
		self
	}

	/// Set the align-after flag.
	pub fn aligned(mut self) -> Self {
		self.meta_flags |= META_ALIGN_BYTES;
		self
	}

	/// Add raw type flags.
	pub fn with_type_flags(mut self, flags: u8) -> Self {
		self.type_flags |= flags;
		self
	}

	/// Whether this node is an array.
	pub fn is_array(&self) -> bool {
		self.type_flags & TYPE_FLAG_ARRAY != 0
	}

	/// Whether this node is a managed reference registry.
	pub fn is_managed_reference_registry(&self) -> bool {
		self.type_flags & TYPE_FLAG_MANAGED_REFERENCE_REGISTRY != 0
	}

	/// Whether this node has no children.
	pub fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}

	/// Whether this node is a fixed-width primitive.
	pub fn is_basic_scalar(&self) -> bool {
		self.is_leaf() && !self.is_array() && self.byte_size > 0
	}

	/// Whether this node is a length-prefixed string.
	pub fn is_string(&self) -> bool {
		self.type_name.as_ref() == "string"
	}

	/// Whether the node itself carries the align-after flag.
	pub fn requires_alignment(&self) -> bool {
		self.meta_flags & META_ALIGN_BYTES != 0
	}

	/// Whether the node carries the descendant-aligns flag.
	pub fn any_child_aligns(&self) -> bool {
		self.meta_flags & META_ANY_CHILD_USES_ALIGN_BYTES != 0
	}

	/// Whether the cursor is rounded up to 4 bytes after this node.
	pub fn aligns_after(&self) -> bool {
		self.requires_alignment() || self.any_child_aligns()
	}

	/// Find a direct child by field name.
	pub fn child(&self, name: &str) -> Option<&TypeTreeNode> {
		self.children.iter().find(|child| child.name.as_ref() == name)
	}

	/// Total number of nodes in this subtree.
	pub fn node_count(&self) -> usize {
		1 + self.children.iter().map(Self::node_count).sum::<usize>()
	}

	/// Parse a type tree blob (format version >= 10, except 11) at the cursor.
	pub fn parse_blob(cursor: &mut Cursor<'_>, format_version: u32) -> Result<Self> {
		let node_count = cursor.read_i32()?;
		let string_size = cursor.read_i32()?;
		let node_count = usize::try_from(node_count).map_err(|_| invalid(format!("negative node count {node_count}")))?;
		let string_size = usize::try_from(string_size).map_err(|_| invalid(format!("negative string buffer size {string_size}")))?;

		let mut records = Vec::with_capacity(node_count);
		for _ in 0..node_count {
			let _version = cursor.read_u16()?;
			let level = cursor.read_u8()?;
			let type_flags = cursor.read_u8()?;
			let type_offset = cursor.read_u32()?;
			let name_offset = cursor.read_u32()?;
			let byte_size = cursor.read_i32()?;
			let _index = cursor.read_i32()?;
			let meta_flags = cursor.read_u32()?;
			if format_version >= 19 {
				let _ref_type_hash = cursor.read_u64()?;
			}
			records.push(NodeRecord {
				level,
				type_flags,
				type_offset,
				name_offset,
				byte_size,
				meta_flags,
			});
		}

		let strings = cursor.read_exact(string_size)?;
		let mut flat = Vec::with_capacity(records.len());
		for record in records {
			let node = TypeTreeNode {
				name: resolve_string(strings, record.name_offset)?,
				type_name: resolve_string(strings, record.type_offset)?,
				byte_size: record.byte_size,
				type_flags: record.type_flags,
				meta_flags: record.meta_flags,
				children: Vec::new(),
			};
			flat.push((record.level, node));
		}

		build_tree(flat)
	}
}

struct NodeRecord {
	level: u8,
	type_flags: u8,
	type_offset: u32,
	name_offset: u32,
	byte_size: i32,
	meta_flags: u32,
}

fn resolve_string(local: &[u8], offset: u32) -> Result<Box<str>> {
	if offset & COMMON_STRING_FLAG != 0 {
		let index = offset & !COMMON_STRING_FLAG;
		return common_string(index)
			.map(Box::from)
			.ok_or_else(|| invalid(format!("unknown common string offset {index}")));
	}

	let start = offset as usize;
	let tail = local
		.get(start..)
		.ok_or_else(|| invalid(format!("string offset {start} outside buffer of {} bytes", local.len())))?;
	let end = tail.iter().position(|byte| *byte == 0).unwrap_or(tail.len());
	Ok(String::from_utf8_lossy(&tail[..end]).into_owned().into_boxed_str())
}

/// Rebuild the level-ordered flat node list into a tree.
fn build_tree(flat: Vec<(u8, TypeTreeNode)>) -> Result<TypeTreeNode> {
	let mut stack: Vec<(u8, TypeTreeNode)> = Vec::new();
	let mut root = None;

	for (level, node) in flat {
		while stack.last().is_some_and(|(top, _)| *top >= level) {
			fold_top(&mut stack, &mut root)?;
		}

		match stack.last() {
			Some((top, _)) if level != top + 1 => {
				return Err(invalid(format!("node {} jumps from level {top} to {level}", node.name)));
			}
			None if level != 0 || root.is_some() => {
				return Err(invalid(format!("node {} at level {level} has no parent", node.name)));
			}
			_ => {}
		}
		stack.push((level, node));
	}

	while !stack.is_empty() {
		fold_top(&mut stack, &mut root)?;
	}

	root.ok_or_else(|| invalid("empty type tree".to_owned()))
}

fn fold_top(stack: &mut Vec<(u8, TypeTreeNode)>, root: &mut Option<TypeTreeNode>) -> Result<()> {
	let Some((_, node)) = stack.pop() else {
		return Ok(());
	};
	match stack.last_mut() {
		Some((_, parent)) => parent.children.push(node),
		None if root.is_none() => *root = Some(node),
		None => return Err(invalid(format!("second root node {}", node.name))),
	}
	Ok(())
}

fn invalid(reason: String) -> DumpError {
	DumpError::InvalidTypeTree { reason }
}
