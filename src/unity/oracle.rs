use std::collections::HashMap;
use std::fmt;

use crate::unity::{DumpError, Result, TypeTreeNode};

/// Runtime type identity of a managed reference payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeIdentity {
	/// Class name.
	pub class_name: Box<str>,
	/// Namespace, possibly empty.
	pub namespace: Box<str>,
	/// Assembly name.
	pub assembly: Box<str>,
}

impl TypeIdentity {
	/// Build an identity from its three parts.
	pub fn new(class_name: &str, namespace: &str, assembly: &str) -> Self {
		Self {
			class_name: class_name.into(),
			namespace: namespace.into(),
			assembly: assembly.into(),
		}
	}
}

impl fmt::Display for TypeIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.namespace.is_empty() {
			write!(f, "{} [{}]", self.class_name, self.assembly)
		} else {
			write!(f, "{}.{} [{}]", self.namespace, self.class_name, self.assembly)
		}
	}
}

/// Source of type trees for objects and managed reference payloads.
pub trait SchemaOracle {
	/// Type tree root for the object with `path_id`.
	fn schema_for_object(&self, path_id: i64) -> Result<&TypeTreeNode>;

	/// Type tree root for a managed reference type identity.
	fn schema_for_type(&self, identity: &TypeIdentity) -> Result<&TypeTreeNode>;
}

/// In-memory schema oracle.
#[derive(Debug, Default)]
pub struct SchemaTable {
	trees: Vec<TypeTreeNode>,
	by_object: HashMap<i64, usize>,
	by_identity: HashMap<TypeIdentity, usize>,
}

impl SchemaTable {
	/// Create an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Store a tree and return its handle.
	pub fn insert_tree(&mut self, tree: TypeTreeNode) -> usize {
		self.trees.push(tree);
		self.trees.len() - 1
	}

	/// Bind an object to a stored tree.
	pub fn bind_object(&mut self, path_id: i64, handle: usize) {
		self.by_object.insert(path_id, handle);
	}

	/// Bind a reference type identity to a stored tree.
	pub fn bind_identity(&mut self, identity: TypeIdentity, handle: usize) {
		self.by_identity.insert(identity, handle);
	}

	/// Store a tree for an object in one step.
	pub fn with_object(mut self, path_id: i64, tree: TypeTreeNode) -> Self {
		let handle = self.insert_tree(tree);
		self.bind_object(path_id, handle);
		self
	}

	/// Store a tree for a reference type in one step.
	pub fn with_type(mut self, identity: TypeIdentity, tree: TypeTreeNode) -> Self {
		let handle = self.insert_tree(tree);
		self.bind_identity(identity, handle);
		self
	}

	/// Tree by handle.
	pub fn tree(&self, handle: usize) -> Option<&TypeTreeNode> {
		self.trees.get(handle)
	}

	/// Number of stored trees.
	pub fn len(&self) -> usize {
		self.trees.len()
	}

	/// Whether no trees are stored.
	pub fn is_empty(&self) -> bool {
		self.trees.is_empty()
	}

	/// Number of bound reference type identities.
	pub fn identity_count(&self) -> usize {
		self.by_identity.len()
	}
}

impl SchemaOracle for SchemaTable {
	fn schema_for_object(&self, path_id: i64) -> Result<&TypeTreeNode> {
		self.by_object
			.get(&path_id)
			.and_then(|handle| self.trees.get(*handle))
			.ok_or(DumpError::MissingObjectSchema { path_id })
	}

	fn schema_for_type(&self, identity: &TypeIdentity) -> Result<&TypeTreeNode> {
		self.by_identity
			.get(identity)
			.and_then(|handle| self.trees.get(*handle))
			.ok_or_else(|| DumpError::UnresolvedPayloadSchema { identity: identity.clone() })
	}
}
