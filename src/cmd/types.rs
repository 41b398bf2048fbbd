use std::path::PathBuf;

use ttdump::unity::{DumpError, Result, SerializedFile, SerializedType, TypeTreeNode};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Print the type tree of the first type with this class id.
	#[arg(long)]
	pub class_id: Option<i32>,
}

/// List the type tables, or print one type tree.
pub fn run(args: Args) -> Result<()> {
	let Args { path, class_id } = args;

	let file = SerializedFile::open(&path)?;

	if let Some(class_id) = class_id {
		let item = file
			.types
			.iter()
			.find(|item| item.class_id == class_id)
			.ok_or(DumpError::UnknownClassId { class_id })?;
		match file.type_tree(item) {
			Some(root) => print_tree(root, 0),
			None => println!("class {class_id} has no type tree"),
		}
		return Ok(());
	}

	println!("types:");
	for (index, item) in file.types.iter().enumerate() {
		println!("  {index}: {}", type_line(&file, item));
	}
	println!("ref_types:");
	for (index, item) in file.ref_types.iter().enumerate() {
		println!("  {index}: {}", type_line(&file, item));
	}

	Ok(())
}

fn type_line(file: &SerializedFile, item: &SerializedType) -> String {
	let mut line = format!("class_id={}", item.class_id);
	if let Some(identity) = &item.identity {
		line.push_str(&format!(" identity={identity}"));
	}
	if item.script_type_index >= 0 {
		line.push_str(&format!(" script_index={}", item.script_type_index));
	}
	match file.type_tree(item) {
		Some(root) => line.push_str(&format!(" root={} nodes={}", root.type_name, root.node_count())),
		None => line.push_str(" root=-"),
	}
	line
}

fn print_tree(node: &TypeTreeNode, depth: usize) {
	println!(
		"{:indent$}{} {} size={} flags={:#x} meta={:#x}",
		"",
		node.type_name,
		node.name,
		node.byte_size,
		node.type_flags,
		node.meta_flags,
		indent = depth * 2
	);
	for child in &node.children {
		print_tree(child, depth + 1);
	}
}
