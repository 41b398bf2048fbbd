use std::collections::BTreeMap;
use std::path::PathBuf;

use ttdump::unity::{ExternalReference, Result, SerializedFile};

use crate::cmd::util::emit_json;

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// Print header fields, metadata table sizes, and objects per class id.
pub fn run(args: Args) -> Result<()> {
	let Args { path, json } = args;

	let file = SerializedFile::open(&path)?;
	let header = &file.header;
	let class_counts = class_counts(&file);

	if json {
		let payload = InfoJson {
			path: path.display().to_string(),
			format_version: header.version,
			endianness: header.endianness.as_str(),
			header_size: header.header_size,
			metadata_size: header.metadata_size,
			file_size: header.file_size,
			data_offset: header.data_offset,
			unity_version: file.unity_version.to_string(),
			target_platform: file.target_platform,
			type_tree_enabled: file.type_tree_enabled,
			type_count: file.types.len(),
			ref_type_count: file.ref_types.len(),
			object_count: file.objects.len(),
			script_count: file.scripts.len(),
			externals: &file.externals,
			classes: class_counts
				.iter()
				.map(|(class_id, count)| ClassCountJson {
					class_id: *class_id,
					count: *count,
				})
				.collect(),
		};
		return emit_json(&payload);
	}

	println!("path: {}", path.display());
	println!("format_version: {}", header.version);
	println!("endianness: {}", header.endianness.as_str());
	println!("header_size: {}", header.header_size);
	println!("metadata_size: {}", header.metadata_size);
	println!("file_size: {}", header.file_size);
	println!("data_offset: {}", header.data_offset);
	println!("unity_version: {}", file.unity_version);
	println!("target_platform: {}", file.target_platform);
	println!("type_tree_enabled: {}", file.type_tree_enabled);
	println!("type_count: {}", file.types.len());
	println!("ref_type_count: {}", file.ref_types.len());
	println!("object_count: {}", file.objects.len());
	println!("script_count: {}", file.scripts.len());
	println!("externals:");
	for external in &file.externals {
		println!("  {} {} type={}", external.guid, external.path, external.kind);
	}
	println!("classes:");
	for (class_id, count) in class_counts {
		println!("  {class_id}: {count}");
	}

	Ok(())
}

fn class_counts(file: &SerializedFile) -> BTreeMap<i32, usize> {
	let mut counts = BTreeMap::new();
	for object in &file.objects {
		*counts.entry(object.class_id).or_insert(0) += 1;
	}
	counts
}

#[derive(serde::Serialize)]
struct ClassCountJson {
	class_id: i32,
	count: usize,
}

#[derive(serde::Serialize)]
struct InfoJson<'a> {
	path: String,
	format_version: u32,
	endianness: &'static str,
	header_size: usize,
	metadata_size: u64,
	file_size: u64,
	data_offset: u64,
	unity_version: String,
	target_platform: i32,
	type_tree_enabled: bool,
	type_count: usize,
	ref_type_count: usize,
	object_count: usize,
	script_count: usize,
	externals: &'a [ExternalReference],
	classes: Vec<ClassCountJson>,
}
