use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use ttdump::unity::{DecodeOptions, DumpOptions, ObjectDump, Result, SHADER_CLASS_ID, SerializedFile, Value, extract_shader, write_dump};

use crate::cmd::util::{file_label, to_json};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Output directory; defaults to the input file's directory.
	#[arg(short, long)]
	pub output: Option<PathBuf>,
	/// Replace arrays with more than 256 elements by a placeholder.
	#[arg(long)]
	pub skip_large_arrays: bool,
	/// Also write every decoded object as JSON.
	#[arg(long)]
	pub json: bool,
}

/// Write the text dump of one serialized file, plus shader artifacts.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		output,
		skip_large_arrays,
		json,
	} = args;

	let file = SerializedFile::open(&path)?;
	let label = file_label(&path);
	let dir = output.unwrap_or_else(|| path.parent().map(Path::to_path_buf).unwrap_or_default());
	fs::create_dir_all(&dir)?;

	let options = DumpOptions {
		decode: DecodeOptions {
			skip_large_arrays,
			..DecodeOptions::default()
		},
	};

	let text_path = dir.join(format!("{label}.txt"));
	let mut out = BufWriter::new(File::create(&text_path)?);
	let mut objects = Vec::new();
	let mut shaders = 0_usize;

	write_dump(&file, &mut out, &options, |dump| {
		if dump.object.class_id == SHADER_CLASS_ID && write_shader(&text_path, shaders, dump)? {
			shaders += 1;
		}
		if json {
			objects.push(ObjectJson::from_dump(dump));
		}
		Ok(())
	})?;
	out.flush()?;

	if json {
		let payload = DumpJson {
			path: path.display().to_string(),
			unity_version: file.unity_version.to_string(),
			objects,
		};
		fs::write(dir.join(format!("{label}.json")), to_json(&payload)?)?;
	}

	info!(
		path = %path.display(),
		objects = file.objects.len(),
		shaders,
		output = %text_path.display(),
		"dumped serialized file"
	);
	println!("{}", text_path.display());
	Ok(())
}

/// Write the shader report and raw program blob next to the text dump; object-local failures only warn.
///
/// The first shader takes `<dump>.shader.txt`; later ones insert their path id.
fn write_shader(text_path: &Path, written: usize, dump: &ObjectDump) -> Result<bool> {
	let path_id = dump.object.path_id;
	let shader = match extract_shader(&dump.root) {
		Ok(shader) => shader,
		Err(err) if err.is_object_local() => {
			warn!(path_id, error = %err, "skipping shader extraction");
			return Ok(false);
		}
		Err(err) => return Err(err),
	};

	let (report, source) = shader_paths(text_path, written, path_id);
	fs::write(report, shader.to_string())?;
	fs::write(source, &shader.blob)?;
	Ok(true)
}

/// Report and source paths, substituted for the text dump's extension.
fn shader_paths(text_path: &Path, written: usize, path_id: i64) -> (PathBuf, PathBuf) {
	if written == 0 {
		(text_path.with_extension("shader.txt"), text_path.with_extension("shader_source.txt"))
	} else {
		(
			text_path.with_extension(format!("{path_id}.shader.txt")),
			text_path.with_extension(format!("{path_id}.shader_source.txt")),
		)
	}
}

#[derive(serde::Serialize)]
struct ObjectJson {
	path_id: i64,
	class_id: i32,
	#[serde(rename = "type")]
	type_name: String,
	value: Value,
}

impl ObjectJson {
	fn from_dump(dump: &ObjectDump) -> Self {
		Self {
			path_id: dump.object.path_id,
			class_id: dump.object.class_id,
			type_name: dump.root.type_name.to_string(),
			value: dump.root.value.clone(),
		}
	}
}

#[derive(serde::Serialize)]
struct DumpJson {
	path: String,
	unity_version: String,
	objects: Vec<ObjectJson>,
}

#[cfg(test)]
mod tests;

