use std::fmt;

use lz4_flex::block::{DecompressError, decompress_into};
use serde::Serialize;
use tracing::debug;

use crate::unity::{DumpError, Field, Result, Scalar, Value};

/// Engine class id of shader assets.
pub const SHADER_CLASS_ID: i32 = 48;

const MAX_DECOMPRESSED_BYTES: usize = 512 * 1024 * 1024;

/// Summary of a decoded shader object plus its decompressed program blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShaderInfo {
	/// Shader name.
	pub name: String,
	/// Property names in declaration order.
	pub props: Vec<String>,
	/// Keyword names; variant keyword indices point into this list.
	pub keywords: Vec<String>,
	/// Sub-shaders in declaration order.
	pub sub_shaders: Vec<SubShaderInfo>,
	/// Decompressed program bytes.
	#[serde(skip)]
	pub blob: Vec<u8>,
}

/// One sub-shader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubShaderInfo {
	/// Passes in declaration order.
	pub passes: Vec<PassInfo>,
}

/// Vertex and fragment programs of one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassInfo {
	/// Vertex stage programs.
	pub vertex: Vec<ProgramInfo>,
	/// Fragment stage programs.
	pub fragment: Vec<ProgramInfo>,
}

/// Compiled variants of one player sub-program group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramInfo {
	/// Variants in stream order.
	pub variants: Vec<VariantInfo>,
}

/// One compiled program variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantInfo {
	/// Index of the variant's code in the decompressed blob.
	pub blob_offset: i64,
	/// Resolved keyword names.
	pub keywords: Vec<String>,
}

impl fmt::Display for VariantInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "+{} {}", self.blob_offset, self.keywords.join(" "))
	}
}

impl fmt::Display for PassInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "VS")?;
		for variant in self.vertex.iter().flat_map(|program| &program.variants) {
			writeln!(f, "  {variant}")?;
		}
		writeln!(f, "PS")?;
		for variant in self.fragment.iter().flat_map(|program| &program.variants) {
			writeln!(f, "  {variant}")?;
		}
		Ok(())
	}
}

impl fmt::Display for SubShaderInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (index, pass) in self.passes.iter().enumerate() {
			writeln!(f, "#Pass {index}")?;
			writeln!(f, "{pass}")?;
		}
		Ok(())
	}
}

impl fmt::Display for ShaderInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "Shader:")?;
		writeln!(f, "  {}", self.name)?;
		writeln!(f, "Props:")?;
		for prop in &self.props {
			writeln!(f, "  {prop}")?;
		}
		writeln!(f, "Keywords:")?;
		for keyword in &self.keywords {
			writeln!(f, "  {keyword}")?;
		}
		writeln!(f)?;
		writeln!(f, "====================================")?;
		writeln!(f)?;
		writeln!(f, "SubShaders")?;
		for (index, sub_shader) in self.sub_shaders.iter().enumerate() {
			writeln!(f, "#SubShader {index}")?;
			writeln!(f, "{sub_shader}")?;
		}
		Ok(())
	}
}

/// Collect shader metadata from a decoded shader root and decompress its program blob.
pub fn extract_shader(root: &Field) -> Result<ShaderInfo> {
	let parsed = Path::root(&root.value).get("m_ParsedForm")?;

	let name = parsed.get("m_Name")?.text()?;
	let props = parsed
		.get("m_PropInfo")?
		.get("m_Props")?
		.items()?
		.into_iter()
		.map(|prop| prop.get("m_Name")?.text())
		.collect::<Result<Vec<_>>>()?;
	let keywords = parsed
		.get("m_KeywordNames")?
		.items()?
		.into_iter()
		.map(|keyword| keyword.text())
		.collect::<Result<Vec<_>>>()?;

	let sub_shaders = parsed
		.get("m_SubShaders")?
		.items()?
		.into_iter()
		.map(|sub_shader| {
			let passes = sub_shader
				.get("m_Passes")?
				.items()?
				.into_iter()
				.map(|pass| {
					Ok(PassInfo {
						vertex: stage_programs(&pass, "progVertex", &keywords)?,
						fragment: stage_programs(&pass, "progFragment", &keywords)?,
					})
				})
				.collect::<Result<Vec<_>>>()?;
			Ok(SubShaderInfo { passes })
		})
		.collect::<Result<Vec<_>>>()?;

	let blob = decompress_shader_blob(Path::root(&root.value))?;
	debug!(shader = %name, sub_shaders = sub_shaders.len(), blob_len = blob.len(), "extracted shader");

	Ok(ShaderInfo {
		name,
		props,
		keywords,
		sub_shaders,
		blob,
	})
}

/// Decompress an LZ4 block into exactly `declared` bytes.
pub fn decompress_blob(compressed: &[u8], declared: usize) -> Result<Vec<u8>> {
	if declared > MAX_DECOMPRESSED_BYTES {
		return Err(DumpError::DecompressedTooLarge {
			declared,
			limit: MAX_DECOMPRESSED_BYTES,
		});
	}

	let mut out = vec![0_u8; declared];
	match decompress_into(compressed, &mut out) {
		Ok(actual) if actual == declared => Ok(out),
		Ok(actual) => Err(DumpError::DecompressionSizeMismatch { declared, actual }),
		Err(DecompressError::OutputTooSmall { expected, .. }) => Err(DumpError::DecompressionSizeMismatch { declared, actual: expected }),
		Err(err) => Err(DumpError::CorruptBlob { reason: err.to_string() }),
	}
}

fn stage_programs(pass: &Path<'_>, stage: &str, keywords: &[String]) -> Result<Vec<ProgramInfo>> {
	let program = pass.get(stage)?;
	// older layouts keep one flat variant list instead of per-group lists
	let groups = match program.get("m_PlayerSubPrograms") {
		Ok(groups) => groups.items()?,
		Err(_) => vec![program.get("m_SubPrograms")?],
	};

	groups
		.into_iter()
		.map(|group| {
			let variants = group
				.items()?
				.into_iter()
				.map(|variant| variant_info(&variant, keywords))
				.collect::<Result<Vec<_>>>()?;
			Ok(ProgramInfo { variants })
		})
		.collect()
}

fn variant_info(variant: &Path<'_>, keywords: &[String]) -> Result<VariantInfo> {
	let indices = variant.get("m_KeywordIndices")?;
	let names = indices
		.items()?
		.into_iter()
		.map(|index| {
			let raw = index.integer()?;
			usize::try_from(raw)
				.ok()
				.and_then(|slot| keywords.get(slot))
				.cloned()
				.ok_or_else(|| index.error("keyword index out of range"))
		})
		.collect::<Result<Vec<_>>>()?;

	Ok(VariantInfo {
		blob_offset: variant.get("m_BlobIndex")?.integer()?,
		keywords: names,
	})
}

fn decompress_shader_blob(root: Path<'_>) -> Result<Vec<u8>> {
	let blob_path = root.get("compressedBlob")?;
	let blob = blob_path
		.items()?
		.into_iter()
		.map(|byte| {
			let raw = byte.integer()?;
			u8::try_from(raw).map_err(|_| byte.error("blob element is not a byte"))
		})
		.collect::<Result<Vec<_>>>()?;

	let declared = match root.get("decompressedLengths") {
		Ok(lengths) => lengths.first_integer()?,
		Err(_) => root.get("decompressedSize")?.integer()?,
	};
	let declared = usize::try_from(declared).map_err(|_| root.error("declared length is negative"))?;

	let chunk = match (root.get("offsets"), root.get("compressedLengths")) {
		(Ok(offsets), Ok(lengths)) => {
			let start = usize::try_from(offsets.first_integer()?).map_err(|_| offsets.error("negative chunk offset"))?;
			let len = usize::try_from(lengths.first_integer()?).map_err(|_| lengths.error("negative chunk length"))?;
			start
				.checked_add(len)
				.and_then(|end| blob.get(start..end))
				.ok_or_else(|| blob_path.error("first chunk lies outside the blob"))?
		}
		_ => blob.as_slice(),
	};

	decompress_blob(chunk, declared)
}

/// A value reached by walking field names from the shader root, carrying its path for diagnostics.
struct Path<'a> {
	value: &'a Value,
	path: String,
}

impl<'a> Path<'a> {
	fn root(value: &'a Value) -> Self {
		Self {
			value,
			path: String::new(),
		}
	}

	fn child_path(&self, name: &str) -> String {
		if self.path.is_empty() { name.to_owned() } else { format!("{}.{name}", self.path) }
	}

	fn get(&self, name: &str) -> Result<Path<'a>> {
		let path = self.child_path(name);
		match self.value.get(name) {
			Some(value) => Ok(Path { value, path }),
			None => Err(DumpError::ShaderField { path, reason: "missing field" }),
		}
	}

	fn items(&self) -> Result<Vec<Path<'a>>> {
		match self.value {
			Value::List(array) => Ok(array
				.items
				.iter()
				.enumerate()
				.map(|(index, value)| Path {
					value,
					path: format!("{}[{index}]", self.path),
				})
				.collect()),
			Value::Skipped(_) => Err(self.error("array was skipped")),
			_ => Err(self.error("expected a list")),
		}
	}

	fn scalar(&self) -> Result<&'a Scalar> {
		self.value.as_scalar().ok_or_else(|| self.error("expected a scalar"))
	}

	fn text(&self) -> Result<String> {
		self.scalar()?
			.as_str()
			.map(str::to_owned)
			.ok_or_else(|| self.error("expected a string"))
	}

	fn integer(&self) -> Result<i64> {
		self.scalar()?.as_i64().ok_or_else(|| self.error("expected an integer"))
	}

	/// First scalar reached by descending through leading list elements.
	fn first_integer(&self) -> Result<i64> {
		match self.value {
			Value::List(_) => self.items()?.into_iter().next().ok_or_else(|| self.error("empty list"))?.first_integer(),
			_ => self.integer(),
		}
	}

	fn error(&self, reason: &'static str) -> DumpError {
		DumpError::ShaderField {
			path: self.path.clone(),
			reason,
		}
	}
}

#[cfg(test)]
mod tests;
