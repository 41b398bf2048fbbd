use std::path::Path;

use serde::Serialize;

use ttdump::unity::{DumpError, Result};

/// Print `value` as pretty JSON on stdout.
pub(crate) fn emit_json<T: Serialize>(value: &T) -> Result<()> {
	println!("{}", to_json(value)?);
	Ok(())
}

/// Serialize `value` as pretty JSON.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String> {
	serde_json::to_string_pretty(value).map_err(|err| DumpError::Io(err.into()))
}

/// File name of `path` as text, used to name output artifacts.
pub(crate) fn file_label(path: &Path) -> String {
	path.file_name()
		.map(|name| name.to_string_lossy().into_owned())
		.unwrap_or_else(|| "output".to_owned())
}
