use std::io::{self, Write};

use crate::unity::{ArrayValue, Field, SkippedArray, Value};

/// Write `field` as a root record: its type name, then nested fields two spaces deeper per level.
pub fn write_field<W: Write>(out: &mut W, field: &Field) -> io::Result<()> {
	write!(out, "{}", field.type_name)?;
	write_value(out, &field.value, 0)
}

/// Render `field` as a root record into a string.
pub fn render_field(field: &Field) -> String {
	let mut out = Vec::new();
	// writes into a Vec cannot fail
	let _ = write_field(&mut out, field);
	String::from_utf8_lossy(&out).into_owned()
}

/// Finish the line started for a value at `depth`, then write what nests below it.
fn write_value<W: Write>(out: &mut W, value: &Value, depth: usize) -> io::Result<()> {
	match value {
		Value::Scalar(scalar) => writeln!(out, " {scalar}"),
		Value::Map(fields) => {
			writeln!(out)?;
			for field in fields {
				write_nested(out, field, depth + 1)?;
			}
			Ok(())
		}
		Value::List(array) => {
			writeln!(out)?;
			write_array(out, array, depth + 1)
		}
		Value::Skipped(skipped) => {
			writeln!(out)?;
			write_skipped(out, skipped, depth + 1)
		}
		Value::UnknownRef => {
			writeln!(out)?;
			writeln!(out, "{}unknown", pad(depth + 1))
		}
		Value::NullRef => {
			writeln!(out)?;
			writeln!(out, "{}null", pad(depth + 1))
		}
	}
}

fn write_nested<W: Write>(out: &mut W, field: &Field, depth: usize) -> io::Result<()> {
	// a bare array node has no line of its own, only its Array<T>[n] header
	if field.type_name.as_ref() == "Array" {
		match &field.value {
			Value::List(array) => return write_array(out, array, depth),
			Value::Skipped(skipped) => return write_skipped(out, skipped, depth),
			_ => {}
		}
	}

	if is_reference_record(&field.type_name) {
		write!(out, "{}{} {}", pad(depth), field.name, field.type_name)?;
	} else {
		write!(out, "{}{} ({})", pad(depth), field.name, field.type_name)?;
	}
	write_value(out, &field.value, depth)
}

/// Registry record and payload lines print their type unparenthesized.
fn is_reference_record(type_name: &str) -> bool {
	matches!(type_name, "ReferencedObject" | "ReferencedObjectData")
}

fn write_array<W: Write>(out: &mut W, array: &ArrayValue, depth: usize) -> io::Result<()> {
	writeln!(out, "{}Array<{}>[{}]", pad(depth), array.elem_type, array.items.len())?;
	if array.items.is_empty() {
		return Ok(());
	}

	if array.bulk {
		write!(out, "{}", pad(depth + 1))?;
		for (index, item) in array.items.iter().enumerate() {
			if index > 0 {
				write!(out, ", ")?;
			}
			match item {
				Value::Scalar(scalar) => write!(out, "{scalar}")?,
				other => write!(out, "<{}>", other.kind())?,
			}
		}
		return writeln!(out);
	}

	for (index, item) in array.items.iter().enumerate() {
		write!(out, "{}{}[{index}] ({})", pad(depth + 1), array.elem_name, array.elem_type)?;
		write_value(out, item, depth + 1)?;
	}
	Ok(())
}

fn write_skipped<W: Write>(out: &mut W, skipped: &SkippedArray, depth: usize) -> io::Result<()> {
	writeln!(out, "{}Array<{}>[{}]", pad(depth), skipped.elem_type, skipped.count)?;
	writeln!(out, "{}<Skipped>", pad(depth + 1))
}

fn pad(depth: usize) -> String {
	"  ".repeat(depth)
}

#[cfg(test)]
mod tests;
