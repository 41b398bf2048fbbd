//! Schema-driven decoding of Unity serialized files into text dumps.

pub mod unity;
