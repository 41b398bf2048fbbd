/// Whole-file text dump command.
pub mod dump;
/// File-level information command.
pub mod info;
/// Type table inspection command.
pub mod types;

mod util;
