use std::path::{Path, PathBuf};

use super::shader_paths;

#[test]
fn first_shader_substitutes_the_dump_extension() {
	let (report, source) = shader_paths(Path::new("out/level0.txt"), 0, 17);

	assert_eq!(report, PathBuf::from("out/level0.shader.txt"));
	assert_eq!(source, PathBuf::from("out/level0.shader_source.txt"));
}

#[test]
fn later_shaders_insert_their_path_id() {
	let (report, source) = shader_paths(Path::new("out/sharedassets0.assets.txt"), 1, -3);

	assert_eq!(report, PathBuf::from("out/sharedassets0.assets.-3.shader.txt"));
	assert_eq!(source, PathBuf::from("out/sharedassets0.assets.-3.shader_source.txt"));
}
