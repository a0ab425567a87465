use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::{env, fs, io, thread};

use crate::text::clean_up_line;

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/input.txt` + `"bin"` → `data/input.bin`
pub fn build_output_path<P: AsRef<Path>>(input_path: P, output_extension: &str) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/cowboys.txt"` → `"cowboys"`
/// - `"cowboys.txt"` → `"cowboys"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}
	files.sort();

	Ok(files)
}

/// Cleans raw corpus lines into token sequences on worker threads.
///
/// # Behavior
/// - Splits input lines into chunks (based on CPU cores * factor).
/// - Spawns one thread per chunk running `clean_up_line` on every line.
/// - Reassembles chunks by index, so the output follows input order and
///   the model built from it stays deterministic.
/// - Lines that clean up to nothing are kept as empty sentences; the
///   model builder skips them.
pub fn clean_lines_parallel(lines: Vec<String>) -> Vec<Vec<String>> {
	if lines.is_empty() {
		return Vec::new();
	}

	let cpus = num_cpus::get();
	let factor = 8;
	let chunks = cpus * factor;
	let chunk_size = lines.len().div_ceil(chunks);

	let (tx, rx) = mpsc::channel();
	for (index, chunk) in lines.chunks(chunk_size).enumerate() {
		let tx = tx.clone();
		let chunk: Vec<String> = chunk.to_vec();

		thread::spawn(move || {
			let cleaned: Vec<Vec<String>> = chunk.iter().map(|line| clean_up_line(line)).collect();
			// The receiver outlives every sender.
			let _ = tx.send((index, cleaned));
		});
	}
	drop(tx);

	let mut parts: Vec<(usize, Vec<Vec<String>>)> = rx.iter().collect();
	parts.sort_by_key(|(index, _)| *index);

	parts.into_iter().flat_map(|(_, cleaned)| cleaned).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn output_path_swaps_extension() {
		let path = build_output_path("data/cowboys.txt", "bin").unwrap();
		assert_eq!(path, PathBuf::from("data/cowboys.bin"));
		assert_eq!(get_filename("./data/cowboys.txt").unwrap(), "cowboys");
	}

	#[test]
	fn parallel_cleaning_keeps_line_order() {
		let lines: Vec<String> = (0..500).map(|i| format!("Line number{i}!")).collect();
		let cleaned = clean_lines_parallel(lines);
		assert_eq!(cleaned.len(), 500);
		for (i, sentence) in cleaned.iter().enumerate() {
			assert_eq!(sentence, &vec!["line".to_owned(), format!("number{i}"), "!".to_owned()]);
		}
	}

	#[test]
	fn lists_only_matching_extension() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("b.txt"), "x").unwrap();
		fs::write(dir.path().join("a.txt"), "x").unwrap();
		fs::write(dir.path().join("a.bin"), "x").unwrap();
		assert_eq!(list_files(dir.path(), "txt").unwrap(), vec!["a.txt", "b.txt"]);
	}
}
