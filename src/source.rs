use std::fs::{create_dir_all, read_to_string, write};
use std::path::Path;
use std::process::Command;
use crate::error::{Error, Result};
use crate::exec::{find_tool, run};
use crate::recipe::{CopyFile, Patch, Recipe, Replace};

const PREPARED: &str = "qtpkg.prepared";

pub fn touch_file(path: impl AsRef<Path>) -> Result<()> {
	let path = path.as_ref();
	if let Some(parent) = path.parent() {
		create_dir_all(parent)
			.map_err(|e| Error::io(format!("failed to create path {}", parent.display()), e))?;
	}
	write(path, "").map_err(|e| Error::io(format!("failed to write {}", path.display()), e))
}

pub fn remove_file(path: impl AsRef<Path>) -> Result<()> {
	let path = path.as_ref();
	match std::fs::remove_file(path) {
		Ok(_) => Ok(()),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
		Err(e) => Err(Error::io(format!("failed to remove {}", path.display()), e))
	}
}

/// Clones and patches the sources once; `force` redoes it.
pub fn prepare(recipe: &Recipe, root_src_dir: &Path, threads: usize, force: bool) -> Result<()> {
	let prepared_path = root_src_dir.join(PREPARED);

	if force {
		println!("info: forcing prepare for {}", recipe.general.name);
		remove_file(&prepared_path)?;
	}

	if prepared_path.exists() {
		return Ok(());
	}

	println!("info: preparing source for {}", recipe.general.name);

	if root_src_dir.exists() {
		std::fs::remove_dir_all(root_src_dir)
			.map_err(|e| Error::io(format!("failed to remove {}", root_src_dir.display()), e))?;
	}
	create_dir_all(root_src_dir)
		.map_err(|e| Error::io(format!("failed to create directory {}", root_src_dir.display()), e))?;

	let work_dir = root_src_dir.join(&recipe.general.checkout);

	println!("info: fetching {} {} using git", recipe.general.repository, recipe.general.version);
	let git = find_tool("git")?;
	run(Command::new(git)
		.arg("clone")
		.arg(&recipe.general.repository)
		.arg(format!("--branch={}", recipe.general.version))
		.args([
			"--depth",
			"1",
			"--single-branch",
			"--no-tags",
			"--recurse-submodules",
			"--shallow-submodules",
			"--progress",
			"--jobs"
		])
		.arg(threads.to_string())
		.arg(&work_dir)
		.current_dir(root_src_dir), "git")?;

	if !recipe.patch.is_empty() {
		let patch_tool = find_tool("patch")?;
		for patch in &recipe.patch {
			apply_patch(&patch_tool, patch, &work_dir, recipe.dir())?;
		}
	}

	for replace in &recipe.replace {
		replace_in_file(replace, &work_dir)?;
	}

	for copy in &recipe.copy {
		copy_file(copy, &work_dir, recipe.dir())?;
	}

	touch_file(prepared_path)
}

fn apply_patch(patch_tool: &Path, patch: &Patch, work_dir: &Path, recipe_dir: &Path) -> Result<()> {
	let file = recipe_dir.join(&patch.file);
	let file = std::path::absolute(&file)
		.map_err(|e| Error::io(format!("failed to get absolute path of {}", file.display()), e))?;

	println!("info: applying patch {}", file.display());

	run(Command::new(patch_tool)
		.arg("-Np1")
		.arg("-i")
		.arg(&file)
		.current_dir(work_dir.join(&patch.base)), "patch")
}

/// Replaces every occurrence of the search text; absent text means the
/// upstream file changed and the recipe needs updating.
pub fn replace_in_file(replace: &Replace, work_dir: &Path) -> Result<()> {
	let path = work_dir.join(&replace.file);
	let data = read_to_string(&path)
		.map_err(|e| Error::io(format!("failed to read {}", path.display()), e))?;

	if !data.contains(&replace.search) {
		return Err(Error::Patch {
			file: path,
			message: format!("pattern {:?} not found", replace.search)
		});
	}

	write(&path, data.replace(&replace.search, &replace.replace))
		.map_err(|e| Error::io(format!("failed to write {}", path.display()), e))
}

fn copy_file(copy: &CopyFile, work_dir: &Path, recipe_dir: &Path) -> Result<()> {
	let from = recipe_dir.join(&copy.from);
	let to = work_dir.join(&copy.to);

	if let Some(parent) = to.parent() {
		create_dir_all(parent)
			.map_err(|e| Error::io(format!("failed to create directory {}", parent.display()), e))?;
	}

	std::fs::copy(&from, &to)
		.map(|_| ())
		.map_err(|e| Error::io(format!("failed to copy {} to {}", from.display(), to.display()), e))
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn replace_rewrites_every_occurrence() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("qtdeclarative/src/plugins/CMakeLists.txt");
		std::fs::create_dir_all(file.parent().unwrap()).unwrap();
		std::fs::write(&file, "add_subdirectory(qmldbg)\nadd_subdirectory(qmllint)\n").unwrap();

		replace_in_file(&Replace {
			file: "qtdeclarative/src/plugins/CMakeLists.txt".to_string(),
			search: "add_subdirectory(qmllint)".to_string(),
			replace: "if(QT_FEATURE_qml_debug AND QT_FEATURE_thread)\nadd_subdirectory(qmllint)\nendif()".to_string()
		}, dir.path()).unwrap();

		assert_eq!(
			std::fs::read_to_string(&file).unwrap(),
			"add_subdirectory(qmldbg)\nif(QT_FEATURE_qml_debug AND QT_FEATURE_thread)\nadd_subdirectory(qmllint)\nendif()\n");
	}

	#[test]
	fn replace_fails_when_pattern_is_missing() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("a.txt"), "nothing to see").unwrap();

		let err = replace_in_file(&Replace {
			file: "a.txt".to_string(),
			search: "QT_BEGIN_NAMESPACE".to_string(),
			replace: String::new()
		}, dir.path()).unwrap_err();
		assert!(matches!(err, Error::Patch { .. }), "{}", err);
	}

	#[test]
	fn copy_creates_parent_dirs() {
		let recipe_dir = tempfile::tempdir().unwrap();
		let work_dir = tempfile::tempdir().unwrap();
		std::fs::write(recipe_dir.path().join("CMakeLists.txt"), "project(x)").unwrap();

		copy_file(&CopyFile {
			from: "CMakeLists.txt".to_string(),
			to: "qtbase/eglfs_brcm/CMakeLists.txt".to_string()
		}, work_dir.path(), recipe_dir.path()).unwrap();

		assert_eq!(
			std::fs::read_to_string(work_dir.path().join("qtbase/eglfs_brcm/CMakeLists.txt")).unwrap(),
			"project(x)");
	}

	#[test]
	fn markers() {
		let dir = tempfile::tempdir().unwrap();
		let marker = dir.path().join("nested/qtpkg.built");
		touch_file(&marker).unwrap();
		assert!(marker.exists());
		remove_file(&marker).unwrap();
		assert!(!marker.exists());
		remove_file(&marker).unwrap();
	}
}
