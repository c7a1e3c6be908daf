use std::collections::HashMap;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use aho_corasick::AhoCorasick;
use serde::Deserialize;
use crate::error::{Error, Result};

fn default_checkout() -> String {
	"Qt".to_string()
}

#[derive(Deserialize, Debug)]
pub struct General {
	pub name: String,
	pub version: String,
	pub repository: String,
	#[serde(default = "default_checkout")]
	pub checkout: String,
	#[serde(default)]
	pub cmake_args: Vec<String>,
	#[serde(flatten)]
	pub others: HashMap<String, String>
}

/// A unified diff applied with `patch -Np1` inside `base`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Patch {
	pub base: String,
	pub file: String
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Replace {
	pub file: String,
	pub search: String,
	pub replace: String
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CopyFile {
	pub from: String,
	pub to: String
}

#[derive(Deserialize, Debug)]
pub struct Recipe {
	pub general: General,
	#[serde(default)]
	pub patch: Vec<Patch>,
	#[serde(default)]
	pub replace: Vec<Replace>,
	#[serde(default)]
	pub copy: Vec<CopyFile>,
	#[serde(skip)]
	pub path: PathBuf
}

/// Values for the `@NAME@` placeholders of a recipe.
pub struct Vars<'a> {
	pub src_dir: &'a Path,
	pub build_root: &'a Path,
	pub threads: usize,
	pub others: &'a HashMap<String, String>
}

impl Recipe {
	pub fn parse(data: &str, path: &Path) -> Result<Self> {
		let mut recipe: Recipe = toml::from_str(data).map_err(|e| Error::Config {
			path: path.to_path_buf(),
			message: e.to_string()
		})?;
		recipe.path = path.to_path_buf();
		Ok(recipe)
	}

	pub fn load(path: &Path) -> Result<Self> {
		let data = read_to_string(path)
			.map_err(|e| Error::io(format!("failed to read recipe {}", path.display()), e))?;
		Self::parse(&data, path)
	}

	pub fn dir(&self) -> &Path {
		self.path.parent().unwrap_or(Path::new("."))
	}

	/// Substitutes placeholders in every path, search string and argument.
	pub fn finalize(&mut self, vars: &Vars) -> Result<()> {
		let recipe_dir = std::path::absolute(self.dir())
			.map_err(|e| Error::io("failed to get absolute recipe dir", e))?;
		let threads = vars.threads.to_string();

		let mut to_replace = vec![
			"@VERSION@".to_string(),
			"@SRCDIR@".to_string(),
			"@RECIPEDIR@".to_string(),
			"@BUILDROOT@".to_string(),
			"@THREADS@".to_string()
		];
		let mut replaces = vec![
			self.general.version.clone(),
			vars.src_dir.to_string_lossy().into_owned(),
			recipe_dir.to_string_lossy().into_owned(),
			vars.build_root.to_string_lossy().into_owned(),
			threads
		];

		for (name, replace) in vars.others.iter().chain(&self.general.others) {
			to_replace.push(format!("@{}@", name.to_uppercase()));
			replaces.push(replace.clone());
		}

		let aho = AhoCorasick::new(&to_replace).map_err(|e| Error::Config {
			path: self.path.clone(),
			message: e.to_string()
		})?;

		// values may themselves contain placeholders; more passes than there
		// are placeholders means one refers back to itself
		let max_passes = to_replace.len() + 1;
		let path = self.path.clone();
		let substitute = |value: &mut String| -> Result<()> {
			for _ in 0..max_passes {
				let result = aho.replace_all(value, &replaces);
				if *value == result {
					return Ok(());
				}
				*value = result;
			}

			let placeholder = aho.find(value.as_str())
				.map(|m| to_replace[m.pattern().as_usize()].as_str())
				.unwrap_or_default();
			Err(Error::Config {
				path: path.clone(),
				message: format!("recursive placeholder {}", placeholder)
			})
		};

		substitute(&mut self.general.repository)?;
		substitute(&mut self.general.checkout)?;
		for arg in &mut self.general.cmake_args {
			substitute(arg)?;
		}
		for patch in &mut self.patch {
			substitute(&mut patch.base)?;
			substitute(&mut patch.file)?;
		}
		for replace in &mut self.replace {
			substitute(&mut replace.file)?;
			substitute(&mut replace.search)?;
			substitute(&mut replace.replace)?;
		}
		for copy in &mut self.copy {
			substitute(&mut copy.from)?;
			substitute(&mut copy.to)?;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	const RECIPE: &str = r#"
[general]
name = "qt"
version = "6.5.3"
repository = "git://code.qt.io/qt/qt5.git"
cmake_args = ["--debug-trycompile", "-DQT_SOURCE_TREE=@SRCDIR@"]
patches = "@RECIPEDIR@/patches"

[[patch]]
base = "qtbase"
file = "@PATCHES@/egl_brcm6_5.patch"

[[replace]]
file = "qtbase/src/corelib/io/qfilesystemengine_unix.cpp"
search = "QT_BEGIN_NAMESPACE"
replace = """QT_BEGIN_NAMESPACE
#undef STATX_BASIC_STATS"""

[[copy]]
from = "@PATCHES@/eglfs_brcm/CMakeLists.txt"
to = "qtbase/src/plugins/platforms/eglfs/deviceintegration/eglfs_brcm/CMakeLists.txt"
"#;

	#[test]
	fn parses_steps() {
		let recipe = Recipe::parse(RECIPE, Path::new("/recipes/qt/recipe.toml")).unwrap();
		assert_eq!(recipe.general.checkout, "Qt");
		assert_eq!(recipe.patch.len(), 1);
		assert_eq!(recipe.replace[0].replace, "QT_BEGIN_NAMESPACE\n#undef STATX_BASIC_STATS");
		assert_eq!(recipe.dir(), Path::new("/recipes/qt"));
	}

	#[test]
	fn finalize_substitutes_nested_placeholders() {
		let mut recipe = Recipe::parse(RECIPE, Path::new("/recipes/qt/recipe.toml")).unwrap();
		let others = HashMap::new();
		recipe.finalize(&Vars {
			src_dir: Path::new("/b/sources/qt/Qt"),
			build_root: Path::new("/b"),
			threads: 8,
			others: &others
		}).unwrap();

		assert_eq!(recipe.patch[0].file, "/recipes/qt/patches/egl_brcm6_5.patch");
		assert_eq!(recipe.copy[0].from, "/recipes/qt/patches/eglfs_brcm/CMakeLists.txt");
		assert_eq!(recipe.general.cmake_args[1], "-DQT_SOURCE_TREE=/b/sources/qt/Qt");
	}

	#[test]
	fn recursive_placeholders_are_config_errors() {
		let others = HashMap::new();
		let vars = Vars {
			src_dir: Path::new("/b/sources/qt/Qt"),
			build_root: Path::new("/b"),
			threads: 1,
			others: &others
		};

		let grows = RECIPE.replace(
			"patches = \"@RECIPEDIR@/patches\"",
			"patches = \"@PATCHES@/more\"");
		let mut recipe = Recipe::parse(&grows, Path::new("/recipes/qt/recipe.toml")).unwrap();
		match recipe.finalize(&vars) {
			Err(Error::Config { message, .. }) => assert_eq!(message, "recursive placeholder @PATCHES@"),
			other => panic!("unexpected {:?}", other)
		}

		let swaps = RECIPE.replace(
			"patches = \"@RECIPEDIR@/patches\"",
			"patches = \"@OTHER@\"\nother = \"@PATCHES@\"");
		let mut recipe = Recipe::parse(&swaps, Path::new("/recipes/qt/recipe.toml")).unwrap();
		assert!(matches!(recipe.finalize(&vars), Err(Error::Config { .. })));
	}

	#[test]
	fn bundled_qt_recipe_parses() {
		let recipe = Recipe::parse(
			include_str!("../recipes/qt/recipe.toml"),
			Path::new("recipes/qt/recipe.toml")).unwrap();
		assert_eq!(recipe.general.name, "qt");
		assert_eq!(recipe.replace.len(), 2);
		assert!(recipe.patch.is_empty());
	}

	#[test]
	fn missing_fields_are_config_errors() {
		let err = Recipe::parse("[general]\nname = \"qt\"\n", Path::new("r.toml")).unwrap_err();
		assert!(matches!(err, Error::Config { .. }));
	}
}
