use std::collections::HashMap;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use serde::Deserialize;
use crate::error::{Error, Result};
use crate::modules::DEFAULT_SOURCE;
use crate::options::OptionSet;
use crate::target::{Machine, Target};

fn default_modules_source() -> String {
	DEFAULT_SOURCE.to_string()
}

fn default_recipe() -> String {
	"recipe.toml".to_string()
}

#[derive(Deserialize, Debug)]
pub struct GeneralConfig {
	pub build_root: String,
	#[serde(default = "default_recipe")]
	pub recipe: String,
	#[serde(default = "default_modules_source")]
	pub modules_source: String,
	#[serde(default)]
	pub threads: usize,
	pub meta_dir: Option<String>,
	#[serde(flatten)]
	pub others: HashMap<String, String>
}

#[derive(Deserialize, Debug)]
pub struct Config {
	pub general: GeneralConfig,
	pub target: Target,
	pub build: Option<Machine>,
	#[serde(default)]
	pub options: OptionSet
}

impl Config {
	pub fn parse(data: &str, path: &Path) -> Result<Self> {
		let mut config: Config = toml::from_str(data).map_err(|e| Error::Config {
			path: path.to_path_buf(),
			message: e.to_string()
		})?;

		let dir = config_dir(path)?;
		config.general.build_root = dir.join(&config.general.build_root)
			.to_string_lossy()
			.into_owned();
		config.general.recipe = dir.join(&config.general.recipe)
			.to_string_lossy()
			.into_owned();

		if config.general.threads == 0 {
			config.general.threads = std::thread::available_parallelism()
				.map(|num| num.get())
				.unwrap_or(1);
		}

		Ok(config)
	}

	/// Loads `path`, or the first of `qtpkg.toml` and `/etc/qtpkg.toml` that exists.
	pub fn load(path: Option<&str>) -> Result<Self> {
		if let Some(path) = path {
			let data = read_to_string(path)
				.map_err(|e| Error::io(format!("failed to read {}", path), e))?;
			return Self::parse(&data, Path::new(path));
		}

		for path in ["qtpkg.toml", "/etc/qtpkg.toml"] {
			let Ok(data) = read_to_string(path) else {
				continue;
			};
			return Self::parse(&data, Path::new(path));
		}

		Err(Error::Config {
			path: PathBuf::from("qtpkg.toml"),
			message: "not found in the current directory or in /etc".to_string()
		})
	}

	pub fn build_machine(&self) -> Option<Machine> {
		self.build.or_else(Machine::host)
	}
}

fn config_dir(path: &Path) -> Result<PathBuf> {
	let abs = std::path::absolute(path)
		.map_err(|e| Error::io(format!("failed to get absolute path of {}", path.display()), e))?;
	Ok(abs.parent().map(Path::to_path_buf).unwrap_or_default())
}

/// Directory layout under the build root. Host builds live next to target builds.
#[derive(Clone, Debug, PartialEq)]
pub struct Paths {
	pub build_root: PathBuf,
	pub sources: PathBuf,
	pub build: PathBuf,
	pub package: PathBuf,
	pub meta: PathBuf
}

impl Paths {
	pub fn new(general: &GeneralConfig, name: &str, host: bool) -> Self {
		let root = PathBuf::from(&general.build_root);
		let (builds, pkgs) = if host {
			("host_builds", "host_pkgs")
		} else {
			("pkg_builds", "pkgs")
		};
		let meta = general.meta_dir
			.as_ref()
			.map(PathBuf::from)
			.unwrap_or_else(|| root.join("meta"));

		Self {
			sources: root.join("sources").join(name),
			build: root.join(builds).join(name),
			package: root.join(pkgs).join(name),
			meta: meta.join(if host { format!("{}-host", name) } else { name.to_string() }),
			build_root: root
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use crate::options::OpenGl;
	use crate::target::{Arch, Os};

	const CONFIG: &str = r#"
[general]
build_root = "out"
threads = 4
sysroot = "/opt/sysroot"

[target]
os = "Linux"
arch = "armv7"
host_path = "/opt/qt-host"

[build]
os = "Linux"
arch = "x86_64"

[options]
widgets = true
opengl = "es2"

[options.modules]
qtdeclarative = true
"#;

	#[test]
	fn parses_and_anchors_paths_to_the_config_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("qtpkg.toml");
		std::fs::write(&path, CONFIG).unwrap();

		let config = Config::load(path.to_str()).unwrap();
		assert_eq!(PathBuf::from(&config.general.build_root), dir.path().join("out"));
		assert_eq!(PathBuf::from(&config.general.recipe), dir.path().join("recipe.toml"));
		assert_eq!(config.general.modules_source, DEFAULT_SOURCE);
		assert_eq!(config.general.threads, 4);
		assert_eq!(config.general.others.get("sysroot").map(String::as_str), Some("/opt/sysroot"));
		assert_eq!(config.target.arch, Arch::Armv7);
		assert_eq!(config.build_machine(), Some(Machine { os: Os::Linux, arch: Arch::X86_64 }));
		assert_eq!(config.options.opengl, Some(OpenGl::Es2));
		assert!(config.options.is_enabled("qtdeclarative"));
	}

	#[test]
	fn example_config_parses() {
		let config = Config::parse(include_str!("../qtpkg.example.toml"), Path::new("/srv/qt/qtpkg.toml")).unwrap();
		assert_eq!(config.general.build_root, "/srv/qt/build");
		assert_eq!(config.general.recipe, "/srv/qt/recipes/qt/recipe.toml");
		assert!(config.general.threads >= 1);
		assert_eq!(config.target.device.as_deref(), Some("devices/linux-rasp-pi-g++"));
		assert_eq!(config.target.sysroot.as_deref(), Some("/opt/rpi/sysroot"));
		assert!(config.options.is_enabled("qtsvg"));
	}

	#[test]
	fn reports_malformed_config() {
		let err = Config::parse("[general]\n", Path::new("qtpkg.toml")).unwrap_err();
		assert!(matches!(err, Error::Config { .. }), "{}", err);
	}

	#[test]
	fn paths_separate_host_and_target() {
		let general = GeneralConfig {
			build_root: "/b".to_string(),
			recipe: default_recipe(),
			modules_source: default_modules_source(),
			threads: 1,
			meta_dir: None,
			others: HashMap::new()
		};

		let target = Paths::new(&general, "qt", false);
		let host = Paths::new(&general, "qt", true);
		assert_eq!(target.sources, host.sources);
		assert_eq!(target.build, PathBuf::from("/b/pkg_builds/qt"));
		assert_eq!(host.package, PathBuf::from("/b/host_pkgs/qt"));
		assert_eq!(host.meta, PathBuf::from("/b/meta/qt-host"));
	}
}
