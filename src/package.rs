//! Package layout after `cmake --install`: path prefix file, runtime
//! libraries, environment script and the FILES manifest.

use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::target::Os;

pub const QT_CONF: &str = "[Paths]\nPrefix = ..\n";
pub const ENV_SCRIPT: &str = "qtpkg-env.sh";

fn is_runtime_lib(path: &Path) -> bool {
	let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
		return false;
	};
	name.ends_with(".dll") || name.ends_with(".dylib") || name.ends_with(".so") || name.contains(".so.")
}

fn runtime_lib_dir(os: Os) -> &'static str {
	if os == Os::Windows {
		"bin"
	} else {
		"lib"
	}
}

/// Shell exports that make the package usable from a build environment.
pub fn env_script(ctx: &Context, package_dir: &Path) -> String {
	let pkg = package_dir.display();
	let mut script = String::from("# generated by qtpkg\n");

	if ctx.options.is_host() {
		script += &format!("export QT_HOST_PATH=\"{}\"\n", pkg);
		script += &format!("export PATH=\"{0}/bin:{0}/qttools/bin:$PATH\"\n", pkg);
		return script;
	}

	script += &format!("export QML_IMPORT_PATH=\"{}/qml${{QML_IMPORT_PATH:+:$QML_IMPORT_PATH}}\"\n", pkg);

	match &ctx.platform.target.host_path {
		Some(host) if ctx.platform.is_cross() => {
			script += &format!("export QT_HOST_PATH=\"{}\"\n", host);
			script += &format!("export PATH=\"{0}/bin:{0}/qttools/bin:$PATH\"\n", host);
		}
		_ => {
			script += &format!("export PATH=\"{0}/bin:{0}/qttools/bin:$PATH\"\n", pkg);
		}
	}

	script
}

fn copy_runtime_libs(ctx: &Context, package_dir: &Path) -> Result<()> {
	let dest = package_dir.join(runtime_lib_dir(ctx.platform.target.os));

	for entry in &ctx.platform.target.runtime_libs {
		let entry = Path::new(entry);
		let files: Vec<PathBuf> = if entry.is_dir() {
			WalkDir::new(entry)
				.into_iter()
				.filter_map(|file| file.ok())
				.filter(|file| !file.file_type().is_dir() && is_runtime_lib(file.path()))
				.map(|file| file.into_path())
				.collect()
		} else {
			vec![entry.to_path_buf()]
		};

		create_dir_all(&dest)
			.map_err(|e| Error::io(format!("failed to create directory {}", dest.display()), e))?;

		for file in files {
			let Some(name) = file.file_name() else {
				continue;
			};
			println!("info: copying runtime library {}", file.display());
			std::fs::copy(&file, dest.join(name))
				.map_err(|e| Error::io(format!("failed to copy {}", file.display()), e))?;
		}
	}

	Ok(())
}

/// Sorted list of every path below `package_dir`, relative to it.
pub fn manifest(package_dir: &Path) -> Result<String> {
	let mut files = Vec::new();

	for file in WalkDir::new(package_dir).sort_by_file_name().min_depth(1) {
		let file = file.map_err(|e| Error::io(
			format!("failed to walk {}", package_dir.display()),
			e.into()))?;
		if let Ok(path) = file.path().strip_prefix(package_dir) {
			files.push(path.to_string_lossy().into_owned());
		}
	}

	let mut out = files.join("\n");
	out.push('\n');
	Ok(out)
}

pub fn finish(ctx: &Context, package_dir: &Path, meta_dir: &Path) -> Result<()> {
	let bin = package_dir.join("bin");
	create_dir_all(&bin)
		.map_err(|e| Error::io(format!("failed to create directory {}", bin.display()), e))?;

	let qt_conf = bin.join("qt.conf");
	write(&qt_conf, QT_CONF)
		.map_err(|e| Error::io(format!("failed to write {}", qt_conf.display()), e))?;

	copy_runtime_libs(ctx, package_dir)?;

	let script = package_dir.join(ENV_SCRIPT);
	write(&script, env_script(ctx, package_dir))
		.map_err(|e| Error::io(format!("failed to write {}", script.display()), e))?;

	create_dir_all(meta_dir)
		.map_err(|e| Error::io(format!("failed to create directory {}", meta_dir.display()), e))?;
	let files = meta_dir.join("FILES");
	write(&files, manifest(package_dir)?)
		.map_err(|e| Error::io(format!("failed to write {}", files.display()), e))?;

	println!("info: packaged {}", package_dir.display());
	Ok(())
}
