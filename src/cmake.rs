use std::path::{Path, PathBuf};
use std::process::Command;
use crate::error::Result;
use crate::exec::{find_tool, run};
use crate::flags::{cmake_args, Flags};

/// Drives one CMake build tree with the Ninja generator.
pub struct CMake<'a> {
	program: PathBuf,
	source_dir: &'a Path,
	build_dir: &'a Path,
	env: &'a [(String, String)]
}

impl<'a> CMake<'a> {
	pub fn new(source_dir: &'a Path, build_dir: &'a Path, env: &'a [(String, String)]) -> Result<Self> {
		find_tool("ninja")?;
		Ok(Self {
			program: find_tool("cmake")?,
			source_dir,
			build_dir,
			env
		})
	}

	fn command(&self) -> Command {
		let mut cmd = Command::new(&self.program);
		cmd.envs(self.env.iter().map(|(name, value)| (name.as_str(), value.as_str())));
		cmd
	}

	pub fn configure_args(&self, flags: &Flags, extra_args: &[String]) -> Vec<String> {
		let mut args = vec![
			"-G".to_string(),
			"Ninja".to_string(),
			"-S".to_string(),
			self.source_dir.to_string_lossy().into_owned(),
			"-B".to_string(),
			self.build_dir.to_string_lossy().into_owned(),
			"--log-level=STATUS".to_string()
		];
		args.extend(extra_args.iter().cloned());
		args.extend(cmake_args(flags));
		args
	}

	pub fn configure(&self, flags: &Flags, extra_args: &[String]) -> Result<()> {
		run(self.command().args(self.configure_args(flags, extra_args)), "cmake")
	}

	pub fn build(&self, threads: usize) -> Result<()> {
		run(self.command()
			.arg("--build")
			.arg(self.build_dir)
			.arg("--parallel")
			.arg(threads.to_string()), "cmake --build")
	}

	pub fn install(&self, prefix: &Path) -> Result<()> {
		run(self.command()
			.arg("--install")
			.arg(self.build_dir)
			.arg("--prefix")
			.arg(prefix), "cmake --install")
	}
}
