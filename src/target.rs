use std::fmt;
use serde::Deserialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub enum Os {
	Linux,
	Windows,
	#[serde(alias = "macOS")]
	Macos,
	Android,
	#[serde(alias = "iOS")]
	Ios,
	Emscripten
}

impl Os {
	pub fn is_mobile(&self) -> bool {
		matches!(self, Os::Android | Os::Ios)
	}
}

impl fmt::Display for Os {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Os::Linux => "Linux",
			Os::Windows => "Windows",
			Os::Macos => "Macos",
			Os::Android => "Android",
			Os::Ios => "iOS",
			Os::Emscripten => "Emscripten"
		})
	}
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
	X86,
	X86_64,
	Armv7,
	Armv8,
	Wasm
}

impl Arch {
	pub fn android_abi(&self) -> Option<&'static str> {
		match self {
			Arch::X86 => Some("x86"),
			Arch::X86_64 => Some("x86_64"),
			Arch::Armv7 => Some("armeabi-v7a"),
			Arch::Armv8 => Some("arm64-v8a"),
			Arch::Wasm => None
		}
	}
}

impl fmt::Display for Arch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Arch::X86 => "x86",
			Arch::X86_64 => "x86_64",
			Arch::Armv7 => "armv7",
			Arch::Armv8 => "armv8",
			Arch::Wasm => "wasm"
		})
	}
}

/// The machine running the build.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Machine {
	pub os: Os,
	pub arch: Arch
}

impl Machine {
	pub fn host() -> Option<Self> {
		let os = match std::env::consts::OS {
			"linux" => Os::Linux,
			"windows" => Os::Windows,
			"macos" => Os::Macos,
			_ => return None
		};
		let arch = match std::env::consts::ARCH {
			"x86" => Arch::X86,
			"x86_64" => Arch::X86_64,
			"arm" => Arch::Armv7,
			"aarch64" => Arch::Armv8,
			_ => return None
		};
		Some(Self { os, arch })
	}
}

fn default_api_level() -> u32 {
	21
}

/// The machine the built framework runs on.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Target {
	pub os: Os,
	pub arch: Arch,
	#[serde(default = "default_api_level")]
	pub api_level: u32,
	/// mkspec for embedded Linux devices, e.g. `devices/linux-rasp-pi-g++`.
	pub device: Option<String>,
	pub toolchain_file: Option<String>,
	/// Install prefix of a Qt built for the build machine, needed when cross-building.
	pub host_path: Option<String>,
	/// Root filesystem of the target; CMake only searches there for libraries and headers.
	pub sysroot: Option<String>,
	pub openssl_root: Option<String>,
	#[serde(default)]
	pub runtime_libs: Vec<String>
}

impl Target {
	pub fn native(machine: Machine) -> Self {
		Self {
			os: machine.os,
			arch: machine.arch,
			api_level: default_api_level(),
			device: None,
			toolchain_file: None,
			host_path: None,
			sysroot: None,
			openssl_root: None,
			runtime_libs: Vec::new()
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Platform {
	pub target: Target,
	pub build: Machine
}

impl Platform {
	pub fn is_cross(&self) -> bool {
		self.target.os != self.build.os || self.target.arch != self.build.arch
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cross_building_compares_os_and_arch() {
		let build = Machine { os: Os::Linux, arch: Arch::X86_64 };

		let native = Platform { target: Target::native(build), build };
		assert!(!native.is_cross());

		let mut pi = Target::native(build);
		pi.arch = Arch::Armv7;
		assert!(Platform { target: pi, build }.is_cross());

		let mut android = Target::native(build);
		android.os = Os::Android;
		assert!(Platform { target: android, build }.is_cross());
	}

	#[test]
	fn target_table_defaults() {
		let target: Target = toml::from_str("os = \"Android\"\narch = \"armv8\"\n").unwrap();
		assert_eq!(target.os, Os::Android);
		assert_eq!(target.api_level, 21);
		assert_eq!(target.arch.android_abi(), Some("arm64-v8a"));
		assert!(target.runtime_libs.is_empty());

		let target: Target = toml::from_str("os = \"iOS\"\narch = \"armv8\"\n").unwrap();
		assert!(target.os.is_mobile());
	}
}
