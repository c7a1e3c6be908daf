//! Projection of a resolved [`Context`] onto Qt's CMake cache variables.

use std::collections::BTreeMap;
use std::fmt;
use crate::context::Context;
use crate::options::{OpenGl, WidgetStyle};
use crate::target::Os;

pub const DEFAULT_DEVICE: &str = "devices/linux-rasp-pi-g++";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlagValue {
	Bool(bool),
	Str(String)
}

impl FlagValue {
	fn parse(value: &str) -> Self {
		match value {
			"ON" | "on" | "TRUE" | "true" => FlagValue::Bool(true),
			"OFF" | "off" | "FALSE" | "false" => FlagValue::Bool(false),
			_ => FlagValue::Str(value.to_string())
		}
	}
}

impl fmt::Display for FlagValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FlagValue::Bool(true) => f.write_str("ON"),
			FlagValue::Bool(false) => f.write_str("OFF"),
			FlagValue::Str(value) => f.write_str(value)
		}
	}
}

pub type Flags = BTreeMap<String, FlagValue>;

struct Projection(Flags);

impl Projection {
	fn set(&mut self, name: &str, value: bool) {
		self.0.insert(name.to_string(), FlagValue::Bool(value));
	}

	fn set_str(&mut self, name: &str, value: impl Into<String>) {
		self.0.insert(name.to_string(), FlagValue::Str(value.into()));
	}
}

pub fn project(ctx: &Context) -> Flags {
	let options = &ctx.options;
	let target = &ctx.platform.target;
	let mut flags = Projection(Flags::new());

	flags.set_str("QT_BUILD_SUBMODULES", ctx.enabled_modules().join(";"));

	if ctx.platform.is_cross() {
		flags.set("QT_FORCE_FIND_TOOLS", false);
		if let Some(host_path) = &target.host_path {
			flags.set_str("QT_HOST_PATH", host_path);
		}

		match target.os {
			Os::Android => {
				flags.set_str("QT_QMAKE_TARGET_MKSPEC", "android-clang");
				if let Some(abi) = target.arch.android_abi() {
					flags.set_str("ANDROID_ABI", abi);
				}
				flags.set_str("ANDROID_PLATFORM", format!("android-{}", target.api_level));
			}
			Os::Ios => {
				flags.set_str("CMAKE_SYSTEM_NAME", "iOS");
				flags.set_str("QT_QMAKE_TARGET_MKSPEC", "macx-ios-clang");
			}
			Os::Emscripten => {
				flags.set_str("QT_QMAKE_TARGET_MKSPEC", "wasm-emscripten");
			}
			Os::Linux => {
				flags.set_str("QT_QMAKE_TARGET_MKSPEC", target.device.as_deref().unwrap_or(DEFAULT_DEVICE));
				flags.set_str("QT_QPA_DEFAULT_PLATFORM", "eglfs");
				flags.set("FEATURE_brotli", false);
				flags.set("FEATURE_pcre2", true);
				flags.set("FEATURE_system_libb2", false);
				flags.set("FEATURE_mtdev", false);
				flags.set("FEATURE_tslib", false);
				flags.set("FEATURE_mng", false);
				flags.set("FEATURE_pkg_config", true);
				flags.set("FEATURE_UNITY_BUILD", false);
				flags.set("FEATURE_use_gold_linker", false);
				flags.set("FEATURE_use_gold_linker_alias", false);
			}
			// same OS, other architecture: the toolchain file carries it
			Os::Windows | Os::Macos => {}
		}

		if let Some(sysroot) = &target.sysroot {
			flags.set_str("CMAKE_SYSROOT", sysroot);
			flags.set_str("CMAKE_FIND_ROOT_PATH", sysroot);
			flags.set_str("CMAKE_FIND_ROOT_PATH_MODE_PROGRAM", "NEVER");
			flags.set_str("CMAKE_FIND_ROOT_PATH_MODE_LIBRARY", "ONLY");
			flags.set_str("CMAKE_FIND_ROOT_PATH_MODE_INCLUDE", "ONLY");
			flags.set_str("CMAKE_FIND_ROOT_PATH_MODE_PACKAGE", "ONLY");
		}
	}

	if let Some(toolchain_file) = &target.toolchain_file {
		flags.set_str("CMAKE_TOOLCHAIN_FILE", toolchain_file);
	}

	for name in [
		"FEATURE_hunspell",
		"TEST_libclang",
		"FEATURE_clang",
		"FEATURE_clangcpp",
		"QT_BUILD_BENCHMARKS",
		"QT_BUILD_MANUAL_TESTS",
		"QT_BUILD_TESTS",
		"QT_BUILD_TESTS_BY_DEFAULT",
		"QT_BUILD_EXAMPLES",
		"QT_BUILD_EXAMPLES_BY_DEFAULT",
		"FEATURE_sql",
		"FEATURE_printsupport"
	] {
		flags.set(name, false);
	}
	flags.set("FEATURE_network", true);

	flags.set("FEATURE_gui", options.gui());
	flags.set("FEATURE_widgets", options.widgets);
	flags.set("BUILD_SHARED_LIBS", options.shared);
	flags.set("CMAKE_POSITION_INDEPENDENT_CODE", options.fpic);
	flags.set("CMAKE_INTERPROCEDURAL_OPTIMIZATION", options.lto);
	flags.set("FEATURE_ltcg", options.lto);

	if options.widgets {
		for style in WidgetStyle::ALL {
			flags.set(style.feature(), options.styles.contains(&style));
		}
	}

	for name in [
		"FEATURE_opengl",
		"FEATURE_opengl_desktop",
		"FEATURE_opengl_dynamic",
		"FEATURE_opengles2",
		"FEATURE_opengles3",
		"FEATURE_opengles31",
		"FEATURE_opengles32"
	] {
		flags.set(name, false);
	}
	match options.opengl() {
		OpenGl::No => {}
		OpenGl::Es2 => {
			flags.set("FEATURE_opengl", true);
			flags.set("FEATURE_opengles2", true);
		}
		OpenGl::Desktop => {
			flags.set("FEATURE_opengl", true);
			flags.set("FEATURE_opengl_desktop", true);
		}
		OpenGl::Dynamic => {
			flags.set("FEATURE_opengl", true);
			flags.set("FEATURE_opengl_dynamic", true);
		}
	}

	flags.set("FEATURE_openssl", options.openssl);
	flags.set("FEATURE_openssl_linked", options.openssl);
	if options.openssl {
		if let Some(root) = &target.openssl_root {
			flags.set_str("OPENSSL_ROOT_DIR", root);
		}
	}

	for (name, value) in &ctx.extra_config {
		flags.0.insert(name.clone(), FlagValue::parse(value));
	}

	flags.0
}

pub fn cmake_args(flags: &Flags) -> Vec<String> {
	flags.iter()
		.map(|(name, value)| format!("-D{}={}", name, value))
		.collect()
}
