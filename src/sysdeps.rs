//! Distribution development packages a Linux build needs for the chosen options.

use crate::context::Context;
use crate::options::OpenGl;
use crate::target::{Arch, Os};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Installer {
	Apt,
	Yum
}

impl Installer {
	pub fn detect() -> Option<Self> {
		if which::which("apt-get").is_ok() {
			Some(Installer::Apt)
		} else if which::which("yum").is_ok() || which::which("dnf").is_ok() {
			Some(Installer::Yum)
		} else {
			None
		}
	}

	pub fn install_command(&self) -> &'static str {
		match self {
			Installer::Apt => "apt-get install",
			Installer::Yum => "yum install"
		}
	}

	fn arch_suffix(&self, arch: Arch) -> &'static str {
		match (self, arch) {
			(Installer::Apt, Arch::X86) => ":i386",
			(Installer::Apt, Arch::X86_64) => ":amd64",
			(Installer::Yum, Arch::X86) => ".i686",
			(Installer::Yum, Arch::X86_64) => ".x86_64",
			_ => ""
		}
	}
}

const APT_GUI: &[&str] = &[
	"libxcb1-dev", "libx11-dev", "libfontconfig1-dev", "libfreetype6-dev", "libxext-dev", "libxfixes-dev",
	"libxi-dev", "libxrender-dev", "libx11-xcb-dev", "libxcb-glx0-dev", "libxkbcommon-dev"
];
const APT_MULTIMEDIA: &[&str] = &[
	"libasound2-dev", "libpulse-dev", "libgstreamer1.0-dev", "libgstreamer-plugins-base1.0-dev"
];
const APT_WEBENGINE: &[&str] = &[
	"libssl-dev", "libxcursor-dev", "libxcomposite-dev", "libxdamage-dev", "libxrandr-dev", "libdbus-1-dev",
	"libfontconfig1-dev", "libcap-dev", "libxtst-dev", "libpulse-dev", "libudev-dev", "libpci-dev",
	"libnss3-dev", "libasound2-dev", "libxss-dev", "libegl1-mesa-dev", "gperf", "bison"
];

const YUM_GUI: &[&str] = &[
	"libxcb-devel", "libX11-devel", "fontconfig-devel", "freetype-devel", "libXext-devel", "libXfixes-devel",
	"libXi-devel", "libXrender-devel", "libxkbcommon-devel"
];
const YUM_MULTIMEDIA: &[&str] = &[
	"alsa-lib-devel", "pulseaudio-libs-devel", "gstreamer-devel", "gstreamer-plugins-base-devel"
];
const YUM_WEBENGINE: &[&str] = &[
	"libgcrypt-devel", "libgcrypt", "pciutils-devel", "nss-devel", "libXtst-devel", "gperf", "cups-devel",
	"pulseaudio-libs-devel", "libgudev1-devel", "systemd-devel", "libcap-devel", "alsa-lib-devel", "flex",
	"bison", "libXrandr-devel", "libXcomposite-devel", "libXcursor-devel", "fontconfig-devel"
];

/// Packages to install on the build machine; empty unless the target is Linux.
pub fn packages(installer: Installer, ctx: &Context) -> Vec<String> {
	if ctx.platform.target.os != Os::Linux {
		return Vec::new();
	}

	let (gui, gl, multimedia, webengine) = match installer {
		Installer::Apt => (APT_GUI, "libgl1-mesa-dev", APT_MULTIMEDIA, APT_WEBENGINE),
		Installer::Yum => (YUM_GUI, "mesa-libGL-devel", YUM_MULTIMEDIA, YUM_WEBENGINE)
	};

	let mut names: Vec<&str> = Vec::new();
	if ctx.options.gui() {
		names.extend(gui);
		if ctx.options.opengl() == OpenGl::Desktop {
			names.push(gl);
		}
	}
	if ctx.options.is_enabled("qtmultimedia") {
		names.extend(multimedia);
	}
	if ctx.options.is_enabled("qtwebengine") {
		names.extend(webengine);
	}

	let suffix = installer.arch_suffix(ctx.platform.target.arch);
	let mut packages: Vec<String> = Vec::new();
	for name in names {
		let package = format!("{}{}", name, suffix);
		if !packages.contains(&package) {
			packages.push(package);
		}
	}
	packages
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use crate::context::tests::{native, resolve, targeting};

	#[test]
	fn headless_build_needs_nothing() {
		let ctx = resolve(native(), |_| {}).unwrap();
		assert!(packages(Installer::Apt, &ctx).is_empty());
		assert!(packages(Installer::Yum, &ctx).is_empty());
	}

	#[test]
	fn gui_with_desktop_gl_on_apt() {
		let ctx = resolve(native(), |o| o.opengl = Some(OpenGl::Desktop)).unwrap();
		let packages = packages(Installer::Apt, &ctx);
		assert_eq!(packages.len(), APT_GUI.len() + 1);
		assert_eq!(packages[0], "libxcb1-dev:amd64");
		assert_eq!(packages.last().map(String::as_str), Some("libgl1-mesa-dev:amd64"));
	}

	#[test]
	fn webengine_packages_are_deduplicated() {
		let ctx = resolve(native(), |o| {
			o.modules.insert("qtwebengine".to_string(), true);
			o.modules.insert("qtmultimedia".to_string(), true);
		}).unwrap();
		let packages = packages(Installer::Yum, &ctx);
		assert!(packages.contains(&"libxcb-devel.x86_64".to_string()));
		assert!(packages.contains(&"gstreamer-devel.x86_64".to_string()));
		assert!(packages.contains(&"nss-devel.x86_64".to_string()));
		assert_eq!(packages.iter().filter(|p| p.starts_with("alsa-lib-devel")).count(), 1);
		assert!(!packages.iter().any(|p| p.starts_with("mesa-libGL-devel")));
	}

	#[test]
	fn non_linux_targets_need_nothing() {
		let ctx = resolve(targeting(Os::Android, Arch::Armv8), |o| o.widgets = true).unwrap();
		assert!(packages(Installer::Apt, &ctx).is_empty());
	}
}
