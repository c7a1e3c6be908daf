use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::str::FromStr;
use serde::Deserialize;
use crate::error::{Error, Result};
use crate::modules::{Module, ModuleGraph};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenGl {
	No,
	Es2,
	Desktop,
	Dynamic
}

impl FromStr for OpenGl {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"no" => Ok(OpenGl::No),
			"es2" => Ok(OpenGl::Es2),
			"desktop" => Ok(OpenGl::Desktop),
			"dynamic" => Ok(OpenGl::Dynamic),
			_ => Err("expected one of no, es2, desktop, dynamic".to_string())
		}
	}
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetStyle {
	Fusion,
	Windows,
	Windowsvista,
	Mac,
	Android
}

impl WidgetStyle {
	pub const ALL: [WidgetStyle; 5] = [
		WidgetStyle::Fusion,
		WidgetStyle::Windows,
		WidgetStyle::Windowsvista,
		WidgetStyle::Mac,
		WidgetStyle::Android
	];

	pub fn feature(&self) -> &'static str {
		match self {
			WidgetStyle::Fusion => "FEATURE_style_fusion",
			WidgetStyle::Windows => "FEATURE_style_windows",
			WidgetStyle::Windowsvista => "FEATURE_style_windowsvista",
			WidgetStyle::Mac => "FEATURE_style_mac",
			WidgetStyle::Android => "FEATURE_style_android"
		}
	}
}

impl FromStr for WidgetStyle {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"fusion" => Ok(WidgetStyle::Fusion),
			"windows" => Ok(WidgetStyle::Windows),
			"windowsvista" => Ok(WidgetStyle::Windowsvista),
			"mac" => Ok(WidgetStyle::Mac),
			"android" => Ok(WidgetStyle::Android),
			other => Err(format!("unknown style {}", other))
		}
	}
}

fn yes() -> bool {
	true
}

fn default_config() -> String {
	"none".to_string()
}

/// User-facing build options. `gui` and `opengl` stay `None` until resolved
/// so explicit choices can be told apart from defaults.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct OptionSet {
	#[serde(default = "yes")]
	pub shared: bool,
	#[serde(default = "yes")]
	pub fpic: bool,
	pub opengl: Option<OpenGl>,
	#[serde(default)]
	pub openssl: bool,
	pub gui: Option<bool>,
	#[serde(default)]
	pub widgets: bool,
	#[serde(default)]
	pub lto: bool,
	#[serde(default = "default_config")]
	pub config: String,
	#[serde(default)]
	pub styles: BTreeSet<WidgetStyle>,
	#[serde(default)]
	pub modules: BTreeMap<String, bool>
}

impl Default for OptionSet {
	fn default() -> Self {
		Self {
			shared: true,
			fpic: true,
			opengl: None,
			openssl: false,
			gui: None,
			widgets: false,
			lto: false,
			config: default_config(),
			styles: BTreeSet::new(),
			modules: BTreeMap::new()
		}
	}
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
	match value {
		"true" | "True" | "1" | "on" | "ON" => Ok(true),
		"false" | "False" | "0" | "off" | "OFF" => Ok(false),
		_ => Err(Error::InvalidOption {
			name: name.to_string(),
			message: format!("expected a boolean, found {}", value)
		})
	}
}

impl OptionSet {
	/// Options for the build-machine Qt that provides tools when cross-building.
	pub fn host() -> Self {
		let modules = [
			"qtbase",
			"qtdeclarative",
			"qtshadertools",
			"qttools",
			"qttranslations",
			"qtquick3d"
		];

		Self {
			shared: true,
			fpic: true,
			opengl: Some(OpenGl::Desktop),
			gui: Some(true),
			widgets: true,
			config: "host".to_string(),
			modules: modules.into_iter().map(|name| (name.to_string(), true)).collect(),
			..Self::default()
		}
	}

	pub fn is_host(&self) -> bool {
		self.config.split_whitespace().any(|token| token == "host")
	}

	pub fn gui(&self) -> bool {
		self.gui.unwrap_or(false)
	}

	pub fn opengl(&self) -> OpenGl {
		self.opengl.unwrap_or(OpenGl::No)
	}

	pub fn is_enabled(&self, module: &str) -> bool {
		self.modules.get(module).copied().unwrap_or(false)
	}

	pub fn enabled(&self) -> impl Iterator<Item = &str> {
		self.modules.iter()
			.filter(|(_, enabled)| **enabled)
			.map(|(name, _)| name.as_str())
	}

	/// `NAME=VALUE` entries of the free-form config string; `host` and `none` are labels.
	pub fn extra_config(&self) -> Result<Vec<(String, String)>> {
		self.config.split_whitespace()
			.filter(|token| !matches!(*token, "host" | "none"))
			.map(|token| match token.split_once('=') {
				Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
				_ => Err(Error::InvalidOption {
					name: "config".to_string(),
					message: format!("expected NAME=VALUE, found {}", token)
				})
			})
			.collect()
	}

	/// Applies a `name=value` override; unrecognized names toggle modules.
	pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
		let invalid = |message: String| Error::InvalidOption {
			name: name.to_string(),
			message
		};

		match name {
			"shared" => self.shared = parse_bool(name, value)?,
			"fpic" | "fPIC" => self.fpic = parse_bool(name, value)?,
			"opengl" => self.opengl = Some(value.parse::<OpenGl>().map_err(invalid)?),
			"openssl" => self.openssl = parse_bool(name, value)?,
			"gui" | "GUI" => self.gui = Some(parse_bool(name, value)?),
			"widgets" => self.widgets = parse_bool(name, value)?,
			"lto" => self.lto = parse_bool(name, value)?,
			"config" => self.config = value.to_string(),
			"styles" => {
				self.styles = value.split(',')
					.map(str::trim)
					.filter(|style| !style.is_empty())
					.map(|style| style.parse::<WidgetStyle>().map_err(invalid))
					.collect::<Result<_>>()?;
			}
			module => {
				let enabled = parse_bool(module, value)?;
				self.modules.insert(module.to_string(), enabled);
			}
		}

		Ok(())
	}

	/// Enables every module reachable through `depends` from an enabled module.
	///
	/// Walks the graph depth-first with an explicit stack. A dependency that
	/// leads back onto the current path is reported as a cycle.
	pub fn expand(&mut self, graph: &ModuleGraph) -> Result<()> {
		let roots: Vec<String> = self.enabled().map(str::to_string).collect();
		let mut done: HashSet<&str> = HashSet::new();

		for root in &roots {
			let module = graph.get(root).ok_or_else(|| Error::UnknownModule {
				name: root.clone(),
				required_by: None
			})?;

			if done.contains(module.name.as_str()) {
				continue;
			}

			let mut stack: Vec<(&Module, usize)> = vec![(module, 0)];

			while let Some(&(module, next)) = stack.last() {
				let Some(dep) = module.depends.get(next) else {
					done.insert(module.name.as_str());
					stack.pop();
					continue;
				};

				if let Some(top) = stack.last_mut() {
					top.1 += 1;
				}

				if done.contains(dep.as_str()) {
					continue;
				}

				if let Some(pos) = stack.iter().position(|(m, _)| m.name == *dep) {
					let mut cycle: Vec<String> = stack[pos..]
						.iter()
						.map(|(m, _)| m.name.clone())
						.collect();
					cycle.push(dep.clone());
					return Err(Error::CyclicDependency { cycle });
				}

				let dep_module = graph.get(dep).ok_or_else(|| Error::UnknownModule {
					name: dep.clone(),
					required_by: Some(module.name.clone())
				})?;
				stack.push((dep_module, 0));
			}
		}

		for name in done {
			self.modules.insert(name.to_string(), true);
		}

		Ok(())
	}
}
