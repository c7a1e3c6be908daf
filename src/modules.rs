//! Qt submodule graph, read from the `.gitmodules` file of the qt5 super-repository.

use std::collections::HashMap;
use std::fmt;
use std::fs::read_to_string;
use std::str::FromStr;
use crate::error::{Error, Result};

pub const DEFAULT_SOURCE: &str = "https://code.qt.io/cgit/qt/qt5.git/plain/.gitmodules?h={version}";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
	Essential,
	Addon,
	Deprecated,
	Preview,
	Ignore,
	Obsolete
}

impl FromStr for Status {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"essential" => Ok(Status::Essential),
			"addon" => Ok(Status::Addon),
			"deprecated" => Ok(Status::Deprecated),
			"preview" => Ok(Status::Preview),
			"ignore" => Ok(Status::Ignore),
			"obsolete" => Ok(Status::Obsolete),
			other => Err(format!("unknown module status {}", other))
		}
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Status::Essential => "essential",
			Status::Addon => "addon",
			Status::Deprecated => "deprecated",
			Status::Preview => "preview",
			Status::Ignore => "ignore",
			Status::Obsolete => "obsolete"
		})
	}
}

/// Which modules survive loading.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatusFilter {
	/// Everything except `obsolete` and `ignore`.
	Active,
	Only(Status)
}

impl StatusFilter {
	fn accepts(&self, status: Status) -> bool {
		match self {
			StatusFilter::Active => !matches!(status, Status::Obsolete | Status::Ignore),
			StatusFilter::Only(wanted) => *wanted == status
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Module {
	pub name: String,
	pub branch: String,
	pub status: Status,
	pub path: String,
	pub depends: Vec<String>,
	pub recommends: Vec<String>
}

/// Modules in document order.
#[derive(Clone, Debug, Default)]
pub struct ModuleGraph {
	modules: Vec<Module>,
	index: HashMap<String, usize>
}

impl ModuleGraph {
	pub fn from_modules(modules: Vec<Module>) -> Self {
		let index = modules.iter()
			.enumerate()
			.map(|(i, module)| (module.name.clone(), i))
			.collect();
		Self {
			modules,
			index
		}
	}

	pub fn get(&self, name: &str) -> Option<&Module> {
		self.index.get(name).map(|&i| &self.modules[i])
	}

	pub fn contains(&self, name: &str) -> bool {
		self.index.contains_key(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Module> {
		self.modules.iter()
	}

	pub fn len(&self) -> usize {
		self.modules.len()
	}

	/// Parses a `.gitmodules` document. `document` only names the input in errors.
	pub fn parse(data: &str, document: &str, filter: StatusFilter) -> Result<Self> {
		struct Section {
			name: String,
			line: usize,
			values: HashMap<String, String>
		}

		let mut sections: Vec<Section> = Vec::new();

		for (i, raw) in data.lines().enumerate() {
			let line_no = i + 1;
			let line = raw.trim();
			if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
				continue;
			}

			if let Some(header) = line.strip_prefix('[') {
				let header = header.strip_suffix(']')
					.ok_or_else(|| Error::parse(document, line_no, "unterminated section header"))?;
				if !header.starts_with("submodule ") {
					return Err(Error::parse(document, line_no, format!("unexpected section [{}]", header)));
				}
				if header.matches('"').count() != 2 {
					return Err(Error::parse(document, line_no, format!("section [{}] must quote the module name", header)));
				}

				let start = header.find('"').unwrap_or_default() + 1;
				let end = header.rfind('"').unwrap_or_default();
				let name = header[start..end].trim();
				if name.is_empty() {
					return Err(Error::parse(document, line_no, "empty module name"));
				}
				if sections.iter().any(|section| section.name == name) {
					return Err(Error::parse(document, line_no, format!("duplicate module {}", name)));
				}

				sections.push(Section {
					name: name.to_string(),
					line: line_no,
					values: HashMap::new()
				});
				continue;
			}

			let Some((key, value)) = line.split_once('=') else {
				return Err(Error::parse(document, line_no, format!("expected key = value, found {}", line)));
			};
			let Some(section) = sections.last_mut() else {
				return Err(Error::parse(document, line_no, format!("{} outside of a section", key.trim())));
			};
			let key = key.trim().to_lowercase();
			if section.values.contains_key(&key) {
				return Err(Error::parse(document, line_no, format!("duplicate key {} in module {}", key, section.name)));
			}
			section.values.insert(key, value.trim().to_string());
		}

		if sections.is_empty() {
			return Err(Error::parse(document, 0, "no submodule sections"));
		}

		let mut modules = Vec::new();
		for mut section in sections {
			let mut required = |key: &str| {
				section.values.remove(key).ok_or_else(|| Error::parse(
					document,
					section.line,
					format!("module {} is missing {}", section.name, key)))
			};

			let branch = required("branch")?;
			let path = required("path")?;
			let status = required("status")?
				.parse::<Status>()
				.map_err(|e| Error::parse(document, section.line, e))?;

			if !filter.accepts(status) {
				continue;
			}

			let list = |value: Option<&String>| -> Vec<String> {
				value
					.map(|value| value.split_whitespace().map(str::to_string).collect())
					.unwrap_or_default()
			};

			modules.push(Module {
				depends: list(section.values.get("depends")),
				recommends: list(section.values.get("recommends")),
				name: section.name,
				branch,
				status,
				path
			});
		}

		Ok(Self::from_modules(modules))
	}

	/// Loads the module list for `version` from a URL or file path template.
	pub fn load(source: &str, version: &str, filter: StatusFilter) -> Result<Self> {
		let location = source.replace("{version}", version);
		let data = fetch(&location)?;
		let graph = Self::parse(&data, &location, filter)?;

		if let Some(qtbase) = graph.get("qtbase") {
			if qtbase.branch != version {
				return Err(Error::VersionMismatch {
					expected: version.to_string(),
					found: qtbase.branch.clone()
				});
			}
		}

		Ok(graph)
	}
}

fn fetch(location: &str) -> Result<String> {
	let fetch_error = |reason: String| Error::Fetch {
		source_name: location.to_string(),
		reason
	};

	if location.starts_with("http://") || location.starts_with("https://") {
		println!("info: fetching module list from {}", location);

		reqwest::blocking::get(location)
			.and_then(|response| response.error_for_status())
			.and_then(|response| response.text())
			.map_err(|e| fetch_error(e.to_string()))
	} else {
		read_to_string(location).map_err(|e| fetch_error(e.to_string()))
	}
}
