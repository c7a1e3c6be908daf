use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("failed to fetch {source_name}: {reason}")]
	Fetch {
		source_name: String,
		reason: String
	},

	#[error("failed to parse {document}:{line}: {message}")]
	Parse {
		document: String,
		line: usize,
		message: String
	},

	#[error("unknown module {name}{}", required_by.as_ref().map(|m| format!(" (required by {})", m)).unwrap_or_default())]
	UnknownModule {
		name: String,
		required_by: Option<String>
	},

	#[error("cyclic module dependency: {}", cycle.join(" -> "))]
	CyclicDependency {
		cycle: Vec<String>
	},

	#[error("conflicting options: {0}")]
	ConfigurationConflict(String),

	#[error("module list is for qtbase {found}, expected {expected}")]
	VersionMismatch {
		expected: String,
		found: String
	},

	#[error("invalid option {name}: {message}")]
	InvalidOption {
		name: String,
		message: String
	},

	#[error("failed to parse {}: {message}", path.display())]
	Config {
		path: PathBuf,
		message: String
	},

	#[error("{tool} not found in PATH: {reason}")]
	MissingTool {
		tool: String,
		reason: String
	},

	#[error("failed to patch {}: {message}", file.display())]
	Patch {
		file: PathBuf,
		message: String
	},

	#[error("{context}: {source}")]
	Io {
		context: String,
		#[source]
		source: std::io::Error
	},

	#[error("{tool} failed with {status}{}", if output.is_empty() { String::new() } else { format!("\n{}", output) })]
	BuildFailed {
		tool: String,
		status: ExitStatus,
		output: String
	}
}

impl Error {
	pub fn parse(document: &str, line: usize, message: impl Into<String>) -> Self {
		Self::Parse {
			document: document.to_string(),
			line,
			message: message.into()
		}
	}

	pub fn conflict(message: impl Into<String>) -> Self {
		Self::ConfigurationConflict(message.into())
	}

	pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
		Self::Io {
			context: context.into(),
			source
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;
