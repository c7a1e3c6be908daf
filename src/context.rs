use crate::error::{Error, Result};
use crate::modules::ModuleGraph;
use crate::options::{OpenGl, OptionSet};
use crate::target::{Os, Platform};

/// Everything one invocation knows about the build, resolved once and then read-only.
#[derive(Debug)]
pub struct Context {
	pub graph: ModuleGraph,
	pub platform: Platform,
	pub options: OptionSet,
	pub extra_config: Vec<(String, String)>
}

impl Context {
	/// Applies option implications and platform overrides, then expands the module closure.
	pub fn resolve(graph: ModuleGraph, platform: Platform, mut options: OptionSet) -> Result<Self> {
		if !graph.contains("qtbase") {
			return Err(Error::UnknownModule {
				name: "qtbase".to_string(),
				required_by: None
			});
		}
		options.modules.insert("qtbase".to_string(), true);
		options.expand(&graph)?;

		let os = platform.target.os;

		if options.widgets || options.is_enabled("qtdeclarative") {
			let reason = if options.widgets { "widgets" } else { "qtdeclarative" };
			if options.gui == Some(false) {
				return Err(Error::conflict(format!("{} requires gui, but gui is disabled", reason)));
			}
			options.gui = Some(true);
		}

		match (options.gui, options.opengl) {
			(Some(false), Some(gl)) if gl != OpenGl::No => {
				return Err(Error::conflict("opengl requires gui, but gui is disabled"));
			}
			(None, Some(gl)) if gl != OpenGl::No => options.gui = Some(true),
			(None, _) => options.gui = Some(false),
			_ => {}
		}

		if !options.gui() {
			options.opengl = Some(OpenGl::No);
		}

		if (os.is_mobile() || os == Os::Emscripten) && options.opengl() != OpenGl::No {
			if options.opengl() != OpenGl::Es2 {
				println!("info: {} only supports OpenGL ES 2, switching opengl to es2", os);
			}
			options.opengl = Some(OpenGl::Es2);
		}
		options.opengl = Some(options.opengl());

		if os == Os::Emscripten && options.shared {
			println!("info: Emscripten builds are static, disabling shared");
			options.shared = false;
		}

		if !options.styles.is_empty() && !options.widgets {
			return Err(Error::conflict("widget styles require widgets"));
		}

		if os == Os::Android && platform.target.arch.android_abi().is_none() {
			return Err(Error::conflict(format!("no Android ABI for {}", platform.target.arch)));
		}

		if platform.is_cross() {
			if matches!(os, Os::Windows | Os::Macos) && os != platform.build.os {
				return Err(Error::conflict(format!("cross-building for {} is not supported", os)));
			}
			if options.is_host() {
				return Err(Error::conflict("a host build cannot target another machine"));
			}
			if platform.target.host_path.is_none() {
				return Err(Error::conflict(
					"cross-building needs target.host_path (build the host tools with --host first)"));
			}
		}

		let extra_config = options.extra_config()?;

		for module in graph.iter().filter(|module| options.is_enabled(&module.name)) {
			for recommended in &module.recommends {
				if graph.contains(recommended) && !options.is_enabled(recommended) {
					println!("info: {} recommends {}, which is disabled", module.name, recommended);
				}
			}
		}

		Ok(Self {
			graph,
			platform,
			options,
			extra_config
		})
	}

	/// Enabled modules in document order.
	pub fn enabled_modules(&self) -> Vec<&str> {
		self.graph.iter()
			.filter(|module| self.options.is_enabled(&module.name))
			.map(|module| module.name.as_str())
			.collect()
	}
}
