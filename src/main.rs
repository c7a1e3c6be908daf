mod cmake;
mod config;
mod context;
mod error;
mod exec;
mod flags;
mod modules;
mod options;
mod package;
mod recipe;
mod source;
mod sysdeps;
mod target;

use std::path::Path;
use std::process::exit;
use clap::{Parser, ValueEnum};
use crate::cmake::CMake;
use crate::config::{Config, Paths};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::modules::{ModuleGraph, Status, StatusFilter};
use crate::options::OptionSet;
use crate::recipe::{Recipe, Vars};
use crate::source::{remove_file, touch_file};
use crate::sysdeps::Installer;
use crate::target::{Platform, Target};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Op {
	Prepare,
	Configure,
	Build,
	Install,
	/// equivalent to build install --force
	Rebuild,
	/// list the modules and whether they are enabled
	Modules,
	/// print the CMake flags a configure would use
	Flags,
	/// list the distribution packages the build needs
	Sysdeps
}

fn parse_key_value(arg: &str) -> std::result::Result<(String, String), String> {
	arg.split_once('=')
		.map(|(name, value)| (name.to_string(), value.to_string()))
		.ok_or_else(|| format!("expected <name>=<value>, found {}", arg))
}

fn parse_status(arg: &str) -> std::result::Result<Status, String> {
	arg.parse()
}

#[derive(Parser, Debug)]
#[command(name = "qtpkg", about = "Fetch, configure, build and package Qt from source")]
struct Args {
	#[arg(value_enum, required = true)]
	ops: Vec<Op>,
	#[arg(long)]
	force: bool,
	/// build the tools Qt used by cross builds, for the build machine
	#[arg(long)]
	host: bool,
	/// path to qtpkg.toml
	#[arg(long)]
	config: Option<String>,
	/// with modules, list every module of this status instead
	#[arg(long, value_parser = parse_status)]
	status: Option<Status>,
	#[arg(long = "env", value_name = "NAME=VALUE", value_parser = parse_key_value)]
	env: Vec<(String, String)>,
	/// override an option or toggle a module
	#[arg(short = 'o', long = "option", value_name = "NAME=VALUE", value_parser = parse_key_value)]
	options: Vec<(String, String)>
}

#[derive(Default)]
struct Steps {
	prepare: bool,
	configure: bool,
	build: bool,
	install: bool,
	force_prepare: bool,
	force_configure: bool,
	force_build: bool,
	force_install: bool
}

impl Steps {
	fn new(ops: &[Op], mut force: bool) -> Self {
		let mut steps = Steps::default();

		for op in ops {
			match op {
				Op::Prepare => steps.prepare = true,
				Op::Configure => steps.configure = true,
				Op::Build => steps.build = true,
				Op::Install => steps.install = true,
				Op::Rebuild => {
					steps.build = true;
					steps.install = true;
					force = true;
				}
				Op::Modules | Op::Flags | Op::Sysdeps => {}
			}
		}

		if force {
			steps.force_prepare = steps.prepare;
			steps.force_configure = steps.configure;
			steps.force_build = steps.build;
			steps.force_install = steps.install;
		}

		if steps.install {
			steps.prepare = true;
			steps.configure = true;
			steps.build = true;
		} else if steps.build {
			steps.prepare = true;
			steps.configure = true;
		} else if steps.configure {
			steps.prepare = true;
		}

		steps
	}

	fn needs_context(&self) -> bool {
		self.configure || self.install
	}
}

fn platform(config: &Config, name: &str, host: bool) -> Result<Platform> {
	let build = config.build_machine().ok_or_else(|| Error::conflict(
		"unknown build machine, set [build] os and arch in qtpkg.toml"))?;

	if host {
		return Ok(Platform { target: Target::native(build), build });
	}

	let mut platform = Platform { target: config.target.clone(), build };
	if platform.is_cross() && platform.target.host_path.is_none() {
		let host_pkg = Paths::new(&config.general, name, true).package;
		if host_pkg.exists() {
			println!("info: using host tools from {}", host_pkg.display());
			platform.target.host_path = Some(host_pkg.to_string_lossy().into_owned());
		}
	}
	Ok(platform)
}

fn resolve_context(args: &Args, config: &Config, recipe: &Recipe, platform: Platform) -> Result<Context> {
	let mut options = if args.host {
		OptionSet::host()
	} else {
		config.options.clone()
	};
	for (name, value) in &args.options {
		options.set(name, value)?;
	}

	let graph = ModuleGraph::load(&config.general.modules_source, &recipe.general.version, StatusFilter::Active)?;
	Context::resolve(graph, platform, options)
}

fn print_modules(ctx: &Context) {
	println!("info: {} modules, {} enabled", ctx.graph.len(), ctx.enabled_modules().len());
	for module in ctx.graph.iter() {
		let mark = if ctx.options.is_enabled(&module.name) { "*" } else { " " };
		if module.depends.is_empty() {
			println!("{} {} ({})", mark, module.name, module.status);
		} else {
			println!("{} {} ({}) -> {}", mark, module.name, module.status, module.depends.join(" "));
		}
	}
}

fn print_sysdeps(ctx: &Context) {
	match Installer::detect() {
		Some(installer) => {
			let packages = sysdeps::packages(installer, ctx);
			if packages.is_empty() {
				println!("info: no system packages needed");
			} else {
				println!("{} {}", installer.install_command(), packages.join(" "));
			}
		}
		None => eprintln!("warning: couldn't detect a package installer, skipping system requirements")
	}
}

fn build_steps(steps: &Steps, args: &Args, ctx: &Context, recipe: &Recipe, paths: &Paths, threads: usize) -> Result<()> {
	let src_dir = paths.sources.join(&recipe.general.checkout);
	let cmake = CMake::new(&src_dir, &paths.build, &args.env)?;

	if steps.configure {
		if steps.force_configure && paths.build.exists() {
			println!("info: forcing configure for {}", recipe.general.name);
			std::fs::remove_dir_all(&paths.build)
				.map_err(|e| Error::io(format!("failed to remove {}", paths.build.display()), e))?;
		}

		if !paths.build.join("qtpkg.configured").exists() {
			println!("info: building Qt submodules: {}", ctx.enabled_modules().join(" "));
			println!("info: configuring {}", recipe.general.name);
			cmake.configure(&flags::project(ctx), &recipe.general.cmake_args)?;
			touch_file(paths.build.join("qtpkg.configured"))?;
		}
	}

	if steps.build {
		if steps.force_build {
			println!("info: forcing build for {}", recipe.general.name);
			remove_file(paths.build.join("qtpkg.built"))?;
		}

		if !paths.build.join("qtpkg.built").exists() {
			println!("info: building {}", recipe.general.name);
			cmake.build(threads)?;
			touch_file(paths.build.join("qtpkg.built"))?;
		}
	}

	if steps.install {
		if steps.force_install {
			println!("info: forcing install for {}", recipe.general.name);
			remove_file(paths.build.join("qtpkg.installed"))?;
		}

		if !paths.build.join("qtpkg.installed").exists() {
			println!("info: installing {}", recipe.general.name);
			cmake.install(&paths.package)?;
			package::finish(ctx, &paths.package, &paths.meta)?;
			touch_file(paths.build.join("qtpkg.installed"))?;
		}
	}

	Ok(())
}

fn run(args: Args) -> Result<()> {
	let config = Config::load(args.config.as_deref())?;
	let mut recipe = Recipe::load(Path::new(&config.general.recipe))?;
	let paths = Paths::new(&config.general, &recipe.general.name, args.host);
	let threads = config.general.threads;

	let src_dir = paths.sources.join(&recipe.general.checkout);
	recipe.finalize(&Vars {
		src_dir: &src_dir,
		build_root: &paths.build_root,
		threads,
		others: &config.general.others
	})?;

	let steps = Steps::new(&args.ops, args.force);
	let inspect = args.ops.iter().any(|op| matches!(op, Op::Modules | Op::Flags | Op::Sysdeps));

	let ctx = if steps.needs_context() || inspect {
		let platform = platform(&config, &recipe.general.name, args.host)?;
		Some(resolve_context(&args, &config, &recipe, platform)?)
	} else {
		None
	};

	if let Some(ctx) = &ctx {
		for op in &args.ops {
			match op {
				Op::Modules => match args.status {
					Some(status) => {
						let graph = ModuleGraph::load(
							&config.general.modules_source,
							&recipe.general.version,
							StatusFilter::Only(status))?;
						for module in graph.iter() {
							println!("{} ({})", module.name, module.status);
						}
					}
					None => print_modules(ctx)
				},
				Op::Flags => {
					for arg in flags::cmake_args(&flags::project(ctx)) {
						println!("{}", arg);
					}
				}
				Op::Sysdeps => print_sysdeps(ctx),
				_ => {}
			}
		}
	}

	if steps.prepare {
		source::prepare(&recipe, &paths.sources, threads, steps.force_prepare)?;
	}

	if let Some(ctx) = &ctx {
		if steps.needs_context() {
			build_steps(&steps, &args, ctx, &recipe, &paths, threads)?;
		}
	}

	Ok(())
}

fn main() {
	let args = Args::parse();

	if let Err(e) = run(args) {
		eprintln!("error: {}", e);
		exit(1);
	}
}
