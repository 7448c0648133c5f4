use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use mdxp_cli::Commands;
use mdxp_cli::MdxpCli;
use mdxp_cli::OutputFormat;
use mdxp_core::AnyEmptyResult;
use mdxp_core::AnyResult;
use mdxp_core::CompiledDocument;
use mdxp_core::DEFAULT_LAYOUT_KEY;
use mdxp_core::DefaultLayouts;
use mdxp_core::Document;
use mdxp_core::DocumentCompiler;
use mdxp_core::HtmlCompiler;
use mdxp_core::MdxpConfig;
use mdxp_core::MdxpError;
use mdxp_core::OutputMode;
use mdxp_core::ParserExtensions;
use mdxp_core::Passthrough;
use mdxp_core::Preprocessor;
use mdxp_core::Processed;
use mdxp_core::extract_with_options;
use mdxp_core::has_default_export;
use mdxp_core::metadata_module;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "MDXP_LOG";

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = MdxpCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Process {
			file,
			group,
			layout,
			html,
			format,
		}) => run_process(&args, file, group.as_deref(), layout.as_deref(), *html, *format),
		Some(Commands::Metadata { file, module }) => run_metadata(&args, file, module.as_deref()),
		Some(Commands::Scan { files }) => {
			match run_scan(&args, files) {
				Ok(true) => Ok(()),
				Ok(false) => process::exit(1),
				Err(e) => Err(e),
			}
		}
		None => {
			eprintln!("No subcommand specified. Run `mdxp --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		report_error(e);
		process::exit(2);
	}
}

/// Log to stderr so that stdout only carries command output.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_directive = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));

	tracing_subscriber::registry()
		.with(filter)
		.with(
			tracing_subscriber::fmt::layer()
				.with_writer(std::io::stderr)
				.with_ansi(use_color),
		)
		.init();
}

fn report_error(e: Box<dyn std::error::Error>) {
	// Try to render through miette for rich diagnostics with help text and
	// error codes.
	match e.downcast::<MdxpError>() {
		Ok(mdxp_err) => {
			let report: miette::Report = (*mdxp_err).into();
			eprintln!("{report:?}");
		}
		Err(e) => {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

fn resolve_root(args: &MdxpCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn load_config(args: &MdxpCli) -> AnyResult<MdxpConfig> {
	let root = resolve_root(args);
	let config = MdxpConfig::load(&root)?;

	if config.is_none() {
		tracing::debug!(root = %root.display(), "no mdxp.toml found, using defaults");
	}

	Ok(config.unwrap_or_default())
}

fn read_document(path: &Path) -> AnyResult<String> {
	std::fs::read_to_string(path)
		.map_err(|e| format!("failed to read {}: {e}", path.display()).into())
}

fn run_process(
	args: &MdxpCli,
	file: &Path,
	group: Option<&str>,
	layout: Option<&str>,
	html: bool,
	format: OutputFormat,
) -> AnyEmptyResult {
	let mut config = load_config(args)?;
	let content = read_document(file)?;

	if let Some(layout) = layout {
		config.layouts = DefaultLayouts::new().with(DEFAULT_LAYOUT_KEY, layout);
	}

	let mut document = Document::new(&content);
	if let Some(group) = group {
		document = document.with_group(group);
	}

	let compiled = if html {
		compile(config, HtmlCompiler::new(), &document)?
	} else {
		compile(config, Passthrough, &document)?
	};

	match format {
		OutputFormat::Text => print!("{}", compiled.compiled),
		OutputFormat::Json => {
			let output = serde_json::json!({
				"file": file.display().to_string(),
				"layoutInjected": compiled.layout_injected,
				"metadata": compiled.metadata.to_json()?,
				"compileInput": compiled.compile_input,
				"compiled": compiled.compiled,
			});
			println!("{}", serde_json::to_string_pretty(&output)?);
		}
	}

	Ok(())
}

fn compile<C: DocumentCompiler>(
	config: MdxpConfig,
	compiler: C,
	document: &Document<'_>,
) -> AnyResult<CompiledDocument> {
	let preprocessor = Preprocessor::from_config(config, compiler);

	match preprocessor.process(document, OutputMode::Component)? {
		Processed::Component(compiled) => Ok(compiled),
		Processed::MetadataOnly(_) => Err("expected a compiled document".into()),
	}
}

fn run_metadata(args: &MdxpCli, file: &Path, module: Option<&str>) -> AnyEmptyResult {
	let config = load_config(args)?;
	let content = read_document(file)?;
	let metadata = Preprocessor::from_config(config, Passthrough)
		.process(&Document::new(&content), OutputMode::MetadataOnly)?
		.into_metadata();

	match module {
		Some(request_path) => println!("{}", metadata_module(request_path, &metadata)?),
		None => println!("{}", serde_json::to_string_pretty(&metadata.to_json()?)?),
	}

	Ok(())
}

/// Returns `false` when any document failed to scan.
fn run_scan(args: &MdxpCli, files: &[PathBuf]) -> AnyResult<bool> {
	let config = load_config(args)?;
	let extensions = ParserExtensions::new();
	let mut all_ok = true;

	for file in files {
		let result = read_document(file).and_then(|content| {
			let front_matter = extract_with_options(&content, &config.front_matter)?;
			Ok(has_default_export(&front_matter.body, &extensions)?)
		});

		match result {
			Ok(true) => {
				println!("{}: {}", file.display(), colored!("default export", green));
			}
			Ok(false) => {
				println!("{}: {}", file.display(), colored!("no default export", yellow));
			}
			Err(e) => {
				all_ok = false;
				eprintln!("{} {}", colored!("failed:", red), file.display());
				report_error(e);
			}
		}
	}

	Ok(all_ok)
}
