use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Inject default layouts into mdx documents that do not export their own.",
	long_about = "mdxp preprocesses mdx documents before they reach a component compiler.\n\nIt \
	              reads the front matter, looks for an `export default` statement and, when the \
	              document has none, injects the layout configured for its content group in \
	              `mdxp.toml`.\n\nQuick start:\n  mdxp process page.mdx   Print the compiler \
	              input\n  mdxp metadata page.mdx  Print the front matter as JSON\n  mdxp scan \
	              *.mdx        Report which documents export a default"
)]
pub struct MdxpCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory, where `mdxp.toml` is looked up.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Preprocess a document and print the text handed to the compiler.
	///
	/// When the document has no default export and a layout is configured
	/// for its content group (or passed with `--layout`), the layout is
	/// imported and exported as the default. Front matter stays at the top
	/// and the body is never changed.
	Process {
		/// The document to preprocess.
		file: PathBuf,

		/// Content group used to pick a layout from `[layouts]`. Falls back
		/// to the `default` layout.
		#[arg(long, short)]
		group: Option<String>,

		/// Layout to inject, overriding the configured layouts.
		#[arg(long, short)]
		layout: Option<String>,

		/// Render the result to HTML instead of printing the compiler input.
		#[arg(long, default_value_t = false)]
		html: bool,

		/// Output format. Use `text` for the processed document or `json` for
		/// the document together with its metadata.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Print the front matter of a document without scanning or compiling
	/// it.
	Metadata {
		/// The document to read.
		file: PathBuf,

		/// Print the metadata-only module that re-exports the component from
		/// this request path instead of JSON.
		#[arg(long)]
		module: Option<String>,
	},
	/// Report whether each document declares a default export.
	///
	/// Exits with a non-zero status code when any document cannot be read
	/// or parsed. Block quotes and list items nested more than 64 levels
	/// deep are reported as parse failures.
	Scan {
		/// The documents to scan.
		#[arg(required = true)]
		files: Vec<PathBuf>,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// The processed document as plain text.
	Text,
	/// JSON output for programmatic consumption, including the metadata and
	/// whether a layout was injected.
	Json,
}
