use markdown::Options;

use crate::MdxpError;
use crate::MdxpResult;
use crate::block_parser::ParserExtensions;
use crate::scanner::parse_document;
use crate::tree::NodeKind;

/// Turns the preprocessed document text into the final artifact.
pub trait DocumentCompiler {
	fn compile(&self, text: &str) -> MdxpResult<String>;
}

impl<F> DocumentCompiler for F
where
	F: Fn(&str) -> MdxpResult<String>,
{
	fn compile(&self, text: &str) -> MdxpResult<String> {
		self(text)
	}
}

/// Returns the preprocessed text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl DocumentCompiler for Passthrough {
	fn compile(&self, text: &str) -> MdxpResult<String> {
		Ok(text.to_string())
	}
}

/// Renders the prose of a document to HTML with GitHub flavored markdown.
/// Top level statement blocks are dropped and the front matter block is
/// recognized and left out of the output.
#[derive(Default)]
pub struct HtmlCompiler {
	extensions: ParserExtensions,
}

impl HtmlCompiler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Use the given extensions when looking for statement blocks.
	#[must_use]
	pub fn with_extensions(mut self, extensions: ParserExtensions) -> Self {
		self.extensions = extensions;
		self
	}
}

impl DocumentCompiler for HtmlCompiler {
	fn compile(&self, text: &str) -> MdxpResult<String> {
		let prose = strip_statements(text, &self.extensions)?;
		let mut options = Options::gfm();
		options.parse.constructs.frontmatter = true;

		markdown::to_html_with_options(&prose, &options)
			.map_err(|error| MdxpError::Compile(error.to_string()))
	}
}

/// Remove every top level statement block from `text`. Line endings are
/// normalized to `\n` in the result.
fn strip_statements(text: &str, extensions: &ParserExtensions) -> MdxpResult<String> {
	let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
	let tree = parse_document(&normalized, extensions)?;
	let mut prose = String::with_capacity(normalized.len());
	let mut offset = 0;

	for node in &tree.children {
		if matches!(node.kind, NodeKind::Statement(_)) {
			prose.push_str(&normalized[offset..node.span.start]);
			offset = node.span.end;
		}
	}

	prose.push_str(&normalized[offset..]);

	Ok(prose)
}
