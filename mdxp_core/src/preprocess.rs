use std::borrow::Cow;
use std::fmt::Write as _;

use crate::MdxpResult;
use crate::block_parser::ParserExtension;
use crate::block_parser::ParserExtensions;
use crate::compiler::DocumentCompiler;
use crate::config::MdxpConfig;
use crate::front_matter::FrontMatterOptions;
use crate::front_matter::Metadata;
use crate::front_matter::extract_with_options;
use crate::layout::DEFAULT_LAYOUT_KEY;
use crate::layout::DefaultLayouts;
use crate::layout::LayoutResolver;
use crate::layout::slash;
use crate::rewriter::rewrite;
use crate::scanner::has_default_export;

/// Query appended to the request path of the full component in a
/// [`metadata_module`].
pub const COMPONENT_QUERY: &str = "?type=component";

/// A document to preprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Document<'a> {
	pub content: &'a str,
	/// Content group used to pick a layout. Documents without a group use
	/// the [`DEFAULT_LAYOUT_KEY`] layout.
	pub group: Option<&'a str>,
}

impl<'a> Document<'a> {
	pub fn new(content: &'a str) -> Self {
		Self {
			content,
			group: None,
		}
	}

	#[must_use]
	pub fn with_group(mut self, group: &'a str) -> Self {
		self.group = Some(group);
		self
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
	/// Scan, inject a layout when needed and compile.
	#[default]
	Component,
	/// Only extract the metadata. Nothing is scanned or compiled.
	MetadataOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDocument {
	/// The text handed to the compiler.
	pub compile_input: String,
	/// The compiler's output.
	pub compiled: String,
	pub metadata: Metadata,
	/// Whether a layout import and default export were injected.
	pub layout_injected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Processed {
	Component(CompiledDocument),
	MetadataOnly(Metadata),
}

impl Processed {
	pub fn metadata(&self) -> &Metadata {
		match self {
			Self::Component(document) => &document.metadata,
			Self::MetadataOnly(metadata) => metadata,
		}
	}

	pub fn into_metadata(self) -> Metadata {
		match self {
			Self::Component(document) => document.metadata,
			Self::MetadataOnly(metadata) => metadata,
		}
	}

	pub fn component(&self) -> Option<&CompiledDocument> {
		match self {
			Self::Component(document) => Some(document),
			Self::MetadataOnly(_) => None,
		}
	}
}

/// Runs documents through front matter extraction, default export scanning,
/// layout injection and compilation.
pub struct Preprocessor<R, C> {
	resolver: R,
	compiler: C,
	extensions: ParserExtensions,
	front_matter: FrontMatterOptions,
}

impl<R, C> Preprocessor<R, C>
where
	R: LayoutResolver,
	C: DocumentCompiler,
{
	pub fn new(resolver: R, compiler: C) -> Self {
		Self {
			resolver,
			compiler,
			extensions: ParserExtensions::new(),
			front_matter: FrontMatterOptions::default(),
		}
	}

	/// Apply an additional parser extension when scanning for a default
	/// export.
	#[must_use]
	pub fn with_extension(mut self, extension: impl ParserExtension + 'static) -> Self {
		self.extensions.push(Box::new(extension));
		self
	}

	#[must_use]
	pub fn with_extensions(mut self, extensions: ParserExtensions) -> Self {
		self.extensions = extensions;
		self
	}

	#[must_use]
	pub fn with_front_matter(mut self, front_matter: FrontMatterOptions) -> Self {
		self.front_matter = front_matter;
		self
	}

	pub fn compiler(&self) -> &C {
		&self.compiler
	}

	pub fn process(&self, document: &Document<'_>, mode: OutputMode) -> MdxpResult<Processed> {
		let front_matter = extract_with_options(document.content, &self.front_matter)?;

		if mode == OutputMode::MetadataOnly {
			return Ok(Processed::MetadataOnly(front_matter.metadata));
		}

		let layout = self
			.resolver
			.resolve(document.group.unwrap_or(DEFAULT_LAYOUT_KEY));
		let exports_default = has_default_export(&front_matter.body, &self.extensions)?;
		let compile_input = rewrite(
			document.content,
			&front_matter,
			exports_default,
			layout.as_deref(),
		);
		let layout_injected = matches!(compile_input, Cow::Owned(_));

		if layout_injected {
			tracing::debug!(
				layout = layout.as_deref().unwrap_or_default(),
				group = document.group.unwrap_or(DEFAULT_LAYOUT_KEY),
				"inserting default layout"
			);
		}

		let compiled = self.compiler.compile(&compile_input)?;

		Ok(Processed::Component(CompiledDocument {
			compile_input: compile_input.into_owned(),
			compiled,
			metadata: front_matter.metadata,
			layout_injected,
		}))
	}
}

impl<C: DocumentCompiler> Preprocessor<DefaultLayouts, C> {
	/// Use the layouts and front matter options from a loaded config.
	pub fn from_config(config: MdxpConfig, compiler: C) -> Self {
		Self::new(config.layouts, compiler).with_front_matter(config.front_matter)
	}
}

impl<R, C> std::fmt::Debug for Preprocessor<R, C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Preprocessor")
			.field("extensions", &self.extensions)
			.field("front_matter", &self.front_matter)
			.finish_non_exhaustive()
	}
}

/// Render the lightweight module served instead of the full component when
/// only the metadata is wanted. It re-exports the component from
/// `request_path` and exposes the metadata as `_frontmatter`.
///
/// ```text
/// import MDXContent from "/posts/hello.mdx?type=component";
/// export default MDXContent;
/// export * from "/posts/hello.mdx?type=component"
///
/// export const _frontmatter = {"title":"Hello"};
/// ```
pub fn metadata_module(request_path: &str, metadata: &Metadata) -> MdxpResult<String> {
	let path = slash(request_path);
	let separator = if path.starts_with('/') { "" } else { "/" };
	let request = format!("{separator}{path}{COMPONENT_QUERY}");
	let json = metadata.to_json()?.to_string();
	let mut module = String::new();

	let _ = writeln!(module, "import MDXContent from \"{request}\";");
	let _ = writeln!(module, "export default MDXContent;");
	let _ = writeln!(module, "export * from \"{request}\"");
	let _ = writeln!(module);
	let _ = write!(module, "export const _frontmatter = {json};");

	Ok(module)
}
