use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum MdxpError {
	#[error(transparent)]
	#[diagnostic(code(mdxp::io_error))]
	Io(#[from] std::io::Error),

	#[error("malformed front matter: {reason}")]
	#[diagnostic(
		code(mdxp::malformed_metadata),
		help("front matter must be a mapping enclosed by `---` lines at the very start of the document")
	)]
	MalformedMetadata { reason: String },

	#[error("failed to parse document at byte {offset}: {reason}")]
	#[diagnostic(code(mdxp::parse))]
	Parse { offset: usize, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(mdxp::config_parse),
		help("check that mdxp.toml is valid TOML with [layouts] and/or [front_matter] sections")
	)]
	ConfigParse(String),

	#[error("front matter cannot be represented as JSON: {0}")]
	#[diagnostic(
		code(mdxp::metadata_json),
		help("front matter keys must be strings to be exported as `_frontmatter`")
	)]
	MetadataJson(String),

	#[error("document compilation failed: {0}")]
	#[diagnostic(code(mdxp::compile))]
	Compile(String),
}

impl MdxpError {
	pub(crate) fn parse(offset: usize, reason: impl Into<String>) -> Self {
		Self::Parse {
			offset,
			reason: reason.into(),
		}
	}

	pub(crate) fn malformed(reason: impl Into<String>) -> Self {
		Self::MalformedMetadata {
			reason: reason.into(),
		}
	}
}

pub type MdxpResult<T> = Result<T, MdxpError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
