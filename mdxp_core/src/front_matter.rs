//! Front matter extraction and serialization.
//!
//! A document may open with a metadata block fenced by a delimiter line
//! (`---` by default):
//!
//! ```text
//! ---
//! title: Hello
//! ---
//! # Hello
//! ```
//!
//! The opening delimiter may be followed by a language tag (`yaml`, `yml`,
//! `json` or `toml`). Without one the block is read as YAML.

use derive_more::Deref;
use derive_more::DerefMut;
use serde::Deserialize;
use serde::Serialize;
use serde_yaml_ng::Mapping;
use serde_yaml_ng::Value;

use crate::MdxpError;
use crate::MdxpResult;

/// The delimiter used when none is configured.
pub const DEFAULT_DELIMITER: &str = "---";

/// UTF-8 byte order mark. It is skipped before looking for the opening
/// delimiter.
pub const BYTE_ORDER_MARK: char = '\u{feff}';

/// Key/value metadata read from a document's front matter. Empty when the
/// document has none.
#[derive(Debug, Clone, Default, PartialEq, Deref, DerefMut, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(pub Mapping);

impl Metadata {
	pub fn new() -> Self {
		Self::default()
	}

	/// Convert to JSON. Fails when a key is not a string.
	pub fn to_json(&self) -> MdxpResult<serde_json::Value> {
		serde_json::to_value(&self.0).map_err(|error| MdxpError::MetadataJson(error.to_string()))
	}
}

impl From<Mapping> for Metadata {
	fn from(mapping: Mapping) -> Self {
		Self(mapping)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontMatterOptions {
	/// Line that opens and closes the front matter block.
	pub delimiter: String,
}

impl Default for FrontMatterOptions {
	fn default() -> Self {
		Self {
			delimiter: DEFAULT_DELIMITER.to_string(),
		}
	}
}

/// A document split into its front matter and body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
	pub metadata: Metadata,
	/// The front matter block exactly as written, from the opening delimiter
	/// to the end of the closing delimiter line (without its line break).
	pub matter: Option<String>,
	/// Language tag following the opening delimiter, if any.
	pub language: Option<String>,
	/// Everything after the front matter block and the line break that ends
	/// it. The whole document, without a byte order mark, when there is no
	/// front matter.
	pub body: String,
}

impl FrontMatter {
	fn without_matter(text: &str) -> Self {
		Self {
			body: text.to_string(),
			..Self::default()
		}
	}

	pub fn has_matter(&self) -> bool {
		self.matter.is_some()
	}
}

/// Split `text` into front matter and body using the default delimiter.
pub fn extract(text: &str) -> MdxpResult<FrontMatter> {
	extract_with_options(text, &FrontMatterOptions::default())
}

/// Split `text` into front matter and body.
///
/// Text that does not open with the delimiter, or whose opening line is
/// followed by a further delimiter character (`----`), has no front matter.
/// An opened block that is never closed, or whose content is not a mapping,
/// is an error.
///
/// A leading byte order mark is not part of the front matter or the body.
pub fn extract_with_options(text: &str, options: &FrontMatterOptions) -> MdxpResult<FrontMatter> {
	let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
	let delimiter = options.delimiter.as_str();

	let Some(after_open) = text.strip_prefix(delimiter) else {
		return Ok(FrontMatter::without_matter(text));
	};

	let Some(last) = delimiter.chars().last() else {
		return Ok(FrontMatter::without_matter(text));
	};

	if after_open.starts_with(last) {
		return Ok(FrontMatter::without_matter(text));
	}

	let (opening_rest, content_start) = match after_open.find('\n') {
		Some(index) => (&after_open[..index], delimiter.len() + index + 1),
		None => (after_open, text.len()),
	};

	let language = opening_rest.trim();

	if !language
		.chars()
		.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
	{
		return Ok(FrontMatter::without_matter(text));
	}

	let Some((close_start, close_end)) = find_closing_line(text, content_start, delimiter) else {
		return Err(MdxpError::malformed(format!(
			"the opening `{delimiter}` is never closed"
		)));
	};

	let metadata = parse_metadata(&text[content_start..close_start], language)?;
	let rest = &text[close_end..];
	let body = rest
		.strip_prefix("\r\n")
		.or_else(|| rest.strip_prefix('\n'))
		.unwrap_or(rest);

	Ok(FrontMatter {
		metadata,
		matter: Some(text[..close_end].to_string()),
		language: (!language.is_empty()).then(|| language.to_string()),
		body: body.to_string(),
	})
}

/// Start of the closing delimiter line and the end of its content (before
/// the line break).
fn find_closing_line(text: &str, from: usize, delimiter: &str) -> Option<(usize, usize)> {
	let mut start = from;

	while start < text.len() {
		let line_end = text[start..].find('\n').map_or(text.len(), |index| start + index);
		let line = &text[start..line_end];
		let content = line.strip_suffix('\r').unwrap_or(line);

		if content
			.strip_prefix(delimiter)
			.is_some_and(|rest| rest.trim().is_empty())
		{
			return Some((start, start + content.len()));
		}

		start = line_end + 1;
	}

	None
}

fn parse_metadata(source: &str, language: &str) -> MdxpResult<Metadata> {
	if source.trim().is_empty() {
		return Ok(Metadata::new());
	}

	let value: Value = match language.to_ascii_lowercase().as_str() {
		"" | "yaml" | "yml" => {
			serde_yaml_ng::from_str(source).map_err(|error| MdxpError::malformed(error.to_string()))?
		}
		"json" => {
			serde_json::from_str(source).map_err(|error| MdxpError::malformed(error.to_string()))?
		}
		"toml" => toml::from_str(source).map_err(|error| MdxpError::malformed(error.to_string()))?,
		other => {
			return Err(MdxpError::malformed(format!(
				"unsupported front matter language `{other}`"
			)));
		}
	};

	match value {
		Value::Null => Ok(Metadata::new()),
		Value::Mapping(mapping) => Ok(Metadata(mapping)),
		other => {
			Err(MdxpError::malformed(format!(
				"expected a mapping but found {}",
				describe(&other)
			)))
		}
	}
}

fn describe(value: &Value) -> &'static str {
	match value {
		Value::Null => "nothing",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Sequence(_) => "a sequence",
		Value::Mapping(_) => "a mapping",
		Value::Tagged(_) => "a tagged value",
	}
}

/// Render metadata as a YAML front matter block using the default
/// delimiter. The block ends with a line break, so it can be prepended to a
/// body directly.
pub fn serialize(metadata: &Metadata) -> MdxpResult<String> {
	serialize_with_options(metadata, &FrontMatterOptions::default())
}

pub fn serialize_with_options(metadata: &Metadata, options: &FrontMatterOptions) -> MdxpResult<String> {
	let delimiter = options.delimiter.as_str();

	if metadata.is_empty() {
		return Ok(format!("{delimiter}\n{delimiter}\n"));
	}

	let yaml =
		serde_yaml_ng::to_string(&metadata.0).map_err(|error| MdxpError::malformed(error.to_string()))?;

	Ok(format!("{delimiter}\n{yaml}{delimiter}\n"))
}
