//! Recognition of `import` and `export` statement blocks embedded in
//! markdown prose.
//!
//! A statement block starts at a line whose first word is `import` or
//! `export` and runs up to, but not including, the next blank line. The
//! block is only recognized when it is terminated by a blank line and when
//! it has the shape of a module statement, so that prose starting with
//! either word still reaches the paragraph tokenizer.

use serde::Deserialize;
use serde::Serialize;

use crate::MdxpResult;
use crate::block_parser::BlockParser;
use crate::block_parser::BlockTokenizer;
use crate::block_parser::Consumed;
use crate::block_parser::Cursor;
use crate::block_parser::Locate;
use crate::block_parser::ParserExtension;
use crate::block_tokenizers::PARAGRAPH_TOKENIZER;
use crate::lexer::Lexeme;
use crate::lexer::StatementToken;
use crate::lexer::lex;
use crate::tree::Node;
use crate::tree::NodeKind;

/// Registry name of the [`StatementTokenizer`].
pub const STATEMENT_TOKENIZER: &str = "statement";

/// Ends a statement block.
pub const BLANK_LINE_SEPARATOR: &str = "\n\n";

const KEYWORDS: [&str; 2] = ["import", "export"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatementKind {
	Import,
	Export,
}

impl std::fmt::Display for StatementKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Import => write!(f, "import"),
			Self::Export => write!(f, "export"),
		}
	}
}

/// A single statement inside a [`StatementBlock`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
	pub kind: StatementKind,
	/// `export default ...` or `export { name as default }`.
	pub is_default_export: bool,
	/// The statement text, starting at its keyword.
	pub raw: String,
}

/// An `import`/`export` block recognized by the [`StatementTokenizer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementBlock {
	/// [`StatementKind::Export`] when any statement in the block exports.
	pub kind: StatementKind,
	/// Whether any statement in the block is a default export. Only ever
	/// `true` for export blocks.
	pub is_default_export: bool,
	/// The exact source text of the block.
	pub raw: String,
	pub statements: Vec<Statement>,
}

/// Try to read a statement block from the start of `value`.
///
/// Returns `None` when `value` has no blank line separator (the block would
/// swallow the rest of the document) or when the text before it is not a
/// module statement.
pub fn tokenize_statement(value: &str) -> Option<StatementBlock> {
	let end = value.find(BLANK_LINE_SEPARATOR)?;
	let raw = &value[..end];
	let statements = split_statements(raw)?;

	let kind = if statements
		.iter()
		.any(|statement| statement.kind == StatementKind::Export)
	{
		StatementKind::Export
	} else {
		StatementKind::Import
	};
	let is_default_export = statements
		.iter()
		.any(|statement| statement.is_default_export);

	Some(StatementBlock {
		kind,
		is_default_export,
		raw: raw.to_string(),
		statements,
	})
}

/// Offset of the first line in `value` that starts (after optional
/// indentation) with `import` or `export` followed by whitespace.
pub fn locate_statement(value: &str) -> Option<usize> {
	let line_starts = std::iter::once(0).chain(
		value
			.match_indices('\n')
			.map(|(index, _)| index + 1)
			.filter(|index| *index < value.len()),
	);

	for start in line_starts {
		if starts_with_keyword(value[start..].trim_start_matches([' ', '\t'])) {
			return Some(start);
		}
	}

	None
}

fn starts_with_keyword(text: &str) -> bool {
	KEYWORDS.iter().any(|keyword| {
		text.strip_prefix(keyword)
			.and_then(|rest| rest.chars().next())
			.is_some_and(char::is_whitespace)
	})
}

/// Split block text into statements. Every line that opens with a statement
/// keyword starts a new candidate; candidates after the first that are not
/// statements themselves continue the previous one.
fn split_statements(raw: &str) -> Option<Vec<Statement>> {
	let lexemes = lex(raw);
	let mut starts = Vec::new();
	let mut at_line_start = true;

	for (index, lexeme) in lexemes.iter().enumerate() {
		if lexeme.is(StatementToken::Newline) {
			at_line_start = true;
			continue;
		}

		if at_line_start
			&& (lexeme.is(StatementToken::Import) || lexeme.is(StatementToken::Export))
			&& raw[lexeme.span.end..]
				.chars()
				.next()
				.is_some_and(char::is_whitespace)
		{
			starts.push(index);
		} else if starts.is_empty() {
			// The block must open with a statement keyword.
			return None;
		}

		at_line_start = false;
	}

	let mut statements: Vec<(Statement, usize)> = Vec::new();

	for (position, start) in starts.iter().enumerate() {
		let end = starts.get(position + 1).copied().unwrap_or(lexemes.len());
		let tokens = &lexemes[*start..end];
		let text_end = lexemes.get(end).map_or(raw.len(), |lexeme| lexeme.span.start);

		match classify(tokens) {
			Some((kind, is_default_export)) => {
				let text_start = lexemes[*start].span.start;
				statements.push((
					Statement {
						kind,
						is_default_export,
						raw: raw[text_start..text_end].trim_end().to_string(),
					},
					text_start,
				));
			}
			None => {
				let (previous, text_start) = statements.last_mut()?;
				previous.raw = raw[*text_start..text_end].trim_end().to_string();
			}
		}
	}

	let statements: Vec<Statement> = statements.into_iter().map(|(statement, _)| statement).collect();

	(!statements.is_empty()).then_some(statements)
}

/// Check the minimal shape of a module statement. `tokens` starts with the
/// `import` or `export` keyword.
fn classify(tokens: &[Lexeme]) -> Option<(StatementKind, bool)> {
	let tokens: Vec<Option<StatementToken>> = tokens
		.iter()
		.filter(|lexeme| !lexeme.is(StatementToken::Newline))
		.map(|lexeme| lexeme.token)
		.collect();

	let (keyword, rest) = tokens.split_first()?;
	let next = *rest.first()?;

	match (*keyword)? {
		StatementToken::Import => {
			let side_effect_only = next == Some(StatementToken::String);

			(side_effect_only || has_from_clause(rest)).then_some((StatementKind::Import, false))
		}
		StatementToken::Export => {
			match next? {
				StatementToken::Default => (rest.len() > 1).then_some((StatementKind::Export, true)),
				StatementToken::Declaration => {
					(rest.len() > 1).then_some((StatementKind::Export, false))
				}
				StatementToken::BraceOpen => {
					let close = rest
						.iter()
						.position(|token| *token == Some(StatementToken::BraceClose))?;
					let specifiers = &rest[..=close];
					let renamed_to_default = specifiers.windows(2).any(|pair| {
						pair == [Some(StatementToken::As), Some(StatementToken::Default)]
					});
					let bare_default = specifiers.windows(3).any(|triple| {
						matches!(
							triple,
							[
								Some(StatementToken::BraceOpen | StatementToken::Comma),
								Some(StatementToken::Default),
								Some(StatementToken::BraceClose | StatementToken::Comma),
							]
						)
					});
					let is_default = renamed_to_default || bare_default;

					Some((StatementKind::Export, is_default))
				}
				StatementToken::Star => has_from_clause(rest).then_some((StatementKind::Export, false)),
				_ => None,
			}
		}
		_ => None,
	}
}

fn has_from_clause(tokens: &[Option<StatementToken>]) -> bool {
	tokens
		.windows(2)
		.any(|pair| pair == [Some(StatementToken::From), Some(StatementToken::String)])
}

/// Block tokenizer for `import`/`export` statement blocks.
pub struct StatementTokenizer;

impl BlockTokenizer for StatementTokenizer {
	fn name(&self) -> &str {
		STATEMENT_TOKENIZER
	}

	/// Only the line at the current position is inspected, so that each
	/// parse position costs no more than the length of its first line.
	fn locate(&self, value: &str) -> Locate {
		if starts_with_keyword(value.trim_start_matches([' ', '\t'])) {
			return Locate::At(0);
		}

		match value.find('\n') {
			Some(index) if index + 1 < value.len() => Locate::At(index + 1),
			_ => Locate::Never,
		}
	}

	fn try_consume(&self, _cursor: &Cursor<'_>, value: &str) -> MdxpResult<Option<Consumed>> {
		Ok(tokenize_statement(value).map(|block| {
			let length = block.raw.len();
			Consumed::node(length, Node::new(NodeKind::Statement(block)))
		}))
	}
}

/// Register the [`StatementTokenizer`] immediately before the paragraph
/// tokenizer. Installing into a parser that already has it is a no-op.
pub fn install(parser: &mut BlockParser) {
	if parser.insert_before(PARAGRAPH_TOKENIZER, StatementTokenizer) {
		tracing::trace!(tokenizers = ?parser, "installed statement tokenizer");
	} else {
		tracing::trace!("statement tokenizer already installed");
	}
}

/// [`ParserExtension`] form of [`install`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementSyntax;

impl ParserExtension for StatementSyntax {
	fn extend(&self, parser: &mut BlockParser) {
		install(parser);
	}
}
