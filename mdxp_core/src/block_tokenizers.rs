//! The generic block tokenizers every [`BlockParser`](crate::BlockParser)
//! starts with.
//!
//! They implement the subset of block syntax needed to decide which text
//! belongs to prose, code or containers: blank lines, indented and fenced
//! code, block quotes, ATX and setext headings, thematic breaks, lists, HTML
//! blocks, tables and paragraphs. Inline syntax is out of scope.

use crate::MdxpResult;
use crate::block_parser::BlockTokenizer;
use crate::block_parser::Consumed;
use crate::block_parser::Cursor;
use crate::tree::Node;
use crate::tree::NodeKind;

pub const BLANK_LINE_TOKENIZER: &str = "blank_line";
pub const INDENTED_CODE_TOKENIZER: &str = "indented_code";
pub const FENCED_CODE_TOKENIZER: &str = "fenced_code";
pub const BLOCK_QUOTE_TOKENIZER: &str = "block_quote";
pub const ATX_HEADING_TOKENIZER: &str = "atx_heading";
pub const THEMATIC_BREAK_TOKENIZER: &str = "thematic_break";
pub const LIST_TOKENIZER: &str = "list";
pub const SETEXT_HEADING_TOKENIZER: &str = "setext_heading";
pub const HTML_TOKENIZER: &str = "html";
pub const TABLE_TOKENIZER: &str = "table";
pub const PARAGRAPH_TOKENIZER: &str = "paragraph";

/// Columns of indentation that turn a line into indented code.
const CODE_INDENT: usize = 4;

pub(crate) fn default_tokenizers() -> Vec<Box<dyn BlockTokenizer>> {
	vec![
		Box::new(BlankLine),
		Box::new(IndentedCode),
		Box::new(FencedCode),
		Box::new(BlockQuote),
		Box::new(AtxHeading),
		Box::new(ThematicBreak),
		Box::new(List),
		Box::new(SetextHeading),
		Box::new(Html),
		Box::new(Table),
		Box::new(Paragraph),
	]
}

/// A line of the remaining text.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
	/// Offset of the first byte of the line.
	start: usize,
	/// The line without its line break.
	text: &'a str,
	/// Offset just past the line break (or the end of the text).
	end: usize,
}

impl Line<'_> {
	fn is_blank(&self) -> bool {
		self.text.trim().is_empty()
	}
}

fn lines(value: &str) -> impl Iterator<Item = Line<'_>> {
	let mut start = 0;

	std::iter::from_fn(move || {
		if start >= value.len() {
			return None;
		}

		let rest = &value[start..];
		let (text, end) = match rest.find('\n') {
			Some(index) => (&rest[..index], start + index + 1),
			None => (rest, value.len()),
		};
		let line = Line { start, text, end };
		start = end;

		Some(line)
	})
}

/// Width of the leading whitespace of a line in columns, with tabs advancing
/// to the next multiple of four.
fn indentation(line: &str) -> usize {
	let mut columns = 0;

	for ch in line.chars() {
		match ch {
			' ' => columns += 1,
			'\t' => columns += CODE_INDENT - columns % CODE_INDENT,
			_ => break,
		}
	}

	columns
}

/// Remove up to `columns` columns of leading whitespace.
fn strip_columns(line: &str, columns: usize) -> &str {
	let mut removed = 0;
	let mut index = 0;

	for (position, ch) in line.char_indices() {
		if removed >= columns {
			break;
		}

		match ch {
			' ' => removed += 1,
			'\t' => removed += CODE_INDENT - removed % CODE_INDENT,
			_ => break,
		}

		index = position + ch.len_utf8();
	}

	&line[index..]
}

/// The line content after at most three columns of indentation, or `None`
/// when the line is indented far enough to be code.
fn block_start(line: &str) -> Option<&str> {
	if indentation(line) >= CODE_INDENT {
		return None;
	}

	Some(line.trim_start_matches([' ', '\t']))
}

fn fence_marker(line: &str) -> Option<(char, usize, &str)> {
	let rest = block_start(line)?;
	let marker = rest.chars().next().filter(|ch| matches!(ch, '`' | '~'))?;
	let length = rest.chars().take_while(|ch| *ch == marker).count();

	if length < 3 {
		return None;
	}

	let info = rest[length..].trim();

	if marker == '`' && info.contains('`') {
		return None;
	}

	Some((marker, length, info))
}

fn is_closing_fence(line: &str, marker: char, length: usize) -> bool {
	let Some(rest) = block_start(line) else {
		return false;
	};
	let count = rest.chars().take_while(|ch| *ch == marker).count();

	count >= length && rest[count..].trim().is_empty()
}

fn atx_depth(line: &str) -> Option<u8> {
	let rest = block_start(line)?;
	let depth = rest.chars().take_while(|ch| *ch == '#').count();

	if !(1..=6).contains(&depth) {
		return None;
	}

	match rest[depth..].chars().next() {
		None | Some(' ' | '\t') => u8::try_from(depth).ok(),
		Some(_) => None,
	}
}

fn is_thematic_break(line: &str) -> bool {
	let Some(rest) = block_start(line) else {
		return false;
	};
	let Some(marker) = rest.chars().next().filter(|ch| matches!(ch, '*' | '-' | '_')) else {
		return false;
	};

	let mut count = 0;

	for ch in rest.chars() {
		match ch {
			' ' | '\t' => {}
			ch if ch == marker => count += 1,
			_ => return false,
		}
	}

	count >= 3
}

fn is_block_quote_start(line: &str) -> bool {
	block_start(line).is_some_and(|rest| rest.starts_with('>'))
}

fn is_html_start(line: &str) -> bool {
	let Some(rest) = block_start(line) else {
		return false;
	};
	let mut chars = rest.chars();

	chars.next() == Some('<')
		&& chars
			.next()
			.is_some_and(|ch| ch.is_ascii_alphabetic() || matches!(ch, '/' | '!' | '?'))
}

/// A list item marker at the start of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ListMarker {
	ordered: bool,
	/// The bullet character, or the delimiter (`.` or `)`) of ordered items.
	symbol: char,
	/// Columns from the start of the line to the item content.
	content_indent: usize,
	/// Byte offset just past the marker.
	marker_end: usize,
	/// Columns of whitespace between the marker and the content.
	spacing: usize,
	/// Whether the item has content on its first line.
	has_content: bool,
	/// Whether an ordered item starts at `1`.
	starts_at_one: bool,
}

impl ListMarker {
	/// The item content on the marker line.
	fn first_line<'a>(&self, line: &'a str) -> &'a str {
		strip_columns(&line[self.marker_end..], self.spacing)
	}

	fn continues(&self, other: &Self) -> bool {
		self.ordered == other.ordered && self.symbol == other.symbol
	}
}

fn list_marker(line: &str) -> Option<ListMarker> {
	let indent = indentation(line);

	if indent >= CODE_INDENT {
		return None;
	}

	let rest = line.trim_start_matches([' ', '\t']);
	let leading = line.len() - rest.len();
	let digits = rest.chars().take_while(char::is_ascii_digit).count();

	let (ordered, symbol, marker_width, starts_at_one) = if digits > 0 {
		if digits > 9 {
			return None;
		}

		let symbol = rest[digits..].chars().next().filter(|ch| matches!(ch, '.' | ')'))?;
		(true, symbol, digits + 1, rest[..digits].parse::<u32>().ok() == Some(1))
	} else {
		let symbol = rest.chars().next().filter(|ch| matches!(ch, '-' | '+' | '*'))?;
		(false, symbol, 1, false)
	};

	let after = &rest[marker_width..];

	if !after.is_empty() && !after.starts_with([' ', '\t']) {
		return None;
	}

	let has_content = !after.trim().is_empty();
	let spacing = if has_content {
		match indentation(after) {
			// Five or more columns means the content is indented code that
			// starts one column after the marker.
			width if width > CODE_INDENT => 1,
			width => width,
		}
	} else {
		1
	};

	Some(ListMarker {
		ordered,
		symbol,
		content_indent: indent + marker_width + spacing,
		marker_end: leading + marker_width,
		spacing,
		has_content,
		starts_at_one,
	})
}

/// Whether a line ends a paragraph (or a lazy continuation) before a blank
/// line does.
fn interrupts_paragraph(line: &str) -> bool {
	if fence_marker(line).is_some()
		|| atx_depth(line).is_some()
		|| is_thematic_break(line)
		|| is_block_quote_start(line)
		|| is_html_start(line)
	{
		return true;
	}

	list_marker(line).is_some_and(|marker| {
		marker.has_content && (!marker.ordered || marker.starts_at_one)
	})
}

pub struct BlankLine;

impl BlockTokenizer for BlankLine {
	fn name(&self) -> &str {
		BLANK_LINE_TOKENIZER
	}

	fn try_consume(&self, _cursor: &Cursor<'_>, value: &str) -> MdxpResult<Option<Consumed>> {
		let length = lines(value)
			.take_while(Line::is_blank)
			.last()
			.map_or(0, |line| line.end);

		Ok((length > 0).then(|| Consumed::skip(length)))
	}
}

pub struct IndentedCode;

impl BlockTokenizer for IndentedCode {
	fn name(&self) -> &str {
		INDENTED_CODE_TOKENIZER
	}

	fn try_consume(&self, _cursor: &Cursor<'_>, value: &str) -> MdxpResult<Option<Consumed>> {
		let mut length = 0;

		for line in lines(value) {
			if line.is_blank() {
				continue;
			}

			if indentation(line.text) < CODE_INDENT {
				break;
			}

			// Blank lines only belong to the code when more code follows.
			length = line.end;
		}

		let node = Node::new(NodeKind::Code {
			fenced: false,
			info: None,
		});

		Ok((length > 0).then(|| Consumed::node(length, node)))
	}
}

pub struct FencedCode;

impl BlockTokenizer for FencedCode {
	fn name(&self) -> &str {
		FENCED_CODE_TOKENIZER
	}

	fn try_consume(&self, _cursor: &Cursor<'_>, value: &str) -> MdxpResult<Option<Consumed>> {
		let mut iter = lines(value);
		let Some(opening) = iter.next() else {
			return Ok(None);
		};
		let Some((marker, fence_length, info)) = fence_marker(opening.text) else {
			return Ok(None);
		};

		// An unclosed fence runs to the end of its container.
		let length = iter
			.find(|line| is_closing_fence(line.text, marker, fence_length))
			.map_or(value.len(), |line| line.end);

		let node = Node::new(NodeKind::Code {
			fenced: true,
			info: (!info.is_empty()).then(|| info.to_string()),
		});

		Ok(Some(Consumed::node(length, node)))
	}
}

pub struct BlockQuote;

impl BlockTokenizer for BlockQuote {
	fn name(&self) -> &str {
		BLOCK_QUOTE_TOKENIZER
	}

	fn try_consume(&self, cursor: &Cursor<'_>, value: &str) -> MdxpResult<Option<Consumed>> {
		let mut content = Vec::new();
		let mut length = 0;

		for line in lines(value) {
			if let Some(rest) = block_start(line.text).and_then(|rest| rest.strip_prefix('>')) {
				content.push(strip_columns(rest, 1));
			} else if !content.is_empty() && !line.is_blank() && !interrupts_paragraph(line.text) {
				// Lazy continuation of a quoted paragraph.
				content.push(line.text);
			} else {
				break;
			}

			length = line.end;
		}

		if content.is_empty() {
			return Ok(None);
		}

		let children = cursor.tokenize(&content.join("\n"))?;
		let node = Node::with_children(NodeKind::BlockQuote, children);

		Ok(Some(Consumed::node(length, node)))
	}
}

pub struct AtxHeading;

impl BlockTokenizer for AtxHeading {
	fn name(&self) -> &str {
		ATX_HEADING_TOKENIZER
	}

	fn try_consume(&self, _cursor: &Cursor<'_>, value: &str) -> MdxpResult<Option<Consumed>> {
		let Some(line) = lines(value).next() else {
			return Ok(None);
		};

		Ok(atx_depth(line.text)
			.map(|depth| Consumed::node(line.end, Node::new(NodeKind::Heading { depth }))))
	}
}

pub struct ThematicBreak;

impl BlockTokenizer for ThematicBreak {
	fn name(&self) -> &str {
		THEMATIC_BREAK_TOKENIZER
	}

	fn try_consume(&self, _cursor: &Cursor<'_>, value: &str) -> MdxpResult<Option<Consumed>> {
		let Some(line) = lines(value).next() else {
			return Ok(None);
		};

		Ok(is_thematic_break(line.text)
			.then(|| Consumed::node(line.end, Node::new(NodeKind::ThematicBreak))))
	}
}

pub struct List;

impl BlockTokenizer for List {
	fn name(&self) -> &str {
		LIST_TOKENIZER
	}

	fn try_consume(&self, cursor: &Cursor<'_>, value: &str) -> MdxpResult<Option<Consumed>> {
		let mut iter = lines(value).peekable();
		let Some(first) = iter.next() else {
			return Ok(None);
		};
		let Some(list_kind) = list_marker(first.text) else {
			return Ok(None);
		};

		// (start, end, content lines) for every item.
		let mut items: Vec<(usize, usize, Vec<&str>)> = Vec::new();
		let mut marker = list_kind;
		items.push((first.start, first.end, vec![marker.first_line(first.text)]));
		let mut pending_blank = 0;

		while let Some(line) = iter.next() {
			if line.is_blank() {
				// A blank line only stays in the list when the list goes on.
				let continues = iter.peek().is_some_and(|next| {
					!next.is_blank()
						&& (indentation(next.text) >= marker.content_indent
							|| list_marker(next.text).is_some_and(|m| m.continues(&list_kind)))
				});

				if !continues {
					break;
				}

				pending_blank += 1;
				continue;
			}

			if indentation(line.text) >= marker.content_indent {
				if let Some(item) = items.last_mut() {
					item.2.extend(std::iter::repeat_n("", pending_blank));
					item.2.push(strip_columns(line.text, marker.content_indent));
					item.1 = line.end;
				}
			} else if let Some(next) = list_marker(line.text).filter(|m| m.continues(&list_kind)) {
				if is_thematic_break(line.text) {
					break;
				}

				marker = next;
				items.push((line.start, line.end, vec![marker.first_line(line.text)]));
			} else if pending_blank == 0 && !interrupts_paragraph(line.text) {
				// Lazy continuation of the item's paragraph.
				if let Some(item) = items.last_mut() {
					item.2.push(line.text);
					item.1 = line.end;
				}
			} else {
				break;
			}

			pending_blank = 0;
		}

		let offset = cursor.offset();
		let mut children = Vec::with_capacity(items.len());
		let mut length = 0;

		for (start, end, content) in items {
			let mut item = Node::with_children(NodeKind::ListItem, cursor.tokenize(&content.join("\n"))?);
			item.span = (offset + start)..(offset + end);
			children.push(item);
			length = end;
		}

		let node = Node::with_children(
			NodeKind::List {
				ordered: list_kind.ordered,
			},
			children,
		);

		Ok(Some(Consumed::node(length, node)))
	}
}

pub struct SetextHeading;

impl BlockTokenizer for SetextHeading {
	fn name(&self) -> &str {
		SETEXT_HEADING_TOKENIZER
	}

	fn try_consume(&self, _cursor: &Cursor<'_>, value: &str) -> MdxpResult<Option<Consumed>> {
		let mut iter = lines(value);
		let (Some(title), Some(underline)) = (iter.next(), iter.next()) else {
			return Ok(None);
		};

		if title.is_blank() || block_start(title.text).is_none() {
			return Ok(None);
		}

		let Some(rest) = block_start(underline.text).map(str::trim_end) else {
			return Ok(None);
		};

		let depth = if !rest.is_empty() && rest.chars().all(|ch| ch == '=') {
			1
		} else if !rest.is_empty() && rest.chars().all(|ch| ch == '-') {
			2
		} else {
			return Ok(None);
		};

		Ok(Some(Consumed::node(
			underline.end,
			Node::new(NodeKind::Heading { depth }),
		)))
	}
}

pub struct Html;

impl BlockTokenizer for Html {
	fn name(&self) -> &str {
		HTML_TOKENIZER
	}

	fn try_consume(&self, _cursor: &Cursor<'_>, value: &str) -> MdxpResult<Option<Consumed>> {
		let mut iter = lines(value);
		let Some(first) = iter.next() else {
			return Ok(None);
		};

		if !is_html_start(first.text) {
			return Ok(None);
		}

		let is_comment = first.text.trim_start().starts_with("<!--");
		let mut length = first.end;

		if is_comment {
			// Comments run to the line holding `-->`, blank lines included.
			if !first.text.contains("-->") {
				length = iter
					.find(|line| line.text.contains("-->"))
					.map_or(value.len(), |line| line.end);
			}
		} else {
			for line in iter.take_while(|line| !line.is_blank()) {
				length = line.end;
			}
		}

		Ok(Some(Consumed::node(length, Node::new(NodeKind::Html))))
	}
}

pub struct Table;

fn is_delimiter_row(line: &str) -> bool {
	let Some(rest) = block_start(line) else {
		return false;
	};
	let rest = rest.trim();
	let rest = rest.strip_prefix('|').unwrap_or(rest);
	let rest = rest.strip_suffix('|').unwrap_or(rest);

	!rest.is_empty()
		&& rest.split('|').all(|cell| {
			let cell = cell.trim();
			let cell = cell.strip_prefix(':').unwrap_or(cell);
			let cell = cell.strip_suffix(':').unwrap_or(cell);

			!cell.is_empty() && cell.chars().all(|ch| ch == '-')
		})
}

impl BlockTokenizer for Table {
	fn name(&self) -> &str {
		TABLE_TOKENIZER
	}

	fn try_consume(&self, _cursor: &Cursor<'_>, value: &str) -> MdxpResult<Option<Consumed>> {
		let mut iter = lines(value);
		let (Some(header), Some(delimiter)) = (iter.next(), iter.next()) else {
			return Ok(None);
		};

		if block_start(header.text).is_none()
			|| !header.text.contains('|')
			|| !is_delimiter_row(delimiter.text)
		{
			return Ok(None);
		}

		let length = iter
			.take_while(|line| !line.is_blank() && !interrupts_paragraph(line.text))
			.last()
			.map_or(delimiter.end, |line| line.end);

		Ok(Some(Consumed::node(length, Node::new(NodeKind::Table))))
	}
}

/// The catch-all: claims at least the first line of whatever no other
/// tokenizer wanted.
pub struct Paragraph;

impl BlockTokenizer for Paragraph {
	fn name(&self) -> &str {
		PARAGRAPH_TOKENIZER
	}

	fn try_consume(&self, _cursor: &Cursor<'_>, value: &str) -> MdxpResult<Option<Consumed>> {
		let mut iter = lines(value);
		let Some(first) = iter.next() else {
			return Ok(None);
		};

		if first.is_blank() {
			return Ok(Some(Consumed::skip(first.end)));
		}

		let length = iter
			.take_while(|line| !line.is_blank() && !interrupts_paragraph(line.text))
			.last()
			.map_or(first.end, |line| line.end);

		Ok(Some(Consumed::node(length, Node::new(NodeKind::Paragraph))))
	}
}
