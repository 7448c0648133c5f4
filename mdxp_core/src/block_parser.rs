use derive_more::Deref;
use derive_more::DerefMut;

use crate::MdxpError;
use crate::MdxpResult;
use crate::block_tokenizers::default_tokenizers;
use crate::tree::Node;
use crate::tree::NodeKind;

/// Containers nested deeper than this fail the parse with
/// [`MdxpError::Parse`] instead of recursing without bound, even though such
/// a document is valid markdown.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Appended to every text handed to the tokenizers so that the end of a
/// document, or of a container, is also the end of a block.
const BLOCK_TERMINATOR: &str = "\n\n";

/// Result of a tokenizer's locator. The parser only attempts a tokenizer at
/// the current position when the locator returns [`Locate::Always`] or
/// [`Locate::At`] with an offset of `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locate {
	/// No pre-filter, always attempt the tokenizer.
	Always,
	/// The first candidate for this tokenizer starts at the given offset of
	/// the remaining text.
	At(usize),
	/// There is no candidate anywhere in the remaining text.
	Never,
}

impl Locate {
	fn allows_attempt(self) -> bool {
		match self {
			Self::Always | Self::At(0) => true,
			Self::At(_) | Self::Never => false,
		}
	}
}

/// What a tokenizer claimed at the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumed {
	/// Number of bytes claimed, counted from the cursor.
	pub length: usize,
	/// The node produced for the claimed bytes. Blank lines claim bytes
	/// without producing a node.
	pub node: Option<Node>,
}

impl Consumed {
	pub fn node(length: usize, node: Node) -> Self {
		Self {
			length,
			node: Some(node),
		}
	}

	pub fn skip(length: usize) -> Self {
		Self { length, node: None }
	}
}

/// A block level recognizer registered with a [`BlockParser`].
pub trait BlockTokenizer: Send + Sync {
	/// Stable registry name, used to order tokenizers relative to each other.
	fn name(&self) -> &str;

	/// Cheap pre-filter over the remaining text. Correctness must never
	/// depend on it: `try_consume` re-validates everything.
	fn locate(&self, _value: &str) -> Locate {
		Locate::Always
	}

	/// Try to claim a block at the start of `value`. Returning `Ok(None)`
	/// hands the position to the next tokenizer in order.
	fn try_consume(&self, cursor: &Cursor<'_>, value: &str) -> MdxpResult<Option<Consumed>>;
}

/// The parse position handed to tokenizers. Container tokenizers use it to
/// tokenize their stripped content with the same tokenizer list.
pub struct Cursor<'p> {
	parser: &'p BlockParser,
	offset: usize,
	depth: usize,
}

impl Cursor<'_> {
	/// Byte offset of the cursor in the text currently being tokenized.
	pub fn offset(&self) -> usize {
		self.offset
	}

	/// Nesting depth, `0` for the document itself.
	pub fn depth(&self) -> usize {
		self.depth
	}

	/// Tokenize the content of a container block one level deeper.
	pub fn tokenize(&self, content: &str) -> MdxpResult<Vec<Node>> {
		self.parser
			.tokenize(content, self.depth + 1)
			.map_err(|error| {
				match error {
					MdxpError::Parse { offset, reason } => {
						MdxpError::parse(
							self.offset,
							format!("{reason} (at byte {offset} of the nested content)"),
						)
					}
					other => other,
				}
			})
	}
}

/// Ordered list of block tokenizers. The first tokenizer (in order) that
/// claims input at a position wins.
pub struct BlockParser {
	tokenizers: Vec<Box<dyn BlockTokenizer>>,
}

impl Default for BlockParser {
	fn default() -> Self {
		Self {
			tokenizers: default_tokenizers(),
		}
	}
}

impl std::fmt::Debug for BlockParser {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(self.names()).finish()
	}
}

impl BlockParser {
	/// A parser with no tokenizers at all. Every parse of non-empty text
	/// fails until tokenizers are registered.
	pub fn empty() -> Self {
		Self {
			tokenizers: Vec::new(),
		}
	}

	/// Registered tokenizer names in execution order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.tokenizers.iter().map(|tokenizer| tokenizer.name())
	}

	pub fn position(&self, name: &str) -> Option<usize> {
		self.names().position(|candidate| candidate == name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.position(name).is_some()
	}

	/// Append a tokenizer after every registered one. Returns `false`, and
	/// leaves the parser untouched, when the name is already registered.
	pub fn push(&mut self, tokenizer: impl BlockTokenizer + 'static) -> bool {
		if self.contains(tokenizer.name()) {
			return false;
		}

		self.tokenizers.push(Box::new(tokenizer));
		true
	}

	/// Register a tokenizer immediately before `anchor`, or last when
	/// `anchor` is not registered. Returns `false`, and leaves the parser
	/// untouched, when the name is already registered.
	pub fn insert_before(&mut self, anchor: &str, tokenizer: impl BlockTokenizer + 'static) -> bool {
		if self.contains(tokenizer.name()) {
			return false;
		}

		let index = self.position(anchor).unwrap_or(self.tokenizers.len());
		self.tokenizers.insert(index, Box::new(tokenizer));
		true
	}

	pub fn remove(&mut self, name: &str) -> bool {
		let Some(index) = self.position(name) else {
			return false;
		};

		self.tokenizers.remove(index);
		true
	}

	/// Apply an extension to this parser.
	pub fn extend(&mut self, extension: &dyn ParserExtension) {
		extension.extend(self);
	}

	/// Parse a whole document into a tree rooted at [`NodeKind::Root`].
	pub fn parse(&self, text: &str) -> MdxpResult<Node> {
		let normalized = normalize_line_endings(text);
		let children = self.tokenize(&normalized, 0)?;
		let mut root = Node::with_children(NodeKind::Root, children);
		root.span = 0..normalized.len();

		Ok(root)
	}

	fn tokenize(&self, text: &str, depth: usize) -> MdxpResult<Vec<Node>> {
		if depth > MAX_NESTING_DEPTH {
			return Err(MdxpError::parse(
				0,
				format!("containers are nested more than {MAX_NESTING_DEPTH} levels deep"),
			));
		}

		let end = text.len();
		let mut source = String::with_capacity(end + BLOCK_TERMINATOR.len());
		source.push_str(text);
		source.push_str(BLOCK_TERMINATOR);

		let mut nodes = Vec::new();
		let mut offset = 0;

		while offset < end {
			let value = &source[offset..];
			let cursor = Cursor {
				parser: self,
				offset,
				depth,
			};

			let Some((name, consumed)) = self.consume_at(&cursor, value)? else {
				return Err(MdxpError::parse(
					offset,
					"no block tokenizer accepted the input",
				));
			};

			if consumed.length == 0
				|| consumed.length > value.len()
				|| !value.is_char_boundary(consumed.length)
			{
				return Err(MdxpError::parse(
					offset,
					format!(
						"tokenizer `{name}` claimed an invalid length of {} bytes",
						consumed.length
					),
				));
			}

			if let Some(mut node) = consumed.node {
				node.span = offset..(offset + consumed.length).min(end);
				nodes.push(node);
			}

			offset += consumed.length;
		}

		Ok(nodes)
	}

	fn consume_at<'a>(
		&'a self,
		cursor: &Cursor<'_>,
		value: &str,
	) -> MdxpResult<Option<(&'a str, Consumed)>> {
		for tokenizer in &self.tokenizers {
			if !tokenizer.locate(value).allows_attempt() {
				continue;
			}

			if let Some(consumed) = tokenizer.try_consume(cursor, value)? {
				return Ok(Some((tokenizer.name(), consumed)));
			}
		}

		Ok(None)
	}
}

fn normalize_line_endings(text: &str) -> String {
	if text.contains('\r') {
		text.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		text.to_string()
	}
}

/// Adds or reorders tokenizers on a freshly constructed [`BlockParser`].
pub trait ParserExtension: Send + Sync {
	fn extend(&self, parser: &mut BlockParser);
}

impl<F> ParserExtension for F
where
	F: Fn(&mut BlockParser) + Send + Sync,
{
	fn extend(&self, parser: &mut BlockParser) {
		self(parser);
	}
}

/// Caller supplied extensions, applied in order to every parser the scanner
/// builds.
#[derive(Default, Deref, DerefMut)]
pub struct ParserExtensions(Vec<Box<dyn ParserExtension>>);

impl ParserExtensions {
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, extension: impl ParserExtension + 'static) -> Self {
		self.0.push(Box::new(extension));
		self
	}

	pub fn apply(&self, parser: &mut BlockParser) {
		for extension in &self.0 {
			parser.extend(&**extension);
		}
	}
}

impl std::fmt::Debug for ParserExtensions {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ParserExtensions")
			.field("len", &self.0.len())
			.finish()
	}
}
