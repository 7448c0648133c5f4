use std::ops::Range;

use serde::Serialize;

use crate::statement::StatementBlock;

/// A node in the block tree produced by one pass of the
/// [`BlockParser`](crate::BlockParser).
///
/// Spans are byte ranges into the text the enclosing container handed to the
/// parser. For top level nodes that is the line-ending normalized document;
/// for nodes inside block quotes and list items it is the container content
/// with its markers stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
	pub kind: NodeKind,
	pub span: Range<usize>,
	pub children: Vec<Node>,
}

impl Node {
	/// Create a leaf node. The span is filled in by the parser once the
	/// tokenizer that produced the node has been accepted.
	pub fn new(kind: NodeKind) -> Self {
		Self {
			kind,
			span: 0..0,
			children: Vec::new(),
		}
	}

	pub fn with_children(kind: NodeKind, children: Vec<Node>) -> Self {
		Self {
			kind,
			span: 0..0,
			children,
		}
	}

	/// Depth-first, pre-order walk over this node and everything below it.
	pub fn descendants(&self) -> Descendants<'_> {
		Descendants { stack: vec![self] }
	}

	/// All statement blocks anywhere in the tree, in document order.
	pub fn statements(&self) -> impl Iterator<Item = &StatementBlock> {
		self.descendants().filter_map(|node| {
			match &node.kind {
				NodeKind::Statement(statement) => Some(statement),
				_ => None,
			}
		})
	}
}

pub struct Descendants<'a> {
	stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
	type Item = &'a Node;

	fn next(&mut self) -> Option<Self::Item> {
		let node = self.stack.pop()?;
		self.stack.extend(node.children.iter().rev());
		Some(node)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
#[non_exhaustive]
pub enum NodeKind {
	Root,
	/// An ATX (`# title`) or setext (`title\n===`) heading.
	Heading { depth: u8 },
	Paragraph,
	/// Fenced or indented code. `info` is the fence info string, if any.
	Code { fenced: bool, info: Option<String> },
	BlockQuote,
	List { ordered: bool },
	ListItem,
	ThematicBreak,
	Html,
	Table,
	/// An import or export statement block embedded in the document.
	Statement(StatementBlock),
	/// A node produced by a tokenizer registered through a
	/// [`ParserExtension`](crate::ParserExtension).
	Custom { name: String },
}

