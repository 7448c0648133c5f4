use crate::MdxpResult;
use crate::block_parser::BlockParser;
use crate::block_parser::ParserExtensions;
use crate::statement::install;
use crate::tree::Node;

/// Build a parser with the default tokenizers, the caller's extensions and
/// the statement tokenizer, in that order. The statement tokenizer is
/// installed last so that it always sits directly before the paragraph
/// tokenizer.
pub fn build_parser(extensions: &ParserExtensions) -> BlockParser {
	let mut parser = BlockParser::default();
	extensions.apply(&mut parser);
	install(&mut parser);

	parser
}

/// Parse `body` into a block tree with statement blocks recognized.
pub fn parse_document(body: &str, extensions: &ParserExtensions) -> MdxpResult<Node> {
	build_parser(extensions).parse(body)
}

/// Whether `body` contains a default export statement anywhere in its block
/// tree, including inside block quotes and list items.
pub fn has_default_export(body: &str, extensions: &ParserExtensions) -> MdxpResult<bool> {
	let tree = parse_document(body, extensions)?;
	let found = tree
		.statements()
		.any(|statement| statement.is_default_export);

	tracing::trace!(found, "scanned document for a default export");

	Ok(found)
}
