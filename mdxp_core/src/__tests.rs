use std::borrow::Cow;
use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use rstest::rstest;
use serde_yaml_ng::Value;
use similar_asserts::assert_eq;
use tracing_test::traced_test;

use super::__fixtures::*;
use super::*;
use crate::block_tokenizers::FENCED_CODE_TOKENIZER;
use crate::block_tokenizers::PARAGRAPH_TOKENIZER;
use crate::block_tokenizers::Paragraph;

#[rstest]
#[case::default_arrow("export default () => null\n\nHello", StatementKind::Export, true)]
#[case::default_function("export default function Layout({ children }) {\n  return children\n}\n\n", StatementKind::Export, true)]
#[case::named_as_default("export { Layout as default } from \"./layout\"\n\n", StatementKind::Export, true)]
#[case::named_const("export const meta = { title: \"Hi\" }\n\n", StatementKind::Export, false)]
#[case::named_list("export { a, b }\n\n", StatementKind::Export, false)]
#[case::star("export * from \"./shared\"\n\n", StatementKind::Export, false)]
#[case::star_namespace("export * as shared from \"./shared\"\n\n", StatementKind::Export, false)]
#[case::default_import("import Chart from \"./chart\"\n\n", StatementKind::Import, false)]
#[case::named_import("import { Chart, Table } from './charts'\n\n", StatementKind::Import, false)]
#[case::side_effect_import("import \"./styles.css\"\n\n", StatementKind::Import, false)]
#[case::indented("  export default Layout\n\n", StatementKind::Export, true)]
#[case::import_then_default("import Layout from \"./layout\"\nexport default Layout\n\n", StatementKind::Export, true)]
#[case::bare_default_reexport("export { default } from \"./Layout.js\"\n\n", StatementKind::Export, true)]
#[case::default_among_names("export { meta, default } from \"./post\"\n\n", StatementKind::Export, true)]
#[case::default_renamed("export { default as Layout } from \"./layout\"\n\n", StatementKind::Export, false)]
fn tokenize_statement_blocks(
	#[case] input: &str,
	#[case] kind: StatementKind,
	#[case] is_default_export: bool,
) {
	let block = tokenize_statement(input);
	let block = block.unwrap_or_else(|| panic!("expected a statement block in {input:?}"));

	assert_eq!(block.kind, kind);
	assert_eq!(block.is_default_export, is_default_export);
	assert!(input.starts_with(&block.raw));
	assert!(!block.raw.contains("\n\n"));
}

#[rstest]
#[case::unterminated("export default () => null")]
#[case::unterminated_import("import Chart from \"./chart\"\n")]
#[case::empty("")]
#[case::prose_import("import is a word we use a lot\n\n")]
#[case::prose_export("export the files before lunch\n\n")]
#[case::keyword_prefix("exports are great\n\n")]
#[case::no_whitespace("export{ a }\n\n")]
#[case::prose_first("Hello\nexport default Layout\n\n")]
#[case::default_without_value("export default\n\n")]
#[case::import_without_source("import Chart\n\n")]
#[case::star_without_source("export * as all\n\n")]
#[case::unclosed_braces("export { a, b\n\n")]
fn tokenize_statement_declines(#[case] input: &str) {
	assert_eq!(tokenize_statement(input), None);
}

#[test]
fn tokenize_statement_stops_at_blank_line() {
	let input = "import A from \"a\"\nimport B from \"b\"\n\nexport default A";
	let block = tokenize_statement(input).unwrap_or_else(|| panic!("expected a block"));

	assert_eq!(block.raw, "import A from \"a\"\nimport B from \"b\"");
	assert_eq!(block.kind, StatementKind::Import);
	assert!(!block.is_default_export);
	assert_eq!(block.statements.len(), 2);
	assert_eq!(block.statements[1].raw, "import B from \"b\"");
}

#[test]
fn continuation_lines_join_previous_statement() {
	let input = "export const meta = {\n  import: true,\n  export: false,\n}\n\n";
	let block = tokenize_statement(input).unwrap_or_else(|| panic!("expected a block"));

	assert_eq!(block.statements.len(), 1);
	assert_eq!(block.statements[0].raw, block.raw);
	assert!(!block.is_default_export);
}

#[test]
fn statement_line_inside_block_starts_new_statement() {
	let input = "export const meta = {}\nexport { Layout as default }\n\n";
	let block = tokenize_statement(input).unwrap_or_else(|| panic!("expected a block"));

	let defaults = block
		.statements
		.iter()
		.map(|statement| statement.is_default_export)
		.collect::<Vec<_>>();

	assert_eq!(defaults, vec![false, true]);
	assert!(block.is_default_export);
}

#[rstest]
#[case::start("export default Layout", Some(0))]
#[case::indented("  import A from \"a\"", Some(0))]
#[case::later_line("Hello\n\nimport A from \"a\"", Some(7))]
#[case::tab_separated("text\nexport\tconst a = 1", Some(5))]
#[case::mid_line("text export default Layout", None)]
#[case::prefix_only("exports\nimported", None)]
#[case::trailing_keyword("text\nexport", None)]
#[case::prose("Just prose.", None)]
fn locate_statement_candidates(#[case] input: &str, #[case] expected: Option<usize>) {
	assert_eq!(locate_statement(input), expected);
}

#[test]
fn statement_tokenizer_locator_distinguishes_never() {
	assert_eq!(StatementTokenizer.locate("export default X"), Locate::At(0));
	assert_eq!(StatementTokenizer.locate("  import A from \"a\""), Locate::At(0));
	assert_eq!(StatementTokenizer.locate("a\nexport default X"), Locate::At(2));
	assert_eq!(StatementTokenizer.locate("no statements"), Locate::Never);
}

#[test]
fn statement_tokenizer_locator_only_reads_the_first_line() {
	let value = format!("{}\n\nexport default Layout\n\n", "Prose line.\n\n".repeat(3));

	assert_eq!(StatementTokenizer.locate(&value), Locate::At("Prose line.\n".len()));
	assert_eq!(locate_statement(&value), Some("Prose line.\n\n".len() * 3 + 2));
}

#[test]
fn large_prose_documents_scan_in_linear_time() -> MdxpResult<()> {
	let document = "Some prose line here.\n\n".repeat(20_000);
	let started = std::time::Instant::now();

	assert!(!has_default_export(&document, &ParserExtensions::new())?);
	assert!(
		started.elapsed() < std::time::Duration::from_secs(10),
		"scanning took {:?}",
		started.elapsed()
	);

	Ok(())
}

#[test]
fn default_parser_has_no_statement_tokenizer() {
	let parser = BlockParser::default();

	assert!(!parser.contains(STATEMENT_TOKENIZER));
	assert_eq!(parser.names().last(), Some(PARAGRAPH_TOKENIZER));
}

#[test]
fn install_places_statement_before_paragraph() {
	let mut parser = BlockParser::default();
	install(&mut parser);

	let names = parser.names().collect::<Vec<_>>();
	assert_eq!(
		names,
		vec![
			"blank_line",
			"indented_code",
			"fenced_code",
			"block_quote",
			"atx_heading",
			"thematic_break",
			"list",
			"setext_heading",
			"html",
			"table",
			"statement",
			"paragraph",
		]
	);
}

#[test]
fn install_is_idempotent() {
	let mut parser = BlockParser::default();
	install(&mut parser);
	install(&mut parser);
	parser.extend(&StatementSyntax);

	let count = parser
		.names()
		.filter(|name| *name == STATEMENT_TOKENIZER)
		.count();

	assert_eq!(count, 1);
	assert_eq!(parser.names().count(), 12);
}

#[test]
fn install_after_extensions_stays_before_paragraph() {
	let extensions = ParserExtensions::new()
		.with(|parser: &mut BlockParser| {
			parser.push(MathBlock);
		})
		.with(StatementSyntax);
	let parser = build_parser(&extensions);

	let statement = parser.position(STATEMENT_TOKENIZER);
	let paragraph = parser.position(PARAGRAPH_TOKENIZER);

	assert_eq!(statement.map(|index| index + 1), paragraph);
	assert_eq!(parser.names().last(), Some(MATH_TOKENIZER));
}

#[test]
fn install_without_paragraph_appends() {
	let mut parser = BlockParser::empty();
	install(&mut parser);

	assert_eq!(parser.names().collect::<Vec<_>>(), vec![STATEMENT_TOKENIZER]);
}

#[test]
fn registering_existing_name_is_noop() {
	let mut parser = BlockParser::default();

	assert!(!parser.push(Paragraph));
	assert!(!parser.insert_before(FENCED_CODE_TOKENIZER, Paragraph));
	assert_eq!(parser.names().count(), 11);
	assert!(parser.remove(PARAGRAPH_TOKENIZER));
	assert!(!parser.remove(PARAGRAPH_TOKENIZER));
}

#[rstest]
#[case::leading_default(DEFAULT_EXPORT_DOCUMENT, true)]
#[case::trailing_default("# Title\n\nexport default Layout", true)]
#[case::after_prose("Some text.\n\nMore text.\n\nexport default Layout\n\nEnd.", true)]
#[case::named_as_default("export { Layout as default } from \"./layout\"\n\n# Hi", true)]
#[case::mixed_block("import Layout from \"./layout\"\nexport default Layout\n\n# Hi", true)]
#[case::crlf("export default Layout\r\n\r\nHello", true)]
#[case::block_quote("> export default Layout", true)]
#[case::list_item("- export default Layout", true)]
#[case::prose(PROSE_DOCUMENT, false)]
#[case::named_only("export const a = 1\n\nexport { b }\n\nText", false)]
#[case::import_only("import Layout from \"./layout\"\n\n# Hi", false)]
#[case::fenced_code("```js\nexport default Layout\n```\n\nText", false)]
#[case::tilde_fence("~~~\nexport default Layout\n~~~", false)]
#[case::unclosed_fence("```\n\nexport default Layout\n\n", false)]
#[case::indented_code("    export default Layout\n\nText", false)]
#[case::html_block("<div>\nexport default Layout\n</div>\n\nText", false)]
#[case::paragraph_continuation("Some prose\nexport default Layout\n\nMore", false)]
#[case::mixed_document(MIXED_DOCUMENT, false)]
#[case::empty("", false)]
fn detect_default_export(#[case] input: &str, #[case] expected: bool) -> MdxpResult<()> {
	let extensions = ParserExtensions::new();

	assert_eq!(has_default_export(input, &extensions)?, expected);
	// A fresh parser per call, so the answer never changes.
	assert_eq!(has_default_export(input, &extensions)?, expected);

	Ok(())
}

#[test]
fn caller_extensions_claim_their_blocks() -> MdxpResult<()> {
	let input = "$$\n\nexport default Layout\n\n$$\n\nText";

	assert!(has_default_export(input, &ParserExtensions::new())?);

	let extensions = ParserExtensions::new().with(|parser: &mut BlockParser| {
		parser.insert_before(FENCED_CODE_TOKENIZER, MathBlock);
	});

	assert!(!has_default_export(input, &extensions)?);

	Ok(())
}

#[test]
fn scanner_propagates_parse_errors() {
	let extensions = ParserExtensions::new().with(|parser: &mut BlockParser| {
		parser.remove(PARAGRAPH_TOKENIZER);
	});
	let result = has_default_export("Just text", &extensions);

	assert!(matches!(result, Err(MdxpError::Parse { offset: 0, .. })));
}

#[test]
fn zero_length_claims_are_parse_errors() {
	let mut parser = BlockParser::empty();
	parser.push(ZeroLength);

	assert!(matches!(parser.parse("text"), Err(MdxpError::Parse { .. })));
}

#[test]
fn nesting_limit_is_inclusive() -> MdxpResult<()> {
	let extensions = ParserExtensions::new();
	let deepest = nested_block_quotes(MAX_NESTING_DEPTH, "export default Layout");
	let too_deep = nested_block_quotes(MAX_NESTING_DEPTH + 1, "export default Layout");

	assert!(has_default_export(&deepest, &extensions)?);
	assert!(matches!(
		has_default_export(&too_deep, &extensions),
		Err(MdxpError::Parse { .. })
	));

	Ok(())
}

#[test]
fn deep_nesting_is_a_parse_error() -> MdxpResult<()> {
	let shallow = nested_block_quotes(3, "export default Layout");
	let deep = nested_block_quotes(MAX_NESTING_DEPTH + 6, "export default Layout");
	let extensions = ParserExtensions::new();

	assert!(has_default_export(&shallow, &extensions)?);
	assert!(matches!(
		has_default_export(&deep, &extensions),
		Err(MdxpError::Parse { .. })
	));

	Ok(())
}

#[test]
fn empty_parser_accepts_empty_document() -> MdxpResult<()> {
	let tree = BlockParser::empty().parse("")?;

	assert_eq!(tree.kind, NodeKind::Root);
	assert!(tree.children.is_empty());

	Ok(())
}

#[test]
fn parse_document_tree() -> MdxpResult<()> {
	let tree = parse_document(MIXED_DOCUMENT, &ParserExtensions::new())?;
	let kinds = tree
		.children
		.iter()
		.map(|node| {
			match &node.kind {
				NodeKind::Statement(block) => format!("statement:{}", block.kind),
				NodeKind::Heading { depth } => format!("heading:{depth}"),
				NodeKind::Code { fenced, info } => {
					format!("code:{fenced}:{}", info.as_deref().unwrap_or_default())
				}
				NodeKind::Html => "html".to_string(),
				other => format!("{other:?}"),
			}
		})
		.collect::<Vec<_>>();

	assert_eq!(
		kinds,
		vec![
			"statement:import",
			"heading:1",
			"statement:export",
			"code:true:js",
			"html",
		]
	);
	assert_eq!(tree.statements().count(), 2);

	Ok(())
}

#[test]
fn node_spans_cover_source() -> MdxpResult<()> {
	let input = "# Title\n\nexport default X\n";
	let tree = parse_document(input, &ParserExtensions::new())?;

	assert_eq!(tree.span, 0..input.len());
	assert_eq!(tree.children.len(), 2);
	assert_eq!(tree.children[0].span, 0..8);
	assert_eq!(tree.children[1].span, 9..25);
	assert_eq!(&input[tree.children[1].span.clone()], "export default X");

	Ok(())
}

#[test]
fn nested_statements_are_found_by_descendants() -> MdxpResult<()> {
	let input = "> quoted\n>\n> export default Layout\n\n- item\n\n  import A from \"a\"";
	let tree = parse_document(input, &ParserExtensions::new())?;
	let kinds = tree
		.statements()
		.map(|block| block.kind)
		.collect::<Vec<_>>();

	assert_eq!(kinds, vec![StatementKind::Export, StatementKind::Import]);

	Ok(())
}

#[test]
fn rewrite_noop_with_default_export() {
	let front_matter = FrontMatter::default();
	let output = rewrite(DEFAULT_EXPORT_DOCUMENT, &front_matter, true, Some(LAYOUT));

	assert!(matches!(output, Cow::Borrowed(_)));
	assert_eq!(output, DEFAULT_EXPORT_DOCUMENT);
}

#[rstest]
#[case::absent(None)]
#[case::empty(Some(""))]
#[case::blank(Some("   "))]
fn rewrite_noop_without_layout(#[case] layout: Option<&str>) {
	let front_matter = FrontMatter::default();
	let output = rewrite(PROSE_DOCUMENT, &front_matter, false, layout);

	assert!(matches!(output, Cow::Borrowed(_)));
	assert_eq!(output, PROSE_DOCUMENT);
}

#[test]
fn rewrite_injects_layout_without_front_matter() -> MdxpResult<()> {
	let front_matter = extract(PROSE_DOCUMENT)?;
	let output = rewrite(PROSE_DOCUMENT, &front_matter, false, Some(LAYOUT));

	assert_eq!(
		output,
		"import DefaultLayout from \"./Layout.js\"\n\nexport default DefaultLayout\n\n# Title\n\nSome \
		 *text*."
	);
	assert!(output.ends_with(PROSE_DOCUMENT));

	Ok(())
}

#[test]
fn rewrite_keeps_front_matter_first() -> MdxpResult<()> {
	let front_matter = extract(FRONT_MATTER_DOCUMENT)?;
	let output = rewrite(FRONT_MATTER_DOCUMENT, &front_matter, false, Some(LAYOUT));

	insta::assert_snapshot!(output, @r#"
	---
	title: Hi
	---

	import DefaultLayout from "./Layout.js"

	export default DefaultLayout

	No export here
	"#);
	assert!(output.ends_with(&front_matter.body));

	Ok(())
}

#[rstest]
#[case::plain("")]
#[case::bom("\u{feff}")]
fn rewrite_keeps_byte_order_mark_before_front_matter(#[case] prefix: &str) -> MdxpResult<()> {
	let input = format!("{prefix}{FRONT_MATTER_DOCUMENT}");
	let front_matter = extract(&input)?;
	let output = rewrite(&input, &front_matter, false, Some(LAYOUT));

	assert_eq!(
		output,
		format!(
			"{prefix}---\ntitle: Hi\n---\n\nimport DefaultLayout from \"./Layout.js\"\n\nexport \
			 default DefaultLayout\n\nNo export here"
		)
	);

	Ok(())
}

#[rstest]
#[case::plain("")]
#[case::bom("\u{feff}")]
fn process_keeps_metadata_of_byte_order_mark_documents(#[case] prefix: &str) -> MdxpResult<()> {
	let input = format!("{prefix}{FRONT_MATTER_DOCUMENT}");
	let preprocessor = Preprocessor::new(DefaultLayouts::from([("default", LAYOUT)]), Passthrough);
	let processed = preprocessor.process(&Document::new(&input), OutputMode::Component)?;
	let compiled = processed
		.component()
		.unwrap_or_else(|| panic!("expected a compiled document"));

	assert_eq!(
		compiled.metadata.get("title").and_then(Value::as_str),
		Some("Hi")
	);
	assert!(compiled.compile_input.starts_with(&format!("{prefix}---\ntitle: Hi\n---\n\n")));

	Ok(())
}

#[test]
fn rewrite_output_is_detected_as_default_export() -> MdxpResult<()> {
	let front_matter = extract(FRONT_MATTER_DOCUMENT)?;
	let output = rewrite(FRONT_MATTER_DOCUMENT, &front_matter, false, Some(LAYOUT));
	let rewritten = extract(&output)?;

	assert_eq!(rewritten.metadata, front_matter.metadata);
	assert!(has_default_export(&rewritten.body, &ParserExtensions::new())?);

	Ok(())
}

#[rstest]
#[case::windows("src\\components\\layout.js", "import DefaultLayout from \"src/components/layout.js\"")]
#[case::posix("/site/src/layout.js", "import DefaultLayout from \"/site/src/layout.js\"")]
#[case::quote("./we\"ird.js", "import DefaultLayout from \"./we\\\"ird.js\"")]
fn rewrite_normalizes_layout_paths(#[case] layout: &str, #[case] expected: &str) {
	let output = rewrite("Hello", &FrontMatter::default(), false, Some(layout));

	assert!(output.starts_with(&format!("{expected}\n\n")));
}

#[rstest]
#[case::backslashes("a\\b\\c.js", "a/b/c.js")]
#[case::forward("a/b/c.js", "a/b/c.js")]
#[case::extended_length("\\\\?\\C:\\site\\layout.js", "\\\\?\\C:\\site\\layout.js")]
fn slash_paths(#[case] input: &str, #[case] expected: &str) {
	assert_eq!(slash(input), expected);
}

#[test]
fn default_layouts_fall_back_to_default() {
	let layouts = DefaultLayouts::from([("default", "./Default.js"), ("posts", "./Post.js")]);

	assert_eq!(layouts.resolve("posts").as_deref(), Some("./Post.js"));
	assert_eq!(layouts.resolve("pages").as_deref(), Some("./Default.js"));

	let layouts = DefaultLayouts::new().with("posts", "./Post.js");

	assert_eq!(layouts.resolve("pages"), None);
}

#[test]
fn closures_resolve_layouts() {
	let resolver = |group: &str| (group == "docs").then(|| "./Docs.js".to_string());

	assert_eq!(resolver.resolve("docs").as_deref(), Some("./Docs.js"));
	assert_eq!(resolver.resolve("blog"), None);
}

#[test]
fn extract_yaml_front_matter() -> MdxpResult<()> {
	let input = "---\ntitle: Hi\ntags:\n  - a\n  - b\n---\nBody\n";
	let front_matter = extract(input)?;

	assert_eq!(
		front_matter.metadata.get("title").and_then(Value::as_str),
		Some("Hi")
	);
	assert_eq!(
		front_matter
			.metadata
			.get("tags")
			.and_then(Value::as_sequence)
			.map(Vec::len),
		Some(2)
	);
	assert_eq!(
		front_matter.matter.as_deref(),
		Some("---\ntitle: Hi\ntags:\n  - a\n  - b\n---")
	);
	assert_eq!(front_matter.body, "Body\n");
	assert_eq!(front_matter.language, None);

	Ok(())
}

#[rstest]
#[case::json("---json\n{\"title\": \"Hi\"}\n---\nBody", "json")]
#[case::toml("---toml\ntitle = \"Hi\"\n---\nBody", "toml")]
#[case::yaml("---yaml\ntitle: Hi\n---\nBody", "yaml")]
fn extract_tagged_front_matter(#[case] input: &str, #[case] language: &str) -> MdxpResult<()> {
	let front_matter = extract(input)?;

	assert_eq!(
		front_matter.metadata.get("title").and_then(Value::as_str),
		Some("Hi")
	);
	assert_eq!(front_matter.language.as_deref(), Some(language));
	assert_eq!(front_matter.body, "Body");

	Ok(())
}

#[rstest]
#[case::plain("---\ntitle: Hi\n---\nBody")]
#[case::bom("\u{feff}---\ntitle: Hi\n---\nBody")]
#[case::bom_crlf("\u{feff}---\r\ntitle: Hi\r\n---\r\nBody")]
fn extract_skips_byte_order_mark(#[case] input: &str) -> MdxpResult<()> {
	let front_matter = extract(input)?;

	assert_eq!(
		front_matter.metadata.get("title").and_then(Value::as_str),
		Some("Hi")
	);
	assert!(front_matter.matter.as_deref().is_some_and(|matter| matter.starts_with("---")));
	assert_eq!(front_matter.body, "Body");

	Ok(())
}

#[test]
fn extract_drops_byte_order_mark_from_body() -> MdxpResult<()> {
	let front_matter = extract("\u{feff}export default Layout\n")?;

	assert!(!front_matter.has_matter());
	assert_eq!(front_matter.body, "export default Layout\n");
	assert!(has_default_export(&front_matter.body, &ParserExtensions::new())?);

	Ok(())
}

#[rstest]
#[case::none("# Title\n\nBody")]
#[case::four_dashes("----\ntitle: Hi\n----\nBody")]
#[case::not_at_start("\n---\ntitle: Hi\n---\nBody")]
#[case::invalid_language("--- not a tag!\ntitle: Hi\n---\nBody")]
fn extract_without_front_matter(#[case] input: &str) -> MdxpResult<()> {
	let front_matter = extract(input)?;

	assert!(!front_matter.has_matter());
	assert!(front_matter.metadata.is_empty());
	assert_eq!(front_matter.body, input);

	Ok(())
}

#[rstest]
#[case::empty("---\n---\nBody", "---\n---")]
#[case::blank("---\n\n---\nBody", "---\n\n---")]
fn extract_empty_front_matter(#[case] input: &str, #[case] matter: &str) -> MdxpResult<()> {
	let front_matter = extract(input)?;

	assert!(front_matter.metadata.is_empty());
	assert_eq!(front_matter.matter.as_deref(), Some(matter));
	assert_eq!(front_matter.body, "Body");

	Ok(())
}

#[test]
fn extract_crlf_front_matter() -> MdxpResult<()> {
	let front_matter = extract("---\r\ntitle: Hi\r\n---\r\nBody")?;

	assert_eq!(
		front_matter.metadata.get("title").and_then(Value::as_str),
		Some("Hi")
	);
	assert_eq!(front_matter.matter.as_deref(), Some("---\r\ntitle: Hi\r\n---"));
	assert_eq!(front_matter.body, "Body");

	Ok(())
}

#[rstest]
#[case::unclosed("---\ntitle: Hi\nBody")]
#[case::sequence("---\n- a\n- b\n---\nBody")]
#[case::scalar("---\njust words\n---\nBody")]
#[case::invalid_yaml("---\ntitle: [unclosed\n---\nBody")]
#[case::invalid_json("---json\n{ title: }\n---\nBody")]
#[case::unsupported_language("---ini\ntitle=Hi\n---\nBody")]
fn extract_malformed_front_matter(#[case] input: &str) {
	assert!(matches!(
		extract(input),
		Err(MdxpError::MalformedMetadata { .. })
	));
}

#[test]
fn extract_with_custom_delimiter() -> MdxpResult<()> {
	let options = FrontMatterOptions {
		delimiter: "+++".to_string(),
	};
	let front_matter = extract_with_options("+++\ntitle: Hi\n+++\nBody", &options)?;

	assert_eq!(
		front_matter.metadata.get("title").and_then(Value::as_str),
		Some("Hi")
	);
	assert_eq!(front_matter.body, "Body");
	assert!(!extract("+++\ntitle: Hi\n+++\nBody")?.has_matter());

	Ok(())
}

#[test]
fn serialize_round_trips() -> MdxpResult<()> {
	let metadata = extract("---\ntitle: Hi\ndraft: false\norder: 3\n---\n")?.metadata;
	let serialized = serialize(&metadata)?;

	assert_eq!(serialized, "---\ntitle: Hi\ndraft: false\norder: 3\n---\n");

	let body = "Hello\n\nWorld";
	assert_eq!(extract(&format!("{serialized}{body}"))?.body, body);
	assert_eq!(
		extract(&format!("{serialized}\n\n{body}"))?.metadata,
		metadata
	);

	Ok(())
}

#[test]
fn serialize_empty_metadata() -> MdxpResult<()> {
	let serialized = serialize(&Metadata::new())?;

	assert_eq!(serialized, "---\n---\n");
	assert_eq!(extract(&format!("{serialized}Body"))?.body, "Body");

	Ok(())
}

#[test]
fn metadata_with_complex_keys_is_not_json() -> MdxpResult<()> {
	let metadata = extract("---\n? [a, b]\n: value\n---\n")?.metadata;

	assert!(matches!(
		metadata.to_json(),
		Err(MdxpError::MetadataJson(_))
	));

	Ok(())
}

#[test]
fn process_leaves_default_export_documents_alone() -> MdxpResult<()> {
	let preprocessor = Preprocessor::new(DefaultLayouts::from([("default", LAYOUT)]), Passthrough);
	let processed = preprocessor.process(&Document::new(DEFAULT_EXPORT_DOCUMENT), OutputMode::Component)?;
	let compiled = processed
		.component()
		.unwrap_or_else(|| panic!("expected a component"));

	assert_eq!(compiled.compile_input, DEFAULT_EXPORT_DOCUMENT);
	assert_eq!(compiled.compiled, DEFAULT_EXPORT_DOCUMENT);
	assert!(!compiled.layout_injected);

	Ok(())
}

#[test]
fn process_injects_layout_by_group() -> MdxpResult<()> {
	let layouts = DefaultLayouts::from([("default", "./Default.js"), ("posts", "./Post.js")]);
	let preprocessor = Preprocessor::new(layouts, Passthrough);

	let document = Document::new(PROSE_DOCUMENT).with_group("posts");
	let processed = preprocessor.process(&document, OutputMode::Component)?;
	let compiled = processed
		.component()
		.unwrap_or_else(|| panic!("expected a component"));

	assert!(compiled.layout_injected);
	assert!(
		compiled
			.compile_input
			.starts_with("import DefaultLayout from \"./Post.js\"\n\nexport default DefaultLayout\n\n")
	);
	assert!(compiled.compile_input.ends_with(PROSE_DOCUMENT));

	let processed = preprocessor.process(&Document::new(PROSE_DOCUMENT), OutputMode::Component)?;
	let compiled = processed
		.component()
		.unwrap_or_else(|| panic!("expected a component"));

	assert!(compiled.compile_input.starts_with("import DefaultLayout from \"./Default.js\""));

	Ok(())
}

#[test]
fn process_without_layout_is_a_noop() -> MdxpResult<()> {
	let preprocessor = Preprocessor::new(DefaultLayouts::new(), Passthrough);
	let processed = preprocessor.process(&Document::new(FRONT_MATTER_DOCUMENT), OutputMode::Component)?;
	let compiled = processed
		.component()
		.unwrap_or_else(|| panic!("expected a component"));

	assert_eq!(compiled.compile_input, FRONT_MATTER_DOCUMENT);
	assert!(!compiled.layout_injected);
	assert_eq!(
		compiled.metadata.get("title").and_then(Value::as_str),
		Some("Hi")
	);

	Ok(())
}

#[test]
fn process_metadata_only_skips_scan_and_compile() -> MdxpResult<()> {
	let parsers = Arc::new(AtomicUsize::new(0));
	let compiles = Cell::new(0);
	let counter = Arc::clone(&parsers);
	let compiler = |text: &str| -> MdxpResult<String> {
		compiles.set(compiles.get() + 1);
		Ok(text.to_string())
	};
	let preprocessor = Preprocessor::new(DefaultLayouts::from([("default", LAYOUT)]), compiler)
		.with_extension(move |_: &mut BlockParser| {
			counter.fetch_add(1, Ordering::SeqCst);
		});

	let processed = preprocessor.process(&Document::new(FRONT_MATTER_DOCUMENT), OutputMode::MetadataOnly)?;

	assert!(matches!(processed, Processed::MetadataOnly(_)));
	assert_eq!(
		processed.metadata().get("title").and_then(Value::as_str),
		Some("Hi")
	);
	assert_eq!(parsers.load(Ordering::SeqCst), 0);
	assert_eq!(compiles.get(), 0);

	preprocessor.process(&Document::new(FRONT_MATTER_DOCUMENT), OutputMode::Component)?;

	assert_eq!(parsers.load(Ordering::SeqCst), 1);
	assert_eq!(compiles.get(), 1);

	Ok(())
}

#[test]
fn process_fails_on_malformed_front_matter() {
	let preprocessor = Preprocessor::new(DefaultLayouts::from([("default", LAYOUT)]), Passthrough);

	for mode in [OutputMode::Component, OutputMode::MetadataOnly] {
		let result = preprocessor.process(&Document::new("---\ntitle: [\n---\nBody"), mode);

		assert!(matches!(result, Err(MdxpError::MalformedMetadata { .. })));
	}
}

#[test]
fn process_propagates_compile_errors() {
	let compiler = |_: &str| -> MdxpResult<String> {
		Err(MdxpError::Compile("unsupported syntax".to_string()))
	};
	let preprocessor = Preprocessor::new(DefaultLayouts::new(), compiler);
	let result = preprocessor.process(&Document::new(PROSE_DOCUMENT), OutputMode::Component);

	assert!(matches!(result, Err(MdxpError::Compile(_))));
}

#[traced_test]
#[test]
fn process_logs_layout_injection() {
	let preprocessor = Preprocessor::new(DefaultLayouts::from([("default", LAYOUT)]), Passthrough);
	preprocessor
		.process(&Document::new(PROSE_DOCUMENT), OutputMode::Component)
		.unwrap_or_else(|e| panic!("process: {e}"));

	assert!(logs_contain("inserting default layout"));
	assert!(logs_contain("./Layout.js"));
}

#[test]
fn html_compiler_renders_prose() -> MdxpResult<()> {
	let preprocessor = Preprocessor::new(DefaultLayouts::from([("default", LAYOUT)]), HtmlCompiler::new());
	let input = "---\ntitle: Hi\n---\n\nimport Chart from \"./chart\"\n\n# Title\n\nSome *text*.";
	let processed = preprocessor.process(&Document::new(input), OutputMode::Component)?;
	let compiled = processed
		.component()
		.unwrap_or_else(|| panic!("expected a component"));

	assert!(compiled.layout_injected);
	assert!(compiled.compiled.contains("<h1>Title</h1>"));
	assert!(compiled.compiled.contains("<em>text</em>"));
	assert!(!compiled.compiled.contains("DefaultLayout"));
	assert!(!compiled.compiled.contains("Chart"));
	assert!(!compiled.compiled.contains("title: Hi"));

	Ok(())
}

#[test]
fn metadata_module_reexports_component() -> MdxpResult<()> {
	let metadata = extract(FRONT_MATTER_DOCUMENT)?.metadata;
	let module = metadata_module("posts\\hello.mdx", &metadata)?;

	insta::assert_snapshot!(module, @r#"
	import MDXContent from "/posts/hello.mdx?type=component";
	export default MDXContent;
	export * from "/posts/hello.mdx?type=component"

	export const _frontmatter = {"title":"Hi"};
	"#);

	let module = metadata_module("/posts/hello.mdx", &Metadata::new())?;
	assert!(module.ends_with("export const _frontmatter = {};"));
	assert!(module.starts_with("import MDXContent from \"/posts/hello.mdx?type=component\";"));

	Ok(())
}

#[test]
fn config_from_root() -> MdxpResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	std::fs::write(
		tmp.path().join("mdxp.toml"),
		"[layouts]\ndefault = \"src/layout.js\"\nposts = \"src/post.js\"\n\n[front_matter]\ndelimiter = \"+++\"\n",
	)?;

	let config = MdxpConfig::load(tmp.path())?.unwrap_or_else(|| panic!("expected a config"));

	assert_eq!(config.layouts.resolve("posts").as_deref(), Some("src/post.js"));
	assert_eq!(config.layouts.resolve("pages").as_deref(), Some("src/layout.js"));
	assert_eq!(config.front_matter.delimiter, "+++");

	let preprocessor = Preprocessor::from_config(config, Passthrough);
	let processed = preprocessor.process(&Document::new("+++\ntitle: Hi\n+++\nBody"), OutputMode::Component)?;
	let compiled = processed
		.component()
		.unwrap_or_else(|| panic!("expected a component"));

	assert_eq!(
		compiled.compile_input,
		"+++\ntitle: Hi\n+++\n\nimport DefaultLayout from \"src/layout.js\"\n\nexport default \
		 DefaultLayout\n\nBody"
	);

	Ok(())
}

#[test]
fn config_discovery_order() -> MdxpResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));

	assert_eq!(MdxpConfig::load(tmp.path())?, None);

	std::fs::create_dir_all(tmp.path().join(".config"))?;
	std::fs::write(
		tmp.path().join(".config/mdxp.toml"),
		"[layouts]\ndefault = \"nested.js\"\n",
	)?;
	let config = MdxpConfig::load(tmp.path())?.unwrap_or_else(|| panic!("expected a config"));
	assert_eq!(config.layouts.resolve("default").as_deref(), Some("nested.js"));
	assert_eq!(config.front_matter, FrontMatterOptions::default());

	std::fs::write(tmp.path().join(".mdxp.toml"), "[layouts]\ndefault = \"hidden.js\"\n")?;
	let config = MdxpConfig::load(tmp.path())?.unwrap_or_else(|| panic!("expected a config"));
	assert_eq!(config.layouts.resolve("default").as_deref(), Some("hidden.js"));

	std::fs::write(tmp.path().join("mdxp.toml"), "[layouts]\ndefault = \"root.js\"\n")?;
	let config = MdxpConfig::load(tmp.path())?.unwrap_or_else(|| panic!("expected a config"));
	assert_eq!(config.layouts.resolve("default").as_deref(), Some("root.js"));

	Ok(())
}

#[rstest]
#[case::invalid_toml("[layouts\ndefault = 1")]
#[case::wrong_type("[layouts]\ndefault = 1\n")]
#[case::empty_delimiter("[front_matter]\ndelimiter = \"\"\n")]
fn config_parse_errors(#[case] content: &str) {
	assert!(matches!(
		MdxpConfig::parse(content),
		Err(MdxpError::ConfigParse(_))
	));
}
