use std::borrow::Cow;

use crate::front_matter::BYTE_ORDER_MARK;
use crate::front_matter::FrontMatter;
use crate::layout::slash;

/// Local name the injected layout import binds.
pub const LAYOUT_BINDING: &str = "DefaultLayout";

/// Inject a layout component as the default export of `original`.
///
/// `original` is returned untouched when the document already has a default
/// export or when `layout` is missing or blank. Otherwise the front matter
/// block is kept at the top (after any byte order mark) and followed by an
/// import of the layout and a default export of it, then the unchanged body:
///
/// ```text
/// <front matter>
///
/// import DefaultLayout from "<layout>"
///
/// export default DefaultLayout
///
/// <body>
/// ```
pub fn rewrite<'a>(
	original: &'a str,
	front_matter: &FrontMatter,
	has_default_export: bool,
	layout: Option<&str>,
) -> Cow<'a, str> {
	if has_default_export {
		return Cow::Borrowed(original);
	}

	let Some(layout) = layout.filter(|layout| !layout.trim().is_empty()) else {
		return Cow::Borrowed(original);
	};

	let (bom, content) = match original.strip_prefix(BYTE_ORDER_MARK) {
		Some(content) => (&original[..BYTE_ORDER_MARK.len_utf8()], content),
		None => ("", original),
	};
	let (matter, body) = split_matter(content, front_matter);
	let layout = slash(layout).replace('\\', "\\\\").replace('"', "\\\"");
	let mut output = String::with_capacity(original.len() + layout.len() + 64);

	output.push_str(bom);

	if let Some(matter) = matter {
		output.push_str(matter);
		output.push_str("\n\n");
	}

	output.push_str(&format!("import {LAYOUT_BINDING} from \"{layout}\"\n\n"));
	output.push_str(&format!("export default {LAYOUT_BINDING}\n\n"));
	output.push_str(body);

	Cow::Owned(output)
}

/// The front matter block of `original` and the body after it. The body is
/// taken from `original` itself so that it is reproduced byte for byte.
fn split_matter<'a>(original: &'a str, front_matter: &FrontMatter) -> (Option<&'a str>, &'a str) {
	let Some(matter) = front_matter.matter.as_deref() else {
		return (None, original);
	};

	let Some(rest) = original.strip_prefix(matter) else {
		return (None, original);
	};

	let body = rest
		.strip_prefix("\r\n")
		.or_else(|| rest.strip_prefix('\n'))
		.unwrap_or(rest);

	(Some(&original[..matter.len()]), body)
}
