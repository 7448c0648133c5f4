use crate::MdxpResult;
use crate::block_parser::BlockTokenizer;
use crate::block_parser::Consumed;
use crate::block_parser::Cursor;
use crate::tree::Node;
use crate::tree::NodeKind;

pub const LAYOUT: &str = "./Layout.js";
pub const MATH_TOKENIZER: &str = "math";

pub const DEFAULT_EXPORT_DOCUMENT: &str = "export default () => null\n\nHello";
pub const PROSE_DOCUMENT: &str = "# Title\n\nSome *text*.";
pub const FRONT_MATTER_DOCUMENT: &str = "---\ntitle: Hi\n---\nNo export here";

pub const MIXED_DOCUMENT: &str = r#"import { Chart } from "../components/chart"

# Quarterly numbers

export const meta = {
  author: "Ada",
}

```js
export default function NotReal() {}
```

<Chart />
"#;

/// Claims `$$` delimited math blocks, blank lines included.
pub struct MathBlock;

impl BlockTokenizer for MathBlock {
	fn name(&self) -> &str {
		MATH_TOKENIZER
	}

	fn try_consume(&self, _cursor: &Cursor<'_>, value: &str) -> MdxpResult<Option<Consumed>> {
		let Some(rest) = value.strip_prefix("$$\n") else {
			return Ok(None);
		};
		let length = rest
			.find("\n$$")
			.map_or(value.len(), |index| "$$\n".len() + index + "\n$$".len());
		let node = Node::new(NodeKind::Custom {
			name: MATH_TOKENIZER.to_string(),
		});

		Ok(Some(Consumed::node(length, node)))
	}
}

/// Accepts every position without consuming anything.
pub struct ZeroLength;

impl BlockTokenizer for ZeroLength {
	fn name(&self) -> &str {
		"zero_length"
	}

	fn try_consume(&self, _cursor: &Cursor<'_>, _value: &str) -> MdxpResult<Option<Consumed>> {
		Ok(Some(Consumed::skip(0)))
	}
}

pub fn nested_block_quotes(depth: usize, content: &str) -> String {
	format!("{} {content}", ">".repeat(depth))
}
