//! `mdxp_core` preprocesses markdown documents with embedded `import` and
//! `export` statements before they reach a component compiler. It decides
//! whether a document already declares its own default export and, when it
//! does not, injects a configured layout component as the default export.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Document
//!   → Front matter extraction (metadata mapping + body)
//!   → Layout resolution (content group → layout path, with a "default" fallback)
//!   → Default export scan (block parser with the statement tokenizer installed)
//!   → Layout injection (front matter, layout import, default export, body)
//!   → Document compiler
//! ```
//!
//! ## Modules
//!
//! - [`block_parser`]: The ordered block tokenizer list, its cursor and parser extensions.
//! - [`block_tokenizers`]: The default markdown block tokenizers.
//! - [`statement`]: The `import`/`export` statement tokenizer and its installer.
//! - [`front_matter`]: Front matter extraction and serialization.
//! - [`config`]: Configuration loading from `mdxp.toml`.
//!
//! ## Key Types
//!
//! - [`Preprocessor`]: Runs a [`Document`] through the whole pipeline.
//! - [`StatementBlock`]: A recognized statement block with its kind and default export flag.
//! - [`FrontMatter`]: A document split into metadata, the verbatim front matter block and the body.
//! - [`DefaultLayouts`]: Layouts keyed by content group.
//! - [`MdxpConfig`]: Configuration loaded from `mdxp.toml`.
//!
//! ## Limits
//!
//! Block quotes and list items may nest at most
//! [`MAX_NESTING_DEPTH`] (64) levels deep. A document nested deeper, such as
//! a line opening with 65 `>` markers, is valid markdown but is rejected with
//! [`MdxpError::Parse`] rather than scanned.
//!
//! ## Quick Start
//!
//! ```rust
//! use mdxp_core::DefaultLayouts;
//! use mdxp_core::Document;
//! use mdxp_core::OutputMode;
//! use mdxp_core::Passthrough;
//! use mdxp_core::Preprocessor;
//!
//! let layouts = DefaultLayouts::from([("default", "./Layout.js")]);
//! let preprocessor = Preprocessor::new(layouts, Passthrough);
//! let document = Document::new("# Title\n\nSome *text*.");
//! let processed = preprocessor
//! 	.process(&document, OutputMode::Component)
//! 	.unwrap();
//!
//! let compiled = processed.component().unwrap();
//! assert!(compiled.layout_injected);
//! assert!(compiled.compile_input.starts_with("import DefaultLayout from \"./Layout.js\""));
//! ```

pub use block_parser::*;
pub use compiler::*;
pub use config::*;
pub use error::*;
pub use front_matter::*;
pub use layout::*;
pub use preprocess::*;
pub use rewriter::*;
pub use scanner::*;
pub use statement::*;
pub use tree::*;

pub mod block_parser;
pub mod block_tokenizers;
mod compiler;
pub mod config;
#[allow(unused_assignments)]
mod error;
pub mod front_matter;
mod layout;
pub(crate) mod lexer;
mod preprocess;
mod rewriter;
mod scanner;
pub mod statement;
mod tree;

#[cfg(test)]
mod __fixtures;
#[cfg(test)]
mod __tests;
