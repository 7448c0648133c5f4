use std::ops::Range;

use logos::Logos;

/// Tokens of the module statement subset needed to tell an `import` or
/// `export` statement apart from prose that happens to start with the same
/// word.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\f]+")]
pub(crate) enum StatementToken {
	#[token("import")]
	Import,
	#[token("export")]
	Export,
	#[token("default")]
	Default,
	#[token("from")]
	From,
	#[token("as")]
	As,
	#[token("const")]
	#[token("let")]
	#[token("var")]
	#[token("function")]
	#[token("class")]
	#[token("async")]
	#[token("type")]
	#[token("interface")]
	#[token("enum")]
	#[token("declare")]
	#[token("abstract")]
	Declaration,
	#[token("{")]
	BraceOpen,
	#[token("}")]
	BraceClose,
	#[token("*")]
	Star,
	#[token(",")]
	Comma,
	#[token(";")]
	Semicolon,
	#[token("\n")]
	Newline,
	#[regex(r#""([^"\\\n]|\\.)*""#)]
	#[regex(r"'([^'\\\n]|\\.)*'")]
	String,
	#[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
	Ident,
}

/// A lexed token and its byte span. `token` is `None` for anything outside
/// the statement subset (operators, numbers, template literals, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Lexeme {
	pub token: Option<StatementToken>,
	pub span: Range<usize>,
}

impl Lexeme {
	pub fn is(&self, token: StatementToken) -> bool {
		self.token == Some(token)
	}
}

pub(crate) fn lex(source: &str) -> Vec<Lexeme> {
	StatementToken::lexer(source)
		.spanned()
		.map(|(result, span)| {
			Lexeme {
				token: result.ok(),
				span,
			}
		})
		.collect()
}
