use crate::utils::span::FileInfo;
use logos::Logos;
use std::fmt::{self, Display};

#[derive(Logos, Clone, Copy, Debug, PartialEq)]
#[logos(skip r"\s+")]
pub enum Tok<'input> {
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    /// A maximal run of characters that are not whitespace or brackets:
    /// names, keywords, integer literals and arithmetic operators.
    #[regex(r"[^\s()\[\]]+")]
    Word(&'input str),
}

impl<'input> Display for Tok<'input> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tok::ParenOpen => write!(f, "("),
            Tok::ParenClose => write!(f, ")"),
            Tok::BracketOpen => write!(f, "["),
            Tok::BracketClose => write!(f, "]"),
            Tok::Word(word) => write!(f, "{}", word),
        }
    }
}

/// The parser's view of the input: the token sequence with the line each
/// token starts on.
pub struct Tokens<'input> {
    toks: Vec<(Tok<'input>, usize)>,
    pos: usize,
    eof_line: usize,
}

impl<'input> Tokens<'input> {
    pub fn new(input: &'input str) -> Self {
        let info = FileInfo::new(input);
        let mut toks = Vec::new();
        for (tok, span) in Tok::lexer(input).spanned() {
            if let Ok(tok) = tok {
                toks.push((tok, info.line_of(span.start)));
            }
        }
        Tokens { toks, pos: 0, eof_line: info.line_of(input.len()) }
    }

    pub fn peek(&self) -> Option<(Tok<'input>, usize)> {
        self.toks.get(self.pos).copied()
    }

    /// One token past `peek`; dispatches on the keyword after an opening
    /// parenthesis.
    pub fn peek_second(&self) -> Option<(Tok<'input>, usize)> {
        self.toks.get(self.pos + 1).copied()
    }

    pub fn bump(&mut self) -> Option<(Tok<'input>, usize)> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Line of the next token, or of the end of input when exhausted.
    pub fn line(&self) -> usize {
        self.peek().map_or(self.eof_line, |(_, line)| line)
    }

    pub fn eof_line(&self) -> usize {
        self.eof_line
    }
}
