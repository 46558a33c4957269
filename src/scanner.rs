use std::str::{Chars, SplitWhitespace};

use serde::Serialize;

use crate::error::ScanError;

/// A token handed to the parsers. `kind` is matched against terminal names,
/// `text` is the lexeme kept in parse trees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    pub kind: String,
    pub text: String,
}

impl Token {
    pub fn new(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
        }
    }

    /// A token whose kind is its own text.
    pub fn word(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            kind: text.clone(),
            text,
        }
    }
}

/// Pull interface: one token at a time, `Ok(None)` at end of stream.
pub trait Scanner {
    fn next_token(&mut self) -> Result<Option<Token>, ScanError>;
}

impl<S: Scanner + ?Sized> Scanner for &mut S {
    fn next_token(&mut self) -> Result<Option<Token>, ScanError> {
        (**self).next_token()
    }
}

impl<S: Scanner + ?Sized> Scanner for Box<S> {
    fn next_token(&mut self) -> Result<Option<Token>, ScanError> {
        (**self).next_token()
    }
}

/// Splits the input on whitespace; every word is a token of its own kind.
pub struct WordScanner<'a> {
    words: SplitWhitespace<'a>,
}

impl<'a> WordScanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            words: input.split_whitespace(),
        }
    }
}

impl Scanner for WordScanner<'_> {
    fn next_token(&mut self) -> Result<Option<Token>, ScanError> {
        Ok(self.words.next().map(Token::word))
    }
}

/// Every non-whitespace character is a token of its own kind.
pub struct CharScanner<'a> {
    chars: Chars<'a>,
}

impl<'a> CharScanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars(),
        }
    }
}

impl Scanner for CharScanner<'_> {
    fn next_token(&mut self) -> Result<Option<Token>, ScanError> {
        Ok(self
            .chars
            .find(|c| !c.is_whitespace())
            .map(|c| Token::word(c.to_string())))
    }
}

/// Adapts an iterator of fallible tokens.
pub struct TokenStream<I> {
    iter: I,
}

impl<I> TokenStream<I>
where
    I: Iterator<Item = Result<Token, ScanError>>,
{
    pub fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<T> TokenStream<std::iter::Map<T, fn(Token) -> Result<Token, ScanError>>>
where
    T: Iterator<Item = Token>,
{
    pub fn from_tokens<I: IntoIterator<IntoIter = T>>(tokens: I) -> Self {
        Self {
            iter: tokens
                .into_iter()
                .map(Ok as fn(Token) -> Result<Token, ScanError>),
        }
    }
}

impl<I> Scanner for TokenStream<I>
where
    I: Iterator<Item = Result<Token, ScanError>>,
{
    fn next_token(&mut self) -> Result<Option<Token>, ScanError> {
        self.iter.next().transpose()
    }
}
