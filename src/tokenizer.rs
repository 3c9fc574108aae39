//! Shell-like line splitting
//!
//! POSIX-style quoting rules:
//! - whitespace separates words; adjacent pieces join into one word
//! - `'…'` is literal
//! - `"…"` honours `\"`, `\\`, `\$`, `` \` `` and keeps other backslashes
//! - an unquoted backslash escapes the next character
//!
//! [`Mode::Lenient`] accepts an unterminated quote or a trailing backslash and records
//! where it happened, which is what completion and live validation need while a line
//! is still being typed. [`Mode::Strict`] rejects both.

use nom::{
    branch::alt,
    bytes::complete::{is_not, take_until},
    character::complete::{anychar, char, multispace0},
    combinator::{eof, map, rest, value},
    error::ParseError as NomParseError,
    multi::fold_many0,
    sequence::{delimited, preceded, terminated},
    IResult,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenizeError {
    #[error("missing closing quotation")]
    UnclosedQuote { quote: char, position: usize },

    #[error("no escaped character")]
    TrailingEscape { position: usize },

    #[error("cannot split input at position {position}")]
    Unparseable { position: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Strict,
    Lenient,
}

/// Quote left open at the end of the line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenQuote {
    pub quote: char,
    /// Byte offset of the quote character
    pub position: usize,
}

/// One word with its byte span in the source line
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Unescaped text
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub open_quote: Option<OpenQuote>,
    pub dangling_escape: bool,
}

impl Token {
    pub fn is_complete(&self) -> bool {
        self.open_quote.is_none() && !self.dangling_escape
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Split a submitted line into words
pub fn split(line: &str) -> Result<Vec<String>, TokenizeError> {
    Ok(split_spans(line, Mode::Strict)?
        .into_iter()
        .map(|token| token.text)
        .collect())
}

/// Split a line keeping byte spans
pub fn split_spans(line: &str, mode: Mode) -> Result<Vec<Token>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut input = line;

    loop {
        let (remaining, _) = multispace0::<_, nom::error::Error<&str>>(input)
            .map_err(|_| TokenizeError::Unparseable {
                position: offset(line, input),
            })?;
        if remaining.is_empty() {
            break;
        }

        let (after, token) = word(line, remaining);
        if after.len() == remaining.len() {
            return Err(TokenizeError::Unparseable {
                position: offset(line, remaining),
            });
        }

        if mode == Mode::Strict {
            if let Some(open) = token.open_quote {
                return Err(TokenizeError::UnclosedQuote {
                    quote: open.quote,
                    position: open.position,
                });
            }
            if token.dangling_escape {
                return Err(TokenizeError::TrailingEscape {
                    position: token.end.saturating_sub(1),
                });
            }
        }

        tokens.push(token);
        input = after;
    }

    Ok(tokens)
}

/// Wrap a candidate in quotes when it would otherwise split
pub fn quote(text: &str) -> String {
    if text.chars().any(char::is_whitespace) {
        if text.contains('\'') {
            format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
        } else {
            format!("'{}'", text)
        }
    } else {
        text.to_string()
    }
}

// ============================================================================
// Internal Parsers
// ============================================================================

#[derive(Clone)]
enum Piece {
    Text(String),
    Open(char, String),
    Dangling,
}

fn offset(line: &str, remaining: &str) -> usize {
    line.len() - remaining.len()
}

fn word<'a>(line: &'a str, input: &'a str) -> (&'a str, Token) {
    let start = offset(line, input);
    let mut text = String::new();
    let mut open_quote = None;
    let mut dangling_escape = false;
    let mut remaining = input;

    while let Ok((after, piece)) = piece::<nom::error::Error<&str>>(remaining) {
        match piece {
            Piece::Text(part) => text.push_str(&part),
            Piece::Open(quote, part) => {
                open_quote = Some(OpenQuote {
                    quote,
                    position: offset(line, remaining),
                });
                text.push_str(&part);
            }
            Piece::Dangling => {
                dangling_escape = true;
                text.push('\\');
            }
        }
        remaining = after;
        if open_quote.is_some() || dangling_escape {
            break;
        }
    }

    let token = Token {
        text,
        start,
        end: offset(line, remaining),
        open_quote,
        dangling_escape,
    };
    (remaining, token)
}

fn piece<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Piece, E> {
    alt((
        map(double_closed, Piece::Text),
        map(double_open, |part| Piece::Open('"', part)),
        map(single_closed, |part: &str| Piece::Text(part.to_string())),
        map(single_open, |part: &str| Piece::Open('\'', part.to_string())),
        map(escaped, |c| Piece::Text(c.to_string())),
        value(Piece::Dangling, terminated(char('\\'), eof)),
        map(bare, |part: &str| Piece::Text(part.to_string())),
    ))(input)
}

fn bare<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    is_not(" \t\r\n'\"\\")(input)
}

fn escaped<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, char, E> {
    preceded(char('\\'), anychar)(input)
}

fn single_closed<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    delimited(char('\''), take_until("'"), char('\''))(input)
}

fn single_open<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    preceded(char('\''), rest)(input)
}

fn double_body<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    fold_many0(
        alt((
            map(is_not("\"\\"), |part: &str| part.to_string()),
            map(preceded(char('\\'), anychar), |c| match c {
                '"' | '\\' | '$' | '`' | '\n' => c.to_string(),
                other => format!("\\{}", other),
            }),
            map(terminated(char('\\'), eof), |_| "\\".to_string()),
        )),
        String::new,
        |mut acc, part| {
            acc.push_str(&part);
            acc
        },
    )(input)
}

fn double_closed<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    delimited(char('"'), double_body, char('"'))(input)
}

fn double_open<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    preceded(char('"'), terminated(double_body, eof))(input)
}

// ============================================================================
// Tests
// ============================================================================
