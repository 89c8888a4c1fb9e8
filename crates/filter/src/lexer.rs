//! Tokenizer for the filter expression language (spec §4.1).
//!
//! Only the atom-level grammar (numbers, strings, identifiers, operators)
//! goes through `nom`; operator precedence is handled by the hand-written
//! recursive-descent parser in [`crate::parser`] over the resulting token
//! stream.

use nom::branch::alt;
use nom::bytes::complete::{escaped_transform, is_not, tag};
use nom::character::complete::{alpha1, alphanumeric1, char, digit1, multispace0, one_of};
use nom::combinator::{opt, recognize, value};
use nom::multi::many0;
use nom::sequence::pair;
use nom::IResult;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    Ident(String),
    LParen,
    RParen,
    Comma,
    Dot,
    And,
    Or,
    Not,
    In,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Matches,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
}

#[derive(Debug, thiserror::Error)]
#[error("could not tokenize near: {0:?}")]
pub struct LexError(pub String);

pub fn lex(input: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut rest = input;
    loop {
        let (r, _) = multispace0::<_, nom::error::Error<&str>>(rest)
            .map_err(|_| LexError(rest.to_string()))?;
        rest = r;
        if rest.is_empty() {
            break;
        }
        let (r, tok) = next_token(rest).map_err(|_| LexError(rest.to_string()))?;
        tokens.push(tok);
        rest = r;
    }
    Ok(tokens)
}

fn next_token(input: &str) -> IResult<&str, Token> {
    alt((
        string_literal,
        number_literal,
        ident_or_keyword,
        two_char_operator,
        one_char_operator,
    ))(input)
}

fn string_literal(input: &str) -> IResult<&str, Token> {
    let (rest, _) = char('"')(input)?;
    let (rest, content) = opt(escaped_transform(
        is_not("\"\\"),
        '\\',
        alt((
            value("\\", tag("\\")),
            value("\"", tag("\"")),
            value("\n", tag("n")),
            value("\t", tag("t")),
        )),
    ))(rest)?;
    let (rest, _) = char('"')(rest)?;
    Ok((rest, Token::Str(content.unwrap_or_default())))
}

fn number_literal(input: &str) -> IResult<&str, Token> {
    let (rest, text) = recognize(pair(
        digit1,
        opt(pair(char('.'), digit1)),
    ))(input)?;
    if let Some(frac) = text.find('.') {
        let _ = frac;
        let value: f64 = text.parse().unwrap_or(0.0);
        Ok((rest, Token::Float(value)))
    } else {
        let value: i64 = text.parse().unwrap_or(0);
        Ok((rest, Token::Int(value)))
    }
}

fn ident_or_keyword(input: &str) -> IResult<&str, Token> {
    let (rest, text) = recognize(pair(
        alt((alpha1, recognize(char('_')))),
        many0(alt((alphanumeric1, recognize(char('_'))))),
    ))(input)?;
    let token = match text {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "in" => Token::In,
        "matches" => Token::Matches,
        "true" => Token::Bool(true),
        "false" => Token::Bool(false),
        "null" => Token::Null,
        other => Token::Ident(other.to_string()),
    };
    Ok((rest, token))
}

fn two_char_operator(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::Eq, tag("==")),
        value(Token::Ne, tag("!=")),
        value(Token::Le, tag("<=")),
        value(Token::Ge, tag(">=")),
    ))(input)
}

fn one_char_operator(input: &str) -> IResult<&str, Token> {
    let (rest, c) = one_of("()+,.-*/%<>")(input)?;
    let token = match c {
        '(' => Token::LParen,
        ')' => Token::RParen,
        ',' => Token::Comma,
        '.' => Token::Dot,
        '+' => Token::Plus,
        '-' => Token::Minus,
        '*' => Token::Star,
        '/' => Token::Slash,
        '%' => Token::Percent,
        '<' => Token::Lt,
        '>' => Token::Gt,
        _ => unreachable!(),
    };
    Ok((rest, token))
}
