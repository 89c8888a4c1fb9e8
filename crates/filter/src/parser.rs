//! Recursive-descent parser over the token stream produced by
//! [`crate::lexer`].
//!
//! Precedence, loosest to tightest:
//! `or` → `and` → `not` → comparison/`in`/`matches` → additive →
//! multiplicative → unary minus → postfix (`.member`, `(args)`) → primary.

use crate::ast::{BinOp, Expr, UnOp};
use crate::lexer::Token;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseError {
    #[error("unexpected end of expression")]
    UnexpectedEof,
    #[error("unexpected token: {0:?}")]
    Unexpected(Token),
    #[error("expected {0:?}, found {1:?}")]
    Expected(Token, Token),
    #[error("trailing tokens after expression: {0:?}")]
    TrailingTokens(Vec<Token>),
}

type PResult<T> = Result<T, ParseError>;

pub fn parse(tokens: &[Token]) -> PResult<Expr> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(ParseError::TrailingTokens(parser.tokens[parser.pos..].to_vec()));
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: Token) -> PResult<()> {
        match self.advance() {
            Some(tok) if *tok == expected => Ok(()),
            Some(tok) => Err(ParseError::Expected(expected, tok.clone())),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn parse_or(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_not()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            let rhs = self.parse_not()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> PResult<Expr> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(Expr::Unary(UnOp::Not, Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> PResult<Expr> {
        let lhs = self.parse_additive()?;
        let op = match self.peek() {
            Some(Token::Eq) => Some(BinOp::Eq),
            Some(Token::Ne) => Some(BinOp::Ne),
            Some(Token::Lt) => Some(BinOp::Lt),
            Some(Token::Le) => Some(BinOp::Le),
            Some(Token::Gt) => Some(BinOp::Gt),
            Some(Token::Ge) => Some(BinOp::Ge),
            Some(Token::Matches) => Some(BinOp::Matches),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let rhs = self.parse_additive()?;
            return Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)));
        }
        if matches!(self.peek(), Some(Token::In)) {
            self.advance();
            let rhs = self.parse_additive()?;
            return Ok(Expr::In(Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Unary(UnOp::Neg, Box::new(inner)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.advance();
                    let name = self.expect_ident()?;
                    expr = Expr::Member(Box::new(expr), name);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn expect_ident(&mut self) -> PResult<String> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name.clone()),
            Some(tok) => Err(ParseError::Unexpected(tok.clone())),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        match self.advance().cloned() {
            Some(Token::Int(v)) => Ok(Expr::IntLit(v)),
            Some(Token::Float(v)) => Ok(Expr::FloatLit(v)),
            Some(Token::Str(v)) => Ok(Expr::StrLit(v)),
            Some(Token::Bool(v)) => Ok(Expr::BoolLit(v)),
            Some(Token::Null) => Ok(Expr::NullLit),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.advance();
                    let args = self.parse_call_args()?;
                    return Ok(build_call(name, args));
                }
                Ok(Expr::Ident(name))
            }
            Some(tok) => Err(ParseError::Unexpected(tok)),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn parse_call_args(&mut self) -> PResult<Vec<Expr>> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some(Token::RParen)) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            match self.peek() {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::RParen) => {
                    self.advance();
                    break;
                }
                Some(tok) => return Err(ParseError::Unexpected(tok.clone())),
                None => return Err(ParseError::UnexpectedEof),
            }
        }
        Ok(args)
    }
}

/// Sequence operations (`any`/`all`/`filter`) are parsed as ordinary calls
/// and rewritten here into their dedicated AST nodes; every other call name
/// stays a generic `Expr::Call` resolved against the helper table in
/// [`crate::helpers`].
fn build_call(name: String, mut args: Vec<Expr>) -> Expr {
    match (name.as_str(), args.len()) {
        ("any", 2) => {
            let body = args.pop().unwrap();
            let seq = args.pop().unwrap();
            Expr::Any(Box::new(seq), Box::new(body))
        }
        ("all", 2) => {
            let body = args.pop().unwrap();
            let seq = args.pop().unwrap();
            Expr::All(Box::new(seq), Box::new(body))
        }
        ("filter", 2) => {
            let body = args.pop().unwrap();
            let seq = args.pop().unwrap();
            Expr::Filter(Box::new(seq), Box::new(body))
        }
        _ => Expr::Call(name, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_str(src: &str) -> Expr {
        parse(&lex(src).unwrap()).unwrap()
    }

    #[test]
    fn parses_precedence() {
        let expr = parse_str("not Watched and WatchCount >= 3 or Year == 2020");
        // (not Watched and WatchCount >= 3) or Year == 2020
        match expr {
            Expr::Binary(BinOp::Or, lhs, rhs) => {
                assert!(matches!(*lhs, Expr::Binary(BinOp::And, _, _)));
                assert!(matches!(*rhs, Expr::Binary(BinOp::Eq, _, _)));
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn parses_member_access_and_call() {
        let expr = parse_str(r#"hasTag("4k") and Movie.Year > 2000"#);
        assert!(matches!(expr, Expr::Binary(BinOp::And, _, _)));
    }

    #[test]
    fn parses_any_sequence_op() {
        let expr = parse_str(r#"any(Tags, it == "4k")"#);
        assert!(matches!(expr, Expr::Any(_, _)));
    }

    #[test]
    fn parses_membership() {
        let expr = parse_str(r#""4k" in Tags"#);
        assert!(matches!(expr, Expr::In(_, _)));
    }

    #[test]
    fn rejects_trailing_tokens() {
        let tokens = lex("true true").unwrap();
        assert!(parse(&tokens).is_err());
    }
}
