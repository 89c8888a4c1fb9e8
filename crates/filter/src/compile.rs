//! Compiles filter source text into a [`Program`]: a tree of closures built
//! once and evaluated once per record (spec §4.1, §9 Design Note).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::ast::{BinOp, Expr, UnOp};
use crate::env::Env;
use crate::error::{CompileError, EvalError};
use crate::helpers;
use crate::legacy;
use crate::lexer::lex;
use crate::parser::parse;
use crate::types::is_definitely_non_bool;
use crate::value::Value;

type Node = Arc<dyn for<'a> Fn(&Env<'a>) -> Result<Value, EvalError> + Send + Sync>;

/// A compiled filter: holds the original source (for error messages and
/// cache keys) and the closure tree that evaluates it against a record.
#[derive(Clone)]
pub struct Program {
    pub source_expression: String,
    node: Node,
}

impl Program {
    pub fn eval(&self, record: &librarian_core::models::Record, now: DateTime<Utc>) -> Result<bool, EvalError> {
        let env = Env::new(record, now);
        match (self.node)(&env)? {
            Value::Bool(b) => Ok(b),
            _ => Err(EvalError::NotBoolean),
        }
    }
}

pub fn compile(source: &str) -> Result<Program, CompileError> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return Err(CompileError::Empty);
    }
    let normalized = if legacy::looks_legacy(trimmed) {
        legacy::rewrite(trimmed)
    } else {
        trimmed.to_string()
    };

    let tokens = lex(&normalized).map_err(|e| CompileError::Lex(e.to_string()))?;
    let ast = parse(&tokens).map_err(|e| CompileError::Parse(e.to_string()))?;
    if is_definitely_non_bool(&ast) {
        return Err(CompileError::NotBoolean);
    }
    let node = build(&ast);
    Ok(Program {
        source_expression: source.to_string(),
        node,
    })
}

fn build(expr: &Expr) -> Node {
    match expr {
        Expr::IntLit(v) => {
            let v = *v;
            Arc::new(move |_| Ok(Value::Int(v)))
        }
        Expr::FloatLit(v) => {
            let v = *v;
            Arc::new(move |_| Ok(Value::Float(v)))
        }
        Expr::StrLit(v) => {
            let v = v.clone();
            Arc::new(move |_| Ok(Value::Str(v.clone())))
        }
        Expr::BoolLit(v) => {
            let v = *v;
            Arc::new(move |_| Ok(Value::Bool(v)))
        }
        Expr::NullLit => Arc::new(|_| Ok(Value::Null)),
        Expr::Ident(name) => {
            let name = name.clone();
            Arc::new(move |env| {
                env.resolve_ident(&name)
                    .ok_or_else(|| EvalError::UnknownIdent(name.clone()))
            })
        }
        Expr::Member(_, field) => {
            let field = field.clone();
            Arc::new(move |env| {
                env.resolve_field(&field)
                    .ok_or_else(|| EvalError::UnknownIdent(field.clone()))
            })
        }
        Expr::Call(name, args) => {
            let name = name.clone();
            let arg_nodes: Vec<Node> = args.iter().map(build).collect();
            Arc::new(move |env| {
                let values = arg_nodes
                    .iter()
                    .map(|n| n(env))
                    .collect::<Result<Vec<_>, _>>()?;
                helpers::call(&name, &values, env)
            })
        }
        Expr::Unary(UnOp::Not, inner) => {
            let inner = build(inner);
            Arc::new(move |env| {
                let v = inner(env)?;
                v.as_bool()
                    .map(|b| Value::Bool(!b))
                    .ok_or_else(|| EvalError::TypeError("not expects a boolean".into()))
            })
        }
        Expr::Unary(UnOp::Neg, inner) => {
            let inner = build(inner);
            Arc::new(move |env| {
                let v = inner(env)?;
                match v {
                    Value::Int(i) => Ok(Value::Int(-i)),
                    Value::Float(f) => Ok(Value::Float(-f)),
                    _ => Err(EvalError::TypeError("unary - expects a number".into())),
                }
            })
        }
        Expr::Binary(op, lhs, rhs) => build_binary(*op, lhs, rhs),
        Expr::In(elem, seq) => {
            let elem = build(elem);
            let seq = build(seq);
            Arc::new(move |env| {
                let e = elem(env)?;
                let s = seq(env)?;
                let list = s
                    .as_list()
                    .ok_or_else(|| EvalError::TypeError("in expects a sequence on the right".into()))?;
                Ok(Value::Bool(list.iter().any(|item| item.loosely_equal(&e))))
            })
        }
        Expr::Any(seq, body) => build_quantifier(seq, body, Quantifier::Any),
        Expr::All(seq, body) => build_quantifier(seq, body, Quantifier::All),
        Expr::Filter(seq, body) => build_quantifier(seq, body, Quantifier::Filter),
    }
}

enum Quantifier {
    Any,
    All,
    Filter,
}

fn build_quantifier(seq: &Expr, body: &Expr, kind: Quantifier) -> Node {
    let seq = build(seq);
    let body = build(body);
    Arc::new(move |env| {
        let s = seq(env)?;
        let list = s
            .as_list()
            .ok_or_else(|| EvalError::TypeError("expected a sequence".into()))?
            .to_vec();
        match kind {
            Quantifier::Any => {
                for item in &list {
                    let child = env.with_it(item.clone());
                    if body(&child)?.as_bool().unwrap_or(false) {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            Quantifier::All => {
                for item in &list {
                    let child = env.with_it(item.clone());
                    if !body(&child)?.as_bool().unwrap_or(false) {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            Quantifier::Filter => {
                let mut kept = Vec::new();
                for item in &list {
                    let child = env.with_it(item.clone());
                    if body(&child)?.as_bool().unwrap_or(false) {
                        kept.push(item.clone());
                    }
                }
                Ok(Value::List(kept))
            }
        }
    })
}

fn build_binary(op: BinOp, lhs: &Expr, rhs: &Expr) -> Node {
    let l = build(lhs);
    let r = build(rhs);
    match op {
        BinOp::And => Arc::new(move |env| {
            let lv = l(env)?.as_bool().ok_or_else(|| EvalError::TypeError("and expects booleans".into()))?;
            if !lv {
                return Ok(Value::Bool(false));
            }
            let rv = r(env)?.as_bool().ok_or_else(|| EvalError::TypeError("and expects booleans".into()))?;
            Ok(Value::Bool(rv))
        }),
        BinOp::Or => Arc::new(move |env| {
            let lv = l(env)?.as_bool().ok_or_else(|| EvalError::TypeError("or expects booleans".into()))?;
            if lv {
                return Ok(Value::Bool(true));
            }
            let rv = r(env)?.as_bool().ok_or_else(|| EvalError::TypeError("or expects booleans".into()))?;
            Ok(Value::Bool(rv))
        }),
        BinOp::Eq => Arc::new(move |env| Ok(Value::Bool(l(env)?.loosely_equal(&r(env)?)))),
        BinOp::Ne => Arc::new(move |env| Ok(Value::Bool(!l(env)?.loosely_equal(&r(env)?)))),
        BinOp::Lt => compare(l, r, std::cmp::Ordering::is_lt),
        BinOp::Le => compare(l, r, std::cmp::Ordering::is_le),
        BinOp::Gt => compare(l, r, std::cmp::Ordering::is_gt),
        BinOp::Ge => compare(l, r, std::cmp::Ordering::is_ge),
        BinOp::Add => arith(l, r, |a, b| a + b),
        BinOp::Sub => arith(l, r, |a, b| a - b),
        BinOp::Mul => arith(l, r, |a, b| a * b),
        BinOp::Div => arith(l, r, |a, b| a / b),
        BinOp::Mod => arith(l, r, |a, b| a % b),
        BinOp::Matches => Arc::new(move |env| {
            let hay = l(env)?;
            let pattern = r(env)?;
            let hay = hay.as_str().ok_or_else(|| EvalError::TypeError("matches expects a string".into()))?;
            let pattern = pattern.as_str().ok_or_else(|| EvalError::TypeError("matches expects a string pattern".into()))?;
            let re = Regex::new(pattern).map_err(|e| EvalError::InvalidRegex(e.to_string()))?;
            Ok(Value::Bool(re.is_match(hay)))
        }),
    }
}

fn compare(l: Node, r: Node, pred: fn(std::cmp::Ordering) -> bool) -> Node {
    Arc::new(move |env| {
        let lv = l(env)?;
        let rv = r(env)?;
        let ord = lv
            .partial_compare(&rv)
            .ok_or_else(|| EvalError::TypeError(format!("cannot compare {lv} and {rv}")))?;
        Ok(Value::Bool(pred(ord)))
    })
}

fn arith(l: Node, r: Node, f: fn(f64, f64) -> f64) -> Node {
    Arc::new(move |env| {
        let lv = l(env)?;
        let rv = r(env)?;
        let (a, b) = (
            lv.as_f64().ok_or_else(|| EvalError::TypeError("arithmetic expects numbers".into()))?,
            rv.as_f64().ok_or_else(|| EvalError::TypeError("arithmetic expects numbers".into()))?,
        );
        let result = f(a, b);
        if matches!(lv, Value::Int(_)) && matches!(rv, Value::Int(_)) && result.fract() == 0.0 {
            Ok(Value::Int(result as i64))
        } else {
            Ok(Value::Float(result))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use librarian_core::models::Record;

    fn sample_record() -> Record {
        let mut r = Record::new(1, "tt1".into(), "1".into(), "Sample".into(), 2020);
        r.tags = vec!["4k".to_string()];
        r.watch_count = 3;
        r.watched = true;
        r
    }

    #[test]
    fn compiles_and_evaluates_simple_comparison() {
        let program = compile("Year >= 2000").unwrap();
        let record = sample_record();
        assert!(program.eval(&record, Utc::now()).unwrap());
    }

    #[test]
    fn rejects_non_bool_expression() {
        assert!(matches!(compile("Title"), Err(CompileError::NotBoolean)));
    }

    #[test]
    fn rejects_empty_expression() {
        assert!(matches!(compile("   "), Err(CompileError::Empty)));
    }

    #[test]
    fn evaluates_helper_call() {
        let program = compile(r#"hasTag("4k") and WatchCount >= 3"#).unwrap();
        let record = sample_record();
        assert!(program.eval(&record, Utc::now()).unwrap());
    }

    #[test]
    fn evaluates_sequence_any() {
        let program = compile(r#"any(Tags, it == "4k")"#).unwrap();
        let record = sample_record();
        assert!(program.eval(&record, Utc::now()).unwrap());
    }

    #[test]
    fn compiles_legacy_syntax() {
        let program = compile(r#"tag:"4k" AND watched:true"#).unwrap();
        let record = sample_record();
        assert!(program.eval(&record, Utc::now()).unwrap());
    }
}
