//! Static result-type inference, used at compile time to reject expressions
//! that can't possibly evaluate to a boolean (spec §4.1: "compilation must
//! reject non-bool expressions"). The engine has no general type system, so
//! this is a best-effort pass over a closed set of field and helper return
//! types: anything outside that set infers as [`ValueKind::Dynamic`] and is
//! let through, matching spec's "undefined variables are permitted at
//! compile time" allowance.

use crate::ast::{BinOp, Expr, UnOp};
use crate::value::ValueKind;

fn field_type(name: &str) -> ValueKind {
    match name {
        "Title" | "Path" | "IMDBID" | "TMDBID" | "RequestedBy" | "RequestStatus" => {
            ValueKind::Str
        }
        "ApprovedBy" => ValueKind::Dynamic, // Str or Null
        "Year" | "WatchCount" | "HardlinkCount" => ValueKind::Number,
        "WatchProgress" | "Popularity" => ValueKind::Number,
        "Tags" | "Ratings" => ValueKind::List,
        "Added" => ValueKind::Timestamp,
        "FileImported" | "LastWatched" | "RequestedAt" => ValueKind::Dynamic, // Timestamp or Null
        "Watched" | "HasFile" | "IsRequested" | "IsAutoRequest" | "IsHardlinked"
        | "IsSeeding" => ValueKind::Bool,
        _ => ValueKind::Dynamic,
    }
}

fn helper_return_type(name: &str) -> ValueKind {
    match name {
        "hasTag" | "watchedBy" | "contains" | "startsWith" | "endsWith" | "hasRating"
        | "requestedAfter" | "requestedBefore" | "requestStatus" | "isRequested"
        | "notRequested" | "notWatchedByRequester" | "watchedByRequester" => ValueKind::Bool,
        "watchCountBy" | "daysSince" => ValueKind::Number,
        "watchProgressBy" | "imdbRating" | "tmdbRating" | "rottenTomatoesRating"
        | "metacriticRating" | "getRating" => ValueKind::Number,
        "daysAgo" | "monthsAgo" | "yearsAgo" | "parseDate" | "now" => ValueKind::Timestamp,
        "lower" | "upper" | "requestedBy" => ValueKind::Str,
        "approvedBy" => ValueKind::Dynamic,
        "len" => ValueKind::Number,
        _ => ValueKind::Dynamic,
    }
}

/// Infers the static result type of `expr`, `None`/`Dynamic` when it can't
/// be determined (unknown field, unknown helper, loop variable `it`).
pub fn static_result_type(expr: &Expr) -> ValueKind {
    match expr {
        Expr::IntLit(_) | Expr::FloatLit(_) => ValueKind::Number,
        Expr::StrLit(_) => ValueKind::Str,
        Expr::BoolLit(_) => ValueKind::Bool,
        Expr::NullLit => ValueKind::Null,
        Expr::Ident(name) => field_type(name),
        Expr::Member(_, name) => field_type(name),
        Expr::Call(name, _) => helper_return_type(name),
        Expr::Unary(UnOp::Not, _) => ValueKind::Bool,
        Expr::Unary(UnOp::Neg, inner) => static_result_type(inner),
        Expr::Binary(op, lhs, rhs) => match op {
            BinOp::And | BinOp::Or | BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le
            | BinOp::Gt | BinOp::Ge | BinOp::Matches => ValueKind::Bool,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                let l = static_result_type(lhs);
                let r = static_result_type(rhs);
                if l == ValueKind::Number && r == ValueKind::Number {
                    ValueKind::Number
                } else {
                    ValueKind::Dynamic
                }
            }
        },
        Expr::In(_, _) => ValueKind::Bool,
        Expr::Any(_, _) | Expr::All(_, _) => ValueKind::Bool,
        Expr::Filter(_, _) => ValueKind::List,
    }
}

/// True when `expr` can be statically shown to never produce a bool, i.e.
/// compilation should reject it.
pub fn is_definitely_non_bool(expr: &Expr) -> bool {
    !matches!(static_result_type(expr), ValueKind::Bool | ValueKind::Dynamic)
}
