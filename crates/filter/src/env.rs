//! Per-record evaluation environment (spec §9 Design Note: "pre-compute
//! per-record helpers into a binding table... index by name during
//! evaluation"). Built fresh for every record and never shared across
//! records or threads.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use librarian_core::models::Record;

use crate::value::Value;

/// Evaluation context for a single record. `locals` holds the implicit
/// loop variable `it` while evaluating the body of `any`/`all`/`filter`.
pub struct Env<'a> {
    pub record: &'a Record,
    pub now: DateTime<Utc>,
    pub locals: HashMap<String, Value>,
}

impl<'a> Env<'a> {
    pub fn new(record: &'a Record, now: DateTime<Utc>) -> Self {
        Self {
            record,
            now,
            locals: HashMap::new(),
        }
    }

    /// Returns a child environment with `it` bound to `value`, used for one
    /// iteration of a sequence operation.
    pub fn with_it(&self, value: Value) -> Env<'a> {
        let mut locals = HashMap::new();
        locals.insert("it".to_string(), value);
        Env {
            record: self.record,
            now: self.now,
            locals,
        }
    }

    /// Resolves a bare identifier: first the local scope (`it`), then the
    /// field shortcuts (`Watched`, `Year`, ...). `Movie.Field` member access
    /// resolves through the same field table via [`Env::resolve_field`].
    pub fn resolve_ident(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.locals.get(name) {
            return Some(value.clone());
        }
        if name == "Movie" {
            // `Movie` by itself isn't a usable value; member access handles
            // `Movie.X` one level up in the AST before this is ever called.
            return None;
        }
        self.resolve_field(name)
    }

    pub fn resolve_field(&self, name: &str) -> Option<Value> {
        let r = self.record;
        let value = match name {
            "Title" => Value::Str(r.title.clone()),
            "Year" => Value::Int(r.year as i64),
            "Tags" => Value::List(r.tags.iter().cloned().map(Value::Str).collect()),
            "Added" => Value::Timestamp(r.added_at),
            "FileImported" => r
                .file_imported_at
                .map(Value::Timestamp)
                .unwrap_or(Value::Null),
            "Watched" => Value::Bool(r.watched),
            "WatchCount" => Value::Int(r.watch_count as i64),
            "LastWatched" => r
                .last_watched_at
                .map(Value::Timestamp)
                .unwrap_or(Value::Null),
            "WatchProgress" => Value::Float(r.watch_progress),
            "HasFile" => Value::Bool(r.has_file),
            "Path" => Value::Str(r.path.clone()),
            "IMDBID" => Value::Str(r.imdb_id.clone()),
            "TMDBID" => Value::Str(r.tmdb_id.clone()),
            "Popularity" => Value::Float(r.popularity),
            "Ratings" => Value::List(r.ratings.keys().cloned().map(Value::Str).collect()),
            "IsRequested" => Value::Bool(r.is_requested),
            "RequestedBy" => Value::Str(r.requested_by.clone()),
            "RequestedAt" => r.requested_at.map(Value::Timestamp).unwrap_or(Value::Null),
            "RequestStatus" => Value::Str(r.request_status.as_str().to_string()),
            "ApprovedBy" => r
                .approved_by
                .clone()
                .map(Value::Str)
                .unwrap_or(Value::Null),
            "IsAutoRequest" => Value::Bool(r.is_auto_request),
            "HardlinkCount" => Value::Int(r.hardlink_count as i64),
            "IsHardlinked" => Value::Bool(r.is_hardlinked),
            "IsSeeding" => Value::Bool(r.is_seeding),
            _ => return None,
        };
        Some(value)
    }
}
