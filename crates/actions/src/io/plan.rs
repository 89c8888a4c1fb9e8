//! The renderable description of a proposed action, shown to a
//! [`super::Formatter`] before an executor commits to it.

#[derive(Debug, Clone)]
pub struct Plan {
    pub action: String,
    pub record_ids: Vec<i64>,
    pub summary: String,
}

impl Plan {
    pub fn new(action: impl Into<String>, record_ids: Vec<i64>, summary: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            record_ids,
            summary: summary.into(),
        }
    }
}
