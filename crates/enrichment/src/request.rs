//! RequestEnricher: attaches request-origination facts by TMDB id (spec
//! §4.2). When more than one request exists for a movie, the most
//! recently created one wins.

use std::collections::HashMap;
use std::sync::Arc;

use librarian_core::collaborators::RequestTrackerClient;
use librarian_core::models::{Record, RequestStatus};
use librarian_core::Result;

use crate::facts::RequestFacts;

const PAGE_SIZE: usize = 500;

pub struct RequestEnricher {
    tracker: Arc<dyn RequestTrackerClient>,
}

impl RequestEnricher {
    pub fn new(tracker: Arc<dyn RequestTrackerClient>) -> Self {
        Self { tracker }
    }

    pub async fn compute(&self, records: &[Record]) -> Result<HashMap<i64, RequestFacts>> {
        let mut requests = Vec::new();
        let mut skip = 0;
        loop {
            let page = self.tracker.list_requests(skip, PAGE_SIZE).await?;
            let got = page.len();
            requests.extend(page);
            if got < PAGE_SIZE {
                break;
            }
            skip += PAGE_SIZE;
        }

        let mut latest_by_tmdb: HashMap<&str, &librarian_core::collaborators::RequestEntry> =
            HashMap::new();
        for req in &requests {
            latest_by_tmdb
                .entry(req.tmdb_id.as_str())
                .and_modify(|existing| {
                    if req.created_at > existing.created_at {
                        *existing = req;
                    }
                })
                .or_insert(req);
        }

        let mut out = HashMap::with_capacity(records.len());
        for record in records {
            let Some(req) = latest_by_tmdb.get(record.tmdb_id.as_str()) else {
                continue;
            };
            let status = RequestStatus::from_code(req.status_code);
            let approved_by = if status.grants_approver() {
                req.modified_by.clone()
            } else {
                None
            };
            out.insert(
                record.id,
                RequestFacts {
                    requested_by: req.requested_by.clone(),
                    requested_by_email: req.requested_by_email.clone(),
                    requested_at: Some(req.created_at),
                    request_status: status,
                    approved_by,
                    is_auto_request: req.is_auto_request,
                },
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use librarian_core::collaborators::RequestEntry;

    struct FakeTracker(Vec<RequestEntry>);

    #[async_trait]
    impl RequestTrackerClient for FakeTracker {
        async fn list_requests(&self, skip: usize, take: usize) -> Result<Vec<RequestEntry>> {
            Ok(self.0.iter().skip(skip).take(take).cloned().collect())
        }
    }

    #[tokio::test]
    async fn picks_most_recent_request_and_sets_approver_only_when_granted() {
        let now = Utc::now();
        let tracker = FakeTracker(vec![
            RequestEntry {
                id: 1,
                status_code: 1,
                created_at: now - Duration::days(5),
                is_auto_request: false,
                requested_by: "old".into(),
                requested_by_email: "old@example.com".into(),
                modified_by: None,
                tmdb_id: "42".into(),
            },
            RequestEntry {
                id: 2,
                status_code: 2,
                created_at: now,
                is_auto_request: true,
                requested_by: "new".into(),
                requested_by_email: "new@example.com".into(),
                modified_by: Some("admin".into()),
                tmdb_id: "42".into(),
            },
        ]);
        let enricher = RequestEnricher::new(Arc::new(tracker));
        let record = Record::new(1, "tt1".into(), "42".into(), "Sample".into(), 2020);
        let facts = enricher.compute(&[record]).await.unwrap();
        let f = &facts[&1];
        assert_eq!(f.requested_by, "new");
        assert_eq!(f.approved_by.as_deref(), Some("admin"));
        assert_eq!(f.request_status, RequestStatus::Approved);
    }

    #[tokio::test]
    async fn pending_status_does_not_grant_approver() {
        let tracker = FakeTracker(vec![RequestEntry {
            id: 1,
            status_code: 1,
            created_at: Utc::now(),
            is_auto_request: false,
            requested_by: "user".into(),
            requested_by_email: "user@example.com".into(),
            modified_by: Some("someone".into()),
            tmdb_id: "42".into(),
        }]);
        let enricher = RequestEnricher::new(Arc::new(tracker));
        let record = Record::new(1, "tt1".into(), "42".into(), "Sample".into(), 2020);
        let facts = enricher.compute(&[record]).await.unwrap();
        assert_eq!(facts[&1].approved_by, None);
    }
}
