//! HardlinkEnricher: stats each imported file's path for its hardlink
//! count (spec §4.2). Grounded on `import/src/hardlink_manager.rs`'s
//! per-file stat + graceful-degrade-on-error logging.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use librarian_core::collaborators::HardlinkStat;
use librarian_core::models::Record;
use librarian_core::Result;
use tracing::warn;

use crate::facts::HardlinkFacts;

pub struct HardlinkEnricher {
    stat: Arc<dyn HardlinkStat>,
}

impl HardlinkEnricher {
    pub fn new(stat: Arc<dyn HardlinkStat>) -> Self {
        Self { stat }
    }

    pub async fn compute(&self, records: &[Record]) -> Result<HashMap<i64, HardlinkFacts>> {
        let tasks = records.iter().filter(|r| r.has_file).map(|r| {
            let stat = self.stat.clone();
            let id = r.id;
            let path = r.path.clone();
            async move { (id, stat.hardlink_count(&path).await) }
        });
        let results = join_all(tasks).await;

        let mut out = HashMap::with_capacity(results.len());
        for (id, result) in results {
            match result {
                Ok(count) => {
                    out.insert(id, HardlinkFacts { hardlink_count: count });
                }
                Err(err) => {
                    warn!(record_id = id, error = %err, "hardlink stat failed, leaving record unchanged");
                }
            }
        }
        Ok(out)
    }
}
