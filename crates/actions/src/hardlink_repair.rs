//! Hardlink repair (spec §4.3.4): a pure decision function over a
//! record's current hardlink/torrent state, plus the executor that gates
//! each decision behind operator consent before touching anything.
//! Grounded on `import/src/hardlink_manager.rs`'s hardlink-vs-copy
//! fallback shape.

use std::sync::Arc;

use librarian_core::collaborators::{CatalogClient, ImportCommand, ImportMode, TorrentClient};
use librarian_core::models::Record;
use tracing::info;

use crate::io::{Formatter, Plan, Prompter};
use crate::scorer::score_candidates;

#[derive(Debug, Clone, PartialEq)]
pub enum HardlinkDecision {
    ReImportPrimary,
    /// Alternates exist, ranked by score; the executor presents them and
    /// asks the caller (via `Prompter::choose`) which one to use.
    ReImportAlternate,
    DeleteAndResearch,
    Skipped,
}

/// Pure: given whether the record's own torrent is still seeding and
/// whether any scored alternates exist, decides what category of action
/// to propose. No I/O, no mutation, no index selection — the executor
/// applies the decision, prompts for consent, and (for `ReImportAlternate`)
/// prompts for the caller's chosen index among the ranked alternates
/// (spec §4.3.4: "propose re-import-alternate[i] where i is the user's
/// selection").
pub fn decide(record: &Record, primary_still_seeding: bool, has_alternates: bool) -> HardlinkDecision {
    if record.is_hardlinked || !record.has_file {
        return HardlinkDecision::Skipped;
    }
    if primary_still_seeding {
        return HardlinkDecision::ReImportPrimary;
    }
    if has_alternates {
        return HardlinkDecision::ReImportAlternate;
    }
    HardlinkDecision::DeleteAndResearch
}

#[derive(Debug, Default)]
pub struct HardlinkRepairOutcome {
    pub repaired: Vec<i64>,
    pub deleted_for_research: Vec<i64>,
    pub skipped: Vec<i64>,
    pub aborted: Vec<i64>,
}

pub struct HardlinkRepairExecutor {
    catalog: Arc<dyn CatalogClient>,
    torrents: Arc<dyn TorrentClient>,
}

impl HardlinkRepairExecutor {
    pub fn new(catalog: Arc<dyn CatalogClient>, torrents: Arc<dyn TorrentClient>) -> Self {
        Self { catalog, torrents }
    }

    pub async fn execute(
        &self,
        records: &[Record],
        prompter: &dyn Prompter,
        formatter: &dyn Formatter,
    ) -> librarian_core::Result<HardlinkRepairOutcome> {
        let broken: Vec<&Record> = records
            .iter()
            .filter(|r| r.has_file && !r.is_hardlinked)
            .collect();

        let plan = Plan::new(
            "hardlink-repair",
            broken.iter().map(|r| r.id).collect(),
            format!("inspect {} record(s) with a broken hardlink", broken.len()),
        );
        formatter.render_plan(&plan);

        let listings = self.torrents.list_torrents().await?;
        let mut outcome = HardlinkRepairOutcome::default();

        for record in broken {
            let primary_still_seeding = record
                .torrent_hash
                .as_deref()
                .and_then(|hash| listings.iter().find(|l| l.hash == hash))
                .map(|l| l.state.is_seeding())
                .unwrap_or(false);
            let alternates = score_candidates(record, &listings);
            let decision = decide(record, primary_still_seeding, !alternates.is_empty());

            match decision {
                HardlinkDecision::Skipped => outcome.skipped.push(record.id),
                HardlinkDecision::ReImportPrimary => {
                    if !prompter.confirm(&format!(
                        "re-import {} from its original seeding torrent?",
                        record.title
                    ))? {
                        outcome.aborted.push(record.id);
                        continue;
                    }
                    let hash = record.torrent_hash.clone().expect("primary seeding implies a hash");
                    if let Some(listing) = listings.iter().find(|l| l.hash == hash) {
                        self.reimport(record, listing.content_path.clone(), hash).await?;
                        outcome.repaired.push(record.id);
                    }
                }
                HardlinkDecision::ReImportAlternate => {
                    let prompt = format!(
                        "{} has {} alternate torrent(s), ranked best first; pick one to re-import",
                        record.title,
                        alternates.len()
                    );
                    let Some(idx) = prompter.choose(&prompt, alternates.len())? else {
                        outcome.aborted.push(record.id);
                        continue;
                    };
                    let candidate = &alternates[idx];
                    if let Some(listing) = listings.iter().find(|l| l.hash == candidate.torrent_ref) {
                        self.reimport(record, listing.content_path.clone(), listing.hash.clone())
                            .await?;
                        outcome.repaired.push(record.id);
                    }
                }
                HardlinkDecision::DeleteAndResearch => {
                    if !prompter.confirm(&format!(
                        "no usable hardlink source for {}; delete and re-search?",
                        record.title
                    ))? {
                        outcome.aborted.push(record.id);
                        continue;
                    }
                    self.catalog.delete_movie(record.id, true).await?;
                    self.catalog.send_search_command(&[record.id]).await?;
                    outcome.deleted_for_research.push(record.id);
                }
            }
        }

        info!(
            repaired = outcome.repaired.len(),
            deleted = outcome.deleted_for_research.len(),
            skipped = outcome.skipped.len(),
            aborted = outcome.aborted.len(),
            "hardlink repair pass complete"
        );
        Ok(outcome)
    }

    async fn reimport(&self, record: &Record, path: String, download_id: String) -> librarian_core::Result<()> {
        let command = ImportCommand {
            movie_id: record.id,
            path,
            mode: ImportMode::Move,
            quality: String::new(),
            languages: vec![],
            release_group: None,
            download_id: Some(download_id),
            custom_format_ids: vec![],
            custom_format_score: 0,
        };
        self.catalog.manual_import_apply(command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eligible_broken_record() -> Record {
        let mut r = Record::new(1, "tt1".into(), "1".into(), "Sample".into(), 2020);
        r.has_file = true;
        r.is_hardlinked = false;
        r
    }

    #[test]
    fn skips_already_hardlinked_records() {
        let mut record = eligible_broken_record();
        record.is_hardlinked = true;
        assert_eq!(decide(&record, false, false), HardlinkDecision::Skipped);
    }

    #[test]
    fn reimports_primary_when_still_seeding() {
        let record = eligible_broken_record();
        assert_eq!(decide(&record, true, false), HardlinkDecision::ReImportPrimary);
    }

    #[test]
    fn proposes_alternates_when_any_exist() {
        let record = eligible_broken_record();
        // Even a single, weakly-scored alternate is proposed — spec only
        // requires falling to delete-and-research when none exist at all.
        assert_eq!(decide(&record, false, true), HardlinkDecision::ReImportAlternate);
    }

    #[test]
    fn falls_back_to_delete_and_research_when_no_alternates() {
        let record = eligible_broken_record();
        assert_eq!(decide(&record, false, false), HardlinkDecision::DeleteAndResearch);
    }
}
