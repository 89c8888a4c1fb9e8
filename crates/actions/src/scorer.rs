//! Fuzzy torrent-candidate scorer (spec §3, §4.3.4). Grounded on
//! `decision/src/engine.rs`'s `ReleaseScore`/`evaluate_release`: a hard
//! rejection gate followed by additive score components, clamped and
//! capped, mirroring `select_best_release`.

use librarian_core::models::{Record, TorrentCandidate, TorrentListing};

/// Below this token-overlap ratio a listing is rejected outright, never
/// scored.
const OVERLAP_REJECT_THRESHOLD: f64 = 0.6;
const YEAR_MATCH_BONUS: f64 = 0.07;
/// Applied when the desired year is known but no year token appears in the
/// candidate at all. A year that's present but *differs* is a hard reject,
/// not a penalty — see `score_candidate`.
const YEAR_ABSENT_PENALTY: f64 = 0.15;
const SEEDING_BONUS: f64 = 0.05;
const COMPLETE_BONUS: f64 = 0.05;
const INCOMPLETE_PENALTY: f64 = 0.15;
const SIZE_SIMILARITY_WEIGHT: f64 = 0.2;
const MAX_CANDIDATES: usize = 5;

/// Scores one listing against a record. `None` means the listing is
/// rejected — either the token overlap is below threshold, or the desired
/// year is known and the candidate's extracted year conflicts with it.
pub fn score_candidate(record: &Record, listing: &TorrentListing) -> Option<TorrentCandidate> {
    let overlap = token_overlap(&record.title, &listing.name);
    if overlap < OVERLAP_REJECT_THRESHOLD {
        return None;
    }

    let mut score = overlap;
    let year_matched = if record.year == 0 {
        // Desired year unknown: year scoring (bonus, penalty, and
        // conflict-reject) is skipped entirely.
        false
    } else {
        match extract_year(&listing.name) {
            Some(year) if year == record.year => {
                score += YEAR_MATCH_BONUS;
                true
            }
            Some(_) => return None,
            None => {
                score -= YEAR_ABSENT_PENALTY;
                false
            }
        }
    };

    // Seeding, completeness, and progress are independent signals — all
    // three can apply to the same candidate.
    if listing.state.is_seeding() {
        score += SEEDING_BONUS;
    }
    if listing.progress >= 1.0 {
        score += COMPLETE_BONUS;
    }
    if listing.progress < 0.9 {
        score -= INCOMPLETE_PENALTY;
    }

    let size_delta_bytes = record
        .file
        .as_ref()
        .map(|f| listing.size as i64 - f.size as i64)
        .unwrap_or(0);

    if let Some(file) = &record.file {
        if file.size > 0 && listing.size > 0 {
            let similarity = (1.0 - (size_delta_bytes.unsigned_abs() as f64) / file.size as f64).max(0.0);
            score += similarity * SIZE_SIMILARITY_WEIGHT;
        }
    }

    Some(TorrentCandidate {
        torrent_ref: listing.hash.clone(),
        score: score.clamp(0.0, 1.0),
        title_match: overlap,
        year_matched,
        size_delta_bytes,
    })
}

/// Scores every listing against `record`, keeping only non-rejected
/// candidates, sorted by score descending then by `|size_delta|`
/// ascending, capped at [`MAX_CANDIDATES`] (spec §4.3.4).
pub fn score_candidates(record: &Record, listings: &[TorrentListing]) -> Vec<TorrentCandidate> {
    let mut candidates: Vec<TorrentCandidate> = listings
        .iter()
        .filter_map(|listing| score_candidate(record, listing))
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.size_delta_bytes.abs().cmp(&b.size_delta_bytes.abs()))
    });
    candidates.truncate(MAX_CANDIDATES);
    candidates
}

fn token_overlap(title: &str, candidate_name: &str) -> f64 {
    let title_tokens: std::collections::HashSet<String> = tokenize(title);
    if title_tokens.is_empty() {
        return 0.0;
    }
    let candidate_tokens: std::collections::HashSet<String> = tokenize(candidate_name);
    let intersection = title_tokens.intersection(&candidate_tokens).count();
    intersection as f64 / title_tokens.len() as f64
}

fn tokenize(s: &str) -> std::collections::HashSet<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !is_year_like(t))
        .map(|t| t.to_string())
        .collect()
}

fn is_year_like(token: &str) -> bool {
    token.len() == 4 && token.chars().all(|c| c.is_ascii_digit())
}

fn extract_year(name: &str) -> Option<i32> {
    name.split(|c: char| !c.is_ascii_digit())
        .filter(|t| t.len() == 4)
        .find_map(|t| t.parse::<i32>().ok())
        .filter(|y| (1900..=2100).contains(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use librarian_core::models::{MovieFile, TorrentState};

    fn record_with_file(title: &str, year: i32, size: u64) -> Record {
        let mut r = Record::new(1, "tt1".into(), "1".into(), title.into(), year);
        r.file = Some(MovieFile {
            id: 1,
            path: "/movies/sample".into(),
            size,
            imported_at: chrono::Utc::now(),
            custom_format_score: 0,
            custom_format_ids: vec![],
        });
        r
    }

    fn listing(name: &str, state: TorrentState, size: u64, progress: f64) -> TorrentListing {
        TorrentListing {
            hash: "abc".into(),
            name: name.into(),
            save_path: "/downloads".into(),
            content_path: format!("/downloads/{name}"),
            state,
            size,
            progress,
        }
    }

    #[test]
    fn rejects_conflicting_year() {
        let record = record_with_file("Example Movie", 2020, 1_000_000_000);
        let candidate = listing(
            "Example.Movie.2019.1080p.BluRay",
            TorrentState::Uploading,
            1_000_000_000,
            1.0,
        );
        assert!(score_candidate(&record, &candidate).is_none());
    }

    #[test]
    fn does_not_reject_on_year_when_desired_year_unknown() {
        let record = record_with_file("Example Movie", 0, 1_000_000_000);
        let candidate = listing(
            "Example.Movie.2019.1080p.BluRay",
            TorrentState::Uploading,
            1_000_000_000,
            1.0,
        );
        let scored = score_candidate(&record, &candidate).unwrap();
        assert!(!scored.year_matched);
    }

    #[test]
    fn penalizes_missing_year_when_desired_year_known() {
        let record = record_with_file("Example Movie", 2020, 1_000_000_000);
        let with_year = listing("Example.Movie.2020.BluRay", TorrentState::Uploading, 1_000_000_000, 1.0);
        let without_year = listing("Example.Movie.BluRay", TorrentState::Uploading, 1_000_000_000, 1.0);
        let with_score = score_candidate(&record, &with_year).unwrap().score;
        let without_score = score_candidate(&record, &without_year).unwrap().score;
        assert!(without_score < with_score);
    }

    #[test]
    fn rejects_low_token_overlap() {
        let record = record_with_file("Example Movie", 2020, 1_000_000_000);
        let candidate = listing("Completely.Different.Title.2020", TorrentState::Uploading, 1_000_000_000, 1.0);
        assert!(score_candidate(&record, &candidate).is_none());
    }

    #[test]
    fn accepts_strong_match_with_year_and_seeding_bonus() {
        let record = record_with_file("Example Movie", 2020, 1_000_000_000);
        let candidate = listing(
            "Example.Movie.2020.1080p.BluRay",
            TorrentState::Uploading,
            1_000_000_000,
            1.0,
        );
        let scored = score_candidate(&record, &candidate).unwrap();
        assert!(scored.year_matched);
        assert!(scored.score >= 0.7);
    }

    #[test]
    fn seeding_and_completeness_bonuses_are_independent() {
        let record = record_with_file("Example Movie", 2020, 1_000_000_000);
        let seeding_and_complete = listing("Example.Movie.2020", TorrentState::Uploading, 1_000_000_000, 1.0);
        let neither = listing("Example.Movie.2020", TorrentState::Downloading, 1_000_000_000, 0.95);
        let a = score_candidate(&record, &seeding_and_complete).unwrap().score;
        let b = score_candidate(&record, &neither).unwrap().score;
        assert!(a > b);
    }

    #[test]
    fn sorts_by_score_then_by_size_delta() {
        let record = record_with_file("Example Movie", 2020, 1_000_000_000);
        let close_size = listing("Example.Movie.2020", TorrentState::Uploading, 1_000_000_100, 1.0);
        let far_size = listing("Example.Movie.2020", TorrentState::Uploading, 2_000_000_000, 1.0);
        let results = score_candidates(&record, &[far_size, close_size]);
        assert!(results[0].size_delta_bytes.abs() < results[1].size_delta_bytes.abs());
    }

    #[test]
    fn caps_results_at_five() {
        let record = record_with_file("Example Movie", 2020, 1_000_000_000);
        let listings: Vec<TorrentListing> = (0..10)
            .map(|i| listing(&format!("Example.Movie.2020.v{i}"), TorrentState::Uploading, 1_000_000_000, 1.0))
            .collect();
        let results = score_candidates(&record, &listings);
        assert_eq!(results.len(), 5);
    }
}
