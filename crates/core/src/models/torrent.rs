//! Torrent-client facts: state enum and fuzzy-match candidates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The 20 documented qBittorrent-style torrent states (spec §6). Seeding
/// states are `Uploading`, `StalledUp`, `QueuedUp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TorrentState {
    Error,
    MissingFiles,
    Uploading,
    PausedUp,
    QueuedUp,
    StalledUp,
    CheckingUp,
    ForcedUp,
    Allocating,
    Downloading,
    MetaDl,
    PausedDl,
    QueuedDl,
    StalledDl,
    CheckingDl,
    ForcedDl,
    CheckingResumeData,
    Moving,
    Unknown,
    Other(String),
}

impl TorrentState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "error" => TorrentState::Error,
            "missingFiles" => TorrentState::MissingFiles,
            "uploading" => TorrentState::Uploading,
            "pausedUP" => TorrentState::PausedUp,
            "queuedUP" => TorrentState::QueuedUp,
            "stalledUP" => TorrentState::StalledUp,
            "checkingUP" => TorrentState::CheckingUp,
            "forcedUP" => TorrentState::ForcedUp,
            "allocating" => TorrentState::Allocating,
            "downloading" => TorrentState::Downloading,
            "metaDL" => TorrentState::MetaDl,
            "pausedDL" => TorrentState::PausedDl,
            "queuedDL" => TorrentState::QueuedDl,
            "stalledDL" => TorrentState::StalledDl,
            "checkingDL" => TorrentState::CheckingDl,
            "forcedDL" => TorrentState::ForcedDl,
            "checkingResumeData" => TorrentState::CheckingResumeData,
            "moving" => TorrentState::Moving,
            "unknown" => TorrentState::Unknown,
            other => TorrentState::Other(other.to_string()),
        }
    }

    /// Per spec §4.2 TorrentEnricher / §6: seeding states are `uploading`,
    /// `stalledUP`, `queuedUP`.
    pub fn is_seeding(&self) -> bool {
        matches!(
            self,
            TorrentState::Uploading | TorrentState::StalledUp | TorrentState::QueuedUp
        )
    }
}

impl fmt::Display for TorrentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TorrentState::Other(s) => write!(f, "{s}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// A torrent-client listing, the input to the fuzzy scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentListing {
    pub hash: String,
    pub name: String,
    pub save_path: String,
    pub content_path: String,
    pub state: TorrentState,
    pub size: u64,
    pub progress: f64,
}

/// A candidate proposed by the fuzzy torrent scorer (spec §3, §4.3.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentCandidate {
    pub torrent_ref: String,
    pub score: f64,
    pub title_match: f64,
    pub year_matched: bool,
    pub size_delta_bytes: i64,
}
