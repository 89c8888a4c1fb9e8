//! The enrichment pipeline: `Operations::load` plus the four per-fact
//! enrichers it fans out to (spec §4.2).

pub mod facts;
pub mod hardlink;
pub mod operations;
pub mod request;
pub mod torrent;
pub mod watch;

pub use facts::{HardlinkFacts, RequestFacts, TorrentFacts, WatchFacts};
pub use hardlink::HardlinkEnricher;
pub use operations::Operations;
pub use request::RequestEnricher;
pub use torrent::TorrentEnricher;
pub use watch::WatchEnricher;
