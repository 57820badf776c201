//! AppState — shared read-only data passed to all components during render/event.
//!
//! Components read this for station and feed data, but never mutate it.
//! The App event-loop is the only thing that writes to AppState.

use dock_proto::station::{StationDetail, StationSummary, TrendResponse};

use crate::connection::ConnectionState;
use crate::feed::FeedView;

/// The full shared state of the application.
/// Components read this; only the App event-loop writes to it.
pub struct AppState {
    // ── Stations (REST) ─────────────────────────────────────────────────────
    pub stations: Vec<StationSummary>,
    /// Detail for the open station page, None on the overview.
    pub detail: Option<StationDetail>,
    pub trend: Option<TrendResponse>,

    // ── Feed ────────────────────────────────────────────────────────────────
    /// The reconciled comment tree for the open station page.
    pub feed: Option<FeedView>,
    pub connection: ConnectionState,
    pub username: String,

    // ── Session ─────────────────────────────────────────────────────────────
    pub status_line: Option<String>,
}

impl AppState {
    pub fn new(username: String) -> Self {
        Self {
            stations: Vec::new(),
            detail: None,
            trend: None,
            feed: None,
            connection: ConnectionState::Disconnected,
            username,
            status_line: None,
        }
    }

    /// Convenience: name of the open station, if a detail page is showing.
    pub fn open_station_name(&self) -> Option<&str> {
        self.detail.as_ref().map(|d| d.name.as_str())
    }
}
