//! Action enum — all user-initiated intents and internal events.

use dock_proto::protocol::Command;

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    StationList,
    StationDetail,
    CommentFeed,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPane(ComponentId),

    // ── Stations ─────────────────────────────────────────────────────────────
    /// Open a station's detail page and subscribe its comment feed.
    OpenStation(i64),
    RefreshStations,

    // ── Feed ─────────────────────────────────────────────────────────────────
    /// Send a command envelope over the feed socket.
    SendCommand(Command),
    Reconnect,
    /// A one-line status message for the bottom bar.
    Status(String),

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
    Noop,
}
