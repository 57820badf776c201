//! App — component-based event loop.
//!
//! Architecture:
//! - `App` owns all components and `AppState` (shared read-only data for components).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background tasks.
//! - The event loop draws each frame, then awaits the next message.
//! - Components return `Vec<Action>`; App dispatches each Action.
//! - Feed commands flow out through the `ConnectionManager`.

use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use dock_proto::station::{StationDetail as StationDetailData, StationSummary, TrendResponse};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::{
        comment_feed::CommentFeed, station_detail::StationDetail, station_list::StationList,
    },
    connection::{ConnectionManager, FeedEvent},
    feed::FeedView,
    http::ApiClient,
    widgets::status_bar,
};

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    Stations(Vec<StationSummary>),
    /// Detail fetched for a station; tagged so a stale fetch for a page the
    /// user already left is dropped.
    Detail(i64, StationDetailData),
    Trend(i64, TrendResponse),
    FetchFailed(String),
}

const STATIONS_REFRESH_SECS: u64 = 30;
const DETAIL_REFRESH_SECS: u64 = 60;

pub struct App {
    state: AppState,

    station_list: StationList,
    station_detail: StationDetail,
    comment_feed: CommentFeed,
    focus: ComponentId,

    connection: ConnectionManager,
    feed_endpoint: String,
    api: ApiClient,

    should_quit: bool,
}

impl App {
    pub fn new(
        username: String,
        feed_endpoint: String,
        api: ApiClient,
        feed_tx: mpsc::Sender<FeedEvent>,
    ) -> Self {
        let connection = ConnectionManager::new(username.clone(), feed_tx);
        Self {
            state: AppState::new(username),
            station_list: StationList::new(),
            station_detail: StationDetail::new(),
            comment_feed: CommentFeed::new(),
            focus: ComponentId::StationList,
            connection,
            feed_endpoint,
            api,
            should_quit: false,
        }
    }

    fn on_detail_page(&self) -> bool {
        self.state.feed.is_some()
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self, mut feed_rx: mpsc::Receiver<FeedEvent>) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(256);

        // ── Background task: keyboard events ──────────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // Initial station roster.
        self.spawn_stations_fetch(&tx);

        let mut stations_refresh =
            tokio::time::interval(Duration::from_secs(STATIONS_REFRESH_SECS));
        stations_refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut detail_refresh = tokio::time::interval(Duration::from_secs(DETAIL_REFRESH_SECS));
        detail_refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        loop {
            terminal.draw(|f| self.draw(f))?;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    self.handle_message(msg, &tx).await;
                }

                Some(event) = feed_rx.recv() => {
                    self.handle_feed_event(event);
                }

                _ = stations_refresh.tick() => {
                    self.spawn_stations_fetch(&tx);
                }

                _ = detail_refresh.tick() => {
                    if let Some(feed) = &self.state.feed {
                        self.spawn_detail_fetch(feed.station_id(), &tx);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        self.connection.close();
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        Ok(())
    }

    // ── Background fetches ────────────────────────────────────────────────────

    fn spawn_stations_fetch(&self, tx: &mpsc::Sender<AppMessage>) {
        let api = self.api.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            match api.stations().await {
                Ok(list) => {
                    let _ = tx.send(AppMessage::Stations(list.stations)).await;
                }
                Err(e) => {
                    warn!("station fetch failed: {}", e);
                    let _ = tx
                        .send(AppMessage::FetchFailed(format!("stations: {e}")))
                        .await;
                }
            }
        });
    }

    fn spawn_detail_fetch(&self, id: i64, tx: &mpsc::Sender<AppMessage>) {
        let api = self.api.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            match api.station_detail(id).await {
                Ok(detail) => {
                    let _ = tx.send(AppMessage::Detail(id, detail)).await;
                }
                Err(e) => {
                    warn!("detail fetch failed for station {}: {}", id, e);
                    let _ = tx
                        .send(AppMessage::FetchFailed(format!("station {id}: {e}")))
                        .await;
                }
            }
            match api.trend(id).await {
                Ok(trend) => {
                    let _ = tx.send(AppMessage::Trend(id, trend)).await;
                }
                Err(e) => {
                    warn!("trend fetch failed for station {}: {}", id, e);
                }
            }
        });
    }

    // ── Message handling ──────────────────────────────────────────────────────

    async fn handle_message(&mut self, msg: AppMessage, tx: &mpsc::Sender<AppMessage>) {
        match msg {
            AppMessage::Event(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                let actions = self.handle_key(key);
                for action in actions {
                    self.dispatch(action, tx).await;
                }
            }
            AppMessage::Event(_) => {}
            AppMessage::Stations(stations) => {
                self.state.stations = stations;
                let refresh = Action::RefreshStations;
                self.station_list.on_action(&refresh, &self.state);
            }
            AppMessage::Detail(id, detail) => {
                if self.state.feed.as_ref().map(|f| f.station_id()) == Some(id) {
                    self.state.detail = Some(detail);
                }
            }
            AppMessage::Trend(id, trend) => {
                if self.state.feed.as_ref().map(|f| f.station_id()) == Some(id) {
                    self.state.trend = Some(trend);
                }
            }
            AppMessage::FetchFailed(msg) => {
                self.state.status_line = Some(msg);
            }
        }
    }

    fn handle_feed_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Connection(state, msg) => {
                self.connection.note_state(state);
                self.state.connection = state;
                self.state.status_line = Some(msg);
            }
            FeedEvent::Comments(list) => {
                if let Some(feed) = &mut self.state.feed {
                    let n = feed.reconcile_comments(&list);
                    if n > 0 {
                        debug!("{} new comment(s)", n);
                    }
                }
            }
            FeedEvent::Replies(list) => {
                if let Some(feed) = &mut self.state.feed {
                    let n = feed.reconcile_replies(&list);
                    if n > 0 {
                        debug!("{} new reply(ies)", n);
                    }
                }
            }
            FeedEvent::Status(status) => {
                if let Some(err) = &status.error {
                    self.state.status_line = Some(format!("feed error: {err}"));
                } else if let Some(msg) = &status.message {
                    self.state.status_line = Some(msg.clone());
                }
            }
        }
    }

    // ── Key routing ───────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        // The composer swallows everything while open.
        if self.comment_feed.is_composing() {
            return self.comment_feed.handle_key(key, &self.state);
        }

        match key.code {
            KeyCode::Char('q') => return vec![Action::Quit],
            KeyCode::Esc => {
                if self.on_detail_page() {
                    return vec![Action::FocusPane(ComponentId::StationList)];
                }
                return vec![Action::Quit];
            }
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::Char('R') => return vec![Action::Reconnect],
            _ => {}
        }

        match self.focus {
            ComponentId::StationList => self.station_list.handle_key(key, &self.state),
            ComponentId::StationDetail => self.station_detail.handle_key(key, &self.state),
            ComponentId::CommentFeed => self.comment_feed.handle_key(key, &self.state),
        }
    }

    // ── Action dispatch ───────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action, tx: &mpsc::Sender<AppMessage>) {
        match &action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::OpenStation(id) => {
                let id = *id;
                info!("opening station {}", id);
                self.state.feed = Some(FeedView::new(id, self.state.username.clone()));
                self.state.detail = None;
                self.state.trend = None;
                self.focus = ComponentId::CommentFeed;
                // A fresh connection replays the full comment and reply lists,
                // which is how the new page gets its backlog.
                self.connection.connect(&self.feed_endpoint);
                self.state.connection = self.connection.state();
                self.spawn_detail_fetch(id, tx);
            }
            Action::FocusPane(ComponentId::StationList) => {
                // Back to the overview: tear the page and its socket down.
                self.state.feed = None;
                self.state.detail = None;
                self.state.trend = None;
                self.connection.close();
                self.state.connection = self.connection.state();
                self.focus = ComponentId::StationList;
            }
            Action::FocusPane(id) => {
                self.focus = *id;
            }
            Action::FocusNext => {
                self.focus = if self.on_detail_page() {
                    match self.focus {
                        ComponentId::StationDetail => ComponentId::CommentFeed,
                        _ => ComponentId::StationDetail,
                    }
                } else {
                    ComponentId::StationList
                };
            }
            Action::SendCommand(cmd) => {
                if let Err(e) = self.connection.send(cmd.clone()) {
                    self.state.status_line = Some(format!("not sent: {e}"));
                }
            }
            Action::Reconnect => {
                if self.on_detail_page() {
                    self.connection.connect(&self.feed_endpoint);
                    self.state.connection = self.connection.state();
                } else {
                    self.spawn_stations_fetch(tx);
                }
            }
            Action::RefreshStations => {
                self.spawn_stations_fetch(tx);
            }
            Action::Status(msg) => {
                self.state.status_line = Some(msg.clone());
            }
            Action::Noop => {}
        }

        // Let unfocused components observe the action too.
        let followups = {
            let state = &self.state;
            let mut all = Vec::new();
            all.extend(self.station_list.on_action(&action, state));
            all.extend(self.station_detail.on_action(&action, state));
            all.extend(self.comment_feed.on_action(&action, state));
            all
        };
        for followup in followups {
            Box::pin(self.dispatch(followup, tx)).await;
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(6),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        if self.on_detail_page() {
            let panes = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(rows[0]);
            self.station_detail.draw(
                frame,
                panes[0],
                self.focus == ComponentId::StationDetail,
                &self.state,
            );
            self.comment_feed.draw(
                frame,
                panes[1],
                self.focus == ComponentId::CommentFeed,
                &self.state,
            );
        } else {
            self.station_list.draw(
                frame,
                rows[0],
                self.focus == ComponentId::StationList,
                &self.state,
            );
        }

        status_bar::draw_separator(frame, rows[1]);
        status_bar::draw_status_bar(
            frame,
            rows[2],
            self.state.connection,
            self.state.status_line.as_deref(),
        );
        status_bar::draw_keys_bar(
            frame,
            rows[3],
            self.on_detail_page(),
            self.comment_feed.is_composing(),
        );
    }
}
