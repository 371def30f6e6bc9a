//! Polling Controller & Dashboard Model (spec.md §4.4): a strict
//! single-writer state container. All mutation flows through [`Dashboard::update`],
//! which returns at most one outbound [`Command`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::derive::{derive, DerivedFrame};
use crate::history::{Field, MetricPoint, SparklineHistory};
use crate::model::Snapshot;

use super::message::{Command, Message};
use super::rows::{INDEX_COLUMNS, NODE_COLUMNS};
use super::settings::SettingsForm;
use super::table::{Column, InputMode, Table};

use ratatui::layout::Alignment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveTable {
    Index,
    Node,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    Analytics,
    DeleteConfirm,
    Settings,
}

/// Backoff schedule (spec.md §4.4.2, scenario D): `fails ≤ 0 → 1s`,
/// `fails ≥ 6 → 60s`, otherwise `2^fails` seconds.
pub fn backoff(fails: u32) -> Duration {
    if fails == 0 {
        Duration::from_secs(1)
    } else if fails >= 6 {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(1u64 << fails)
    }
}

/// Fetch deadline derived from the poll interval, clamped to [500ms, 10s]
/// (spec.md §4.4.2, §5).
pub fn fetch_timeout(poll_interval: Duration) -> Duration {
    poll_interval
        .saturating_sub(Duration::from_millis(500))
        .clamp(Duration::from_millis(500), Duration::from_secs(10))
}

pub struct Dashboard {
    pub poll_interval: Duration,

    pub previous: Option<Snapshot>,
    pub current: Option<Snapshot>,
    pub derived: Option<DerivedFrame>,
    pub history: SparklineHistory,

    pub connection: ConnectionState,
    pub consecutive_fails: u32,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub fetching: bool,
    pub last_error: Option<String>,

    pub tick_gen: u64,
    pub countdown_gen: u64,
    pub settings_nonce: u64,
    pub pending_refresh: bool,

    pub overlay: Overlay,
    pub active_table: ActiveTable,
    pub index_table: Table<crate::derive::IndexRow>,
    pub node_table: Table<crate::derive::NodeRow>,
    pub help_visible: bool,

    pub delete_target: Vec<String>,
    pub delete_status: Option<String>,

    pub settings_form: Option<SettingsForm>,
    pub settings_status: Option<String>,

    pub analytics_cursor: usize,

    pub quit: bool,

    /// A second command `on_fetch_error` needs issued (the 1Hz countdown
    /// ticker) alongside its primary retry-tick return value. `Update`
    /// itself still returns at most one command per invocation; the event
    /// loop drains this after every `update()` call (spec.md §4.4.2 "schedule
    /// both a retry tick... and a 1-Hz countdown tick").
    side_command: Option<Command>,
}

fn index_columns() -> Vec<Column> {
    INDEX_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, &title)| Column {
            title,
            preferred_width: if i == 0 { 30 } else { 10 },
            alignment: if i == 0 { Alignment::Left } else { Alignment::Right },
            numeric: i != 0,
        })
        .collect()
}

fn node_columns() -> Vec<Column> {
    NODE_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, &title)| Column {
            title,
            preferred_width: if i < 3 { 16 } else { 10 },
            alignment: if i < 3 { Alignment::Left } else { Alignment::Right },
            numeric: i >= 3,
        })
        .collect()
}

impl Dashboard {
    pub fn new(poll_interval: Duration) -> Self {
        let mut index_table = Table::new(index_columns(), true);
        index_table.focused = true;
        let node_table = Table::new(node_columns(), false);

        Self {
            poll_interval,
            previous: None,
            current: None,
            derived: None,
            history: SparklineHistory::default(),
            connection: ConnectionState::Disconnected,
            consecutive_fails: 0,
            next_retry_at: None,
            fetching: false,
            last_error: None,
            tick_gen: 0,
            countdown_gen: 0,
            settings_nonce: 0,
            pending_refresh: false,
            overlay: Overlay::None,
            active_table: ActiveTable::Index,
            index_table,
            node_table,
            help_visible: false,
            delete_target: Vec::new(),
            delete_status: None,
            settings_form: None,
            settings_status: None,
            analytics_cursor: 0,
            quit: false,
            side_command: None,
        }
    }

    /// Drains the secondary command produced by the most recent `update()`
    /// call, if any.
    pub fn take_side_command(&mut self) -> Option<Command> {
        self.side_command.take()
    }

    /// The single mutation entry point. Returns at most one outbound command.
    pub fn update(&mut self, msg: Message) -> Option<Command> {
        match msg {
            Message::Snapshot(snapshot) => self.on_snapshot(*snapshot),
            Message::FetchError(err) => self.on_fetch_error(err.to_string()),
            Message::Tick { gen } => self.on_tick(gen),
            Message::CountdownTick { gen } => self.on_countdown_tick(gen),
            Message::Key(key) => self.on_key(key),
            Message::Mouse(_) => None,
            Message::WindowSize { width, height } => {
                self.on_resize(width, height);
                None
            }
            Message::DeleteResult { names, err } => self.on_delete_result(names, err),
            Message::SettingsLoaded { values, err, nonce } => self.on_settings_loaded(values, err, nonce),
            Message::SettingsResult { names, err, nonce } => self.on_settings_result(names, err, nonce),
        }
    }

    fn on_snapshot(&mut self, snapshot: Snapshot) -> Option<Command> {
        let had_previous = self.current.is_some();
        self.previous = self.current.take();
        self.current = Some(snapshot);

        // Derivation runs here, against the dashboard's own previous/current
        // pair, rather than inside the fetch command — the command only
        // knows the snapshot it just fetched, not what the model was
        // holding when it landed (spec.md §4.3, §4.4.2).
        let derived = derive(self.previous.as_ref(), self.current.as_ref())
            .expect("current snapshot is always Some here");

        if had_previous {
            self.history.push(MetricPoint {
                timestamp: Utc::now(),
                indexing_rate: derived.metrics.indexing_rate,
                search_rate: derived.metrics.search_rate,
                index_latency_ms: derived.metrics.index_latency_ms,
                search_latency_ms: derived.metrics.search_latency_ms,
            });
        }

        self.index_table.set_data(derived.index_rows.clone());
        self.node_table.set_data(derived.node_rows.clone());
        self.derived = Some(derived);

        self.connection = ConnectionState::Connected;
        self.consecutive_fails = 0;
        self.next_retry_at = None;
        self.fetching = false;
        self.last_error = None;
        self.tick_gen += 1;
        self.countdown_gen += 1;

        if self.pending_refresh {
            // This snapshot was already in flight when the write completed
            // — it predates the write, so the confirmation text must
            // survive it. Fire the guaranteed post-write refresh instead of
            // scheduling the ordinary poll tick (spec.md §4.4.5).
            self.pending_refresh = false;
            self.fetching = true;
            Some(Command::Fetch)
        } else {
            // An ordinary refresh (or the post-write refresh's own result)
            // clears any stale confirmation text.
            self.delete_status = None;
            self.settings_status = None;
            Some(Command::ScheduleTick {
                delay_ms: self.poll_interval.as_millis() as u64,
                gen: self.tick_gen,
            })
        }
    }

    fn on_fetch_error(&mut self, err: String) -> Option<Command> {
        self.connection = ConnectionState::Disconnected;
        self.consecutive_fails += 1;
        let delay = backoff(self.consecutive_fails);
        self.next_retry_at = Some(Utc::now() + chrono::Duration::from_std(delay).unwrap_or_default());
        self.fetching = false;
        self.last_error = Some(crate::sanitize::sanitize(&err));
        self.tick_gen += 1;
        self.countdown_gen += 1;

        self.side_command = Some(Command::ScheduleCountdown { gen: self.countdown_gen });
        Some(Command::ScheduleTick {
            delay_ms: delay.as_millis() as u64,
            gen: self.tick_gen,
        })
    }

    fn on_tick(&mut self, gen: u64) -> Option<Command> {
        if gen != self.tick_gen || self.fetching {
            return None;
        }
        self.fetching = true;
        Some(Command::Fetch)
    }

    fn on_countdown_tick(&mut self, gen: u64) -> Option<Command> {
        if gen != self.countdown_gen || self.connection == ConnectionState::Connected {
            return None;
        }
        Some(Command::ScheduleCountdown { gen: self.countdown_gen })
    }

    fn on_resize(&mut self, _width: u16, height: u16) {
        let page_size = (height as usize).saturating_sub(8).max(1);
        self.index_table.set_page_size(page_size);
        self.node_table.set_page_size(page_size);
    }

    fn on_delete_result(&mut self, names: Vec<String>, err: Option<Arc<crate::gateway::error::GatewayError>>) -> Option<Command> {
        match err {
            Some(e) => {
                self.delete_status = Some(crate::sanitize::sanitize(&format!("delete failed: {e}")));
                None
            }
            None => {
                self.delete_status = Some(crate::sanitize::sanitize(&format!("deleted {}", names.join(", "))));
                self.maybe_pending_refresh()
            }
        }
    }

    fn on_settings_loaded(
        &mut self,
        values: crate::gateway::types::IndexSettingsValues,
        err: Option<Arc<crate::gateway::error::GatewayError>>,
        nonce: u64,
    ) -> Option<Command> {
        if nonce != self.settings_nonce {
            return None;
        }
        if let Some(form) = &mut self.settings_form {
            match err {
                Some(e) => {
                    self.settings_status = Some(crate::sanitize::sanitize(&format!("load failed: {e}")));
                }
                None => form.apply_loaded(&values),
            }
        }
        None
    }

    fn on_settings_result(
        &mut self,
        names: Vec<String>,
        err: Option<Arc<crate::gateway::error::GatewayError>>,
        nonce: u64,
    ) -> Option<Command> {
        if nonce != self.settings_nonce {
            return None;
        }
        match err {
            Some(e) => {
                self.settings_status = Some(crate::sanitize::sanitize(&format!("settings update failed: {e}")));
                None
            }
            None => {
                self.settings_status = Some(crate::sanitize::sanitize(&format!("updated {}", names.join(", "))));
                self.maybe_pending_refresh()
            }
        }
    }

    fn maybe_pending_refresh(&mut self) -> Option<Command> {
        if self.fetching {
            self.pending_refresh = true;
            None
        } else {
            self.fetching = true;
            Some(Command::Fetch)
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit = true;
            return Some(Command::Quit);
        }
        if key.code == KeyCode::Char('q') {
            self.quit = true;
            return Some(Command::Quit);
        }

        let focused_table_searching = match self.active_table {
            ActiveTable::Index => self.index_table.input_mode == InputMode::Searching,
            ActiveTable::Node => self.node_table.input_mode == InputMode::Searching,
        };
        if focused_table_searching {
            self.route_search_input(key);
            return None;
        }

        match self.overlay {
            Overlay::Analytics => {
                self.route_analytics_keys(key);
                return None;
            }
            Overlay::DeleteConfirm => return self.route_delete_confirm_keys(key),
            Overlay::Settings => return self.route_settings_keys(key),
            Overlay::None => {}
        }

        self.route_main_keys(key)
    }

    fn active_table_mut(&mut self) -> &mut dyn TableLike {
        match self.active_table {
            ActiveTable::Index => &mut self.index_table,
            ActiveTable::Node => &mut self.node_table,
        }
    }

    fn route_search_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.active_table_mut().commit_search(),
            KeyCode::Esc => self.active_table_mut().cancel_search_input(),
            KeyCode::Backspace => self.active_table_mut().pop_search_char(),
            KeyCode::Char(c) => self.active_table_mut().push_search_char(c),
            _ => {}
        }
    }

    fn route_analytics_keys(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.analytics_cursor = self.analytics_cursor.saturating_sub(1),
            KeyCode::Down => self.analytics_cursor += 1,
            KeyCode::Esc | KeyCode::Char('a') => self.overlay = Overlay::None,
            _ => {}
        }
    }

    fn route_delete_confirm_keys(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char('y') => {
                self.overlay = Overlay::None;
                let names = std::mem::take(&mut self.delete_target);
                Some(Command::DeleteIndices(names))
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.overlay = Overlay::None;
                self.delete_target.clear();
                None
            }
            _ => None,
        }
    }

    fn route_settings_keys(&mut self, key: KeyEvent) -> Option<Command> {
        let Some(form) = &mut self.settings_form else { return None };

        if form.state == super::settings::FormState::Loading && key.code != KeyCode::Esc {
            return None;
        }

        match key.code {
            KeyCode::Esc => {
                self.overlay = Overlay::None;
                self.settings_form = None;
                None
            }
            KeyCode::Tab | KeyCode::Down => {
                form.focus_next();
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.focus_prev();
                None
            }
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                let diff = form.changed_settings();
                let index_name = form.index_name.clone();
                self.overlay = Overlay::None;
                self.settings_form = None;
                if diff.is_empty() {
                    None
                } else {
                    Some(Command::SubmitSettings {
                        names: vec![index_name],
                        diff,
                        nonce: self.settings_nonce,
                    })
                }
            }
            KeyCode::Backspace => {
                form.backspace();
                None
            }
            KeyCode::Char(c) => {
                form.push_char(c);
                None
            }
            _ => None,
        }
    }

    fn route_main_keys(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char('r') => {
                if self.fetching {
                    return None;
                }
                self.tick_gen += 1;
                self.fetching = true;
                Some(Command::Fetch)
            }
            KeyCode::Tab => {
                self.toggle_active_table();
                None
            }
            KeyCode::BackTab => {
                self.toggle_active_table();
                None
            }
            KeyCode::Char('?') => {
                self.help_visible = !self.help_visible;
                None
            }
            KeyCode::Char('a') => {
                self.overlay = Overlay::Analytics;
                self.analytics_cursor = 0;
                None
            }
            KeyCode::Char('e') => self.enter_settings_edit(),
            KeyCode::Char('d') => {
                self.enter_delete_confirm();
                None
            }
            _ => {
                self.route_active_table_key(key);
                None
            }
        }
    }

    fn toggle_active_table(&mut self) {
        self.active_table = match self.active_table {
            ActiveTable::Index => ActiveTable::Node,
            ActiveTable::Node => ActiveTable::Index,
        };
    }

    fn enter_delete_confirm(&mut self) {
        if let Some(row) = self.index_table.selected_row() {
            let name = row.name.clone();
            self.delete_target = if self.index_table.selected.contains(&name) {
                self.index_table.selected.iter().cloned().collect()
            } else {
                vec![name]
            };
            self.overlay = Overlay::DeleteConfirm;
        }
    }

    fn enter_settings_edit(&mut self) -> Option<Command> {
        let name = self.index_table.selected_row()?.name.clone();
        self.settings_nonce += 1;
        let node_names: Vec<String> = self.node_table.page_rows().iter().map(|n| n.name.clone()).collect();
        let node_ips: Vec<String> = self.node_table.page_rows().iter().map(|n| n.ip.clone()).collect();
        self.settings_form = Some(SettingsForm::open(name.clone(), self.settings_nonce, &node_names, &node_ips));
        self.overlay = Overlay::Settings;
        Some(Command::LoadSettings { name, nonce: self.settings_nonce })
    }

    fn route_active_table_key(&mut self, key: KeyEvent) {
        match self.active_table {
            ActiveTable::Index => route_table_key(&mut self.index_table, key, true),
            ActiveTable::Node => route_table_key(&mut self.node_table, key, false),
        }
    }

    pub fn history_values(&self, field: Field) -> Vec<f64> {
        self.history.values(field)
    }
}

/// Object-safe subset of `Table<T>` operations the controller needs without
/// being generic over the row type (index vs node table).
trait TableLike {
    fn commit_search(&mut self);
    fn cancel_search_input(&mut self);
    fn pop_search_char(&mut self);
    fn push_search_char(&mut self, c: char);
}

impl<T: super::table::Row> TableLike for Table<T> {
    fn commit_search(&mut self) {
        Table::commit_search(self)
    }
    fn cancel_search_input(&mut self) {
        Table::cancel_search_input(self)
    }
    fn pop_search_char(&mut self) {
        Table::pop_search_char(self)
    }
    fn push_search_char(&mut self, c: char) {
        Table::push_search_char(self, c)
    }
}

/// `allow_selection` gates the `space` key to the index table — spec.md
/// §4.5 "Keys" restricts selection-toggling to the index table only, the
/// node table has no multi-delete concept to select rows for.
fn route_table_key<T: super::table::Row>(table: &mut Table<T>, key: KeyEvent, allow_selection: bool) {
    match key.code {
        KeyCode::Char('/') => table.open_search(),
        KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
            let col = c.to_digit(10).unwrap() as usize - 1;
            table.press_sort_column(col);
        }
        KeyCode::Left => table.prev_page(),
        KeyCode::Right => table.next_page(),
        KeyCode::Up | KeyCode::Char('k') => table.move_cursor_up(),
        KeyCode::Down | KeyCode::Char('j') => table.move_cursor_down(),
        KeyCode::Char(' ') if allow_selection => table.toggle_selection_at_cursor(),
        KeyCode::Esc => {
            table.clear_filter_if_active();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_schedule_matches_scenario_d() {
        assert_eq!(backoff(1), Duration::from_secs(2));
        assert_eq!(backoff(2), Duration::from_secs(4));
        assert_eq!(backoff(3), Duration::from_secs(8));
        assert_eq!(backoff(6), Duration::from_secs(60));
        assert_eq!(backoff(10), Duration::from_secs(60));
    }

    #[test]
    fn stale_tick_is_dropped() {
        let mut dash = Dashboard::new(Duration::from_secs(5));
        dash.tick_gen = 5;
        let cmd = dash.update(Message::Tick { gen: 3 });
        assert!(cmd.is_none());
        assert!(!dash.fetching);
    }

    #[test]
    fn force_refresh_mid_poll_is_a_no_op() {
        let mut dash = Dashboard::new(Duration::from_secs(5));
        dash.fetching = true;
        let cmd = dash.update(Message::Key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE)));
        assert!(cmd.is_none());
        assert!(dash.fetching);
    }

    #[test]
    fn fetch_timeout_is_clamped() {
        assert_eq!(fetch_timeout(Duration::from_secs(300)), Duration::from_secs(10));
        assert_eq!(fetch_timeout(Duration::from_secs(1)), Duration::from_millis(500));
        assert_eq!(fetch_timeout(Duration::from_secs(5)), Duration::from_millis(4500));
    }

    #[test]
    fn quit_key_returns_quit_command() {
        let mut dash = Dashboard::new(Duration::from_secs(5));
        let cmd = dash.update(Message::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(matches!(cmd, Some(Command::Quit)));
        assert!(dash.quit);
    }
}
