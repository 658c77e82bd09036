//! HarnessApp — the TEA model.
//!
//! All screen state lives here. `update` receives one `TuiMessage` at a
//! time, reads store snapshots and mutates state, returning the `Effect`s
//! the runner must perform (timer, clipboard, quit). No terminal or OS
//! access happens in this module.

use std::time::{Duration, Instant};

use ratatui::widgets::TableState;

use crate::store::{Message, MessageStore, Topic};

use super::dashboard::{format_key, payload_preview};
use super::event::{Effect, TuiMessage};
use super::input::{action_for, Action, PAGE_SIZE};

/// Alert shown after a successful copy.
pub const COPY_ALERT: &str = "message copied to your clipboard!";

/// Which screen is visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Topics,
    Messages { topic: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Info,
    Error,
}

/// A transient notice with a hard expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub text: String,
    pub kind: AlertKind,
    pub expires_at: Instant,
}

/// Lightweight view of a stored message (no payload copy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub index: usize,
    pub partition: i32,
    pub offset: i64,
    pub key: String,
    pub size: usize,
    pub preview: String,
}

impl MessageRow {
    fn new(index: usize, m: &Message) -> Self {
        Self {
            index,
            partition: m.partition,
            offset: m.offset,
            key: format_key(m.key.as_deref()),
            size: m.payload.len(),
            preview: payload_preview(&m.payload),
        }
    }
}

/// The main TUI application state.
pub struct HarnessApp {
    pub screen: Screen,
    /// Seed brokers, shown in the header.
    pub brokers: Vec<String>,
    /// Topic rows, ordered by name.
    pub topics: Vec<Topic>,
    /// Cursor and scroll position of the topics table.
    pub topics_state: TableState,
    /// Point-in-time snapshot of the selected topic's messages.
    pub messages: Vec<MessageRow>,
    pub messages_state: TableState,
    pub alert: Option<Alert>,
    pub alert_ttl: Duration,
    pub should_quit: bool,
}

fn topic_rows(store: &dyn MessageStore) -> Vec<Topic> {
    store.list_topics().into_values().collect()
}

fn initial_state(len: usize) -> TableState {
    TableState::default().with_selected(if len == 0 { None } else { Some(0) })
}

impl HarnessApp {
    pub fn new(brokers: Vec<String>, store: &dyn MessageStore, alert_ttl: Duration) -> Self {
        let topics = topic_rows(store);
        let topics_state = initial_state(topics.len());
        Self {
            screen: Screen::Topics,
            brokers,
            topics,
            topics_state,
            messages: Vec::new(),
            messages_state: TableState::default(),
            alert: None,
            alert_ttl,
            should_quit: false,
        }
    }

    /// Effects to run before the first event: start the refresh cadence.
    pub fn init(&self) -> Vec<Effect> {
        vec![Effect::ArmRefresh]
    }

    /// Handle a TUI message (TEA update).
    pub fn update(
        &mut self,
        msg: TuiMessage,
        store: &dyn MessageStore,
        now: Instant,
    ) -> Vec<Effect> {
        match msg {
            TuiMessage::Input(key) => match action_for(&self.screen, key) {
                Some(action) => self.apply(action, store, now),
                None => Vec::new(),
            },
            TuiMessage::Refresh => {
                if self.screen != Screen::Topics {
                    // Suspended until the user comes back to the topics list
                    return Vec::new();
                }
                self.refresh_topics(store);
                vec![Effect::ArmRefresh]
            }
            TuiMessage::CopyFinished(Ok(_)) => {
                self.set_alert(COPY_ALERT, AlertKind::Info, now);
                Vec::new()
            }
            TuiMessage::CopyFinished(Err(e)) => {
                self.set_alert(format!("copy failed: {e}"), AlertKind::Error, now);
                Vec::new()
            }
            TuiMessage::Quit => self.quit(),
        }
    }

    fn apply(&mut self, action: Action, store: &dyn MessageStore, now: Instant) -> Vec<Effect> {
        match action {
            Action::Quit => self.quit(),
            Action::Up => {
                self.move_by(-1);
                Vec::new()
            }
            Action::Down => {
                self.move_by(1);
                Vec::new()
            }
            Action::PageUp => {
                self.move_by(-(PAGE_SIZE as isize));
                Vec::new()
            }
            Action::PageDown => {
                self.move_by(PAGE_SIZE as isize);
                Vec::new()
            }
            Action::Top => {
                self.move_by(isize::MIN);
                Vec::new()
            }
            Action::Bottom => {
                self.move_by(isize::MAX);
                Vec::new()
            }
            Action::Select => {
                self.open_selected_topic(store);
                Vec::new()
            }
            Action::Back => self.back_to_topics(store),
            Action::Copy => self.copy_selected(store, now),
        }
    }

    fn quit(&mut self) -> Vec<Effect> {
        self.should_quit = true;
        vec![Effect::Quit]
    }

    /// Replace topic rows in place. The table state (cursor, scroll) is kept.
    pub fn refresh_topics(&mut self, store: &dyn MessageStore) {
        self.topics = topic_rows(store);
        clamp_selection(&mut self.topics_state, self.topics.len());
    }

    /// Topics → Messages for the highlighted topic.
    fn open_selected_topic(&mut self, store: &dyn MessageStore) {
        let Some(topic) = self.selected_topic().map(|t| t.name.clone()) else {
            return;
        };
        self.messages = store
            .list_messages(&topic)
            .iter()
            .enumerate()
            .map(|(i, m)| MessageRow::new(i, m))
            .collect();
        self.messages_state = initial_state(self.messages.len());
        self.screen = Screen::Messages { topic };
    }

    /// Messages → Topics with fresh counts; restarts the refresh cadence.
    fn back_to_topics(&mut self, store: &dyn MessageStore) -> Vec<Effect> {
        self.screen = Screen::Topics;
        self.messages.clear();
        self.refresh_topics(store);
        vec![Effect::ArmRefresh]
    }

    fn copy_selected(&mut self, store: &dyn MessageStore, now: Instant) -> Vec<Effect> {
        let Screen::Messages { topic } = &self.screen else {
            return Vec::new();
        };
        let Some(row) = self.selected_message() else {
            return Vec::new();
        };
        match store.get_message_at(topic, row.partition, row.offset) {
            Ok(message) => vec![Effect::CopyToClipboard(message.payload)],
            Err(e) => {
                self.set_alert(e.to_string(), AlertKind::Error, now);
                Vec::new()
            }
        }
    }

    /// Move the cursor of the visible table, clamped to its rows.
    fn move_by(&mut self, delta: isize) {
        let (state, len) = match self.screen {
            Screen::Topics => (&mut self.topics_state, self.topics.len()),
            Screen::Messages { .. } => (&mut self.messages_state, self.messages.len()),
        };
        if len == 0 {
            state.select(None);
            return;
        }
        let current = state.selected().unwrap_or(0) as isize;
        let next = current.saturating_add(delta).clamp(0, len as isize - 1);
        state.select(Some(next as usize));
    }

    pub fn selected_topic(&self) -> Option<&Topic> {
        self.topics_state.selected().and_then(|i| self.topics.get(i))
    }

    pub fn selected_message(&self) -> Option<&MessageRow> {
        self.messages_state
            .selected()
            .and_then(|i| self.messages.get(i))
    }

    pub fn set_alert(&mut self, text: impl Into<String>, kind: AlertKind, now: Instant) {
        self.alert = Some(Alert {
            text: text.into(),
            kind,
            expires_at: now + self.alert_ttl,
        });
    }

    /// The alert, if it has not yet expired at `now`.
    pub fn visible_alert(&self, now: Instant) -> Option<&Alert> {
        self.alert.as_ref().filter(|a| now < a.expires_at)
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    match (state.selected(), len) {
        (_, 0) => state.select(None),
        (None, _) => state.select(Some(0)),
        (Some(i), len) if i >= len => state.select(Some(len - 1)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EphemeralStore, StoreError};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    const TTL: Duration = Duration::from_secs(5);

    fn key(code: KeyCode) -> TuiMessage {
        TuiMessage::Input(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn msg(partition: i32, offset: i64, payload: &str) -> Message {
        Message {
            partition,
            offset,
            key: None,
            payload: payload.as_bytes().to_vec(),
        }
    }

    fn store() -> EphemeralStore {
        let store = EphemeralStore::new([
            Topic::new("audit", 1),
            Topic::new("orders", 2),
            Topic::new("payments", 1),
        ]);
        for i in 0..3 {
            store.insert("orders", msg(0, i, &format!("order-{i}"))).unwrap();
        }
        store.insert("payments", msg(0, 0, "pay-0")).unwrap();
        store
    }

    fn app(store: &EphemeralStore) -> HarnessApp {
        HarnessApp::new(vec!["localhost:9092".into()], store, TTL)
    }

    #[test]
    fn starts_on_topics_with_first_row_selected() {
        let store = store();
        let app = app(&store);
        assert_eq!(app.screen, Screen::Topics);
        assert_eq!(app.topics.len(), 3);
        assert_eq!(app.selected_topic().unwrap().name, "audit");
        assert_eq!(app.init(), vec![Effect::ArmRefresh]);
    }

    #[test]
    fn enter_opens_messages_snapshot() {
        let store = store();
        let mut app = app(&store);
        let now = Instant::now();
        app.update(key(KeyCode::Char('j')), &store, now);
        let effects = app.update(key(KeyCode::Enter), &store, now);

        assert!(effects.is_empty());
        assert_eq!(app.screen, Screen::Messages { topic: "orders".into() });
        let offsets: Vec<i64> = app.messages.iter().map(|r| r.offset).collect();
        assert_eq!(offsets, vec![0, 1, 2]);
        assert_eq!(app.messages[1].preview, "order-1");
        assert_eq!(app.messages_state.selected(), Some(0));
    }

    #[test]
    fn messages_snapshot_is_point_in_time() {
        let store = store();
        let mut app = app(&store);
        let now = Instant::now();
        app.update(key(KeyCode::Down), &store, now);
        app.update(key(KeyCode::Enter), &store, now);

        store.insert("orders", msg(1, 0, "late")).unwrap();
        assert!(app.update(TuiMessage::Refresh, &store, now).is_empty());
        assert_eq!(app.messages.len(), 3);
    }

    #[test]
    fn back_rebuilds_topics_and_rearms_refresh() {
        let store = store();
        let mut app = app(&store);
        let now = Instant::now();
        app.update(key(KeyCode::Down), &store, now);
        app.update(key(KeyCode::Enter), &store, now);
        store.insert("orders", msg(1, 0, "late")).unwrap();

        let effects = app.update(key(KeyCode::Esc), &store, now);
        assert_eq!(effects, vec![Effect::ArmRefresh]);
        assert_eq!(app.screen, Screen::Topics);
        assert_eq!(app.selected_topic().unwrap().name, "orders");
        assert_eq!(app.selected_topic().unwrap().message_count, 4);
    }

    #[test]
    fn revisiting_a_topic_sees_new_messages() {
        let store = store();
        let mut app = app(&store);
        let now = Instant::now();
        app.update(key(KeyCode::Down), &store, now);

        let mut seen = Vec::new();
        for round in 0..3 {
            app.update(key(KeyCode::Enter), &store, now);
            seen.push(app.messages.len());
            app.update(key(KeyCode::Esc), &store, now);
            store.insert("orders", msg(1, round, "more")).unwrap();
        }
        assert_eq!(seen, vec![3, 4, 5]);
    }

    #[test]
    fn refresh_updates_counts_without_moving_cursor() {
        let store = store();
        let mut app = app(&store);
        let now = Instant::now();
        app.update(key(KeyCode::Char('j')), &store, now);
        app.update(key(KeyCode::Char('j')), &store, now);
        assert_eq!(app.topics_state.selected(), Some(2));
        let offset_before = app.topics_state.offset();

        store.insert("payments", msg(0, 1, "pay-1")).unwrap();
        let effects = app.update(TuiMessage::Refresh, &store, now);

        assert_eq!(effects, vec![Effect::ArmRefresh]);
        assert_eq!(app.topics_state.selected(), Some(2));
        assert_eq!(app.topics_state.offset(), offset_before);
        assert_eq!(app.selected_topic().unwrap().name, "payments");
        assert_eq!(app.selected_topic().unwrap().message_count, 2);
    }

    #[test]
    fn cursor_is_clamped() {
        let store = store();
        let mut app = app(&store);
        let now = Instant::now();
        app.update(key(KeyCode::Up), &store, now);
        assert_eq!(app.topics_state.selected(), Some(0));
        app.update(key(KeyCode::PageDown), &store, now);
        assert_eq!(app.topics_state.selected(), Some(2));
        app.update(key(KeyCode::Char('g')), &store, now);
        assert_eq!(app.topics_state.selected(), Some(0));
        app.update(key(KeyCode::End), &store, now);
        assert_eq!(app.topics_state.selected(), Some(2));
    }

    #[test]
    fn empty_topic_has_no_selection_and_copy_is_noop() {
        let store = store();
        let mut app = app(&store);
        let now = Instant::now();
        app.update(key(KeyCode::Enter), &store, now);
        assert_eq!(app.screen, Screen::Messages { topic: "audit".into() });
        assert!(app.messages.is_empty());
        assert_eq!(app.messages_state.selected(), None);

        app.update(key(KeyCode::Down), &store, now);
        assert!(app.update(key(KeyCode::Char('y')), &store, now).is_empty());
        assert!(app.alert.is_none());
    }

    #[test]
    fn copy_requests_exact_payload() {
        let store = store();
        let mut app = app(&store);
        let now = Instant::now();
        app.update(key(KeyCode::Down), &store, now);
        app.update(key(KeyCode::Enter), &store, now);
        app.update(key(KeyCode::Down), &store, now);

        let effects = app.update(key(KeyCode::Char('y')), &store, now);
        assert_eq!(effects, vec![Effect::CopyToClipboard(b"order-1".to_vec())]);
    }

    #[test]
    fn copy_lookup_miss_becomes_alert() {
        let empty = EphemeralStore::new([Topic::new("orders", 1)]);
        let populated = store();
        let mut app = app(&populated);
        let now = Instant::now();
        app.update(key(KeyCode::Down), &populated, now);
        app.update(key(KeyCode::Enter), &populated, now);

        // Row exists in the snapshot but not in the store being queried
        let effects = app.update(key(KeyCode::Char('y')), &empty, now);
        assert!(effects.is_empty());
        let alert = app.alert.as_ref().unwrap();
        assert_eq!(alert.kind, AlertKind::Error);
        assert_eq!(
            alert.text,
            StoreError::MessageNotFound {
                topic: "orders".into(),
                offset: 0
            }
            .to_string()
        );
    }

    #[test]
    fn copy_alert_visible_for_five_seconds() {
        let store = store();
        let mut app = app(&store);
        let t = Instant::now();
        app.update(TuiMessage::CopyFinished(Ok(7)), &store, t);

        assert_eq!(app.visible_alert(t).unwrap().text, COPY_ALERT);
        assert!(app.visible_alert(t + Duration::from_millis(4_999)).is_some());
        assert!(app.visible_alert(t + TTL).is_none());
        assert!(app.visible_alert(t + Duration::from_secs(60)).is_none());
    }

    #[test]
    fn clipboard_failure_is_an_alert_not_a_crash() {
        let store = store();
        let mut app = app(&store);
        let now = Instant::now();
        let effects = app.update(
            TuiMessage::CopyFinished(Err("no display".into())),
            &store,
            now,
        );
        assert!(effects.is_empty());
        assert!(!app.should_quit);
        let alert = app.visible_alert(now).unwrap();
        assert_eq!(alert.kind, AlertKind::Error);
        assert!(alert.text.contains("no display"));
    }

    #[test]
    fn quit_from_either_screen() {
        let store = store();
        let now = Instant::now();

        let mut on_topics = app(&store);
        assert_eq!(on_topics.update(key(KeyCode::Char('q')), &store, now), vec![Effect::Quit]);
        assert!(on_topics.should_quit);

        let mut on_messages = app(&store);
        on_messages.update(key(KeyCode::Enter), &store, now);
        assert_eq!(on_messages.update(TuiMessage::Quit, &store, now), vec![Effect::Quit]);
        assert!(on_messages.should_quit);
    }

    #[test]
    fn clamp_selection_cases() {
        let mut state = TableState::default();
        clamp_selection(&mut state, 3);
        assert_eq!(state.selected(), Some(0));
        state.select(Some(9));
        clamp_selection(&mut state, 3);
        assert_eq!(state.selected(), Some(2));
        clamp_selection(&mut state, 0);
        assert_eq!(state.selected(), None);
    }
}
