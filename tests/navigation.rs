//! End-to-end: scripted broker → session → store → TUI state machine.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::Span;

use harness::broker::{MemoryBroker, Record, TopicMetadata};
use harness::config::HarnessConfig;
use harness::session::Session;
use harness::store::{EphemeralStore, Message, MessageStore, StoreError, Topic};
use harness::tui::app::{HarnessApp, Screen};
use harness::tui::event::{Effect, TuiMessage};

fn key(code: KeyCode) -> TuiMessage {
    TuiMessage::Input(KeyEvent::new(code, KeyModifiers::NONE))
}

fn record(topic: &str, partition: i32, offset: i64) -> Record {
    Record {
        topic: topic.into(),
        partition,
        offset,
        key: None,
        payload: format!("{topic}:{partition}:{offset}").into_bytes(),
    }
}

#[test]
fn orders_and_payments_scenario() {
    let store = EphemeralStore::new([Topic::new("orders", 1), Topic::new("payments", 1)]);
    let inserted: Vec<Message> = (0..3)
        .map(|offset| Message {
            partition: 0,
            offset,
            key: None,
            payload: format!("order-{offset}").into_bytes(),
        })
        .collect();
    for m in &inserted {
        store.insert("orders", m.clone()).unwrap();
    }
    store
        .insert(
            "payments",
            Message {
                partition: 0,
                offset: 0,
                key: None,
                payload: b"payment-0".to_vec(),
            },
        )
        .unwrap();

    let topics = store.list_topics();
    assert_eq!(topics["orders"].message_count, 3);
    assert_eq!(topics["payments"].message_count, 1);

    let orders = store.list_messages("orders");
    assert_eq!(orders, inserted);
    assert_eq!(store.get_message(1, "orders").unwrap(), inserted[1]);
    assert!(matches!(
        store.get_message(5, "orders"),
        Err(StoreError::MessageNotFound { offset: 5, .. })
    ));
}

#[tokio::test]
async fn browse_while_ingesting() {
    let broker = Arc::new(MemoryBroker::new(vec![
        TopicMetadata::new("__consumer_offsets", 50),
        TopicMetadata::new("orders", 2),
        TopicMetadata::new("payments", 1),
    ]));
    let mut session = Session::open(broker.clone(), &HarnessConfig::default(), Span::none()).unwrap();
    session.start().unwrap();
    let store = session.store();

    broker.push_records(vec![record("orders", 0, 0), record("orders", 1, 0)]);
    while store.topic("orders").unwrap().message_count < 2 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let mut app = HarnessApp::new(session.brokers().to_vec(), store.as_ref(), Duration::from_secs(5));
    let now = Instant::now();
    assert_eq!(app.topics.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(), ["orders", "payments"]);

    // Drill into orders, copy the second row (partition 1, offset 0)
    app.update(key(KeyCode::Enter), store.as_ref(), now);
    assert_eq!(app.screen, Screen::Messages { topic: "orders".into() });
    assert_eq!(app.messages.len(), 2);
    app.update(key(KeyCode::Char('j')), store.as_ref(), now);
    let effects = app.update(key(KeyCode::Char('y')), store.as_ref(), now);
    assert_eq!(effects, vec![Effect::CopyToClipboard(b"orders:1:0".to_vec())]);

    // More arrives; going back and in again sees it
    broker.push_records(vec![record("orders", 0, 1)]);
    while store.topic("orders").unwrap().message_count < 3 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(app.update(key(KeyCode::Esc), store.as_ref(), now), vec![Effect::ArmRefresh]);
    assert_eq!(app.selected_topic().unwrap().message_count, 3);
    app.update(key(KeyCode::Enter), store.as_ref(), now);
    assert_eq!(app.messages.len(), 3);

    session.shutdown(Duration::from_secs(5)).await.unwrap();
}

#[tokio::test]
async fn refresh_keeps_highlighted_row() {
    let broker = Arc::new(MemoryBroker::new(vec![
        TopicMetadata::new("a", 1),
        TopicMetadata::new("b", 1),
        TopicMetadata::new("c", 1),
    ]));
    let mut session = Session::open(broker.clone(), &HarnessConfig::default(), Span::none()).unwrap();
    session.start().unwrap();
    let store = session.store();

    let mut app = HarnessApp::new(vec![], store.as_ref(), Duration::from_secs(5));
    let now = Instant::now();
    app.update(key(KeyCode::Down), store.as_ref(), now);
    app.update(key(KeyCode::Down), store.as_ref(), now);

    broker.push_records(vec![record("c", 0, 0), record("a", 0, 0)]);
    while store.list_topics().values().map(|t| t.message_count).sum::<usize>() < 2 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(app.update(TuiMessage::Refresh, store.as_ref(), now), vec![Effect::ArmRefresh]);
    assert_eq!(app.topics_state.selected(), Some(2));
    let selected = app.selected_topic().unwrap();
    assert_eq!(selected.name, "c");
    assert_eq!(selected.message_count, 1);

    session.shutdown(Duration::from_secs(5)).await.unwrap();
}
