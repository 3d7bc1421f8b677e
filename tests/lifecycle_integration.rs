mod common;

use chatstream::{
    core::{
        config::LoadMoreConfig,
        report::{ClearHistoryStep, ReportEvent},
    },
    domain::message::{ChatMessage, LoadDirection},
    infrastructure::memory::ScrollCall,
    model::load_lock::LoadAction,
    LoadOutcome,
};
use pretty_assertions::assert_eq;
use strum::IntoEnumIterator;

use common::{config, harness, harness_without_scroll, idx};

#[tokio::test]
async fn test_initial_load_records_page_and_locates_first_unread() {
    let h = harness(100, config());
    h.conversation.mark_read(idx("45"));
    h.open_after("40", 20).await;

    let state = h.client.state().await;
    assert_eq!(state.cursor(), "41");
    assert_eq!(state.next_cursor(), "60");
    assert!(state.prev_has_more());
    assert!(state.next_has_more());
    assert_eq!(state.read_index(), &idx("45"));
    assert_eq!(state.end_index(), &idx("100"));
    assert_eq!(state.max_load_index(), &idx("60"));

    assert_eq!(
        h.scroll.calls(),
        vec![ScrollCall::IntoView(String::from("msg-46"))]
    );
    assert!(h.events().contains(&ReportEvent::UnreadLocated {
        message_id: String::from("msg-46")
    }));
}

#[tokio::test]
async fn test_initial_load_falls_back_to_last_read_message() {
    let h = harness(100, config());
    h.conversation.mark_read(idx("60"));
    h.open_after("40", 20).await;

    assert_eq!(
        h.scroll.calls(),
        vec![ScrollCall::IntoView(String::from("msg-60"))]
    );
}

#[tokio::test]
async fn test_initial_load_of_empty_conversation() {
    let h = harness(0, config());
    h.open_latest(20).await;

    let state = h.client.state().await;
    assert!(!state.prev_has_more());
    assert_eq!(state.max_load_index(), &idx("0"));
    assert!(h.scroll.calls().is_empty());
    assert!(h.events().contains(&ReportEvent::UnreadLocateFailed {
        reason: String::from("initial page is empty")
    }));
}

#[tokio::test]
async fn test_initial_load_gives_up_when_nothing_renders() {
    let h = harness(
        40,
        LoadMoreConfig {
            locate_timeout_ms: 10,
            ..config()
        },
    );
    h.conversation.mark_read(idx("30"));

    // Record the page without rendering it
    let page = h.conversation.initial_page(20);
    h.client.handle_initial_load(&page).await;

    assert!(h.scroll.calls().is_empty());
    assert!(h.events().contains(&ReportEvent::UnreadLocateFailed {
        reason: String::from("message list was not rendered in time")
    }));
    assert_eq!(h.client.state().await.read_index(), &idx("30"));
}

#[tokio::test]
async fn test_initial_load_waits_for_the_page_over_a_stale_window() {
    let h = harness(
        100,
        LoadMoreConfig {
            locate_timeout_ms: 1_000,
            ..config()
        },
    );
    h.conversation.mark_read(idx("90"));
    // Left over from a previous session
    h.window.replace(vec![ChatMessage::new("old-1", "5")]);
    let page = h.conversation.initial_page(20);

    tokio::join!(h.client.handle_initial_load(&page), async {
        tokio::task::yield_now().await;
        assert!(h.scroll.calls().is_empty());
        h.window.replace(page.message_list.clone());
    });

    assert_eq!(
        h.scroll.calls(),
        vec![ScrollCall::IntoView(String::from("msg-91"))]
    );
    assert!(h.events().contains(&ReportEvent::UnreadLocated {
        message_id: String::from("msg-91")
    }));
}

#[tokio::test]
async fn test_initial_load_times_out_while_only_a_stale_window_shows() {
    let h = harness(
        100,
        LoadMoreConfig {
            locate_timeout_ms: 10,
            ..config()
        },
    );
    h.conversation.mark_read(idx("90"));
    h.window.replace(vec![ChatMessage::new("old-1", "5")]);

    let page = h.conversation.initial_page(20);
    h.client.handle_initial_load(&page).await;

    assert!(h.scroll.calls().is_empty());
    assert!(h.events().contains(&ReportEvent::UnreadLocateFailed {
        reason: String::from("message list was not rendered in time")
    }));
}

#[tokio::test]
async fn test_initial_load_without_scroll_view_reports_violation() {
    let h = harness_without_scroll(100, config());
    h.conversation.mark_read(idx("45"));
    h.open_after("40", 20).await;

    assert_eq!(h.client.state().await.read_index(), &idx("45"));
    assert!(h.scroll.calls().is_empty());
    assert!(h.events().contains(&ReportEvent::IntegrityViolation {
        reason: String::from("no scroll view to locate the first unread message")
    }));
}

#[tokio::test]
async fn test_clear_history_resets_and_aligns() {
    let h = harness(100, config());
    h.conversation.mark_read(idx("45"));
    h.open_after("40", 20).await;
    h.conversation.fail_next_fetches(1);
    assert_eq!(h.client.load_by_scroll_prev().await, LoadOutcome::Failed);

    h.client.on_clear_history().await;

    let state = h.client.state().await;
    assert_eq!(state.cursor(), "0");
    assert_eq!(state.next_cursor(), "0");
    assert!(!state.prev_has_more());
    assert!(!state.next_has_more());
    assert!(state.load_errors().is_empty());
    assert_eq!(state.read_index(), &idx("100"));
    assert_eq!(state.end_index(), &idx("100"));

    let steps: Vec<ClearHistoryStep> = h
        .events()
        .into_iter()
        .filter_map(|event| match event {
            ReportEvent::ClearHistoryStepDone { step } => Some(step),
            _ => None,
        })
        .collect();
    assert_eq!(steps, ClearHistoryStep::iter().collect::<Vec<_>>());
}

#[tokio::test]
async fn test_clear_history_drops_in_flight_response() {
    let h = harness(100, config());
    h.open_after("40", 20).await;
    h.conversation.hold(LoadDirection::Prev);

    let (outcome, ()) = tokio::join!(h.client.load_by_scroll_prev(), async {
        h.fetches_reached(2).await;
        h.conversation.clear();
        h.window.replace(Vec::new());
        h.client.on_clear_history().await;
        h.conversation.release(LoadDirection::Prev);
    });

    assert_eq!(outcome, LoadOutcome::Stale);
    assert!(h.window.is_empty());
    let state = h.client.state().await;
    assert_eq!(state.cursor(), "0");
    assert!(!state.is_locked(LoadAction::LoadPrev));
}

#[tokio::test]
async fn test_loads_after_clear_start_from_latest() {
    let h = harness(30, config());
    h.open_latest(20).await;

    h.client.on_clear_history().await;
    h.window.replace(Vec::new());
    h.conversation.push(3);

    assert_eq!(
        h.client.load_eagerly_unconditionally().await,
        LoadOutcome::Loaded
    );
    assert_eq!(h.window.len(), 20);
    assert_eq!(h.client.state().await.max_load_index(), &idx("33"));
}
