//! Integration tests for the event router.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use tushub_core::HookType;
use tushub_core::events;
use tushub_hooks::testing::{CountingStopHandle, StubBackend};

use helpers::TestHooks;

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_slow_hook_does_not_block_others() {
    let hooks = TestHooks::new(
        StubBackend::new().with_delay(HookType::PostFinish, Duration::from_secs(60)),
    );
    let (senders, events) = events::channels(16);
    let _router = hooks.manager.spawn_router(events);

    senders
        .completed
        .send(helpers::event("slow", 1))
        .await
        .expect("send");
    for i in 0..5 {
        senders
            .created
            .send(helpers::event(&format!("fast-{i}"), 1))
            .await
            .expect("send");
    }

    hooks
        .backend
        .wait_for_completed(5, WAIT)
        .await
        .expect("fast hooks finish while the slow one is pending");

    assert_eq!(hooks.backend.calls_for(HookType::PostFinish), 1);
    assert_eq!(hooks.backend.calls_for(HookType::PostCreate), 5);
    assert_eq!(hooks.backend.completed_count(), 5);
}

#[tokio::test]
async fn test_progress_event_stops_upload() {
    let hooks = TestHooks::with_config(
        StubBackend::new().with_return_code(33),
        helpers::hooks_config(&HookType::ALL, 33),
    );
    let (senders, events) = events::channels(4);
    let router = hooks.manager.spawn_router(events);

    let stop = Arc::new(CountingStopHandle::new());
    senders
        .progress
        .send(helpers::event("abc", 10).with_stop_handle(stop.clone()))
        .await
        .expect("send");

    hooks
        .backend
        .wait_for_completed(1, WAIT)
        .await
        .expect("dispatch");
    tokio::time::timeout(WAIT, async {
        while stop.count() == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("stop signal");

    drop(senders);
    tokio::time::timeout(WAIT, router)
        .await
        .expect("router exits")
        .expect("router task");
    assert_eq!(stop.count(), 1);
}

#[tokio::test]
async fn test_disabled_events_are_dropped() {
    let hooks = TestHooks::with_config(
        StubBackend::new(),
        helpers::hooks_config(&[HookType::PostTerminate], 0),
    );
    let (senders, events) = events::channels(8);
    let router = hooks.manager.spawn_router(events);

    senders.created.send(helpers::event("a", 1)).await.expect("send");
    senders.progress.send(helpers::event("a", 1)).await.expect("send");
    senders.completed.send(helpers::event("a", 1)).await.expect("send");
    senders.terminated.send(helpers::event("a", 1)).await.expect("send");

    hooks
        .backend
        .wait_for_completed(1, WAIT)
        .await
        .expect("terminate dispatch");

    drop(senders);
    tokio::time::timeout(WAIT, router)
        .await
        .expect("router exits")
        .expect("router task");

    let calls = hooks.backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].hook, HookType::PostTerminate);
}
