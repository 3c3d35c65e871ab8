//! Async adapters: `next_navigation_outcome` over `futures` streams and
//! `spawn_after_next_navigation` over the broadcast channel.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{stream, StreamExt};
use navwatch_core::{
    next_navigation_outcome, spawn_after_next_navigation, CancellationCode, ChannelConfig,
    NavWatchError, NavigationEvent, NavigationEventChannel, Outcome, SkipCode,
};

#[tokio::test]
async fn stream_skips_redirects_and_settles_on_end() {
    let events = vec![
        NavigationEvent::start(1, "/a"),
        NavigationEvent::cancel(1, "/a", CancellationCode::Redirect),
        NavigationEvent::cancel(2, "/b", CancellationCode::SupersededByNewNavigation),
        NavigationEvent::end(3, "/c"),
    ];
    assert_eq!(
        next_navigation_outcome(stream::iter(events)).await,
        Some(Outcome::Complete)
    );
}

#[tokio::test]
async fn stream_settles_on_failure() {
    let events = vec![
        NavigationEvent::cancel(1, "/a", CancellationCode::SupersededByNewNavigation),
        NavigationEvent::error(2, "/b", "no route"),
    ];
    assert_eq!(
        next_navigation_outcome(stream::iter(events)).await,
        Some(Outcome::Failed)
    );
}

#[tokio::test]
async fn stream_ending_without_terminal_yields_none() {
    let events = vec![
        NavigationEvent::Unknown,
        NavigationEvent::cancel(1, "/a", CancellationCode::Redirect),
    ];
    assert_eq!(next_navigation_outcome(stream::iter(events)).await, None);
}

#[tokio::test]
async fn stream_ignores_unknown_then_completes() {
    let polled = Arc::new(AtomicUsize::new(0));
    let counter = polled.clone();
    let events = stream::iter(vec![NavigationEvent::Unknown, NavigationEvent::end(1, "/")])
        .inspect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

    assert_eq!(
        next_navigation_outcome(events).await,
        Some(Outcome::Complete)
    );
    assert_eq!(polled.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn stream_stops_polling_after_first_terminal() {
    let polled = Arc::new(AtomicUsize::new(0));
    let counter = polled.clone();
    let events = stream::iter(vec![
        NavigationEvent::skipped(1, "/", SkipCode::IgnoredByUrlHandlingStrategy),
        NavigationEvent::end(2, "/"),
        NavigationEvent::error(3, "/", "never seen"),
    ])
    .inspect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(
        next_navigation_outcome(events).await,
        Some(Outcome::Complete)
    );
    assert_eq!(polled.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn spawned_watcher_fires_once_on_channel() {
    let channel = NavigationEventChannel::new(ChannelConfig::default());
    let fired = Arc::new(AtomicUsize::new(0));
    let f = fired.clone();
    let handle = spawn_after_next_navigation(channel.subscribe(), move |outcome| {
        assert_eq!(outcome, Outcome::Complete);
        f.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(channel.receiver_count(), 1);
    channel.publish(NavigationEvent::start(1, "/"));
    channel.publish(NavigationEvent::cancel(1, "/", CancellationCode::Redirect));
    channel.publish(NavigationEvent::end(2, "/login"));
    channel.publish(NavigationEvent::error(3, "/", "after settle"));

    let outcome = handle.join().await.unwrap();
    assert_eq!(outcome, Some(Outcome::Complete));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn spawned_watcher_ignores_unknown_then_completes() {
    let channel = NavigationEventChannel::default();
    let fired = Arc::new(AtomicUsize::new(0));
    let f = fired.clone();
    let handle = spawn_after_next_navigation(channel.subscribe(), move |_| {
        f.fetch_add(1, Ordering::SeqCst);
    });

    channel.publish(NavigationEvent::Unknown);
    channel.publish(NavigationEvent::end(1, "/"));

    assert_eq!(handle.join().await.unwrap(), Some(Outcome::Complete));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn spawned_watcher_fires_once_after_any_number_of_redirects() {
    for redirects in 0..5u64 {
        let channel = NavigationEventChannel::default();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        let handle = spawn_after_next_navigation(channel.subscribe(), move |outcome| {
            assert_eq!(outcome, Outcome::Complete);
            f.fetch_add(1, Ordering::SeqCst);
        });

        for i in 0..redirects {
            let code = if i % 2 == 0 {
                CancellationCode::Redirect
            } else {
                CancellationCode::SupersededByNewNavigation
            };
            channel.publish(NavigationEvent::start(i, "/hop"));
            channel.publish(NavigationEvent::cancel(i, "/hop", code));
        }
        channel.publish(NavigationEvent::end(redirects, "/final"));
        channel.publish(NavigationEvent::error(redirects + 1, "/", "after settle"));

        assert_eq!(
            handle.join().await.unwrap(),
            Some(Outcome::Complete),
            "redirects = {redirects}"
        );
        assert_eq!(fired.load(Ordering::SeqCst), 1, "redirects = {redirects}");
    }
}

#[tokio::test]
async fn spawned_watcher_returns_none_when_channel_closes() {
    let channel = NavigationEventChannel::default();
    let fired = Arc::new(AtomicUsize::new(0));
    let f = fired.clone();
    let handle = spawn_after_next_navigation(channel.subscribe(), move |_| {
        f.fetch_add(1, Ordering::SeqCst);
    });

    channel.publish(NavigationEvent::cancel(
        1,
        "/",
        CancellationCode::SupersededByNewNavigation,
    ));
    drop(channel);

    assert_eq!(handle.join().await.unwrap(), None);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancelled_watcher_reports_cancelled() {
    let channel = NavigationEventChannel::default();
    let handle = spawn_after_next_navigation(channel.subscribe(), |_| {});
    handle.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), handle.join())
        .await
        .expect("join should resolve after cancel");
    assert!(matches!(result, Err(NavWatchError::Cancelled)));
}

#[tokio::test]
async fn panicking_action_is_reported() {
    let channel = NavigationEventChannel::default();
    let handle = spawn_after_next_navigation(channel.subscribe(), |_| panic!("action failed"));
    channel.publish(NavigationEvent::end(1, "/"));

    assert!(matches!(
        handle.join().await,
        Err(NavWatchError::ActionPanicked)
    ));
}

#[tokio::test]
async fn lagging_receiver_keeps_waiting() {
    let channel = NavigationEventChannel::new(ChannelConfig { capacity: 2 });
    let receiver = channel.subscribe();

    // Overflow the receiver before the watcher task gets to run.
    for id in 0..5 {
        channel.publish(NavigationEvent::start(id, "/"));
    }
    channel.publish(NavigationEvent::error(9, "/", "late failure"));

    let handle = spawn_after_next_navigation(receiver, |_| {});
    assert_eq!(handle.join().await.unwrap(), Some(Outcome::Failed));
}

#[tokio::test]
async fn publish_without_receivers_is_not_an_error() {
    let channel = NavigationEventChannel::default();
    assert_eq!(channel.publish(NavigationEvent::end(1, "/")), 0);
}
