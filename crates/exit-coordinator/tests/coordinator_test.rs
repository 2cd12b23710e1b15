use exit_coordinator::mock::MockActor;
use exit_coordinator::{Coordinator, ExitError, ExitReport, ExitSignal};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, Notify};

#[tokio::test]
async fn test_exit_without_error() {
    let coordinator = Coordinator::new("test");

    let mut listener = coordinator.register("one").unwrap();
    tokio::spawn(async move {
        let reply = listener.recv().await.unwrap();
        reply.ok();
    });

    assert!(coordinator.exit().await.is_none());
}

#[tokio::test]
async fn test_one_clean_and_one_failing_actor() {
    let coordinator = Coordinator::new("test");

    let mut one = coordinator.register("one").unwrap();
    tokio::spawn(async move {
        one.recv().await.unwrap().ok();
    });
    let mut two = coordinator.register("two").unwrap();
    tokio::spawn(async move {
        two.recv().await.unwrap().err("boom");
    });

    let report = coordinator.exit().await.expect("expected a report");
    assert_eq!(report.len(), 1);
    assert_eq!(report.get("two").unwrap().to_string(), "boom");
    assert!(report.get("one").is_none());
}

#[tokio::test]
async fn test_every_failure_is_reported_in_name_order() {
    let coordinator = Coordinator::new("test");
    for name in ["delta", "alpha", "charlie", "bravo"] {
        MockActor::register(&coordinator, name)
            .unwrap()
            .reply_err(format!("{name} failed"))
            .spawn();
    }

    let report = coordinator.exit().await.unwrap();
    assert_eq!(report.len(), 4);
    assert_eq!(report.get("charlie").unwrap().to_string(), "charlie failed");
    assert_eq!(
        report.to_string(),
        "alpha: alpha failed / bravo: bravo failed / charlie: charlie failed / delta: delta failed"
    );

    let mut out = Vec::new();
    report.write_to(&mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "alpha: alpha failed\nbravo: bravo failed\ncharlie: charlie failed\ndelta: delta failed\n"
    );
}

#[tokio::test]
async fn test_exit_with_timeout() {
    let coordinator = Coordinator::new("test");
    coordinator.set_timeout(Duration::from_millis(100));

    MockActor::register(&coordinator, "one").unwrap().spawn();
    // Takes the request but never answers.
    let two = MockActor::register(&coordinator, "two").unwrap().hang().spawn();
    // Registered, but the listener is never polled.
    let _three = coordinator.register("three").unwrap();

    let report = coordinator.exit().await.unwrap();
    assert_eq!(report.len(), 2);
    assert_eq!(report.get("two"), Some(ExitError::Timeout));
    assert_eq!(report.get("three"), Some(ExitError::Timeout));
    assert!(report.get("one").is_none());
    two.abort();
}

#[tokio::test]
async fn test_unpolled_actor_times_out_after_one_timeout() {
    let coordinator = Coordinator::new("test");
    coordinator.set_timeout(Duration::from_millis(100));
    let _listener = coordinator.register("sleepy").unwrap();

    let start = Instant::now();
    let report = coordinator.exit().await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(report.len(), 1);
    assert!(report.get("sleepy").unwrap().is_timeout());
    assert!(elapsed >= Duration::from_millis(100), "returned early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(190), "took too long: {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_stalled_reply_is_bounded_by_two_timeouts() {
    let coordinator = Coordinator::new("test");
    coordinator.set_timeout(Duration::from_millis(100));
    let stalled = MockActor::register(&coordinator, "stalled")
        .unwrap()
        .hang()
        .spawn();

    let start = tokio::time::Instant::now();
    let report = coordinator.exit().await.unwrap();
    let elapsed = start.elapsed();

    assert!(stalled.was_asked());
    assert!(report.get("stalled").unwrap().is_timeout());
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed <= Duration::from_millis(210));
    stalled.abort();
}

#[tokio::test(start_paused = true)]
async fn test_signal_timeout_overrides_coordinator_timeout() {
    let coordinator = Coordinator::new("test");
    coordinator.set_timeout(Duration::from_millis(10));

    let (signal, listener) = ExitSignal::new("patient");
    coordinator
        .attach(signal.with_timeout(Duration::from_millis(500)))
        .unwrap();
    MockActor::new(listener)
        .cleanup(Duration::from_millis(200))
        .spawn();

    MockActor::register(&coordinator, "hurried")
        .unwrap()
        .cleanup(Duration::from_millis(200))
        .spawn();

    let report = coordinator.exit().await.unwrap();
    assert_eq!(report.names(), vec!["hurried"]);
}

#[tokio::test]
async fn test_one_failure_does_not_cut_others_short() {
    let coordinator = Coordinator::new("test");
    coordinator.set_timeout(Duration::from_secs(5));

    MockActor::register(&coordinator, "fast-fail")
        .unwrap()
        .reply_err("broken")
        .spawn();
    let slow = MockActor::register(&coordinator, "slow-ok")
        .unwrap()
        .cleanup(Duration::from_millis(50))
        .spawn();

    let report = coordinator.exit().await.unwrap();
    assert_eq!(report.names(), vec!["fast-fail"]);
    assert!(slow.was_asked());
}

#[tokio::test]
async fn test_dropped_listener_and_reply_are_reported() {
    let coordinator = Coordinator::new("test");
    drop(coordinator.register("gone").unwrap());
    MockActor::register(&coordinator, "careless")
        .unwrap()
        .drop_reply()
        .spawn();

    let report = coordinator.exit().await.unwrap();
    assert_eq!(report.get("gone"), Some(ExitError::ListenerDropped));
    assert_eq!(report.get("careless"), Some(ExitError::ReplyDropped));
}

#[tokio::test]
async fn test_duplicate_registration_policy() {
    let coordinator = Coordinator::new("test");
    let _first = coordinator.register("worker").unwrap();

    assert_eq!(
        coordinator.register("worker").unwrap_err(),
        ExitError::DuplicateName("worker".into())
    );
    let (signal, _listener) = ExitSignal::new("worker");
    assert!(coordinator.attach(signal).is_err());

    // After a round the name is free again.
    coordinator.set_timeout(Duration::from_millis(10));
    coordinator.exit().await;
    assert!(coordinator.register("worker").is_ok());
}

#[tokio::test]
async fn test_registration_during_round_joins_next_round() {
    let coordinator = Coordinator::new("test");
    let release = Arc::new(Notify::new());

    let mut blocker = coordinator.register("blocker").unwrap();
    tokio::spawn({
        let release = release.clone();
        async move {
            let reply = blocker.recv().await.unwrap();
            release.notified().await;
            reply.ok();
        }
    });

    let round = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.exit().await }
    });

    // Wait until the round has taken its snapshot.
    while coordinator.is_registered("blocker") {
        tokio::task::yield_now().await;
    }

    // Registration is not blocked by the round in progress.
    let late = MockActor::register(&coordinator, "late").unwrap().spawn();
    release.notify_one();

    assert!(round.await.unwrap().is_none());
    assert!(!late.was_asked());
    assert!(coordinator.is_registered("late"));

    assert!(coordinator.exit().await.is_none());
    assert!(late.was_asked());
}

#[tokio::test]
async fn test_exit_on_trigger_matches_exit() {
    let coordinator = Coordinator::new("test");
    MockActor::register(&coordinator, "one").unwrap().spawn();
    MockActor::register(&coordinator, "two")
        .unwrap()
        .reply_err("boom")
        .spawn();

    let (tx, rx) = oneshot::channel::<()>();
    tx.send(()).unwrap();

    let report = coordinator.exit_on(rx).await.unwrap();
    assert_eq!(report.to_string(), "two: boom");
}

#[tokio::test]
async fn test_exit_on_waits_for_trigger() {
    let coordinator = Coordinator::new("test");
    let handle = MockActor::register(&coordinator, "one").unwrap().spawn();

    let (tx, rx) = tokio::sync::watch::channel(false);
    let waiter = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.exit_on(rx).await }
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!handle.was_asked());
    assert!(!waiter.is_finished());

    tx.send(true).unwrap();
    assert!(waiter.await.unwrap().is_none());
    assert!(handle.was_asked());
}

#[tokio::test]
async fn test_hooks_run_with_outcomes() {
    let actor_outcomes = Arc::new(Mutex::new(Vec::new()));
    let rounds: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));

    let coordinator = Coordinator::builder()
        .name("hooks")
        .after_exit({
            let rounds = rounds.clone();
            move |report: Option<&ExitReport>| {
                rounds.lock().unwrap().push(report.map(|r| r.to_string()));
            }
        })
        .build();

    let (signal, listener) = ExitSignal::new("db");
    let signal = signal.on_exit({
        let actor_outcomes = actor_outcomes.clone();
        move |name, outcome| {
            actor_outcomes
                .lock()
                .unwrap()
                .push(format!("{name}: {}", outcome.is_ok()));
        }
    });
    coordinator.attach(signal).unwrap();
    MockActor::new(listener).reply_err("locked").spawn();

    coordinator.exit().await;
    coordinator.exit().await;

    assert_eq!(*actor_outcomes.lock().unwrap(), vec!["db: false"]);
    assert_eq!(
        *rounds.lock().unwrap(),
        vec![Some("db: locked".to_string()), None]
    );
}

#[tokio::test]
async fn test_from_config() {
    let config: exit_coordinator::CoordinatorConfig =
        serde_json::from_str(r#"{"name": "api", "timeout_ms": 250}"#).unwrap();
    let coordinator = Coordinator::from_config(&config);

    assert_eq!(coordinator.name(), "api");
    assert_eq!(coordinator.timeout(), Some(Duration::from_millis(250)));
}

#[tokio::test]
async fn test_dropped_round_aborts_its_handshakes() {
    let coordinator = Coordinator::new("test");
    let mut listener = coordinator.register("slow").unwrap();

    // No timeout configured, so only dropping the round ends the handshake.
    let cut_short = tokio::time::timeout(Duration::from_millis(10), coordinator.exit()).await;
    assert!(cut_short.is_err());
    assert!(!coordinator.is_registered("slow"));

    // Let the runtime finish tearing down the aborted handshake task.
    tokio::time::sleep(Duration::from_millis(10)).await;

    // The signal is gone and its undelivered request is discarded.
    let request = tokio::time::timeout(Duration::from_secs(1), listener.recv())
        .await
        .expect("listener still waiting on a live signal");
    assert!(request.is_none());
}
