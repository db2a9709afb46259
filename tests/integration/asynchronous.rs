use crate::utils::{ms, policy, Counter, Delays, Failure};
use reattempt::{ConfigUpdate, RetryEngine, RetryPolicy};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn succeeds_on_third_attempt() {
    let _ = env_logger::try_init();
    let engine = RetryEngine::new();
    let calls = Counter::default();
    let delays = Delays::default();

    let outcome = engine
        .retry(
            || {
                let attempt = calls.bump();
                async move {
                    if attempt < 3 {
                        Err("unavailable")
                    } else {
                        Ok(attempt * 7)
                    }
                }
            },
            Some(delays.observe(policy(3, 100, 300))),
        )
        .await
        .unwrap();

    assert!(outcome.succeeded());
    assert_eq!(outcome.attempts(), 3);
    assert_eq!(outcome.value(), Some(&21));
    assert_eq!(outcome.failure(), None);
    assert_eq!(calls.get(), 3);
    assert_eq!(delays.millis(), vec![100, 200]);
}

#[tokio::test(start_paused = true)]
async fn exhausts_budget_without_trailing_delay() {
    let _ = env_logger::try_init();
    let engine = RetryEngine::new();
    let calls = Counter::default();
    let delays = Delays::default();
    let start = Instant::now();

    let outcome = engine
        .retry(
            || {
                calls.bump();
                async { Err::<(), _>("unavailable") }
            },
            Some(delays.observe(policy(3, 100, 300))),
        )
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert!(!outcome.succeeded());
    assert_eq!(outcome.attempts(), 3);
    assert_eq!(outcome.failure(), Some(&"unavailable"));
    assert_eq!(calls.get(), 3);
    assert_eq!(delays.millis(), vec![100, 200]);
    assert!(elapsed >= ms(300), "waited only {:?}", elapsed);
    assert!(elapsed < ms(400), "waited after the last attempt: {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn delay_is_capped_by_max_delay() {
    let engine = RetryEngine::new();
    let delays = Delays::default();

    let outcome = engine
        .retry(
            || async { Err::<(), _>("unavailable") },
            Some(delays.observe(policy(3, 100, 150))),
        )
        .await
        .unwrap();

    assert_eq!(outcome.attempts(), 3);
    assert_eq!(delays.millis(), vec![100, 150]);
}

#[tokio::test(start_paused = true)]
async fn terminal_failure_stops_immediately() {
    let _ = env_logger::try_init();
    let engine = RetryEngine::new();
    let calls = Counter::default();
    let delays = Delays::default();
    let policy = policy(5, 100, 10_000).retry_if(|f: &Failure| *f == Failure::Transient);

    let outcome = engine
        .retry(
            || {
                let attempt = calls.bump();
                async move {
                    if attempt == 1 {
                        Err::<(), _>(Failure::Transient)
                    } else {
                        Err(Failure::Fatal)
                    }
                }
            },
            Some(delays.observe(policy)),
        )
        .await
        .unwrap();

    assert_eq!(outcome.attempts(), 2);
    assert_eq!(calls.get(), 2);
    assert_eq!(delays.millis(), vec![100]);
    assert_eq!(outcome.into_failure(), Some(Failure::Fatal));
}

#[tokio::test(start_paused = true)]
async fn single_attempt_budget_never_waits() {
    let engine = RetryEngine::new();
    let calls = Counter::default();
    let delays = Delays::default();

    let outcome = engine
        .retry(
            || {
                calls.bump();
                async { Err::<(), _>("unavailable") }
            },
            Some(delays.observe(policy(1, 100, 300))),
        )
        .await
        .unwrap();

    assert_eq!(outcome.attempts(), 1);
    assert_eq!(calls.get(), 1);
    assert!(delays.millis().is_empty());
}

#[tokio::test(start_paused = true)]
async fn zero_attempts_is_a_configuration_error() {
    let engine = RetryEngine::new();
    let calls = Counter::default();

    let result = engine
        .retry(
            || {
                calls.bump();
                async { Ok::<_, &str>(()) }
            },
            Some(policy(0, 100, 300)),
        )
        .await;

    assert!(matches!(result, Err(reattempt::Error::InvalidPolicy(_))));
    assert_eq!(calls.get(), 0);
}

#[tokio::test(start_paused = true)]
async fn in_flight_call_keeps_its_schedule() {
    let engine = RetryEngine::new();
    let calls = Counter::default();
    let handle = engine.clone();

    let outcome = engine
        .retry(
            || {
                if calls.bump() == 1 {
                    handle
                        .update_default_config(ConfigUpdate::new().max_attempts(10))
                        .unwrap();
                }
                async { Err::<(), _>("unavailable") }
            },
            Some(RetryPolicy::new().initial_delay(ms(100)).max_delay(ms(300))),
        )
        .await
        .unwrap();

    // The default allowed 3 attempts when the call started.
    assert_eq!(outcome.attempts(), 3);
    assert_eq!(engine.config().max_attempts, 10);
}

#[tokio::test(start_paused = true)]
async fn batch_runs_concurrently() {
    let _ = env_logger::try_init();
    let engine = RetryEngine::new();
    let calls = Counter::default();
    let start = Instant::now();

    let operations = (0..3u32).map(|i| {
        let calls = calls.clone();
        move || {
            calls.bump();
            async move {
                if i == 1 {
                    Ok(i)
                } else {
                    Err("unavailable")
                }
            }
        }
    });
    let outcomes = engine
        .retry_all(operations, Some(policy(3, 100, 300)))
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(outcomes.len(), 3);
    assert!(!outcomes[0].succeeded());
    assert_eq!(outcomes[0].attempts(), 3);
    assert_eq!(outcomes[1].value(), Some(&1));
    assert_eq!(outcomes[1].attempts(), 1);
    assert_eq!(outcomes[2].attempts(), 3);
    assert_eq!(calls.get(), 7);
    // Both failing schedules overlap, so the batch takes as long as one of them.
    assert!(elapsed < ms(400), "batch ran sequentially: {:?}", elapsed);
}
