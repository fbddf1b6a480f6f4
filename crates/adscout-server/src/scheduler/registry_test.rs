use std::sync::atomic::AtomicUsize;

use adscout_core::FixedClock;
use adscout_pipeline::utc_offset;
use chrono::TimeZone;
use futures::FutureExt;
use tokio::sync::Notify;

use super::*;

fn noop() -> RunFn {
    Arc::new(|| async {}.boxed())
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 10, 15, 0).unwrap()
}

async fn registry() -> JobRegistry {
    JobRegistry::new(utc_offset(-3).unwrap(), Arc::new(FixedClock::new(now())))
        .await
        .unwrap()
}

#[tokio::test]
async fn duplicate_names_are_rejected() {
    let mut registry = registry().await;
    registry
        .register("analysis", TriggerSpec::EveryMinutes(30), noop())
        .unwrap();
    let err = registry
        .register("analysis", TriggerSpec::EveryMinutes(10), noop())
        .unwrap_err();
    assert!(matches!(err, RegistryError::Duplicate(name) if name == "analysis"));
}

#[tokio::test]
async fn status_reports_next_fire_only_while_active() {
    let mut registry = registry().await;
    registry
        .register("scraping", TriggerSpec::EveryHours(2), noop())
        .unwrap();
    registry
        .register("analysis", TriggerSpec::EveryMinutes(30), noop())
        .unwrap();

    let before = registry.status();
    assert!(!before["scraping"].active);
    assert_eq!(before["scraping"].next_fire, None);

    registry.start_all().await.unwrap();
    let after = registry.status();
    assert!(after["scraping"].active);
    assert_eq!(
        after["scraping"].next_fire,
        Some(Utc.with_ymd_and_hms(2025, 6, 1, 11, 0, 0).unwrap())
    );
    assert_eq!(
        after["analysis"].next_fire,
        Some(Utc.with_ymd_and_hms(2025, 6, 1, 10, 30, 0).unwrap())
    );

    registry.stop_job("scraping").await.unwrap();
    let stopped = registry.status();
    assert!(!stopped["scraping"].active);
    assert!(stopped["analysis"].active);

    registry.stop_all().await.unwrap();
    assert!(registry.status().values().all(|s| !s.active));
}

#[tokio::test]
async fn registry_restarts_after_stop_all() {
    let mut registry = registry().await;
    registry
        .register("cleanup", TriggerSpec::DailyAt { hour: 2, minute: 0 }, noop())
        .unwrap();

    registry.start_all().await.unwrap();
    registry.stop_all().await.unwrap();
    assert!(!registry.status()["cleanup"].active);

    registry.start_all().await.unwrap();
    let status = registry.status();
    assert!(status["cleanup"].active);
    assert!(status["cleanup"].next_fire.is_some());
    registry.stop_all().await.unwrap();
}

#[tokio::test]
async fn unknown_job_names_are_errors() {
    let mut registry = registry().await;
    assert!(matches!(
        registry.stop_job("nope").await,
        Err(RegistryError::Unknown(_))
    ));
    assert!(matches!(
        registry.run_now("nope"),
        Err(RegistryError::Unknown(_))
    ));
}

#[tokio::test]
async fn firing_while_in_flight_is_skipped() {
    let mut registry = registry().await;
    let release = Arc::new(Notify::new());
    let runs = Arc::new(AtomicUsize::new(0));

    let run: RunFn = {
        let release = Arc::clone(&release);
        let runs = Arc::clone(&runs);
        Arc::new(move || {
            let release = Arc::clone(&release);
            let runs = Arc::clone(&runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                release.notified().await;
            }
            .boxed()
        })
    };
    registry
        .register("scraping", TriggerSpec::EveryHours(2), run)
        .unwrap();

    let first = registry.run_now("scraping").unwrap().expect("first run starts");
    assert!(registry.status()["scraping"].running);
    assert!(registry.run_now("scraping").unwrap().is_none());

    release.notify_one();
    first.await.unwrap();
    assert!(!registry.status()["scraping"].running);
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    let again = registry.run_now("scraping").unwrap().expect("runs after the first ends");
    release.notify_one();
    again.await.unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn panicking_run_clears_in_flight_flag() {
    let mut registry = registry().await;
    registry
        .register(
            "cleanup",
            TriggerSpec::DailyAt { hour: 2, minute: 0 },
            Arc::new(|| async { panic!("store exploded") }.boxed()),
        )
        .unwrap();

    let handle = registry.run_now("cleanup").unwrap().unwrap();
    assert!(handle.await.is_err());
    assert!(!registry.status()["cleanup"].running);
}
