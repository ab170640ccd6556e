//! Integration tests for the result cache and task coordinator.
//!
//! These tests exercise the public API end to end:
//! - Results surviving a coordinator restart through the disk tier
//! - Invalidation when the source file changes
//! - Parallel fan-out ordering, failure isolation and the worker bound
//! - Config file → coordinator wiring
//! - Workflow runs on top of a shared coordinator
//!
//! Run with: `cargo test --test coordinator_integration`

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde_json::{json, Value};
use tempfile::TempDir;

use sonicache::cache::{Params, ResultCache, ResultCacheConfig};
use sonicache::config::ConfigFile;
use sonicache::coordinator::{
    CoordinatorConfig, Operation, OperationError, ParallelTask, TaskCoordinator,
};
use sonicache::workflow::{Workflow, WorkflowStep};

// ============================================================================
// Test Helpers
// ============================================================================

/// Coordinator with a cache rooted inside `temp`.
fn create_coordinator(temp: &TempDir, workers: usize) -> TaskCoordinator {
    let config = CoordinatorConfig::default()
        .with_max_workers(workers)
        .with_cache_config(ResultCacheConfig::new(temp.path().join("cache")).with_max_size(10));
    TaskCoordinator::new(config).unwrap()
}

/// Write a fake audio file.
fn create_track(temp: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = temp.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Blocking operation that counts its invocations.
fn counting_analysis(calls: &Arc<AtomicUsize>, tempo: f64) -> Operation {
    let calls = Arc::clone(calls);
    Operation::blocking(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"tempo": tempo, "key": "A minor"}))
    })
}

fn set_mtime(path: &Path, time: SystemTime) {
    let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(time).unwrap();
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_results_survive_restart() {
    let temp = TempDir::new().unwrap();
    let track = create_track(&temp, "song.wav", b"RIFF....WAVEfmt ");
    let params = Params::new().with("sr", 22050).with("hop_length", 512);
    let calls = Arc::new(AtomicUsize::new(0));

    let first = create_coordinator(&temp, 2);
    let computed = first
        .run_with_cache("analysis", counting_analysis(&calls, 120.0), &track, &params)
        .await
        .unwrap();
    drop(first);

    let second = create_coordinator(&temp, 2);
    let cached = second
        .run_with_cache("analysis", counting_analysis(&calls, 999.0), &track, &params)
        .await
        .unwrap();

    assert_eq!(computed, cached);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let stats = second.get_performance_stats().await;
    assert_eq!(stats.cache_hit_rate, 1.0);
    assert_eq!(stats.cache_stats.unwrap().memory_entries, 1);
}

#[tokio::test]
async fn test_modified_file_is_recomputed() {
    let temp = TempDir::new().unwrap();
    let track = create_track(&temp, "song.wav", b"RIFF");
    let calls = Arc::new(AtomicUsize::new(0));
    let coordinator = create_coordinator(&temp, 1);

    set_mtime(&track, SystemTime::UNIX_EPOCH + Duration::from_secs(1_000));
    coordinator
        .run_with_cache("analysis", counting_analysis(&calls, 100.0), &track, &Params::new())
        .await
        .unwrap();

    std::fs::write(&track, b"RIFF plus new samples").unwrap();
    set_mtime(&track, SystemTime::UNIX_EPOCH + Duration::from_secs(2_000));
    let result = coordinator
        .run_with_cache("analysis", counting_analysis(&calls, 101.0), &track, &Params::new())
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(result["tempo"], json!(101.0));
}

#[tokio::test]
async fn test_parameters_and_operations_are_isolated() {
    let temp = TempDir::new().unwrap();
    let track = create_track(&temp, "song.wav", b"RIFF");
    let calls = Arc::new(AtomicUsize::new(0));
    let coordinator = create_coordinator(&temp, 2);

    let low = Params::new().with("n_fft", 1024);
    let high = Params::new().with("n_fft", 4096);

    for params in [&low, &high, &low] {
        coordinator
            .run_with_cache("analysis", counting_analysis(&calls, 90.0), &track, params)
            .await
            .unwrap();
    }
    coordinator
        .run_with_cache("classification", counting_analysis(&calls, 90.0), &track, &low)
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_shared_cache_between_coordinators() {
    let temp = TempDir::new().unwrap();
    let track = create_track(&temp, "song.wav", b"RIFF");
    let config = ResultCacheConfig::new(temp.path().join("shared"));
    let cache = Arc::new(ResultCache::new(config).unwrap());
    let calls = Arc::new(AtomicUsize::new(0));

    let a = TaskCoordinator::with_cache(1, Some(Arc::clone(&cache)));
    let b = TaskCoordinator::with_cache(1, Some(Arc::clone(&cache)));

    a.run_with_cache("analysis", counting_analysis(&calls, 80.0), &track, &Params::new())
        .await
        .unwrap();
    b.run_with_cache("analysis", counting_analysis(&calls, 80.0), &track, &Params::new())
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.memory_len(), 1);
}

// ============================================================================
// Parallel execution
// ============================================================================

#[tokio::test]
async fn test_parallel_isolates_failures_and_keeps_order() {
    let temp = TempDir::new().unwrap();
    let coordinator = create_coordinator(&temp, 2);

    let tasks = vec![
        ParallelTask::new(
            "analysis",
            Operation::blocking(|| {
                std::thread::sleep(Duration::from_millis(30));
                Ok(json!({"tempo": 128}))
            }),
        ),
        ParallelTask::new(
            "separation",
            Operation::blocking(|| Err(OperationError::failed("out of memory"))),
        ),
        ParallelTask::new(
            "classification",
            Operation::from_future(async { Ok(json!({"genre": "house"})) }),
        ),
    ];

    let results = coordinator.run_parallel(tasks).await;

    assert_eq!(
        results,
        vec![
            json!({"tempo": 128}),
            json!({"error": "Task separation failed: out of memory"}),
            json!({"genre": "house"}),
        ]
    );
}

#[tokio::test]
async fn test_parallel_respects_worker_bound() {
    let temp = TempDir::new().unwrap();
    let coordinator = create_coordinator(&temp, 2);

    let tasks = (0..6)
        .map(|i| {
            ParallelTask::new(
                format!("chunk-{}", i),
                Operation::blocking(move || {
                    std::thread::sleep(Duration::from_millis(20));
                    Ok(json!(i))
                }),
            )
        })
        .collect();

    let results = coordinator.run_parallel(tasks).await;

    assert_eq!(results, (0..6).map(|i| json!(i)).collect::<Vec<Value>>());
    assert!(coordinator.pool().peak_in_flight() <= 2);
    assert_eq!(coordinator.pool().in_flight(), 0);
}

#[tokio::test]
async fn test_panicking_operation_is_reported() {
    let temp = TempDir::new().unwrap();
    let track = create_track(&temp, "song.wav", b"RIFF");
    let coordinator = create_coordinator(&temp, 1);

    let result = coordinator
        .run_with_cache(
            "analysis",
            Operation::blocking(|| panic!("decoder crashed")),
            &track,
            &Params::new(),
        )
        .await;

    assert!(matches!(
        result,
        Err(OperationError::Panicked(ref m)) if m.contains("decoder crashed")
    ));

    // The worker slot is released and timing is still recorded.
    assert_eq!(coordinator.pool().available(), 1);
    let stats = coordinator.get_performance_stats().await;
    assert_eq!(stats.operation_performance["analysis"].total_runs, 1);
}

// ============================================================================
// Stats and clearing
// ============================================================================

#[tokio::test]
async fn test_clear_cache_forces_recompute() {
    let temp = TempDir::new().unwrap();
    let track = create_track(&temp, "song.wav", b"RIFF");
    let calls = Arc::new(AtomicUsize::new(0));
    let coordinator = create_coordinator(&temp, 1);

    for _ in 0..2 {
        coordinator
            .run_with_cache("analysis", counting_analysis(&calls, 70.0), &track, &Params::new())
            .await
            .unwrap();
    }
    assert_eq!(coordinator.get_performance_stats().await.cache_hit_rate, 0.5);

    coordinator.clear_cache().await;
    let stats = coordinator.get_performance_stats().await;
    assert_eq!(stats.cache_hit_rate, 0.0);
    let cache_stats = stats.cache_stats.unwrap();
    assert_eq!(cache_stats.memory_entries, 0);
    assert_eq!(cache_stats.disk_entries, 0);
    assert_eq!(stats.operation_performance["analysis"].total_runs, 2);

    coordinator
        .run_with_cache("analysis", counting_analysis(&calls, 70.0), &track, &Params::new())
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_stats_serialize_to_json() {
    let temp = TempDir::new().unwrap();
    let coordinator = create_coordinator(&temp, 3);

    let stats = serde_json::to_value(coordinator.get_performance_stats().await).unwrap();

    assert_eq!(stats["worker_count"], json!(3));
    assert_eq!(stats["cache_enabled"], json!(true));
    assert_eq!(stats["cache_stats"]["max_size"], json!(10));
}

// ============================================================================
// Config wiring
// ============================================================================

#[tokio::test]
async fn test_coordinator_from_config_file() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("config.ini");
    std::fs::write(
        &config_path,
        format!(
            "[cache]\ndirectory = {}\nmax_size = 4\n\n[coordinator]\nworkers = 3\n",
            temp.path().join("from-config").display()
        ),
    )
    .unwrap();

    let config = ConfigFile::load_from(&config_path).unwrap();
    let coordinator = TaskCoordinator::new(config.coordinator_config()).unwrap();

    assert_eq!(coordinator.worker_count(), 3);
    let cache = coordinator.cache().unwrap();
    assert_eq!(cache.max_size(), 4);
    assert!(temp.path().join("from-config").is_dir());
}

#[tokio::test]
async fn test_disabled_cache_from_config() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("config.ini");
    std::fs::write(&config_path, "[cache]\nenabled = false\n").unwrap();

    let config = ConfigFile::load_from(&config_path).unwrap();
    let coordinator = TaskCoordinator::new(config.coordinator_config()).unwrap();
    let track = create_track(&temp, "song.wav", b"RIFF");
    let calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        coordinator
            .run_with_cache("analysis", counting_analysis(&calls, 60.0), &track, &Params::new())
            .await
            .unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(coordinator.get_performance_stats().await.cache_stats.is_none());
}

// ============================================================================
// Workflow
// ============================================================================

#[tokio::test]
async fn test_workflow_reuses_cached_steps() {
    let temp = TempDir::new().unwrap();
    let track = create_track(&temp, "song.wav", b"RIFF");
    let coordinator = Arc::new(create_coordinator(&temp, 2));
    let calls = Arc::new(AtomicUsize::new(0));

    let step_calls = Arc::clone(&calls);
    let workflow = Workflow::new(Arc::clone(&coordinator))
        .register(WorkflowStep::Analysis, move |_, _| {
            counting_analysis(&step_calls, 140.0)
        })
        .register(WorkflowStep::Visualization, |path, _| {
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
            Operation::from_future(async move { Ok(json!({"spectrogram": name})) })
        });

    let sequential = workflow
        .run(&track, &["analysis"], &Params::new(), false)
        .await
        .unwrap();
    let again = workflow
        .run(&track, &["analysis"], &Params::new(), false)
        .await
        .unwrap();
    let parallel = workflow
        .run(&track, &["analysis", "visualization"], &Params::new(), true)
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(sequential.result(WorkflowStep::Analysis), again.result(WorkflowStep::Analysis));
    assert!(parallel.parallel);
    assert_eq!(
        parallel.result(WorkflowStep::Visualization),
        Some(&json!({"spectrogram": "song.wav"}))
    );
}
