// tests/unresolved_and_cycles.rs

use taskdag::{Phase, SchedulerError, SchedulerOptions, TaskScheduler, UnresolvedPolicy};
use taskdag_test_utils::tasks::{CallLog, constant};
use taskdag_test_utils::{init_tracing, with_timeout};

#[tokio::test]
async fn unresolved_dependency_fails_start_by_default() {
    init_tracing();

    let mut scheduler = TaskScheduler::new();
    scheduler
        .add_task("a", constant("A".to_string()), &[])
        .unwrap();
    scheduler
        .add_task("b", constant("B".to_string()), &["a", "ghost"])
        .unwrap();

    match scheduler.start() {
        Err(SchedulerError::UnresolvedDependency { task, dependency }) => {
            assert_eq!(task, "b");
            assert_eq!(dependency, "ghost");
        }
        other => panic!("expected UnresolvedDependency, got {other:?}"),
    }
    assert_eq!(scheduler.phase(), Phase::Building);
}

#[tokio::test]
async fn failed_validation_can_be_fixed_and_retried() {
    init_tracing();

    let log = CallLog::new();
    let mut scheduler = TaskScheduler::new();
    scheduler
        .add_task("b", log.task("b", "B"), &["ghost"])
        .unwrap();
    assert!(scheduler.start().is_err());

    scheduler
        .add_task("ghost", log.task("ghost", "G"), &[])
        .unwrap();
    let results = with_timeout(scheduler.start().unwrap()).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(log.order(), vec!["ghost", "b"]);
}

#[tokio::test]
async fn skip_policy_runs_everything_else() {
    init_tracing();

    let log = CallLog::new();
    let mut scheduler = TaskScheduler::with_options(SchedulerOptions {
        on_unresolved: UnresolvedPolicy::Skip,
    });
    scheduler.add_task("a", log.task("a", "A"), &[]).unwrap();
    scheduler
        .add_task("b", log.task("b", "B"), &["a", "ghost"])
        .unwrap();
    scheduler.add_task("c", log.task("c", "C"), &["b"]).unwrap();
    scheduler.add_task("d", log.task("d", "D"), &["a"]).unwrap();

    let results = with_timeout(scheduler.start().unwrap()).await.unwrap();

    let mut names: Vec<_> = results.keys().cloned().collect();
    names.sort();
    // `b` waits on a task that never exists, and `c` waits on `b`.
    assert_eq!(names, vec!["a", "d"]);
    assert_eq!(log.count("b"), 0);
    assert_eq!(log.count("c"), 0);
    // Placeholders never show up in results.
    assert!(!results.contains_key("ghost"));
}

#[tokio::test]
async fn cycle_is_detected_at_start() {
    init_tracing();

    let mut scheduler = TaskScheduler::new();
    scheduler
        .add_task("a", constant(1u8), &["c"])
        .unwrap();
    scheduler
        .add_task("b", constant(2u8), &["a"])
        .unwrap();
    scheduler
        .add_task("c", constant(3u8), &["b"])
        .unwrap();

    let err = scheduler.start().unwrap_err();
    assert!(matches!(err, SchedulerError::CycleDetected(_)));
    assert_eq!(scheduler.phase(), Phase::Building);
}

#[tokio::test]
async fn self_dependency_is_a_cycle() {
    let mut scheduler = TaskScheduler::new();
    scheduler
        .add_task("loop", constant(0u8), &["loop"])
        .unwrap();

    assert!(matches!(
        scheduler.start(),
        Err(SchedulerError::CycleDetected(_))
    ));
}

#[tokio::test]
async fn cycle_is_reported_before_unresolved_dependencies() {
    let mut scheduler = TaskScheduler::new();
    scheduler
        .add_task("a", constant(0u8), &["b", "ghost"])
        .unwrap();
    scheduler
        .add_task("b", constant(0u8), &["a"])
        .unwrap();

    assert!(matches!(
        scheduler.start(),
        Err(SchedulerError::CycleDetected(_))
    ));
}

#[tokio::test]
async fn duplicate_dependencies_collapse() {
    init_tracing();

    let log = CallLog::new();
    let mut scheduler = TaskScheduler::new();
    scheduler.add_task("a", log.task("a", "A"), &[]).unwrap();
    scheduler
        .add_task("b", log.task("b", "B"), &["a", "a"])
        .unwrap();

    let results = with_timeout(scheduler.start().unwrap()).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(scheduler.graph().dependencies_of("b"), vec!["a"]);
    assert_eq!(log.inputs_of("b").unwrap().len(), 1);
}
