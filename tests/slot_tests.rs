use lazy_chart::compute::{mapper, ArraySlot, ComputeSlot, ComputeTask, PoolKind, WorkerPool};
use lazy_chart::config::PoolConfig;
use lazy_chart::CacheError;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn pool(kind: PoolKind, workers: usize) -> Arc<WorkerPool> {
    Arc::new(WorkerPool::new(kind, &PoolConfig::named("slot-test").with_workers(workers)).unwrap())
}

#[test]
fn test_read_before_recompute_fails() {
    let slot: ComputeSlot<Vec<i32>> = ComputeSlot::new("never", pool(PoolKind::Primary, 1));
    assert!(!slot.is_initialized());
    assert_eq!(
        slot.read(),
        Err(CacheError::Uninitialized {
            slot: "never".into()
        })
    );
    assert!(matches!(slot.try_read(), Err(CacheError::Uninitialized { .. })));
}

#[test]
fn test_concurrent_readers_share_one_value() {
    let slot = ComputeSlot::new("shared", pool(PoolKind::Primary, 2));
    slot.recompute(ComputeTask::new("slow", || {
        thread::sleep(Duration::from_millis(50));
        vec![1u64, 2, 3]
    }));

    let readers = 8;
    let barrier = Arc::new(Barrier::new(readers));
    let handles: Vec<_> = (0..readers)
        .map(|_| {
            let slot = slot.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                slot.read().unwrap()
            })
        })
        .collect();

    let values: Vec<Arc<Vec<u64>>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for v in &values {
        assert!(Arc::ptr_eq(v, &values[0]));
        assert_eq!(**v, vec![1, 2, 3]);
    }
}

#[test]
fn test_invalidated_value_never_observed() {
    let slot = ComputeSlot::new("invalidate", pool(PoolKind::Primary, 2));
    slot.recompute(ComputeTask::new("first", || 1));
    assert_eq!(*slot.read().unwrap(), 1);

    slot.recompute(ComputeTask::new("second", || {
        thread::sleep(Duration::from_millis(100));
        2
    }));
    assert!(!slot.is_ready());
    assert_eq!(slot.try_read(), Ok(None));

    let reader = {
        let slot = slot.clone();
        thread::spawn(move || *slot.read().unwrap())
    };
    assert_eq!(reader.join().unwrap(), 2);
    assert_eq!(*slot.read().unwrap(), 2);
}

#[test]
fn test_last_recompute_wins() {
    let mut slot = ArraySlot::with_cardinality("values", pool(PoolKind::Primary, 4), 2, 2);
    let data: Arc<[i64]> = Arc::from(vec![1, 2]);

    let g1 = slot.recompute_map(
        data.clone(),
        mapper(|x: &i64, _, _| {
            thread::sleep(Duration::from_millis(150));
            *x
        }),
    );
    let g2 = slot.recompute_map(data, mapper(|x: &i64, _, _| x + 10));
    assert_eq!(g2, g1 + 1);

    assert_eq!(*slot.read().unwrap(), vec![11, 12]);

    // The superseded task finishes later and must not overwrite the value.
    thread::sleep(Duration::from_millis(300));
    assert_eq!(*slot.read().unwrap(), vec![11, 12]);
    assert_eq!(slot.cardinality(), 2);
}

#[test]
fn test_task_panic_fails_read_instead_of_hanging() {
    let slot: ComputeSlot<i32> = ComputeSlot::new("broken", pool(PoolKind::Primary, 1));
    slot.recompute(ComputeTask::new("explode", || -> i32 { panic!("mapper failed") }));
    match slot.read_timeout(Duration::from_secs(5)) {
        Err(CacheError::TaskPanicked { task, message }) => {
            assert_eq!(task, "explode");
            assert_eq!(message, "mapper failed");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    // A later recompute recovers the slot.
    slot.recompute(ComputeTask::new("fixed", || 7));
    assert_eq!(*slot.read().unwrap(), 7);
}

#[test]
fn test_read_timeout_on_slow_task() {
    let slot = ComputeSlot::new("slow", pool(PoolKind::Primary, 1));
    slot.recompute(ComputeTask::new("sleepy", || {
        thread::sleep(Duration::from_millis(500));
        0u8
    }));
    let err = slot.read_timeout(Duration::from_millis(20)).unwrap_err();
    assert!(matches!(err, CacheError::TimedOut { .. }));
    assert!(err.is_transient());
    assert_eq!(*slot.read().unwrap(), 0);
}

#[test]
fn test_nested_read_on_secondary_pool() {
    let primary = pool(PoolKind::Primary, 1);
    let secondary = pool(PoolKind::Secondary, 1);
    let base: ComputeSlot<Vec<i32>> = ComputeSlot::new("base", primary);
    let derived: ComputeSlot<i32> = ComputeSlot::new("derived", secondary);
    assert_eq!(derived.pool_kind(), PoolKind::Secondary);

    // Dispatch the dependent task first; it waits for the base slot.
    base.recompute(ComputeTask::new("base", || {
        thread::sleep(Duration::from_millis(30));
        vec![1, 2, 3, 4]
    }));
    let reader = base.clone();
    derived.recompute(ComputeTask::fallible("sum", move || {
        Ok(reader.read()?.iter().sum())
    }));

    assert_eq!(*derived.read().unwrap(), 10);
}

#[test]
fn test_nested_read_propagates_upstream_failure() {
    let base: ComputeSlot<i32> = ComputeSlot::new("base", pool(PoolKind::Primary, 1));
    let derived: ComputeSlot<i32> = ComputeSlot::new("derived", pool(PoolKind::Secondary, 1));
    let reader = base.clone();
    derived.recompute(ComputeTask::fallible("double", move || Ok(*reader.read()? * 2)));
    assert_eq!(
        derived.read(),
        Err(CacheError::Uninitialized {
            slot: "base".into()
        })
    );
}

#[test]
fn test_generation_counts_recomputes() {
    let slot = ComputeSlot::new("gen", pool(PoolKind::Primary, 1));
    assert_eq!(slot.generation(), 0);
    for i in 1..=3u64 {
        assert_eq!(slot.recompute(ComputeTask::new("n", move || i)), i);
    }
    assert_eq!(*slot.read().unwrap(), 3);
    assert!(slot.is_ready());
}

#[test]
fn test_fan_out_slot_and_reader_share_secondary_pool() {
    let secondary = pool(PoolKind::Secondary, 2);
    let mut values = ArraySlot::with_cardinality("values", secondary.clone(), 2, 2);
    values.recompute_map(
        Arc::from(vec![600u64, 50]),
        mapper(|ms: &u64, _, _| {
            thread::sleep(Duration::from_millis(*ms));
            *ms
        }),
    );

    // Queued while the fan-out above is still waiting on its slices.
    thread::sleep(Duration::from_millis(20));
    let sum: ComputeSlot<u64> = ComputeSlot::new("sum", secondary);
    let upstream = values.as_slot().clone();
    sum.recompute(ComputeTask::fallible("sum", move || {
        Ok(upstream.read()?.iter().sum())
    }));

    assert_eq!(sum.read_timeout(Duration::from_secs(5)), Ok(Arc::new(650)));
    assert_eq!(
        *values.read_timeout(Duration::from_millis(10)).unwrap(),
        vec![600, 50]
    );
}
