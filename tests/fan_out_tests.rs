use lazy_chart::compute::{fan_out, fan_out_into, fan_out_map, mapper, PoolKind, WorkerPool};
use lazy_chart::config::PoolConfig;
use lazy_chart::CacheError;
use rand::Rng;

fn pool(workers: usize) -> WorkerPool {
    WorkerPool::new(PoolKind::Primary, &PoolConfig::named("fan-out").with_workers(workers)).unwrap()
}

#[test]
fn test_matches_sequential_for_random_lengths() {
    let pool = pool(4);
    let mut rng = rand::rng();
    for _ in 0..50 {
        let len = rng.random_range(0..2_000usize);
        let width = rng.random_range(1..12usize);
        let data: Vec<f64> = (0..len).map(|_| rng.random_range(-1e6..1e6)).collect();

        let f = |i: usize| (data[i] * 0.5).sin() + i as f64;
        let expected: Vec<f64> = (0..len).map(f).collect();
        let actual = fan_out(&pool, width, len, f).unwrap();
        assert_eq!(actual, expected, "len={len} width={width}");
    }
}

#[test]
fn test_empty_range_submits_nothing() {
    let pool = pool(2);
    let calls = std::sync::atomic::AtomicUsize::new(0);
    let out: Vec<u8> = fan_out(&pool, 8, 0, |_| {
        calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        0
    })
    .unwrap();
    assert!(out.is_empty());
    assert_eq!(calls.into_inner(), 0);
}

#[test]
fn test_width_larger_than_len() {
    let out = fan_out(&pool(2), 64, 3, |i| i * i).unwrap();
    assert_eq!(out, vec![0, 1, 4]);
}

#[test]
fn test_into_clears_previous_contents() {
    let pool = pool(2);
    let mut buffer = vec![usize::MAX; 10];
    fan_out_into(&pool, 3, 4, &mut buffer, |i| i + 1).unwrap();
    assert_eq!(buffer, vec![1, 2, 3, 4]);
}

#[test]
fn test_mapper_sees_item_index_and_all_items() {
    let data = vec![10, 20, 30, 40, 50];
    let m = mapper(|x: &i32, i, all: &[i32]| x + i as i32 + all.len() as i32);
    let out = fan_out_map(&pool(3), 2, &data, &m).unwrap();
    assert_eq!(out, vec![15, 26, 37, 48, 59]);
}

#[test]
fn test_panicking_slice_fails_the_job() {
    let err = fan_out(&pool(2), 4, 16, |i| {
        if i == 7 {
            panic!("bad index");
        }
        i
    })
    .unwrap_err();
    assert!(matches!(
        err,
        CacheError::WorkerPanicked {
            pool: PoolKind::Primary,
            failed: 1,
            total: 4
        }
    ));
}
