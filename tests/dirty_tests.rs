use lazy_chart::compute::mapper;
use lazy_chart::config::PoolConfig;
use lazy_chart::elements::MappedSeries;
use lazy_chart::{CacheConfig, CacheError, ChartContext, Recomputable};

fn context(lazy: bool) -> ChartContext {
    ChartContext::new(CacheConfig {
        lazy_recomputing: lazy,
        primary: PoolConfig::named("dirty-primary").with_workers(2),
        secondary: PoolConfig::named("dirty-secondary").with_workers(2),
        fan_out_width: Some(2),
        read_timeout_ms: None,
    })
    .unwrap()
}

fn doubling_series(ctx: &ChartContext) -> MappedSeries<i64, i64> {
    let mut series = MappedSeries::with_data(ctx, "doubled", vec![1, 2, 3]);
    series.set_mapper(mapper(|x: &i64, _, _| x * 2));
    series
}

#[test]
fn test_many_mutations_one_recompute() {
    let ctx = context(true);
    let mut series = doubling_series(&ctx);
    series.mark_dirty();
    series.mark_dirty();
    series.set_data(vec![5, 6]);

    assert!(series.prepare(&ctx).unwrap());
    assert_eq!(series.slot().generation(), 1);
    assert!(!series.needs_recompute());

    // Nothing changed since: the slot keeps its value and generation.
    assert!(!series.prepare(&ctx).unwrap());
    assert_eq!(series.slot().generation(), 1);
    assert_eq!(*series.read(&ctx).unwrap(), vec![10, 12]);
}

#[test]
fn test_mutation_after_prepare_triggers_next_frame() {
    let ctx = context(true);
    let mut series = doubling_series(&ctx);
    series.prepare(&ctx).unwrap();

    series.set_mapper(mapper(|x: &i64, _, _| x + 100));
    assert!(series.needs_recompute());
    assert!(series.prepare(&ctx).unwrap());
    assert_eq!(series.slot().generation(), 2);
    assert_eq!(*series.read(&ctx).unwrap(), vec![101, 102, 103]);
}

#[test]
fn test_reset_clears_dirty_state() {
    let ctx = context(true);
    let mut series = doubling_series(&ctx);
    assert!(series.needs_recompute());
    series.reset();
    assert!(!series.needs_recompute());
    assert!(!series.prepare(&ctx).unwrap());
    assert!(!series.slot().is_initialized());
}

#[test]
fn test_eager_mode_recomputes_every_frame() {
    let ctx = context(false);
    let mut series = doubling_series(&ctx);
    for frame in 1..=3 {
        assert!(series.prepare(&ctx).unwrap());
        assert_eq!(series.slot().generation(), frame);
    }
    assert_eq!(*series.read(&ctx).unwrap(), vec![2, 4, 6]);
}

#[test]
fn test_missing_inputs_are_reported() {
    let ctx = context(true);
    let mut no_data: MappedSeries<i64, i64> = MappedSeries::new(&ctx, "empty");
    no_data.set_mapper(mapper(|x: &i64, _, _| *x));
    assert_eq!(
        no_data.prepare(&ctx),
        Err(CacheError::MissingInput {
            element: "empty".into(),
            input: "data"
        })
    );

    let mut no_mapper: MappedSeries<i64, i64> = MappedSeries::with_data(&ctx, "raw", vec![1]);
    assert_eq!(
        no_mapper.prepare(&ctx),
        Err(CacheError::MissingInput {
            element: "raw".into(),
            input: "mapper"
        })
    );
    // A failed prepare leaves the element dirty.
    assert!(no_mapper.needs_recompute());
}
