use glam::Vec2;

use lazy_chart::canvas::{Canvas, RecordingCanvas};
use lazy_chart::compute::mapper;
use lazy_chart::config::PoolConfig;
use lazy_chart::dirty::{DirtyCounter, TracksDirty};
use lazy_chart::elements::{ArcElement, AxisElement, LineElement, MappedSeries};
use lazy_chart::scales::ChartScale;
use lazy_chart::transform::PlotTransform;
use lazy_chart::{
    CacheConfig, CacheError, ChartContext, ChartElement, PlotPoint, PoolKind, Recomputable,
    Result, Scene,
};

fn context() -> ChartContext {
    ChartContext::new(CacheConfig {
        primary: PoolConfig::named("scene-primary").with_workers(3),
        secondary: PoolConfig::named("scene-secondary").with_workers(2),
        fan_out_width: Some(3),
        read_timeout_ms: Some(5_000),
        ..CacheConfig::default()
    })
    .unwrap()
}

fn line(ctx: &ChartContext) -> LineElement {
    let data = (0..50).map(|i| PlotPoint::new(i as f64, (i % 7) as f64)).collect();
    let mut line = LineElement::new(ctx, "line", data);
    line.set_transform(PlotTransform::linear((0.0, 50.0), (0.0, 7.0), 500.0, 70.0));
    line
}

/// Element whose mapper panics on one item.
struct Fragile {
    series: MappedSeries<u32, u32>,
}

impl Fragile {
    fn new(ctx: &ChartContext) -> Self {
        let mut series = MappedSeries::with_data(ctx, "fragile", (0..16).collect::<Vec<u32>>());
        series.set_mapper(mapper(|x: &u32, _, _| {
            if *x == 9 {
                panic!("corrupt sample");
            }
            *x
        }));
        Self { series }
    }
}

impl TracksDirty for Fragile {
    fn dirty_counter(&self) -> &DirtyCounter {
        self.series.dirty_counter()
    }

    fn dirty_counter_mut(&mut self) -> &mut DirtyCounter {
        self.series.dirty_counter_mut()
    }
}

impl ChartElement for Fragile {
    fn name(&self) -> &str {
        self.series.name()
    }

    fn prepare(&mut self, ctx: &ChartContext) -> Result<bool> {
        self.series.prepare(ctx)
    }

    fn draw(&self, ctx: &ChartContext, canvas: &mut dyn Canvas) -> Result<()> {
        let values = self.series.read(ctx)?;
        canvas.text(Vec2::ZERO, &values.len().to_string(), lazy_chart::Rgba::WHITE);
        Ok(())
    }
}

#[test]
fn test_second_frame_reuses_cached_values() {
    let ctx = context();
    let mut scene = Scene::new();
    scene.push(Box::new(line(&ctx)));
    let mut pie = ArcElement::new(&ctx, "pie", vec![2.0, 2.0]);
    pie.set_geometry(Vec2::new(50.0, 50.0), 40.0);
    scene.push(Box::new(pie));
    scene.push(Box::new(AxisElement::new(
        &ctx,
        "axis",
        ChartScale::new_linear((0.0, 50.0), (0.0, 500.0)),
    )));

    let mut canvas = RecordingCanvas::new();
    let first = scene.render_frame(&ctx, &mut canvas).unwrap();
    assert_eq!((first.prepared, first.drawn), (3, 3));
    assert!(first.skipped.is_empty());
    let recorded = canvas.commands.clone();

    canvas.clear();
    let second = scene.render_frame(&ctx, &mut canvas).unwrap();
    assert_eq!((second.prepared, second.drawn), (0, 3));
    assert_eq!(canvas.commands, recorded);

    drop(scene);
    assert!(ctx.shutdown());
}

#[test]
fn test_worker_panic_skips_element_and_keeps_it_dirty() {
    let ctx = context();
    let mut scene = Scene::new();
    scene.push(Box::new(line(&ctx)));
    scene.push(Box::new(Fragile::new(&ctx)));

    let mut canvas = RecordingCanvas::new();
    let report = scene.render_frame(&ctx, &mut canvas).unwrap();
    assert_eq!(report.drawn, 1);
    assert_eq!(report.skipped.len(), 1);
    let (name, err) = &report.skipped[0];
    assert_eq!(name, "fragile");
    assert!(matches!(
        err,
        CacheError::WorkerPanicked {
            pool: PoolKind::Primary,
            failed: 1,
            ..
        }
    ));
    assert!(scene.elements_mut()[1].needs_recompute());
    assert!(!scene.elements_mut()[0].needs_recompute());

    // Retried on the next frame, and skipped again since the input is unchanged.
    let retry = scene.render_frame(&ctx, &mut canvas).unwrap();
    assert_eq!(retry.prepared, 1);
    assert_eq!(retry.skipped.len(), 1);
}

#[test]
fn test_missing_input_aborts_frame() {
    let ctx = context();
    let mut scene = Scene::new();
    scene.push(Box::new(LineElement::new(&ctx, "unprojected", vec![PlotPoint::new(0.0, 0.0)])));

    let err = scene
        .render_frame(&ctx, &mut RecordingCanvas::new())
        .unwrap_err();
    assert_eq!(
        err,
        CacheError::MissingInput {
            element: "unprojected".into(),
            input: "mapper"
        }
    );
}

#[test]
fn test_context_from_json() {
    let ctx = ChartContext::from_json(
        r#"{ "primary": { "workers": 2, "thread_name": "json-primary" }, "fan_out_width": 3 }"#,
    )
    .unwrap();
    assert_eq!(ctx.fan_out_width(), 3);
    assert_eq!(ctx.pool(PoolKind::Primary).workers(), 2);
    assert_eq!(ctx.pool(PoolKind::Secondary).kind(), PoolKind::Secondary);
    assert!(ctx.shutdown());

    let err = ChartContext::from_json("{ not json").unwrap_err();
    assert_eq!(err.to_string(), "parsing cache configuration");
}
