//! Headless frame loop: builds a small scene, renders a few frames into a
//! recording canvas and mutates one element between frames.
//!
//! Run with `RUST_LOG=lazy_chart=debug` to watch recomputes being dispatched.

use eyre::WrapErr;
use glam::Vec2;
use rand::Rng;

use lazy_chart::canvas::RecordingCanvas;
use lazy_chart::data_types::{AxisConfig, AxisEdge, HeatmapCell, RasterConfig, Rgba};
use lazy_chart::elements::{ArcElement, AreaElement, AxisElement, LineElement, RasterLayer, StackedChart};
use lazy_chart::scales::ChartScale;
use lazy_chart::transform::PlotTransform;
use lazy_chart::{ChartContext, PlotPoint, Scene};

const CONFIG: &str = r#"{
    "lazy_recomputing": true,
    "primary": { "thread_name": "demo-primary" },
    "secondary": { "workers": 2, "thread_name": "demo-secondary" },
    "read_timeout_ms": 2000
}"#;

fn random_walk(len: usize) -> Vec<PlotPoint> {
    let mut rng = rand::rng();
    let mut y = 50.0;
    (0..len)
        .map(|i| {
            y += rng.random_range(-2.0..2.0);
            PlotPoint::new(i as f64, y)
        })
        .collect()
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let ctx = ChartContext::from_json(CONFIG)?;
    let transform = PlotTransform::linear((0.0, 1_000.0), (0.0, 100.0), 800.0, 400.0);

    let mut line = LineElement::new(&ctx, "price", random_walk(1_000));
    line.set_transform(transform);

    let mut area = AreaElement::new(&ctx, "volume", random_walk(1_000));
    area.set_transform(transform);

    let mut pie = ArcElement::new(&ctx, "share", vec![3.0, 5.0, 2.0]);
    pie.set_geometry(Vec2::new(900.0, 200.0), 80.0);

    let mut x_axis = AxisElement::new(&ctx, "x-axis", transform.x_scale);
    x_axis.set_origin(Vec2::new(0.0, 400.0));
    let mut y_axis = AxisElement::new(&ctx, "y-axis", transform.y_scale);
    y_axis.set_config(AxisConfig {
        edge: AxisEdge::Left,
        ..AxisConfig::default()
    });

    let cells: Vec<HeatmapCell> = (0..100)
        .map(|i| HeatmapCell {
            x: (i % 10) as f64 * 100.0 + 50.0,
            y: (i / 10) as f64 * 10.0 + 5.0,
            width: 100.0,
            height: 10.0,
            value: (i as f32) / 100.0,
        })
        .collect();
    let mut heat = RasterLayer::new(&ctx, "heat", cells);
    heat.set_transform(transform);
    heat.set_config(RasterConfig {
        width: 800,
        height: 400,
        ..RasterConfig::default()
    });

    let layers: Vec<Vec<PlotPoint>> = (0..3)
        .map(|k| {
            (0..10)
                .map(|i| PlotPoint::new(i as f64 * 100.0 + 50.0, (k + 1) as f64 * 5.0))
                .collect::<Vec<_>>()
        })
        .collect();
    let stack = StackedChart::bars(&ctx, "stack", layers, &[Rgba::BLUE, Rgba::GREEN, Rgba::RED], transform);

    let mut scene = Scene::new();
    scene.push(Box::new(heat));
    scene.push(Box::new(area));
    scene.push(Box::new(stack));
    scene.push(Box::new(line));
    scene.push(Box::new(pie));
    scene.push(Box::new(x_axis));
    scene.push(Box::new(y_axis));

    let mut canvas = RecordingCanvas::new();
    for frame in 0..4 {
        if frame == 2 {
            // The y axis is element 6; zooming it dirties only that element.
            let mut zoomed = AxisElement::new(&ctx, "y-axis", ChartScale::new_linear((25.0, 75.0), (400.0, 0.0)));
            zoomed.set_config(AxisConfig {
                edge: AxisEdge::Left,
                ..AxisConfig::default()
            });
            scene.elements_mut()[6] = Box::new(zoomed);
        }

        canvas.clear();
        let report = scene
            .render_frame(&ctx, &mut canvas)
            .wrap_err_with(|| format!("rendering frame {frame}"))?;
        println!(
            "frame {frame}: prepared {} drawn {} skipped {} commands {} in {:.2} ms",
            report.prepared,
            report.drawn,
            report.skipped.len(),
            canvas.commands.len(),
            report.elapsed_nanos as f64 / 1e6,
        );
    }

    drop(scene);
    if !ctx.shutdown() {
        tracing::warn!("pools still referenced at exit");
    }
    Ok(())
}
