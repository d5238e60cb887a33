// ============================================================
// Layer 7 — Learning Curve Figure
// ============================================================
// Two panels sharing the epoch axis, training score on top and
// validation score below, under a caption with the final test
// score and the parameters that define the run:
//
//   ┌───────────────────────────────────────────┐
//   │ Final test score (mse) = 0.0123           │
//   │ LR=0.001, decay=0.001, optimizer=adam, …  │
//   ├───────────────────────────────────────────┤
//   │ Training score (mse)     ╲___             │
//   ├───────────────────────────────────────────┤
//   │ Validation score (mse)   ╲____            │
//   └──────────────────────── Epochs ───────────┘

use anyhow::{anyhow, Result};
use plotters::prelude::*;
use std::{ops::Range, path::Path};

use crate::domain::history::TrainingHistory;
use crate::domain::params::RunPlan;

const WIDTH:         u32 = 800;
const HEIGHT:        u32 = 700;
const HEADER_HEIGHT: u32 = 90;

/// Caption lines above the two panels.
pub fn caption_lines(plan: &RunPlan, final_score: f64) -> Vec<String> {
    let p = &plan.params;
    vec![
        format!("Final test score ({}) = {:2.4}", plan.metric, final_score),
        format!(
            "LR={}, decay={}, optimizer={}, pool_method={}",
            p.learning_rate, p.lr_decay, plan.optimizer, p.pool_method,
        ),
        format!(
            "use_transposed_conv={}, loss={}, batch_norm_before_activation={}",
            p.use_transposed_conv, p.loss, p.batch_norm_before_activation,
        ),
    ]
}

/// Y range covering every finite value with a 5% margin. Falls
/// back to 0..1 when nothing is finite.
pub fn value_range(values: &[f64]) -> Range<f64> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return 0.0..1.0;
    }
    let margin = if hi > lo { (hi - lo) * 0.05 } else { lo.abs().max(1e-3) * 0.05 };
    (lo - margin)..(hi + margin)
}

pub fn render_learning_curve(path: &Path, history: &TrainingHistory, caption: &[String]) -> Result<()> {
    let metric = history.metric();
    let epochs = history.len().max(2) as f64;

    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("backend error: {e}"))?;

    let (header, body) = root.split_vertically(HEADER_HEIGHT);
    for (i, line) in caption.iter().enumerate() {
        header
            .draw(&Text::new(line.as_str(), (20, 12 + 24 * i as i32), ("sans-serif", 16.0)))
            .map_err(|e| anyhow!("caption error: {e}"))?;
    }

    let panels = body.split_evenly((2, 1));
    let series = [
        (format!("Training score ({metric})"), history.train_scores()),
        (format!("Validation score ({metric})"), history.validation_scores()),
    ];

    for (i, (panel, (label, values))) in panels.iter().zip(series).enumerate() {
        let bottom = i == panels.len() - 1;
        let mut chart = ChartBuilder::on(panel)
            .margin(10)
            .set_label_area_size(LabelAreaPosition::Left, 70)
            .set_label_area_size(LabelAreaPosition::Bottom, if bottom { 40 } else { 20 })
            .build_cartesian_2d(1.0..epochs, value_range(&values))
            .map_err(|e| anyhow!("chart build error: {e}"))?;

        let mut mesh = chart.configure_mesh();
        mesh.y_desc(label.as_str());
        if bottom {
            mesh.x_desc("Epochs");
        }
        mesh.draw().map_err(|e| anyhow!("mesh error: {e}"))?;

        let points = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(e, v)| ((e + 1) as f64, *v));
        chart
            .draw_series(LineSeries::new(points, &BLUE))
            .map_err(|e| anyhow!("draw error: {e}"))?;
    }

    root.present().map_err(|e| anyhow!("render error: {e}"))?;
    tracing::debug!("Learning curve written to '{}'", path.display());
    Ok(())
}
