use peak_field_core::config::{FieldConfig, PeakConfig, PeakLayerConfig};
use peak_field_core::world::PeakField;
use std::time::Instant;

fn create_config(layers: usize, world_dim: usize) -> FieldConfig {
    let peak = PeakConfig {
        height: 8.0,
        spread: 20.0,
        max_x: world_dim as i64 - 1,
        max_y: world_dim as i64 - 1,
        ..PeakConfig::default()
    };
    let center = world_dim as f64 / 2.0;
    FieldConfig {
        world_x: world_dim,
        world_y: world_dim,
        bite_every: 5,
        layers: (0..layers)
            .map(|_| PeakLayerConfig {
                start: [center, center],
                peak: peak.clone(),
            })
            .collect(),
        ..FieldConfig::default()
    }
}

fn main() {
    let layers = 32;
    let world_dim = 200;
    println!(
        "Benchmarking with {} layers on a {}x{} grid",
        layers, world_dim, world_dim
    );

    let config = create_config(layers, world_dim);
    let mut field1 = PeakField::new(config.clone());
    let mut field2 = PeakField::new(config);

    let steps = 50;

    // Run WITHOUT metrics
    let start = Instant::now();
    for _ in 0..steps {
        field1.step();
    }
    let duration_no_metrics = start.elapsed();
    println!("Time for {} steps WITHOUT metrics: {:?}", steps, duration_no_metrics);
    println!("Avg time per step (no metrics): {:?}", duration_no_metrics / steps as u32);

    // Run WITH metrics (every step)
    let start = Instant::now();
    field2.run_experiment(steps, 1);
    let duration_metrics = start.elapsed();

    println!("Time for {} steps WITH metrics: {:?}", steps, duration_metrics);
    println!("Avg time per step (with metrics): {:?}", duration_metrics / steps as u32);

    let diff = duration_metrics.saturating_sub(duration_no_metrics);
    println!("Total metrics overhead: {:?}", diff);
    println!("Avg metrics overhead per step: {:?}", diff / steps as u32);
}
