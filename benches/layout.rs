use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use roofplan::catalog::PanelCatalog;
use roofplan::geometry::{Point, Surface};
use roofplan::ops::WeightedFitness;
use roofplan::options::OptimizationOptions;
use roofplan::preview::preview;
use roofplan::GeneticOptimizer;

fn roof(side: f64) -> Vec<Surface> {
    vec![Surface::from_polygon(
        "bench",
        vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, side),
            Point::new(side, side),
            Point::new(side, 0.0),
        ],
        180.0,
        25.0,
    )]
}

fn run_search(catalog: &PanelCatalog, surfaces: &[Surface], population: usize, parallel: bool) {
    let options = OptimizationOptions {
        population_size: population,
        generations: 40,
        parallel,
        ..OptimizationOptions::default()
    };
    let template = catalog.get("std-400").expect("default template");
    let optimizer = GeneticOptimizer::builder(
        WeightedFitness::new(catalog, options.weights, 30),
        surfaces,
        template,
    )
    .options(options)
    .max_panel_count(30)
    .build()
    .expect("valid optimizer configuration");
    let mut rng = StdRng::seed_from_u64(42);
    optimizer.run(&mut rng).expect("search to succeed");
}

fn search_benchmark(c: &mut Criterion) {
    let catalog = PanelCatalog::with_defaults();
    let surfaces = roof(12.0);
    let mut group = c.benchmark_group("layout-search");
    for &population in &[50_usize, 200_usize] {
        for parallel in [false, true] {
            let label = format!("{population}-{}", if parallel { "par" } else { "seq" });
            group.bench_function(BenchmarkId::from_parameter(label), |b| {
                b.iter_batched(
                    || (),
                    |()| run_search(&catalog, &surfaces, population, parallel),
                    BatchSize::SmallInput,
                );
            });
        }
    }
    group.finish();
}

fn preview_benchmark(c: &mut Criterion) {
    let catalog = PanelCatalog::with_defaults();
    let template = catalog.get("std-400").expect("default template");
    let surfaces = roof(40.0);
    c.bench_function("layout-preview", |b| {
        b.iter(|| preview(&surfaces[0], template, 500).expect("preview to succeed"));
    });
}

criterion_group!(benches, search_benchmark, preview_benchmark);
criterion_main!(benches);
