use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use narwhal::{Curve, EdgeGeometry, Port, RectilinearRouter, RouterOptions, Shape, point, vector};
use std::hint::black_box;
use std::time::Duration;

#[derive(Debug, Clone)]
struct GridSpec {
    side: usize,
    /// Pairs of cell indices to connect.
    edges: Vec<(usize, usize)>,
}

impl GridSpec {
    fn build(&self) -> RectilinearRouter {
        let mut router = RectilinearRouter::new(RouterOptions::default());
        let mut ports = Vec::with_capacity(self.side * self.side);
        for i in 0..self.side {
            for j in 0..self.side {
                let center = point(i as f64 * 70.0, j as f64 * 50.0);
                let s = router.add_shape(Shape::new(Curve::rectangle_centered(center, 30.0, 20.0)));
                ports.push(router.add_port(Port::relative(s, vector(0.0, 0.0))));
            }
        }
        for &(a, b) in &self.edges {
            router.add_edge_geometry(EdgeGeometry::new(ports[a], ports[b]));
        }
        router
    }
}

fn build_grid_spec(side: usize, fanout: usize) -> GridSpec {
    let cells = side * side;
    let mut edges = Vec::new();
    for i in 0..cells {
        for k in 1..=fanout {
            // Skip across rows and columns so most routes need bends.
            let to = (i * 7 + k * (side + 1)) % cells;
            if to != i {
                edges.push((i, to));
            }
        }
    }
    GridSpec { side, edges }
}

fn bench_route_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_grid");
    group.measurement_time(Duration::from_secs(10));

    let cases = [("grid_4_f1", 4usize, 1usize), ("grid_8_f2", 8, 2), ("grid_12_f2", 12, 2)];

    for (name, side, fanout) in cases {
        let spec = build_grid_spec(side, fanout);
        group.bench_with_input(BenchmarkId::new("RectilinearRouter::run", name), &spec, |b, spec| {
            b.iter_batched(
                || spec.build(),
                |mut router| {
                    router.run().unwrap();
                    black_box(router.edge_geometries().count());
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_route_grid);
criterion_main!(benches);
