use criterion::{black_box, criterion_group, criterion_main, Criterion};

use channel_optimizer::model::{Channel, GeoPoint, OptimizeRequest, Order, Weights};
use channel_optimizer::optimizer;

fn synthetic_request(order_count: usize, channel_count: usize) -> OptimizeRequest {
    let orders = (0..order_count)
        .map(|i| {
            let lat = 40.70 + (i % 10) as f64 * 0.01;
            let lng = -74.00 + (i / 10) as f64 * 0.01;
            Order {
                id: format!("order_{i}"),
                pickup_location: GeoPoint { lat, lng },
                delivery_location: GeoPoint {
                    lat: lat + 0.01,
                    lng: lng + 0.01,
                },
                priority: (i % 10 + 1) as u8,
                max_delivery_time: 60,
                weight: 1.0,
                special_requirements: vec![],
            }
        })
        .collect();

    let channels = (0..channel_count)
        .map(|j| Channel {
            id: format!("channel_{j}"),
            capacity: (order_count / channel_count + 1) as u32,
            current_load: 0,
            cost_per_order: 2.0 + j as f64,
            quality_score: 80 + (j % 20) as u8,
            prep_time_minutes: 15,
            location: GeoPoint {
                lat: 40.70 + j as f64 * 0.01,
                lng: -74.00,
            },
            vehicle_type: "standard".to_string(),
            max_distance: 50.0,
        })
        .collect();

    OptimizeRequest {
        orders,
        channels,
        constraints: Default::default(),
        weights: Weights::default(),
        timeout_seconds: 0.1,
    }
}

fn bench_solve(c: &mut Criterion) {
    let small = synthetic_request(20, 4);
    c.bench_function("solve_20x4", |b| {
        b.iter(|| optimizer::solve(black_box(&small)))
    });

    let medium = synthetic_request(100, 10);
    c.bench_function("solve_100x10", |b| {
        b.iter(|| optimizer::solve(black_box(&medium)))
    });
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
