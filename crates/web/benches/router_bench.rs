use criterion::{Criterion, criterion_group, criterion_main};
use http::{Method, StatusCode};
use micro_dispatch::{Application, Request, Router, get, handler_fn, post};
use std::hint::black_box;

async fn noop() {}

async fn created() -> (&'static str, StatusCode) {
    ("created", StatusCode::CREATED)
}

fn router() -> Router {
    let mut router = Router::new();
    for resource in ["clients", "orders", "products", "invoices", "users"] {
        router.add_route(get(format!("/{resource}"), handler_fn(noop)));
        router.add_route(post(format!("/{resource}"), handler_fn(noop)));
        router.add_route(get(format!("/{resource}/{{id}}"), handler_fn(noop)));
        router.add_route(get(format!("/{resource}/{{id}}/items/{{item}}"), handler_fn(noop)));
        router.add_route(get(format!("/{resource}/search"), handler_fn(noop)));
    }
    router
}

fn bench_router_match(c: &mut Criterion) {
    let router = router();

    c.bench_function("match_literal", |b| {
        b.iter(|| router.at(black_box("/products/search"), black_box(&Method::GET)).map(|m| m.params().len()));
    });

    c.bench_function("match_params", |b| {
        b.iter(|| router.at(black_box("/orders/42/items/7"), black_box(&Method::GET)).map(|m| m.params().len()));
    });

    c.bench_function("match_not_found", |b| {
        b.iter(|| router.at(black_box("/orders/42/unknown"), black_box(&Method::GET)).is_err());
    });
}

fn bench_application_run(c: &mut Criterion) {
    let app = Application::builder().endpoint(post("/clients", handler_fn(created))).build();
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();

    c.bench_function("run_simple_request", |b| {
        b.iter(|| {
            let req = Request::builder().method("POST").path("/clients").build().unwrap();
            runtime.block_on(app.run(black_box(req)))
        });
    });
}

criterion_group!(benches, bench_router_match, bench_application_run);
criterion_main!(benches);
