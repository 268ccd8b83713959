use chainrouter::{sync_handler, HandlerUnit, RouteOptions, Server, ServerConfig};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use http::{Method, StatusCode};
use std::hint::black_box;

fn ok() -> HandlerUnit {
    sync_handler(|_, res| res.send_status(StatusCode::OK))
}

/// A server with `n` resource groups, each carrying the usual verb set
fn build_server(n: usize) -> Server {
    let server = Server::new(ServerConfig::default());
    for i in 0..n {
        let collection = format!("/zoo/r{i}");
        let item = format!("/zoo/r{i}/:id");
        server.get(collection.as_str(), ok()).unwrap();
        server.post(collection.as_str(), ok()).unwrap();
        server.get(item.as_str(), ok()).unwrap();
        server.put(item.as_str(), ok()).unwrap();
        server.del(item.as_str(), ok()).unwrap();
        server
            .get(
                RouteOptions::new(format!("{item}/events/*")).version("2.0"),
                ok(),
            )
            .unwrap();
    }
    server
}

fn bench_resolve(c: &mut Criterion) {
    let any = vec!["*".to_string()];
    let mut group = c.benchmark_group("resolve");
    for n in [10usize, 100] {
        let server = build_server(n);
        let table = server.routes();
        let last = format!("/zoo/r{}/42", n - 1);
        let wildcard = format!("/zoo/r{}/42/events/a/b", n / 2);

        group.bench_with_input(BenchmarkId::new("last_match", n), &last, |b, path| {
            b.iter(|| black_box(table.resolve(&Method::GET, black_box(path), &any)))
        });
        group.bench_with_input(BenchmarkId::new("wildcard", n), &wildcard, |b, path| {
            b.iter(|| black_box(table.resolve(&Method::GET, black_box(path), &any)))
        });
        group.bench_with_input(BenchmarkId::new("method_not_allowed", n), &last, |b, path| {
            b.iter(|| black_box(table.resolve(&Method::PATCH, black_box(path), &any)))
        });
        group.bench_function(BenchmarkId::new("not_found", n), |b| {
            b.iter(|| {
                black_box(table.resolve(&Method::GET, black_box("/nowhere/at/all"), &any))
            })
        });
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let server = build_server(50);
    c.bench_function("dispatch_get_item", |b| {
        b.iter(|| {
            let req = http::Request::get("/zoo/r25/7")
                .body(bytes::Bytes::new())
                .unwrap();
            black_box(rt.block_on(server.handle(req)))
        })
    });
}

criterion_group!(benches, bench_resolve, bench_dispatch);
criterion_main!(benches);
