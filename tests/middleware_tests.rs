#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use chainrouter::{request_logger, sync_handler, Chain, Next, Server, ServerConfig};
use common::{call_log, calls, record, request, respond};
use http::{Method, StatusCode};

#[test]
fn test_chain_flattening_preserves_order() {
    let log = call_log();
    let inner = Chain::from([record(&log, "a"), record(&log, "b")]);
    let chain = Chain::from(vec![
        inner.clone(),
        Chain::new().then(record(&log, "c")),
        inner,
    ]);
    assert_eq!(chain.len(), 5);

    let mut extended = Chain::new();
    extended.extend(vec![record(&log, "x"), record(&log, "y")]);
    let joined = extended.concat(&chain);
    assert_eq!(joined.len(), 7);
    assert_eq!(extended.len(), 2);
}

#[tokio::test]
async fn test_request_logger_continues() {
    let log = call_log();
    let server = Server::new(ServerConfig::default());
    server.add_middleware(request_logger());
    server.get("/x", respond(&log, "x")).unwrap();

    let res = server.handle(request(Method::GET, "/x", &[])).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(calls(&log), vec!["x"]);
}

#[tokio::test]
async fn test_global_unit_may_answer_for_every_route() {
    let log = call_log();
    let server = Server::new(ServerConfig::default());
    server.add_middleware(sync_handler(|req, res| {
        if req.header("x-maintenance").is_some() {
            res.send_status(StatusCode::SERVICE_UNAVAILABLE)
        } else {
            Next::Continue
        }
    }));
    server.get("/a", respond(&log, "a")).unwrap();
    server.post("/b", respond(&log, "b")).unwrap();

    let a = server
        .handle(request(Method::GET, "/a", &[("x-maintenance", "1")]))
        .await;
    let b = server
        .handle(request(Method::POST, "/b", &[("x-maintenance", "1")]))
        .await;
    assert_eq!(a.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(b.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(calls(&log).is_empty());

    let ok = server.handle(request(Method::GET, "/a", &[])).await;
    assert_eq!(ok.status(), StatusCode::OK);
}
