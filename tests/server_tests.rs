#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use chainrouter::content::JsonFormatter;
use chainrouter::{
    sync_handler, Formatters, HandlerError, Next, RegistrationError, RouteOptions, RoutingError,
    Server, ServerConfig,
};
use common::{call_log, calls, json_body, record, request, respond};
use http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_first_registered_route_wins() {
    let log = call_log();
    let server = Server::new(ServerConfig::default());
    server.get("/users/:id", respond(&log, "by_id")).unwrap();
    server.get("/users/me", respond(&log, "me")).unwrap();

    let res = server.handle(request(Method::GET, "/users/me", &[])).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        json_body(&res),
        json!({ "route": "by_id", "params": { "id": "me" } })
    );
}

#[tokio::test]
async fn test_params_are_decoded_and_wildcard_binds_rest() {
    let log = call_log();
    let server = Server::new(ServerConfig::default());
    server.get("/files/:owner/*", respond(&log, "files")).unwrap();

    let res = server
        .handle(request(Method::GET, "/files/jane%20doe/a/b/c.txt", &[]))
        .await;
    assert_eq!(
        json_body(&res),
        json!({ "route": "files", "params": { "owner": "jane doe", "*": "a/b/c.txt" } })
    );
}

#[tokio::test]
async fn test_method_not_allowed_lists_every_method() {
    let log = call_log();
    let server = Server::new(ServerConfig::default());
    server.get("/x", respond(&log, "get")).unwrap();
    server.post("/x", respond(&log, "post")).unwrap();

    let res = server.handle(request(Method::DELETE, "/x", &[])).await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()["allow"], "GET, POST");
    assert_eq!(json_body(&res)["code"], "MethodNotAllowed");
    assert!(calls(&log).is_empty());
}

#[tokio::test]
async fn test_options_without_route_answers_allow() {
    let log = call_log();
    let server = Server::new(ServerConfig::default());
    server.get("/x/:id", respond(&log, "get")).unwrap();
    server.post("/x/{key}", respond(&log, "post")).unwrap();

    let res = server.handle(request(Method::OPTIONS, "/x/1", &[])).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["allow"], "GET, POST");
    assert!(res.body().is_empty());
}

#[tokio::test]
async fn test_explicit_options_route_is_used() {
    let log = call_log();
    let server = Server::new(ServerConfig::default());
    server.get("/x", respond(&log, "get")).unwrap();
    server.opts("/x", respond(&log, "options")).unwrap();

    let res = server.handle(request(Method::OPTIONS, "/x", &[])).await;
    assert_eq!(json_body(&res)["route"], "options");
}

#[tokio::test]
async fn test_not_found() {
    let server = Server::new(ServerConfig::default());
    let res = server.handle(request(Method::GET, "/nowhere", &[])).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(&res)["code"], "ResourceNotFound");
}

#[tokio::test]
async fn test_version_selection() {
    let log = call_log();
    let server = Server::new(ServerConfig::default());
    server
        .get(RouteOptions::new("/x").version("2.0"), respond(&log, "v2"))
        .unwrap();
    server
        .get(RouteOptions::new("/x").version("1.0"), respond(&log, "v1"))
        .unwrap();

    let v1 = server
        .handle(request(Method::GET, "/x", &[("accept-version", "1.0")]))
        .await;
    assert_eq!(json_body(&v1)["route"], "v1");

    let any = server.handle(request(Method::GET, "/x", &[])).await;
    assert_eq!(json_body(&any)["route"], "v2");

    let legacy_header = server
        .handle(request(Method::GET, "/x", &[("x-api-version", "1.0")]))
        .await;
    assert_eq!(json_body(&legacy_header)["route"], "v1");

    let missing = server
        .handle(request(Method::GET, "/x", &[("accept-version", "3.0")]))
        .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    let body = json_body(&missing);
    assert_eq!(body["code"], "InvalidVersion");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("2.0"));
    assert!(message.contains("1.0"));
}

#[tokio::test]
async fn test_range_versioning() {
    let config = ServerConfig {
        range_versioning: true,
        ..ServerConfig::default()
    };
    let log = call_log();
    let server = Server::new(config);
    server
        .get(
            RouteOptions::new("/x").version("^1.2.0"),
            respond(&log, "v1"),
        )
        .unwrap();
    server
        .get(
            RouteOptions::new("/x").version("2.0.0"),
            respond(&log, "v2"),
        )
        .unwrap();

    let minor = server
        .handle(request(Method::GET, "/x", &[("accept-version", "1.4.1")]))
        .await;
    assert_eq!(json_body(&minor)["route"], "v1");

    let tilde = server
        .handle(request(Method::GET, "/x", &[("accept-version", "~2")]))
        .await;
    assert_eq!(json_body(&tilde)["route"], "v2");

    let too_old = server
        .handle(request(Method::GET, "/x", &[("accept-version", "1.1.0")]))
        .await;
    assert_eq!(too_old.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_invalid_range_is_a_registration_error() {
    let server = Server::new(ServerConfig {
        range_versioning: true,
        ..ServerConfig::default()
    });
    let unit = sync_handler(|_, res| res.send_status(StatusCode::OK));
    let err = server
        .get(RouteOptions::new("/x").version("not a range"), unit)
        .unwrap_err();
    assert!(matches!(err, RegistrationError::InvalidVersion(_)));
}

#[tokio::test]
async fn test_global_chain_is_captured_at_registration() {
    let log = call_log();
    let server = Server::new(ServerConfig::default());
    server.add_middleware(record(&log, "a"));
    server.get("/one", respond(&log, "one")).unwrap();
    server.add_middleware(record(&log, "b"));
    server.get("/two", respond(&log, "two")).unwrap();

    server.handle(request(Method::GET, "/one", &[])).await;
    assert_eq!(calls(&log), vec!["a", "one"]);

    log.lock().unwrap().clear();
    server.handle(request(Method::GET, "/two", &[])).await;
    assert_eq!(calls(&log), vec!["a", "b", "two"]);
}

#[tokio::test]
async fn test_nested_groups_run_in_order() {
    let log = call_log();
    let server = Server::new(ServerConfig::default());
    server
        .get(
            "/x",
            vec![
                chainrouter::Chain::from(vec![record(&log, "1"), record(&log, "2")]),
                chainrouter::Chain::from(record(&log, "3")),
                chainrouter::Chain::from(respond(&log, "4")),
            ],
        )
        .unwrap();
    server.handle(request(Method::GET, "/x", &[])).await;
    assert_eq!(calls(&log), vec!["1", "2", "3", "4"]);
}

#[tokio::test]
async fn test_handler_error_aborts_chain() {
    let log = call_log();
    let server = Server::new(ServerConfig::default());
    server
        .get(
            "/x",
            [
                sync_handler(|_, _| Next::Error(HandlerError::forbidden("no access"))),
                respond(&log, "never"),
            ],
        )
        .unwrap();
    let res = server.handle(request(Method::GET, "/x", &[])).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(&res),
        json!({ "code": "Forbidden", "message": "no access" })
    );
    assert!(calls(&log).is_empty());
}

#[tokio::test]
async fn test_anyhow_errors_become_500() {
    let server = Server::new(ServerConfig::default());
    server
        .get(
            "/x",
            sync_handler(|_, _| {
                let parsed: Result<u32, anyhow::Error> =
                    "nope".parse::<u32>().map_err(anyhow::Error::from);
                match parsed {
                    Ok(_) => Next::Continue,
                    Err(err) => Next::Error(HandlerError::from(err)),
                }
            }),
        )
        .unwrap();
    let res = server.handle(request(Method::GET, "/x", &[])).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_remove_route_twice() {
    let log = call_log();
    let server = Server::new(ServerConfig::default());
    server
        .get(RouteOptions::new("/x").name("get_x"), respond(&log, "get"))
        .unwrap();
    server.put("/x", respond(&log, "put")).unwrap();

    assert!(server.remove_route("get_x"));
    assert!(!server.remove_route("get_x"));

    let res = server.handle(request(Method::GET, "/x", &[])).await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()["allow"], "PUT");
}

#[tokio::test]
async fn test_remove_route_by_identity() {
    let log = call_log();
    let server = Server::new(ServerConfig::default());
    let route = server.get("/x", respond(&log, "get")).unwrap();
    assert!(server.remove_route(&route));
    assert!(server.routes().is_empty());
}

#[tokio::test]
async fn test_formatter_fallback() {
    let formatters = Formatters::empty()
        .with("application/json", JsonFormatter)
        .unwrap();
    let server = Server::with_formatters(ServerConfig::default(), formatters);
    let log = call_log();
    server.get("/x", respond(&log, "x")).unwrap();

    let none = server.handle(request(Method::GET, "/x", &[])).await;
    assert_eq!(none.headers()["content-type"], "application/json");

    let text = server
        .handle(request(Method::GET, "/x", &[("accept", "text/plain")]))
        .await;
    assert_eq!(text.status(), StatusCode::OK);
    assert_eq!(text.headers()["content-type"], "application/json");
}

#[tokio::test]
async fn test_strict_negotiation_answers_406() {
    let formatters = Formatters::empty()
        .with("application/json", JsonFormatter)
        .unwrap();
    let config = ServerConfig {
        strict_negotiation: true,
        ..ServerConfig::default()
    };
    let server = Server::with_formatters(config, formatters);
    let log = call_log();
    server.get("/x", respond(&log, "x")).unwrap();

    let res = server
        .handle(request(Method::GET, "/x", &[("accept", "text/plain")]))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(res.headers()["content-type"], "application/json");
}

#[tokio::test]
async fn test_accept_selects_text_formatter() {
    let server = Server::new(ServerConfig::default());
    server
        .get(
            "/greeting",
            sync_handler(|_, res| res.send(StatusCode::OK, &json!("hello"))),
        )
        .unwrap();
    let res = server
        .handle(request(
            Method::GET,
            "/greeting",
            &[("accept", "application/json;q=0.5, text/*")],
        ))
        .await;
    assert_eq!(res.headers()["content-type"], "text/plain");
    assert_eq!(&res.body()[..], b"hello");
}

#[tokio::test]
async fn test_fallback_overrides() {
    let server = Server::new(ServerConfig::default());
    server
        .on_not_found(sync_handler(|req, res| {
            let path = match req.routing_error() {
                Some(RoutingError::NotFound { path, .. }) => path.clone(),
                _ => String::new(),
            };
            res.send(StatusCode::NOT_FOUND, &json!({ "missing": path }))
        }))
        .unwrap();
    let second = server.on_not_found(sync_handler(|_, _| Next::Continue));
    assert!(matches!(
        second,
        Err(RegistrationError::FallbackAlreadySet(_))
    ));

    server
        .on_version_not_allowed(sync_handler(|req, res| {
            let acceptable = match req.routing_error() {
                Some(RoutingError::VersionNotAllowed { acceptable, .. }) => acceptable.clone(),
                _ => Vec::new(),
            };
            res.send(
                StatusCode::NOT_ACCEPTABLE,
                &json!({ "acceptable": acceptable }),
            )
        }))
        .unwrap();
    let log = call_log();
    server
        .get(RouteOptions::new("/v").version("1.0"), respond(&log, "v1"))
        .unwrap();

    let res = server.handle(request(Method::GET, "/gone", &[])).await;
    assert_eq!(json_body(&res), json!({ "missing": "/gone" }));

    let res = server
        .handle(request(Method::GET, "/v", &[("accept-version", "9.0")]))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(json_body(&res), json!({ "acceptable": ["1.0"] }));
}

#[tokio::test]
async fn test_method_not_allowed_override_handles_options() {
    let server = Server::new(ServerConfig::default());
    server
        .on_method_not_allowed(sync_handler(|req, res| {
            let allowed = req
                .routing_error()
                .and_then(RoutingError::allow_header)
                .unwrap_or_default();
            res.send(StatusCode::OK, &json!({ "methods": allowed }))
        }))
        .unwrap();
    let log = call_log();
    server.get("/x", respond(&log, "get")).unwrap();

    let res = server.handle(request(Method::OPTIONS, "/x", &[])).await;
    assert_eq!(json_body(&res), json!({ "methods": "GET" }));
}

#[test]
fn test_accessors() {
    let config = ServerConfig {
        name: "pets".to_string(),
        ..ServerConfig::default()
    };
    let formatters = Formatters::empty()
        .with("application/hal+json", JsonFormatter)
        .unwrap();
    let server = Server::with_formatters(config, formatters);
    let unit = sync_handler(|_, res| res.send_status(StatusCode::OK));
    server
        .get(
            RouteOptions::new("/pets").name("list_pets"),
            Arc::clone(&unit),
        )
        .unwrap();
    server.post("/pets", unit).unwrap();

    assert_eq!(server.name(), "pets");
    assert_eq!(server.config().name, "pets");
    assert_eq!(
        server.acceptable(),
        vec![
            "application/hal+json",
            "application/json",
            "text/plain",
            "application/octet-stream"
        ]
    );
    let names: Vec<String> = server.routes().iter().map(|r| r.name().to_string()).collect();
    assert_eq!(names, vec!["list_pets", "postpets"]);
    let route = server.route_named("list_pets").unwrap();
    assert_eq!(route.path(), "/pets");
    assert_eq!(route.allowed_methods(), &[Method::GET, Method::POST]);
    assert!(server.route_named("missing").is_none());
}

#[tokio::test]
async fn test_concurrent_dispatch_during_registration() {
    let server = Arc::new(Server::new(ServerConfig::default()));
    let log = call_log();
    server.get("/stable", respond(&log, "stable")).unwrap();

    let mut tasks = Vec::new();
    for i in 0..16 {
        let server = Arc::clone(&server);
        tasks.push(tokio::spawn(async move {
            if i % 4 == 0 {
                let unit = sync_handler(|_, res| res.send_status(StatusCode::NO_CONTENT));
                server.get(format!("/dynamic/{i}"), unit).unwrap();
            }
            server
                .handle(request(Method::GET, "/stable", &[]))
                .await
                .status()
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }
    assert_eq!(server.routes().len(), 5);
}
