//! The axum binding, exercised with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use abdera_server::config::ServerConfig;
use axum::body::Body;
use axum::http::header::{ALLOW, CONTENT_TYPE, ETAG, IF_NONE_MATCH, LOCATION};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

const ENTRY: &str = r#"<entry xmlns="http://www.w3.org/2005/Atom"><title>Over the wire</title></entry>"#;

fn app(max_body_bytes: usize) -> Router {
    let provider = ServerConfig::default().provider().expect("provider");
    abdera_server::http::router(Arc::new(provider), max_body_bytes)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8")
}

#[tokio::test]
async fn service_document_with_etag() {
    let response = app(1024)
        .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).expect("content type"),
        "application/atomsvc+xml"
    );
    assert!(response.headers().contains_key(ETAG));
    let body = body_string(response).await;
    assert!(body.contains(r#"href="/entries""#), "{body}");
}

#[tokio::test]
async fn head_has_headers_but_no_body() {
    let response = app(1024)
        .oneshot(
            Request::builder()
                .method("HEAD")
                .uri("/")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(ETAG));
    assert!(body_string(response).await.is_empty());
}

#[tokio::test]
async fn conditional_get_returns_not_modified() {
    let app = app(1024);
    let first = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let tag = first.headers().get(ETAG).expect("etag").clone();

    let second = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header(IF_NONE_MATCH, tag)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn post_entry_sets_location() {
    let app = app(1024);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/entries")
                .header(CONTENT_TYPE, "application/atom+xml;type=entry")
                .body(Body::from(ENTRY))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response
        .headers()
        .get(LOCATION)
        .expect("location")
        .to_str()
        .expect("location str")
        .to_string();
    assert_eq!(location, "/entries/over-the-wire");

    let read = app
        .oneshot(Request::builder().uri(location).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(read.status(), StatusCode::OK);
    assert!(body_string(read).await.contains("Over the wire"));
}

#[tokio::test]
async fn method_not_allowed_lists_methods() {
    let response = app(1024)
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/entries")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get(ALLOW).expect("allow"), "GET, HEAD, POST");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let response = app(16)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/entries")
                .header(CONTENT_TYPE, "application/atom+xml;type=entry")
                .body(Body::from(ENTRY))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let response = app(1024)
        .oneshot(
            Request::builder()
                .uri("/entries/a/b/c")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
