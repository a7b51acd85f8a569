//! Atompub scenarios driven through the request processor.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use abdera_model::atom::{Entry, ENTRY_MEDIA_TYPE};
use abdera_model::Parser;
use abdera_server::adapter::{AcceptMap, MULTIPART_RELATED};
use abdera_server::basic::InMemoryAdapter;
use abdera_server::processor::Provider;
use abdera_server::request::{RequestContext, SLUG};
use abdera_server::response::ResponseContext;
use abdera_server::route::{RouteManager, TargetResolver};
use abdera_server::workspace::{DefaultWorkspaceManager, WorkspaceInfo};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, StatusCode};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pretty_assertions::assert_eq;

fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

struct Server {
    provider: Provider,
    notes: Arc<InMemoryAdapter>,
}

fn server() -> Server {
    let notes = Arc::new(InMemoryAdapter::new("Notes", "Ann"));
    let photos = Arc::new(
        InMemoryAdapter::new("Photos", "Ann")
            .with_accepts(AcceptMap::entries_only().accept("image/*", MULTIPART_RELATED)),
    );
    let workspaces = DefaultWorkspaceManager::new().with_workspace(
        WorkspaceInfo::new("Main")
            .with_collection("notes", notes.clone())
            .with_collection("photos", photos),
    );
    Server {
        provider: Provider::new(RouteManager::standard("/").unwrap(), Arc::new(workspaces)),
        notes,
    }
}

fn entry_of(response: &ResponseContext) -> Entry {
    let document = Parser::default().parse(&response.body_bytes(), None).unwrap();
    Entry::from_document(document).unwrap()
}

fn post_entry(provider: &Provider, path: &str) -> ResponseContext {
    provider.process(
        &RequestContext::new(Method::POST, path)
            .with_header(CONTENT_TYPE, ENTRY_MEDIA_TYPE)
            .with_body(load_fixture("entry.xml")),
    )
}

#[test]
fn scenario_a_post_then_get() {
    let server = server();

    let created = post_entry(&server.provider, "/notes");
    assert_eq!(created.status(), StatusCode::CREATED);
    let location = created.location().unwrap().to_string();
    assert_eq!(entry_of(&created).title().as_deref(), Some("Atom-Powered Robots Run Amok"));

    let read = server.provider.process(&RequestContext::new(Method::GET, location.as_str()));
    assert_eq!(read.status(), StatusCode::OK);
    assert_eq!(read.content_type(), Some(ENTRY_MEDIA_TYPE));
    assert_eq!(entry_of(&read).title().as_deref(), Some("Atom-Powered Robots Run Amok"));
}

#[test]
fn scenario_a_slug_names_the_entry() {
    let server = server();
    let created = server.provider.process(
        &RequestContext::new(Method::POST, "/notes")
            .with_header(CONTENT_TYPE, "application/atom+xml")
            .with_header(SLUG, "Robot News")
            .with_body(load_fixture("entry.xml")),
    );
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(created.location(), Some("/notes/robot-news"));
}

#[test]
fn scenario_b_media_to_atom_only_collection() {
    let server = server();
    let response = server.provider.process(
        &RequestContext::new(Method::POST, "/notes")
            .with_header(CONTENT_TYPE, "application/octet-stream")
            .with_body(vec![0_u8, 1, 2, 3]),
    );

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(!response.allow().contains(&Method::POST));
    assert!(server.notes.is_empty().unwrap());
}

#[test]
fn scenario_c_multipart_with_misleading_start() {
    let server = server();
    let image = b"\x89PNG\r\n\x1a\n";
    let body = format!(
        "--MIME_boundary\r\n\
         Content-Type: image/png\r\n\
         Content-ID: <image@example.org>\r\n\
         Content-Transfer-Encoding: base64\r\n\
         \r\n\
         {}\r\n\
         --MIME_boundary\r\n\
         Content-Type: application/atom+xml;type=entry\r\n\
         Content-ID: <entry@example.org>\r\n\
         \r\n\
         {}\r\n\
         --MIME_boundary--\r\n",
        STANDARD.encode(image),
        load_fixture("entry.xml").trim_start_matches(r#"<?xml version="1.0" encoding="UTF-8"?>"#).trim(),
    );

    let created = server.provider.process(
        &RequestContext::new(Method::POST, "/photos")
            .with_header(
                CONTENT_TYPE,
                r#"multipart/related; boundary="MIME_boundary"; type="application/atom+xml"; start="<image@example.org>""#,
            )
            .with_header(SLUG, "robot")
            .with_body(body),
    );
    assert_eq!(created.status(), StatusCode::CREATED);

    let entry = entry_of(&created);
    assert_eq!(entry.title().as_deref(), Some("Atom-Powered Robots Run Amok"));
    assert_eq!(entry.edit_media_link().as_deref(), Some("/photos/robot;media"));

    let media = server
        .provider
        .process(&RequestContext::new(Method::GET, "/photos/robot;media"));
    assert_eq!(media.status(), StatusCode::OK);
    assert_eq!(media.content_type(), Some("image/png"));
    assert_eq!(media.body_bytes(), image);
}

#[test]
fn scenario_c_multipart_rejects_unaccepted_media() {
    let server = server();
    let body = format!(
        "--b\r\nContent-Type: application/atom+xml\r\n\r\n{}\r\n--b\r\nContent-Type: text/plain\r\n\r\naGVsbG8=\r\n--b--\r\n",
        r#"<entry xmlns="http://www.w3.org/2005/Atom"><title>t</title></entry>"#
    );
    let response = server.provider.process(
        &RequestContext::new(Method::POST, "/photos")
            .with_header(CONTENT_TYPE, r#"multipart/related; boundary=b; type="application/atom+xml""#)
            .with_body(body),
    );
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[test]
fn scenario_d_delete_then_get() {
    let server = server();
    let created = post_entry(&server.provider, "/notes");
    let location = created.location().unwrap().to_string();

    let deleted = server.provider.process(&RequestContext::new(Method::DELETE, location.as_str()));
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = server.provider.process(&RequestContext::new(Method::GET, location.as_str()));
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let again = server.provider.process(&RequestContext::new(Method::DELETE, location.as_str()));
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[test]
fn feed_lists_created_entries() {
    let server = server();
    post_entry(&server.provider, "/notes");
    post_entry(&server.provider, "/notes");

    let feed = server.provider.process(&RequestContext::new(Method::GET, "/notes"));
    assert_eq!(feed.status(), StatusCode::OK);
    let body = String::from_utf8(feed.body_bytes()).unwrap();
    assert_eq!(body.matches("<entry>").count(), 2, "{body}");
}

#[test]
fn routing_is_idempotent() {
    let server = server();
    let routes = server.provider.routes();
    for path in ["/", "/notes", "/notes/a", "/notes/a;media", "/notes;categories"] {
        assert_eq!(
            routes.resolve(&Method::GET, path),
            routes.resolve(&Method::GET, path),
            "{path}"
        );
    }
}
