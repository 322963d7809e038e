/// HTTP-level tests against the full route table.
///
/// The pool never connects, so every request here must be answered before
/// the first query: session checks, input validation and routing.
mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, App};
use blog_service::configure;
use common::{app_state, session_cookie, unreachable_pool, RecordingMediaStore};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

macro_rules! test_app {
    () => {{
        let state = app_state(unreachable_pool(), Arc::new(RecordingMediaStore::default()));
        test::init_service(App::new().configure(move |cfg| configure(cfg, &state))).await
    }};
}

fn multipart_body(boundary: &str, category: &str, content: &str) -> Vec<u8> {
    format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"type\"\r\n\r\n{category}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"content\"\r\n\r\n{content}\r\n\
         --{b}--\r\n",
        b = boundary
    )
    .into_bytes()
}

#[actix_web::test]
async fn health_is_public() {
    let app = test_app!();

    for path in ["/health", "/api/health"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "ok");
    }
}

#[actix_web::test]
async fn write_routes_require_session() {
    let app = test_app!();
    let id = Uuid::new_v4();

    let requests = vec![
        test::TestRequest::post().uri("/api/blocks/create"),
        test::TestRequest::put().uri("/api/blocks/hendleLikeDislike"),
        test::TestRequest::post().uri("/api/blocks/handleReview"),
        test::TestRequest::get().uri("/api/admin/adminBlogs"),
        test::TestRequest::get().uri(&format!("/api/admin/fetchBlogById/{id}")),
        test::TestRequest::delete().uri(&format!("/api/admin/deleteBlog/{id}")),
        test::TestRequest::post().uri("/api/Auth/signOut"),
        test::TestRequest::get().uri("/api/Auth/checkLogin"),
    ];

    for req in requests {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

#[actix_web::test]
async fn forged_cookie_is_rejected() {
    let app = test_app!();

    let req = test::TestRequest::get()
        .uri("/api/admin/adminBlogs")
        .cookie(actix_web::cookie::Cookie::new("token", "not-a-signed-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn sign_in_rejected_when_already_signed_in() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/api/Auth/signin")
        .cookie(session_cookie(Uuid::new_v4(), "reader@example.com"))
        .set_json(json!({ "email": "reader@example.com", "password": "secret1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "You are already signed in");
}

#[actix_web::test]
async fn sign_out_clears_cookie() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/api/Auth/signOut")
        .cookie(session_cookie(Uuid::new_v4(), "reader@example.com"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[actix_web::test]
async fn signup_requires_every_field() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/api/Auth/otp")
        .set_json(json!({ "username": "writer", "email": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "All fields are required.");
}

#[actix_web::test]
async fn reaction_must_be_like_or_dislike() {
    let app = test_app!();

    let req = test::TestRequest::put()
        .uri("/api/blocks/hendleLikeDislike")
        .cookie(session_cookie(Uuid::new_v4(), "reader@example.com"))
        .set_json(json!({ "id": Uuid::new_v4(), "likeordislike": "love" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn malformed_input_is_bad_request() {
    let app = test_app!();

    let cases = vec![
        test::TestRequest::put()
            .uri("/api/blocks/fetchReview")
            .set_json(json!({})),
        test::TestRequest::get().uri("/api/blocks/getPeosonalDetails/not-a-uuid"),
        test::TestRequest::get().uri("/api/blocks/onFilterChange?type=gossip"),
        test::TestRequest::put()
            .uri("/api/blocks/fetchReview")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{broken"),
    ];

    for req in cases {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

#[actix_web::test]
async fn create_rejects_content_without_leading_title() {
    let media = Arc::new(RecordingMediaStore::default());
    let state = app_state(unreachable_pool(), media.clone());
    let app = test::init_service(App::new().configure(move |cfg| configure(cfg, &state))).await;

    let boundary = "echodraftboundary";
    let content = r#"[{"id":"a","type":"text","value":"no title"},{"id":"b","type":"image"}]"#;
    let req = test::TestRequest::post()
        .uri("/api/blocks/create")
        .cookie(session_cookie(Uuid::new_v4(), "writer@example.com"))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        ))
        .set_payload(multipart_body(boundary, "tech", content))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "The first block must be a title");
    assert!(media.uploads.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn create_rejects_unknown_category() {
    let app = test_app!();

    let boundary = "echodraftboundary";
    let content = r#"[{"id":"t","type":"title","value":"Hello"}]"#;
    let req = test::TestRequest::post()
        .uri("/api/blocks/create")
        .cookie(session_cookie(Uuid::new_v4(), "writer@example.com"))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        ))
        .set_payload(multipart_body(boundary, "gossip", content))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
