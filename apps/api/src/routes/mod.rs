pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::auth::handlers as admin;
use crate::chat::handlers as chat;
use crate::export::handlers as export;
use crate::history::handlers as history;
use crate::paywall::handlers as paywall;
use crate::pipeline::handlers as pipeline;
use crate::pipeline::upload::UPLOAD_BODY_LIMIT;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Pipeline sessions
        .route("/api/v1/sessions", post(pipeline::handle_open_session))
        .route(
            "/api/v1/sessions/:id",
            get(pipeline::handle_get_session).delete(pipeline::handle_close_session),
        )
        .route(
            "/api/v1/sessions/:id/language",
            put(pipeline::handle_set_language),
        )
        .route(
            "/api/v1/sessions/:id/upload",
            post(pipeline::handle_upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/v1/sessions/:id/optimize",
            post(pipeline::handle_optimize),
        )
        .route("/api/v1/sessions/:id/reset", post(pipeline::handle_reset))
        .route("/api/v1/sessions/:id/payment", post(paywall::handle_payment))
        // Export (paywall-gated)
        .route(
            "/api/v1/sessions/:id/export/pdf",
            get(export::handle_export_pdf),
        )
        .route(
            "/api/v1/sessions/:id/export/docx",
            get(export::handle_export_docx),
        )
        .route(
            "/api/v1/sessions/:id/export/text",
            get(export::handle_export_text),
        )
        .route(
            "/api/v1/sessions/:id/export/html",
            get(export::handle_export_html),
        )
        // History
        .route("/api/v1/history", get(history::handle_list_history))
        .route(
            "/api/v1/sessions/:id/history/:record_id",
            post(history::handle_select_history),
        )
        // Chat
        .route("/api/v1/chat", post(chat::handle_chat))
        .route("/api/v1/chat/welcome", get(chat::handle_welcome))
        // Admin
        .route(
            "/api/v1/admin/capabilities",
            get(admin::handle_capabilities),
        )
        .route(
            "/api/v1/admin/optimizations",
            get(admin::handle_list_optimizations),
        )
        .route(
            "/api/v1/admin/optimizations/:id/paid",
            post(admin::handle_mark_paid),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::{USER_ID_HEADER, USER_ROLE_HEADER};
    use crate::export::docx::DOCX_CONTENT_TYPE;
    use crate::store::MemoryRecordStore;
    use crate::test_support::{app_state, FakeGateway};

    const BOUNDARY: &str = "cvboost-test-boundary";

    struct TestApp {
        router: Router,
        gateway: Arc<FakeGateway>,
    }

    fn test_app() -> TestApp {
        let gateway = Arc::new(FakeGateway::new());
        let state = app_state(gateway.clone(), Arc::new(MemoryRecordStore::new()));
        TestApp {
            router: build_router(state),
            gateway,
        }
    }

    fn request(method: Method, uri: &str, user: Option<(&str, &str)>) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((id, role)) = user {
            builder = builder
                .header(USER_ID_HEADER, id)
                .header(USER_ROLE_HEADER, role);
        }
        builder
    }

    fn json_request(method: Method, uri: &str, user: Option<(&str, &str)>, body: Value) -> Request<Body> {
        request(method, uri, user)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: Method, uri: &str, user: Option<(&str, &str)>) -> Request<Body> {
        request(method, uri, user).body(Body::empty()).unwrap()
    }

    fn upload_request(uri: &str, user: Option<(&str, &str)>, filename: &str, mime: &str) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"%PDF-1.7 fake resume bytes");
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        request(Method::POST, uri, user)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = send(app, req).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    async fn open_session(app: &Router, user: Option<(&str, &str)>) -> String {
        let (status, body) = send_json(
            app,
            json_request(Method::POST, "/api/v1/sessions", user, json!({"output_language": "en"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["stage"], "IDLE");
        body["id"].as_str().unwrap().to_string()
    }

    const JANE: Option<(&str, &str)> = Some(("jane", "individual_user"));

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let (status, body) = send_json(&app.router, empty_request(Method::GET, "/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "cvboost-api");
    }

    #[tokio::test]
    async fn test_upload_optimize_pay_export() {
        let app = test_app();
        let router = &app.router;
        let id = open_session(router, JANE).await;
        let base = format!("/api/v1/sessions/{id}");

        let (status, body) = send_json(
            router,
            upload_request(&format!("{base}/upload"), JANE, "cv.pdf", "application/pdf"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stage"], "ANALYSIS_COMPLETED");
        assert_eq!(body["analysis"]["atsCompatibility"], "Medium");

        let (status, body) = send_json(
            router,
            json_request(
                Method::POST,
                &format!("{base}/optimize"),
                JANE,
                json!({"instructions": "Keep it to one page"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stage"], "COMPLETED");
        assert_eq!(body["document"]["blurred"], true);

        // Locked: every export is refused.
        for kind in ["pdf", "docx", "text", "html"] {
            let (status, _, _) =
                send(router, empty_request(Method::GET, &format!("{base}/export/{kind}"), JANE)).await;
            assert_eq!(status, StatusCode::PAYMENT_REQUIRED, "{kind}");
        }

        let (status, body) = send_json(
            router,
            json_request(
                Method::POST,
                &format!("{base}/payment"),
                JANE,
                json!({"card_number": "4242 4242 4242 4242", "expiry": "12/30", "cvv": "123", "name": "Jane Doe"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["payment_step"], "success");
        assert_eq!(body["document"]["unlocked"], true);

        let (status, headers, bytes) =
            send(router, empty_request(Method::GET, &format!("{base}/export/docx"), JANE)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], DOCX_CONTENT_TYPE);
        assert!(headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("optimized-resume.docx"));
        assert_eq!(&bytes[..2], b"PK");

        let (status, _, bytes) =
            send(router, empty_request(Method::GET, &format!("{base}/export/pdf"), JANE)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(bytes).unwrap().contains("window.print()"));

        let (status, _, bytes) =
            send(router, empty_request(Method::GET, &format!("{base}/export/text"), JANE)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(bytes).unwrap().starts_with("Jane Doe\nExperience"));

        let (status, history) =
            send_json(router, empty_request(Method::GET, "/api/v1/history", JANE)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history[0]["is_paid"], true);
        assert_eq!(history[0]["original_filename"], "cv.pdf");
    }

    #[tokio::test]
    async fn test_invalid_upload_is_rejected_without_analysis() {
        let app = test_app();
        let id = open_session(&app.router, None).await;

        let (status, body) = send_json(
            &app.router,
            upload_request(&format!("/api/v1/sessions/{id}/upload"), None, "notes.txt", "text/plain"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(app.gateway.analyze_calls.load(Ordering::SeqCst), 0);

        let (_, view) = send_json(
            &app.router,
            empty_request(Method::GET, &format!("/api/v1/sessions/{id}"), None),
        )
        .await;
        assert_eq!(view["stage"], "IDLE");
    }

    #[tokio::test]
    async fn test_optimize_before_upload_is_a_conflict() {
        let app = test_app();
        let id = open_session(&app.router, None).await;
        let (status, body) = send_json(
            &app.router,
            empty_request(Method::POST, &format!("/api/v1/sessions/{id}/optimize"), None),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_sessions_are_bound_to_their_owner() {
        let app = test_app();
        let id = open_session(&app.router, JANE).await;
        let (status, _) = send_json(
            &app.router,
            empty_request(
                Method::GET,
                &format!("/api/v1/sessions/{id}"),
                Some(("mallory", "individual_user")),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send_json(
            &app.router,
            empty_request(Method::DELETE, &format!("/api/v1/sessions/{id}"), JANE),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send_json(
            &app.router,
            empty_request(Method::GET, &format!("/api/v1/sessions/{id}"), JANE),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_history_requires_identity() {
        let app = test_app();
        let (status, _) =
            send_json(&app.router, empty_request(Method::GET, "/api/v1/history", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_permissions() {
        let app = test_app();
        let (status, _) = send_json(
            &app.router,
            empty_request(Method::GET, "/api/v1/admin/optimizations", JANE),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let commerce = Some(("sam", "commerce_manager"));
        let (status, body) = send_json(
            &app.router,
            empty_request(Method::GET, "/api/v1/admin/optimizations", commerce),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, body) = send_json(
            &app.router,
            empty_request(Method::GET, "/api/v1/admin/capabilities", Some(("ed", "content_editor"))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["allowed"], json!(["access_admin_panel", "manage_blog_posts"]));
    }

    #[tokio::test]
    async fn test_chat_and_welcome() {
        let app = test_app();
        let (status, body) = send_json(
            &app.router,
            json_request(
                Method::POST,
                "/api/v1/chat",
                None,
                json!({"messages": [{"role": "user", "text": "How do ATS filters work?"}], "lang": "en"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fallback"], false);

        let (status, body) = send_json(
            &app.router,
            empty_request(Method::GET, "/api/v1/chat/welcome?lang=ar", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], crate::i18n::Language::Ar.messages().chat_welcome);
    }
}
