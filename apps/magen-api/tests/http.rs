use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode, header},
};
use serde_json::Value;
use tower::util::ServiceExt;

use magen_api::{routes, state::AppState};
use magen_config::Config;
use magen_service::MagenService;
use magen_testkit::{ScriptedCompletion, ScriptedSearch, StubEmbedding};

const QUESTION: &str = "מה לעשות בזמן רעידת אדמה";
const DISCLAIMER: &str = "(התשובה מבוססת על ידע כללי ואינה נתמכת במסמכים רשמיים)";

fn app_with(cfg: Config, search: ScriptedSearch, completion: ScriptedCompletion) -> Router {
	let providers = magen_testkit::providers(
		Arc::new(StubEmbedding::new()),
		Arc::new(search),
		Arc::new(completion),
	);

	routes::router(AppState::with_service(MagenService::with_providers(cfg, providers)))
}

fn app(search: ScriptedSearch, completion: ScriptedCompletion) -> Router {
	app_with(magen_testkit::test_config(), search, completion)
}

fn three_documents() -> Vec<magen_domain::CandidateDocument> {
	vec![
		magen_testkit::document(Some("רעידת אדמה"), "צאו לשטח פתוח."),
		magen_testkit::document(Some("מרחב מוגן"), "היכנסו לממ\"ד."),
		magen_testkit::document(None, "החזיקו מים ופנס."),
	]
}

fn post_json(uri: &str, payload: Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(payload.to_string()))
		.expect("Failed to build request.")
}

fn get(uri: &str) -> Request<Body> {
	Request::builder().uri(uri).body(Body::empty()).expect("Failed to build request.")
}

async fn body_text(response: axum::response::Response) -> String {
	let bytes =
		body::to_bytes(response.into_body(), usize::MAX).await.expect("Failed to read body.");

	String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8.")
}

async fn body_json(response: axum::response::Response) -> Value {
	serde_json::from_str(&body_text(response).await).expect("Failed to parse response body.")
}

#[tokio::test]
async fn health_is_always_ok() {
	let response = app(ScriptedSearch::failing(), ScriptedCompletion::failing())
		.oneshot(get("/health"))
		.await
		.expect("Failed to call health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn readiness_reports_search_store_state() {
	let ok = app(ScriptedSearch::empty(), ScriptedCompletion::answering("x"))
		.oneshot(get("/api/health"))
		.await
		.expect("Failed to call readiness.");

	assert_eq!(ok.status(), StatusCode::OK);
	assert_eq!(body_json(ok).await, serde_json::json!({ "status": "ok" }));

	let down = app(ScriptedSearch::failing(), ScriptedCompletion::answering("x"))
		.oneshot(get("/api/health"))
		.await
		.expect("Failed to call readiness.");

	assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(
		body_json(down).await,
		serde_json::json!({ "status": "error", "message": "Service unavailable" })
	);
}

#[tokio::test]
async fn chat_returns_grounded_answer_with_sources() {
	let response = app(
		ScriptedSearch::returning(three_documents()),
		ScriptedCompletion::answering("צאו מהבניין."),
	)
	.oneshot(post_json("/api/chat", serde_json::json!({ "message": QUESTION })))
	.await
	.expect("Failed to call chat.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = body_json(response).await;

	assert_eq!(json["source_type"], "stepback");
	assert_eq!(json["sources"], serde_json::json!(["רעידת אדמה", "מרחב מוגן", "(untitled)"]));
	assert_eq!(
		json["answer"],
		"צאו מהבניין.\n\nSources: רעידת אדמה, מרחב מוגן, (untitled)"
	);
}

#[tokio::test]
async fn chat_without_documents_uses_fallback() {
	let response = app(ScriptedSearch::empty(), ScriptedCompletion::answering("היכנסו למקלט."))
		.oneshot(post_json("/api/chat", serde_json::json!({ "message": QUESTION })))
		.await
		.expect("Failed to call chat.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = body_json(response).await;

	assert_eq!(json["source_type"], "fallback");
	assert_eq!(json["sources"], serde_json::json!([]));
	assert_eq!(json["answer"], format!("היכנסו למקלט.\n\n{DISCLAIMER}"));
}

#[tokio::test]
async fn chat_requires_a_message() {
	for payload in [
		serde_json::json!({}),
		serde_json::json!({ "message": "" }),
		serde_json::json!({ "message": null }),
		serde_json::json!({ "message": "  \n" }),
	] {
		let response = app(ScriptedSearch::empty(), ScriptedCompletion::answering("x"))
			.oneshot(post_json("/api/chat", payload))
			.await
			.expect("Failed to call chat.");

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		assert_eq!(body_json(response).await, serde_json::json!({ "error": "Message is required" }));
	}
}

#[tokio::test]
async fn malformed_bodies_get_json_bad_request() {
	let without_content_type = Request::builder()
		.method("POST")
		.uri("/api/chat")
		.body(Body::from(serde_json::json!({ "message": QUESTION }).to_string()))
		.expect("Failed to build request.");
	let not_json = Request::builder()
		.method("POST")
		.uri("/api/generate-title")
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from("{\"question\":"))
		.expect("Failed to build request.");
	let requests = [
		post_json("/api/chat", serde_json::json!({ "message": 42 })),
		post_json("/api/chat", serde_json::json!({ "message": QUESTION, "stream": "yes" })),
		post_json("/api/generate-title", serde_json::json!({ "question": ["a"] })),
		without_content_type,
		not_json,
	];

	for request in requests {
		let response = app(ScriptedSearch::empty(), ScriptedCompletion::answering("x"))
			.oneshot(request)
			.await
			.expect("Failed to call endpoint.");

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		assert_eq!(
			body_json(response).await,
			serde_json::json!({ "error": "Request body must be a JSON object" })
		);
	}
}

#[tokio::test]
async fn generate_title_requires_a_question() {
	for payload in [
		serde_json::json!({ "answer": "a" }),
		serde_json::json!({ "question": null, "answer": null }),
		serde_json::json!({ "question": " \t", "answer": "a" }),
	] {
		let response = app(ScriptedSearch::empty(), ScriptedCompletion::answering("x"))
			.oneshot(post_json("/api/generate-title", payload))
			.await
			.expect("Failed to call generate-title.");

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		assert_eq!(body_json(response).await, serde_json::json!({ "error": "Question is required" }));
	}
}

#[tokio::test]
async fn search_failure_returns_generic_error_without_streaming() {
	let response = app(ScriptedSearch::failing(), ScriptedCompletion::streaming(&["x"]))
		.oneshot(post_json("/api/chat", serde_json::json!({ "message": QUESTION, "stream": true })))
		.await
		.expect("Failed to call chat.");

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(
		response.headers().get(header::CONTENT_TYPE).map(|value| value.as_bytes()),
		Some("application/json".as_bytes())
	);

	let json = body_json(response).await;

	assert_eq!(json, serde_json::json!({ "error": "Failed to process your request" }));
	assert!(!json.to_string().contains("connection refused"));
}

#[tokio::test]
async fn streamed_chat_writes_tokens_then_footer() {
	let response = app(
		ScriptedSearch::returning(three_documents()),
		ScriptedCompletion::streaming(&["צאו ", "מהבניין", "."]),
	)
	.oneshot(post_json("/api/chat", serde_json::json!({ "message": QUESTION, "stream": true })))
	.await
	.expect("Failed to call chat.");

	assert_eq!(response.status(), StatusCode::OK);

	let headers = response.headers();

	assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
	assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
	assert_eq!(headers["x-source-type"], "stepback");
	assert_eq!(
		body_text(response).await,
		"צאו מהבניין.\n\nSources: רעידת אדמה, מרחב מוגן, (untitled)"
	);
}

#[tokio::test]
async fn streamed_direct_answer_is_labelled_direct() {
	let response = app(
		ScriptedSearch::returning(three_documents()),
		ScriptedCompletion::streaming(&["x"]),
	)
	.oneshot(post_json(
		"/api/chat",
		serde_json::json!({ "message": QUESTION, "stream": true, "prompt": "direct" }),
	))
	.await
	.expect("Failed to call chat.");

	assert_eq!(response.headers()["x-source-type"], "direct");
}

#[tokio::test]
async fn interrupted_stream_ends_with_error_marker() {
	let response = app(
		ScriptedSearch::returning(three_documents()),
		ScriptedCompletion::streaming(&["a", "b", "c"]).fail_after(1),
	)
	.oneshot(post_json("/api/chat", serde_json::json!({ "message": QUESTION, "stream": true })))
	.await
	.expect("Failed to call chat.");

	assert_eq!(response.status(), StatusCode::OK);

	let body = body_text(response).await;

	assert_eq!(body, "a\n\n❌ שגיאה במהלך יצירת התשובה.");
	assert!(!body.contains("Sources:"));
}

#[tokio::test]
async fn generate_title_returns_trimmed_title() {
	let response = app(ScriptedSearch::empty(), ScriptedCompletion::answering(" רעידת אדמה\n"))
		.oneshot(post_json(
			"/api/generate-title",
			serde_json::json!({ "question": QUESTION, "answer": "צאו לשטח פתוח." }),
		))
		.await
		.expect("Failed to call generate-title.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(body_json(response).await, serde_json::json!({ "title": "רעידת אדמה" }));
}

#[tokio::test]
async fn generate_title_failure_is_generic() {
	let response = app(ScriptedSearch::empty(), ScriptedCompletion::failing())
		.oneshot(post_json("/api/generate-title", serde_json::json!({ "question": QUESTION })))
		.await
		.expect("Failed to call generate-title.");

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body_json(response).await, serde_json::json!({ "error": "Failed to generate title" }));
}

#[tokio::test]
async fn cors_headers_are_added_when_enabled() {
	let mut cfg = magen_testkit::test_config();

	cfg.service.cors_permissive = true;

	let request = Request::builder()
		.uri("/health")
		.header(header::ORIGIN, "http://localhost:3000")
		.body(Body::empty())
		.expect("Failed to build request.");
	let response = app_with(cfg, ScriptedSearch::empty(), ScriptedCompletion::answering("x"))
		.oneshot(request)
		.await
		.expect("Failed to call health.");

	assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
