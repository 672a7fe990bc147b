//! HTTP router.
//!
//! All routes share one [`AppState`]. CORS is permissive so a frontend on
//! another origin can call the API during development.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::{AppState, ServerConfig};
use crate::predict::Predictor;

/// Build the router around a shared predictor
pub fn app_router(predictor: Arc<Predictor>, config: ServerConfig) -> Router {
    build_router(AppState::new(predictor, config))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(endpoints::home::index))
        .route("/login", post(endpoints::auth::login))
        .route("/logout", post(endpoints::auth::logout))
        .route("/chat", post(endpoints::chat::chat))
        .route("/health", get(endpoints::health::check))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::predictor::testing;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        app_router(Arc::new(testing::predictor()), ServerConfig::default())
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn chat_single_entry_is_bare_object() {
        let response = app()
            .oneshot(json_request("/chat", json!({ "message": "itching, skin_rash, joint_pain" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert!(json.get("responses").is_none());
        assert_eq!(json["input"], "itching, skin_rash, joint_pain");

        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["disease"], "Fungal infection");
        assert_eq!(results[0]["doctor"], "Dermatologist");
        let confidences: Vec<f64> = results
            .iter()
            .map(|r| r["confidence"].as_f64().unwrap())
            .collect();
        assert!(confidences.windows(2).all(|w| w[0] >= w[1]));
        assert!(confidences.iter().all(|c| (0.0..=100.0).contains(c)));
    }

    #[tokio::test]
    async fn chat_list_is_wrapped() {
        let response = app()
            .oneshot(json_request("/chat", json!({ "message": ["itching", "fever"] })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let responses = json["responses"].as_array().unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["input"], "itching");
        assert!(responses[0]["results"].is_array());
        assert_eq!(responses[1]["input"], "fever");
        assert_eq!(responses[1]["error"], "No valid symptoms recognized");
    }

    #[tokio::test]
    async fn chat_empty_message() {
        let response = app()
            .oneshot(json_request("/chat", json!({ "message": "" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "input": "", "error": "No symptoms provided" })
        );
    }

    #[tokio::test]
    async fn chat_missing_message_behaves_as_empty() {
        let response = app().oneshot(json_request("/chat", json!({}))).await.unwrap();
        assert_eq!(body_json(response).await["error"], "No symptoms provided");
    }

    #[tokio::test]
    async fn chat_without_content_type_still_parses() {
        let req = Request::builder()
            .method("POST")
            .uri("/chat")
            .body(Body::from(r#"{"message": "cough"}"#))
            .unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["results"].is_array());
    }

    #[tokio::test]
    async fn chat_number_message_is_400() {
        let response = app()
            .oneshot(json_request("/chat", json!({ "message": 5 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "Invalid input format" }));
    }

    #[tokio::test]
    async fn login_success_sets_cookie() {
        let response = app()
            .oneshot(json_request(
                "/login",
                json!({ "email": "test@example.com", "password": "1234" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("session="));
        assert_eq!(
            body_json(response).await,
            json!({ "success": true, "message": "Logged in!" })
        );
    }

    #[tokio::test]
    async fn login_wrong_password_is_401() {
        let response = app()
            .oneshot(json_request(
                "/login",
                json!({ "email": "test@example.com", "password": "wrong" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            json!({ "success": false, "message": "Invalid credentials" })
        );
    }

    #[tokio::test]
    async fn login_then_logout_closes_session() {
        let state = AppState::new(Arc::new(testing::predictor()), ServerConfig::default());
        let app = build_router(state.clone());

        let response = app
            .clone()
            .oneshot(json_request(
                "/login",
                json!({ "email": "yash@example.com", "password": "password" }),
            ))
            .await
            .unwrap();
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        let pair = cookie.split(';').next().unwrap().to_string();
        assert_eq!(state.sessions.lock().unwrap().len(), 1);

        let req = Request::builder()
            .method("POST")
            .uri("/logout")
            .header(header::COOKIE, pair)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "success": true, "message": "Logged out" })
        );
        assert!(state.sessions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn logout_without_session_succeeds() {
        let req = Request::builder()
            .method("POST")
            .uri("/logout")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn home_lists_symptoms() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("value=\"joint_pain\""));
    }

    #[tokio::test]
    async fn health_reports_counts() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["symptoms"], 5);
        assert_eq!(json["diseases"], 4);
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let req = Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"message": "cough"}"#))
            .unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
