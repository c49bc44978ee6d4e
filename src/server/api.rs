use crate::agent::CompletionServiceFactory;
use crate::error::RelayError;
use crate::models::chat::{ RelayRequest, RelayResponse };
use crate::relay::relay;
use std::sync::Arc;
use axum::{
    extract::{ rejection::JsonRejection, State },
    routing::{ get, post },
    Json,
    Router,
};
use serde_json::{ json, Value };
use tower::ServiceBuilder;
use tower_http::cors::{ Any, CorsLayer };

#[derive(Clone)]
pub struct AppState {
    pub factory: Arc<dyn CompletionServiceFactory>,
    pub empty_message_reply: Arc<str>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/main", post(main_handler))
        .route("/healthz", get(health_handler))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

async fn main_handler(
    State(state): State<AppState>,
    body: Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Json<RelayResponse>, RelayError> {
    let Json(request) = body.map_err(|e| RelayError::InvalidRequest(e.body_text()))?;
    let response = relay(state.factory.as_ref(), request, &state.empty_message_reply).await?;
    Ok(Json(response))
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorEnvelope;
    use crate::models::chat::Continuation;
    use crate::relay::tests::RecordingFactory;
    use axum::body::{ to_bytes, Body };
    use axum::http::{ header, Request, StatusCode };
    use axum::response::Response;
    use tower::ServiceExt;

    fn app(factory: Arc<RecordingFactory>) -> Router {
        router(AppState {
            factory,
            empty_message_reply: Arc::from("Please type something"),
        })
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/main")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn relays_a_continued_message() {
        let factory = Arc::new(RecordingFactory::default());
        let response = app(factory.clone())
            .oneshot(post_json(r#"{"message":"again","conversationId":"c1","parentMessageId":"m1"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "echo: again", "conversationId": "c1", "messageId": "m-next" })
        );
        assert_eq!(factory.calls(), vec![(
            "again".to_string(),
            Some(Continuation { conversation_id: "c1".into(), parent_message_id: "m1".into() }),
        )]);
    }

    #[tokio::test]
    async fn empty_message_gets_the_canned_prompt() {
        let factory = Arc::new(RecordingFactory::default());
        let response = app(factory.clone())
            .oneshot(post_json(r#"{"message":"","conversationId":"c1","parentMessageId":"m1"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "message": "Please type something" }));
        assert!(factory.calls().is_empty());
    }

    #[tokio::test]
    async fn null_identifiers_with_empty_message_get_the_canned_prompt() {
        let factory = Arc::new(RecordingFactory::default());
        let response = app(factory.clone())
            .oneshot(post_json(r#"{"message":"","conversationId":null,"parentMessageId":null}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "message": "Please type something" }));
        assert!(factory.calls().is_empty());
    }

    #[tokio::test]
    async fn null_identifiers_start_a_new_conversation() {
        let factory = Arc::new(RecordingFactory::default());
        let response = app(factory.clone())
            .oneshot(post_json(r#"{"message":"hi","conversationId":null,"parentMessageId":null}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "echo: hi", "conversationId": "c-new", "messageId": "m-next" })
        );
        assert_eq!(factory.calls(), vec![("hi".to_string(), None)]);
    }

    #[tokio::test]
    async fn malformed_body_gets_an_error_envelope() {
        let response = app(Arc::new(RecordingFactory::default()))
            .oneshot(post_json("{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let envelope: ErrorEnvelope = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(envelope.error.code, "invalid_request");
    }

    #[tokio::test]
    async fn upstream_failure_is_a_bad_gateway() {
        let response = app(Arc::new(RecordingFactory::failing()))
            .oneshot(post_json(r#"{"message":"hello"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let envelope: ErrorEnvelope = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(envelope.error.code, "completion_failed");
        assert!(envelope.error.message.contains("upstream exploded"));
    }

    #[tokio::test]
    async fn health_check_touches_nothing() {
        let factory = Arc::new(RecordingFactory::default());
        let response = app(factory.clone())
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "status": "ok" }));
        assert_eq!(factory.connects.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
