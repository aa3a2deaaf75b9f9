//! Axum router configuration

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::handlers::{debug_sessions, health_check, speed_info, version_check};
use super::socket::playback_socket;
use super::upload::transcribe_upload;

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.assets.static_dir.clone();
    let upload_limit = state.config.transcription.max_upload_bytes();

    let mut router = Router::new()
        // Health and version endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        .route("/api/speed/{value}", get(speed_info))
        // Debug endpoints
        .route("/debug/sessions", get(debug_sessions))
        // Playback sessions
        .route("/ws", get(playback_socket))
        .route(
            "/transcribe",
            post(transcribe_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Page and clip assets
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http());

    if state.config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS, Method::HEAD])
            .allow_headers([
                header::ACCEPT,
                header::RANGE,
                header::CONTENT_TYPE,
                header::ORIGIN,
            ])
            .max_age(Duration::from_secs(3600));
        router = router.layer(cors);
    }

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::playback::{ServerMessage, PROCESSING_PLACEHOLDER};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use tower::util::ServiceExt; // Use tower::util::ServiceExt for oneshot

    const BOUNDARY: &str = "sign-player-test-boundary";

    fn multipart_body(field: &str, file_name: Option<&str>, data: &str) -> Body {
        let disposition = match file_name {
            Some(name) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream",
                field, name
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"", field),
        };
        Body::from(format!(
            "--{b}\r\n{d}\r\n\r\n{data}\r\n--{b}--\r\n",
            b = BOUNDARY,
            d = disposition,
            data = data
        ))
    }

    fn upload_request(uri: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(body)
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn app() -> Router {
        create_router(Arc::new(AppState::with_defaults()))
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_speed_route() {
        let response = app()
            .oneshot(Request::get("/api/speed/2000").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["label"], "0.5x Speed");
    }

    #[tokio::test]
    async fn test_upload_without_video_field() {
        let response = app()
            .oneshot(upload_request(
                "/transcribe",
                multipart_body("other", None, "value"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "No video file part");
    }

    #[tokio::test]
    async fn test_upload_without_file_name() {
        let response = app()
            .oneshot(upload_request(
                "/transcribe",
                multipart_body("video", Some(""), "value"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "No selected file");
    }

    #[tokio::test]
    async fn test_upload_with_wrong_extension() {
        let response = app()
            .oneshot(upload_request(
                "/transcribe",
                multipart_body("video", Some("notes.txt"), "value"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "File type not allowed");
    }

    #[tokio::test]
    async fn test_upload_without_upstream() {
        let response = app()
            .oneshot(upload_request(
                "/transcribe",
                multipart_body("video", Some("clip.mp4"), "data"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_upload_for_unknown_session() {
        let uri = format!("/transcribe?session={}", uuid::Uuid::new_v4());
        let response = app()
            .oneshot(upload_request(
                &uri,
                multipart_body("video", Some("clip.mp4"), "data"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_starts_session_playback() {
        use axum::extract::Multipart;

        // Stand-in transcription service
        let upstream = Router::new().route(
            "/transcribe",
            post(|mut multipart: Multipart| async move {
                let field = multipart.next_field().await.unwrap().unwrap();
                assert_eq!(field.name(), Some("video"));
                axum::Json(serde_json::json!({ "text": "hi" }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, upstream).await.unwrap();
        });

        let mut config = ServerConfig::default();
        config.transcription.endpoint = Some(format!("http://{}/transcribe", addr));
        let state = Arc::new(AppState::new(config).unwrap());
        let (handle, mut rx) = state.open_session();
        let app = create_router(state.clone());

        let uri = format!("/transcribe?session={}", handle.id());
        let response = app
            .oneshot(upload_request(
                &uri,
                multipart_body("video", Some("clip.mp4"), "data"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["text"], "hi");

        let mut seen = Vec::new();
        while let Some(message) = rx.recv().await {
            let done = matches!(message, ServerMessage::Show { .. });
            seen.push(message);
            if done {
                break;
            }
        }

        assert!(seen.contains(&ServerMessage::InputLocked { locked: true }));
        assert!(seen.contains(&ServerMessage::Transcript {
            text: PROCESSING_PLACEHOLDER.to_string()
        }));
        assert!(seen.contains(&ServerMessage::InputLocked { locked: false }));
        assert!(seen.contains(&ServerMessage::Transcript {
            text: "hi".to_string()
        }));
        assert!(matches!(
            seen.last(),
            Some(ServerMessage::Show {
                unit: crate::sign::VisualUnit::Video { symbol: 'H', .. },
                ..
            })
        ));

        state.close_session(handle.id());
    }

    async fn drain_until_unlocked(
        rx: &mut tokio::sync::mpsc::UnboundedReceiver<ServerMessage>,
    ) -> Vec<ServerMessage> {
        let mut seen = Vec::new();
        while let Some(message) = rx.recv().await {
            let unlocked = message == ServerMessage::InputLocked { locked: false };
            seen.push(message);
            if unlocked {
                break;
            }
        }
        seen
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected_and_unlocks_session() {
        let mut config = ServerConfig::default();
        config.transcription.max_upload_mb = 1;
        let state = Arc::new(AppState::new(config).unwrap());
        let (handle, mut rx) = state.open_session();
        let app = create_router(state.clone());

        let data = "x".repeat(2 * 1024 * 1024);
        let uri = format!("/transcribe?session={}", handle.id());
        let response = app
            .oneshot(upload_request(
                &uri,
                multipart_body("video", Some("clip.mp4"), &data),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let seen = drain_until_unlocked(&mut rx).await;
        assert!(seen.contains(&ServerMessage::InputLocked { locked: true }));
        assert!(seen.iter().any(|m| matches!(
            m,
            ServerMessage::Alert { message } if message.starts_with("Server Error:")
        )));
        assert!(!handle.snapshot().input_locked);

        state.close_session(handle.id());
    }

    #[tokio::test]
    async fn test_abandoned_upload_unlocks_session() {
        // Transcription service that never answers in time
        let upstream = Router::new().route(
            "/transcribe",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                axum::Json(serde_json::json!({ "text": "late" }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, upstream).await.unwrap();
        });

        let mut config = ServerConfig::default();
        config.transcription.endpoint = Some(format!("http://{}/transcribe", addr));
        let state = Arc::new(AppState::new(config).unwrap());
        let (handle, mut rx) = state.open_session();
        let app = create_router(state.clone());

        let uri = format!("/transcribe?session={}", handle.id());
        let request = upload_request(&uri, multipart_body("video", Some("clip.mp4"), "data"));
        let outcome = tokio::time::timeout(Duration::from_millis(300), app.oneshot(request)).await;
        assert!(outcome.is_err());

        drain_until_unlocked(&mut rx).await;
        handle.client(crate::playback::ClientMessage::Convert {
            text: "$".to_string(),
        });
        loop {
            match rx.recv().await.unwrap() {
                ServerMessage::Show { unit, .. } => {
                    assert_eq!(unit, crate::sign::VisualUnit::Unsupported { symbol: '$' });
                    break;
                }
                _ => continue,
            }
        }
        assert!(!handle.snapshot().input_locked);

        state.close_session(handle.id());
    }

    #[tokio::test]
    async fn test_cors_options() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/transcribe")
            .header(header::ORIGIN, "http://localhost:8080")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("POST"));
    }

    #[tokio::test]
    async fn test_missing_clip_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::default();
        config.assets.static_dir = dir.path().to_path_buf();
        let app = create_router(Arc::new(AppState::new(config).unwrap()));

        let response = app
            .oneshot(
                Request::get("/static/hand_videos/A.mp4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serves_clip_assets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("hand_videos")).unwrap();
        std::fs::write(dir.path().join("hand_videos").join("A.mp4"), b"clip").unwrap();

        let mut config = ServerConfig::default();
        config.assets.static_dir = dir.path().to_path_buf();
        let app = create_router(Arc::new(AppState::new(config).unwrap()));

        let response = app
            .oneshot(
                Request::get("/static/hand_videos/A.mp4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
