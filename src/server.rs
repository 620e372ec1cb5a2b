use crate::core::desktop::Desktop;
use crate::error::HelperError;
use crate::tools::login_clicker::LoginHelper;
use axum::{extract::State, response::Json, routing::post, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Body of every endpoint response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    fn from_result<T>(result: Result<T, HelperError>, on_success: impl FnOnce(T) -> String) -> Self {
        match result {
            Ok(value) => Self {
                success: true,
                message: on_success(value),
            },
            Err(e) => Self {
                success: false,
                message: e.to_string(),
            },
        }
    }
}

// Requests are served one at a time through the mutex
type SharedHelper<D> = Arc<Mutex<LoginHelper<D>>>;

pub fn router<D>(helper: LoginHelper<D>) -> Router
where
    D: Desktop + Send + 'static,
{
    Router::new()
        .route("/trigger-login", post(trigger_login::<D>))
        .route("/save-template", post(save_template::<D>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(Mutex::new(helper)))
}

/// Run a helper operation on the blocking pool; it sleeps and waits on the OS
async fn run_blocking<D, T, F>(helper: SharedHelper<D>, job: F) -> Result<T, HelperError>
where
    D: Desktop + Send + 'static,
    T: Send + 'static,
    F: FnOnce(&LoginHelper<D>) -> Result<T, HelperError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let guard = helper.lock().unwrap_or_else(PoisonError::into_inner);
        job(&guard)
    })
    .await
    .map_err(|e| HelperError::Task(e.to_string()))?
}

async fn trigger_login<D>(State(helper): State<SharedHelper<D>>) -> Json<ActionResponse>
where
    D: Desktop + Send + 'static,
{
    let result = run_blocking(helper, |h| h.click_login()).await;
    match &result {
        Ok((x, y)) => tracing::info!(x, y, "login button clicked"),
        Err(e) => tracing::warn!(error = %e, "login trigger failed"),
    }

    Json(ActionResponse::from_result(result, |(x, y)| {
        format!("login button clicked at ({}, {})", x, y)
    }))
}

async fn save_template<D>(State(helper): State<SharedHelper<D>>) -> Json<ActionResponse>
where
    D: Desktop + Send + 'static,
{
    let result = run_blocking(helper, |h| h.save_template()).await;
    match &result {
        Ok(path) => tracing::info!(path = %path.display(), "template saved"),
        Err(e) => tracing::warn!(error = %e, "template save failed"),
    }

    Json(ActionResponse::from_result(result, |path| {
        format!("template saved to {}", path.display())
    }))
}

/// Serve until Ctrl+C
pub async fn run_server<D>(helper: LoginHelper<D>, addr: SocketAddr) -> std::io::Result<()>
where
    D: Desktop + Send + 'static,
{
    let app = router(helper);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install CTRL+C handler");
            }
            tracing::info!("shutting down gracefully");
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::desktop::testing::{noise_image, FakeDesktop};
    use crate::settings::HelperSettings;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app(dir: &TempDir, desktop: FakeDesktop) -> Router {
        let settings = HelperSettings {
            template_dir: dir.path().join("templates"),
            focus_delay_ms: 0,
            ..HelperSettings::default()
        };
        router(LoginHelper::new(desktop, settings).unwrap())
    }

    fn post_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn call(app: Router, request: Request<Body>) -> ActionResponse {
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn trigger_without_window_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let desktop = FakeDesktop::new(&["Explorer"], noise_image(64, 64, 1));

        let response = call(app(&dir, desktop.clone()), post_request("/trigger-login")).await;

        assert_eq!(
            response,
            ActionResponse {
                success: false,
                message: "window containing \"微信\" not found".to_string(),
            }
        );
        assert!(desktop.clicks().is_empty());
    }

    #[tokio::test]
    async fn save_then_trigger_clicks_screen_center() {
        let dir = tempfile::tempdir().unwrap();
        let desktop = FakeDesktop::new(&["微信"], noise_image(300, 200, 4));
        let app = app(&dir, desktop.clone());

        let saved = call(app.clone(), post_request("/save-template")).await;
        assert!(saved.success, "{}", saved.message);
        assert!(saved.message.starts_with("template saved to "));

        let triggered = call(app, post_request("/trigger-login")).await;
        assert_eq!(
            triggered,
            ActionResponse {
                success: true,
                message: "login button clicked at (150, 100)".to_string(),
            }
        );
        assert_eq!(desktop.clicks(), vec![(150, 100)]);
    }

    #[tokio::test]
    async fn trigger_without_template_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let desktop = FakeDesktop::new(&["微信"], noise_image(64, 64, 1));

        let response = call(app(&dir, desktop), post_request("/trigger-login")).await;

        assert!(!response.success);
        assert!(response.message.starts_with("template image not found"));
    }

    #[tokio::test]
    async fn get_is_not_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder()
            .uri("/trigger-login")
            .body(Body::empty())
            .unwrap();

        let response = app(&dir, FakeDesktop::new(&[], noise_image(8, 8, 1)))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn responses_allow_any_origin() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/save-template")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();

        let response = app(&dir, FakeDesktop::new(&[], noise_image(8, 8, 1)))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }
}
