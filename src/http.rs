//! HTTP front end: the input form, the JSON API and read-only views of the log.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::PredictionError;
use crate::metrics::MetricsSnapshot;
use crate::service::{PredictionOutcome, PredictionService};
use crate::types::prediction::{PredictionRecord, Verdict};
use crate::types::reading::{
    MachineReading, ProductQuality, AIR_TEMPERATURE_K, PROCESS_TEMPERATURE_K,
    ROTATIONAL_SPEED_RPM, TOOL_WEAR_MIN, TORQUE_NM,
};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
}

#[derive(Debug, Serialize)]
struct PredictionResponse {
    serial_no: Option<u64>,
    prediction: Verdict,
    maintenance_required: bool,
    message: &'static str,
    logged: bool,
    log_error: Option<String>,
}

impl From<&PredictionOutcome> for PredictionResponse {
    fn from(outcome: &PredictionOutcome) -> Self {
        Self {
            serial_no: outcome.serial_no(),
            prediction: outcome.verdict,
            maintenance_required: outcome.verdict.is_required(),
            message: outcome.verdict.message(),
            logged: outcome.serial_no().is_some(),
            log_error: outcome.log_error().map(|e| e.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    model: String,
}

/// Why a request produced no verdict, including runtime failures
enum RequestFailure {
    Prediction(PredictionError),
    Internal(String),
}

impl RequestFailure {
    fn status(&self) -> StatusCode {
        match self {
            RequestFailure::Prediction(PredictionError::Validation(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            RequestFailure::Prediction(PredictionError::Inference(_))
            | RequestFailure::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            RequestFailure::Prediction(e) => e.kind(),
            RequestFailure::Internal(_) => "internal",
        }
    }

    fn message(&self) -> String {
        match self {
            RequestFailure::Prediction(e) => e.to_string(),
            RequestFailure::Internal(message) => message.clone(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/api/predict", post(predict_json))
        .route("/api/log", get(prediction_log))
        .route("/api/metrics", get(metrics))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(addr: &str, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "MachineGuard listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Inference and the log append block, so they run off the async workers
async fn run_prediction(
    service: Arc<PredictionService>,
    reading: MachineReading,
) -> Result<PredictionOutcome, RequestFailure> {
    match tokio::task::spawn_blocking(move || service.predict_and_log(&reading)).await {
        Ok(result) => result.map_err(RequestFailure::Prediction),
        Err(e) => {
            error!(error = %e, "Prediction task failed");
            Err(RequestFailure::Internal(format!("Prediction task failed: {}", e)))
        }
    }
}

async fn index() -> Html<String> {
    Html(render_page(&MachineReading::default(), None))
}

async fn predict_form(
    State(state): State<AppState>,
    Form(reading): Form<MachineReading>,
) -> (StatusCode, Html<String>) {
    match run_prediction(state.service.clone(), reading.clone()).await {
        Ok(outcome) => (
            StatusCode::OK,
            Html(render_page(&reading, Some(render_outcome(&outcome)))),
        ),
        Err(failure) => (
            failure.status(),
            Html(render_page(
                &reading,
                Some(format!(
                    r#"<div class="result rejected">{}</div>"#,
                    escape_html(&failure.message())
                )),
            )),
        ),
    }
}

async fn predict_json(
    State(state): State<AppState>,
    Json(reading): Json<MachineReading>,
) -> Response {
    match run_prediction(state.service.clone(), reading).await {
        Ok(outcome) => Json(PredictionResponse::from(&outcome)).into_response(),
        Err(failure) => (
            failure.status(),
            Json(ErrorResponse {
                error: failure.message(),
                kind: failure.kind(),
            }),
        )
            .into_response(),
    }
}

async fn prediction_log(
    State(state): State<AppState>,
) -> Result<Json<Vec<PredictionRecord>>, (StatusCode, Json<ErrorResponse>)> {
    let service = state.service.clone();
    let records = tokio::task::spawn_blocking(move || service.history())
        .await
        .map_err(|e| internal_error(e.to_string()))?
        .map_err(|e| internal_error(e.to_string()))?;

    Ok(Json(records))
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.service.metrics().snapshot())
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.service.classifier_name().to_string(),
    })
}

fn internal_error(message: String) -> (StatusCode, Json<ErrorResponse>) {
    error!(error = %message, "Failed to read prediction log");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message,
            kind: "internal",
        }),
    )
}

fn render_outcome(outcome: &PredictionOutcome) -> String {
    let (class, icon) = if outcome.verdict.is_required() {
        ("error-box", "⚠️")
    } else {
        ("success-box", "✅")
    };

    let mut html = format!(
        r#"<div class="result {class}">{icon} {}</div>"#,
        outcome.verdict.message()
    );

    match (outcome.serial_no(), outcome.log_error()) {
        (Some(serial_no), _) => {
            html.push_str(&format!(r#"<p class="note">Logged as entry #{serial_no}</p>"#));
        }
        (None, Some(e)) => {
            html.push_str(&format!(
                r#"<p class="note warning">Prediction was not logged: {}</p>"#,
                escape_html(&e.to_string())
            ));
        }
        (None, None) => {}
    }

    html
}

fn render_page(reading: &MachineReading, result: Option<String>) -> String {
    let quality_options: String = ProductQuality::ALL
        .iter()
        .map(|quality| {
            let selected = if quality.code() == reading.product_quality {
                " selected"
            } else {
                ""
            };
            format!(
                r#"<option value="{}"{selected}>{}</option>"#,
                quality.code(),
                quality.label()
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>MachineGuard</title>
<style>
body {{ background: linear-gradient(135deg, #0f172a, #1e293b); color: #f1f5f9; font-family: sans-serif; min-height: 100vh; margin: 0; }}
main {{ max-width: 720px; margin: 0 auto; padding: 40px 20px; }}
h1 {{ text-align: center; font-size: 48px; color: #3b82f6; margin-bottom: 5px; }}
.subtitle {{ text-align: center; color: #cbd5e1; margin-bottom: 40px; }}
form {{ display: grid; grid-template-columns: 1fr 1fr; gap: 16px 24px; }}
label {{ display: flex; flex-direction: column; gap: 6px; color: #e2e8f0; font-weight: 500; }}
input, select {{ background: #f8fafc; color: #111827; border-radius: 8px; border: none; padding: 8px; }}
button {{ grid-column: 1 / span 2; height: 50px; font-size: 18px; border-radius: 12px; background: #3b82f6; color: white; border: none; }}
.result {{ padding: 20px; border-radius: 12px; text-align: center; font-size: 22px; font-weight: 600; margin-top: 25px; }}
.success-box {{ background: rgba(34,197,94,0.15); color: #4ade80; border: 1px solid rgba(34,197,94,0.4); }}
.error-box, .rejected {{ background: rgba(239,68,68,0.15); color: #f87171; border: 1px solid rgba(239,68,68,0.4); }}
.note {{ text-align: center; color: #94a3b8; }}
.warning {{ color: #fbbf24; }}
</style>
</head>
<body>
<main>
<h1>MachineGuard</h1>
<div class="subtitle">Industrial Machine Failure Prediction System</div>
<form method="post" action="/predict">
<label>Air Temperature [K]<input type="number" name="air_temperature_k" min="{air_min}" max="{air_max}" step="any" value="{air}" required></label>
<label>Torque [Nm]<input type="number" name="torque_nm" min="{torque_min}" max="{torque_max}" step="any" value="{torque}" required></label>
<label>Process Temperature [K]<input type="number" name="process_temperature_k" min="{process_min}" max="{process_max}" step="any" value="{process}" required></label>
<label>Tool Wear [min]<input type="number" name="tool_wear_min" min="{wear_min}" max="{wear_max}" step="1" value="{wear}" required></label>
<label>Rotational Speed [rpm]<input type="number" name="rotational_speed_rpm" min="{speed_min}" max="{speed_max}" step="1" value="{speed}" required></label>
<label>Product Quality<select name="product_quality">{quality_options}</select></label>
<button type="submit">🔍 Predict Maintenance</button>
</form>
{result}
</main>
</body>
</html>
"#,
        air_min = AIR_TEMPERATURE_K.start(),
        air_max = AIR_TEMPERATURE_K.end(),
        air = reading.air_temperature_k,
        torque_min = TORQUE_NM.start(),
        torque_max = TORQUE_NM.end(),
        torque = reading.torque_nm,
        process_min = PROCESS_TEMPERATURE_K.start(),
        process_max = PROCESS_TEMPERATURE_K.end(),
        process = reading.process_temperature_k,
        wear_min = TOOL_WEAR_MIN.start(),
        wear_max = TOOL_WEAR_MIN.end(),
        wear = reading.tool_wear_min,
        speed_min = ROTATIONAL_SPEED_RPM.start(),
        speed_max = ROTATIONAL_SPEED_RPM.end(),
        speed = reading.rotational_speed_rpm,
        quality_options = quality_options,
        result = result.unwrap_or_default(),
    )
}

fn escape_html(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;
    use crate::feature_extractor::FeatureVector;
    use crate::metrics::ServiceMetrics;
    use crate::models::inference::Classifier;
    use crate::prediction_log::PredictionLog;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tower::ServiceExt;

    struct ConstantClassifier(i64);

    impl Classifier for ConstantClassifier {
        fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<i64>, InferenceError> {
            Ok(vec![self.0; rows.len()])
        }

        fn name(&self) -> &str {
            "constant"
        }
    }

    fn app(label: i64, dir: &tempfile::TempDir) -> Router {
        app_with_log(label, &dir.path().join("prediction_log.csv"))
    }

    fn app_with_log(label: i64, log_path: &std::path::Path) -> Router {
        let service = PredictionService::new(
            Arc::new(ConstantClassifier(label)),
            PredictionLog::new(log_path),
            Arc::new(ServiceMetrics::new()),
        );
        router(AppState {
            service: Arc::new(service),
        })
    }

    fn form_request(product_quality: i64) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!(
                "air_temperature_k=300&process_temperature_k=310&rotational_speed_rpm=1500\
                 &torque_nm=40&tool_wear_min=10&product_quality={product_quality}"
            )))
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_renders_form() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(0, &dir)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains(r#"name="air_temperature_k""#));
        assert!(html.contains(r#"max="5000""#));
        assert!(html.contains("Predict Maintenance"));
    }

    #[tokio::test]
    async fn test_form_submission_shows_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(
                "air_temperature_k=300&process_temperature_k=310&rotational_speed_rpm=1500\
                 &torque_nm=40&tool_wear_min=10&product_quality=1",
            ))
            .unwrap();

        let response = app(1, &dir).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Maintenance Required"));
        assert!(html.contains("error-box"));
        assert!(html.contains("entry #1"));
    }

    #[tokio::test]
    async fn test_form_rejects_invalid_reading() {
        let dir = tempfile::tempdir().unwrap();

        let response = app(1, &dir).oneshot(form_request(3)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_string(response).await;
        assert!(html.contains(r#"class="result rejected""#));
        assert!(html.contains("product quality"));
        assert!(!html.contains("Maintenance Required"));
        assert!(!dir.path().join("prediction_log.csv").exists());
    }

    #[tokio::test]
    async fn test_form_reports_unexpected_label() {
        let dir = tempfile::tempdir().unwrap();

        let response = app(5, &dir).oneshot(form_request(1)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = body_string(response).await;
        assert!(html.contains(r#"class="result rejected""#));
        assert!(!html.contains("entry #"));
        assert!(!dir.path().join("prediction_log.csv").exists());
    }

    #[tokio::test]
    async fn test_form_warns_when_log_unwritable() {
        let dir = tempfile::tempdir().unwrap();

        let response = app_with_log(1, dir.path())
            .oneshot(form_request(1))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Maintenance Required"));
        assert!(html.contains("Prediction was not logged"));
        assert!(!html.contains("entry #"));
    }

    #[tokio::test]
    async fn test_api_reports_unlogged_prediction() {
        let dir = tempfile::tempdir().unwrap();
        let request = json_request(
            "/api/predict",
            serde_json::to_value(MachineReading::default()).unwrap(),
        );

        let response = app_with_log(0, dir.path()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["prediction"], "Not Required");
        assert_eq!(body["logged"], false);
        assert!(body["serial_no"].is_null());
        assert!(body["log_error"].as_str().is_some_and(|e| !e.is_empty()));
    }

    #[tokio::test]
    async fn test_api_predict() {
        let dir = tempfile::tempdir().unwrap();
        let request = json_request(
            "/api/predict",
            serde_json::json!({
                "air_temperature_k": 300.0,
                "process_temperature_k": 310.0,
                "rotational_speed_rpm": 1500,
                "torque_nm": 40.0,
                "tool_wear_min": 10,
                "product_quality": 1
            }),
        );

        let response = app(0, &dir).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["prediction"], "Not Required");
        assert_eq!(body["maintenance_required"], false);
        assert_eq!(body["serial_no"], 1);
        assert_eq!(body["logged"], true);
    }

    #[tokio::test]
    async fn test_api_rejects_invalid_reading() {
        let dir = tempfile::tempdir().unwrap();
        let request = json_request(
            "/api/predict",
            serde_json::json!({
                "air_temperature_k": 300.0,
                "process_temperature_k": 310.0,
                "rotational_speed_rpm": 1500,
                "torque_nm": 40.0,
                "tool_wear_min": 10,
                "product_quality": 3
            }),
        );

        let response = app(0, &dir).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["kind"], "validation");
        assert!(!dir.path().join("prediction_log.csv").exists());
    }

    #[tokio::test]
    async fn test_api_reports_unexpected_label() {
        let dir = tempfile::tempdir().unwrap();
        let request = json_request(
            "/api/predict",
            serde_json::to_value(MachineReading::default()).unwrap(),
        );

        let response = app(5, &dir).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["kind"], "inference");
    }

    #[tokio::test]
    async fn test_log_endpoint_lists_records() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(1, &dir);

        for _ in 0..2 {
            let request = json_request(
                "/api/predict",
                serde_json::to_value(MachineReading::default()).unwrap(),
            );
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(Request::builder().uri("/api/log").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let records: Vec<PredictionRecord> =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].serial_no, 2);
        assert_eq!(records[1].prediction, Verdict::Required);
    }

    #[tokio::test]
    async fn test_health_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(0, &dir);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "constant");

        let request = json_request(
            "/api/predict",
            serde_json::to_value(MachineReading::default()).unwrap(),
        );
        app.clone().oneshot(request).await.unwrap();

        let response = app
            .oneshot(Request::builder().uri("/api/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["predictions"], 1);
        assert_eq!(body["maintenance_required"], 0);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>torque & wear</b>"), "&lt;b&gt;torque &amp; wear&lt;/b&gt;");
    }
}
