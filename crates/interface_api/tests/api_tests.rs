//! HTTP tests for the billing API over the in-memory port

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::ServiceExt;

use core_kernel::StudentId;
use domain_billing::ports::mock::MockBillingPort;
use domain_billing::BillingService;
use interface_api::auth::{create_token, roles};
use interface_api::config::ApiConfig;
use interface_api::create_router;
use test_utils::PianoScenario;

const JUNE: &str = "from=2024-06-01&to=2024-06-30";

fn test_config() -> ApiConfig {
    ApiConfig {
        jwt_secret: "api-test-secret".to_string(),
        ..ApiConfig::default()
    }
}

fn app(port: Arc<MockBillingPort>) -> Router {
    create_router(BillingService::new(port), test_config())
}

fn token(role: &str, student_id: Option<StudentId>) -> String {
    create_token("user-1", vec![role.to_string()], student_id, &test_config().jwt_secret, 300).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        Value::Number(n) => n.to_string().parse().unwrap(),
        other => panic!("not a decimal: {other}"),
    }
}

async fn piano() -> (PianoScenario, Arc<MockBillingPort>) {
    let scenario = PianoScenario::new();
    let port = Arc::new(scenario.clone().into_mock_port().await);
    (scenario, port)
}

mod auth {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (_, port) = piano().await;
        let (status, body) = send(app(port), get(&format!("/api/v1/billing/summary?{JUNE}"), None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_forged_token_is_unauthorized() {
        let (_, port) = piano().await;
        let forged = create_token("user-1", vec![roles::ADMIN.to_string()], None, "other-secret", 300).unwrap();
        let (status, _) = send(app(port), get(&format!("/api/v1/billing/summary?{JUNE}"), Some(&forged))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_student_cannot_read_summary() {
        let (scenario, port) = piano().await;
        let token = token(roles::STUDENT, Some(scenario.student.id));
        let (status, body) = send(app(port), get(&format!("/api/v1/billing/summary?{JUNE}"), Some(&token))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");
    }

    #[tokio::test]
    async fn test_student_cannot_read_another_statement() {
        let (scenario, port) = piano().await;
        let token = token(roles::STUDENT, Some(StudentId::new()));
        let uri = format!("/api/v1/students/{}/statement?{JUNE}", scenario.student.id);
        let (status, _) = send(app(port), get(&uri, Some(&token))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (_, port) = piano().await;
        let (status, body) = send(app(port), get("/health", None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}

mod summary {
    use super::*;

    #[tokio::test]
    async fn test_teacher_reads_june_summary() {
        let (scenario, port) = piano().await;
        let token = token(roles::TEACHER, None);
        let (status, body) = send(app(port), get(&format!("/api/v1/billing/summary?{JUNE}"), Some(&token))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&body["total_accrued"]), dec!(60));
        assert_eq!(decimal(&body["total_realized"]), dec!(60));
        assert_eq!(decimal(&body["total_outstanding"]), dec!(0));
        assert_eq!(body["range"]["from"], "2024-06-01");
        assert_eq!(body["range"]["timezone"], "UTC");

        let row = &body["students"][0];
        assert_eq!(row["student_id"], scenario.student.id.as_uuid().to_string());
        assert_eq!(row["student_name"], "Priya Raman");
        assert_eq!(row["currency_symbol"], "$");
        assert_eq!(decimal(&row["balance"]), dec!(0));
        assert_eq!(row["has_billing_issues"], false);
    }

    #[tokio::test]
    async fn test_missing_bound_is_bad_request() {
        let (_, port) = piano().await;
        let token = token(roles::ADMIN, None);
        let (status, body) = send(app(port), get("/api/v1/billing/summary?from=2024-06-01", Some(&token))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_reversed_range_is_bad_request() {
        let (_, port) = piano().await;
        let token = token(roles::ADMIN, None);
        let uri = "/api/v1/billing/summary?from=2024-06-30&to=2024-06-01";
        let (status, _) = send(app(port), get(uri, Some(&token))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_day_is_json_bad_request() {
        let (_, port) = piano().await;
        let token = token(roles::ADMIN, None);
        let uri = "/api/v1/billing/summary?from=2024-13-01&to=2024-06-30";
        let (status, body) = send(app(port), get(uri, Some(&token))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
        assert!(body["message"].as_str().unwrap().contains("2024-13-01"));
    }

    #[tokio::test]
    async fn test_malformed_statement_day_is_json_bad_request() {
        let (scenario, port) = piano().await;
        let token = token(roles::TEACHER, None);
        let uri = format!("/api/v1/students/{}/statement?from=2024-06-01&to=June", scenario.student.id);
        let (status, body) = send(app(port), get(&uri, Some(&token))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_unknown_timezone_is_bad_request() {
        let (_, port) = piano().await;
        let token = token(roles::ADMIN, None);
        let uri = format!("/api/v1/billing/summary?{JUNE}&tz=Mars/Olympus");
        let (status, _) = send(app(port), get(&uri, Some(&token))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_store_outage_is_service_unavailable() {
        let (_, port) = piano().await;
        port.set_unavailable(true);
        let token = token(roles::TEACHER, None);
        let (status, body) = send(app(port), get(&format!("/api/v1/billing/summary?{JUNE}"), Some(&token))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "service_unavailable");
    }

    #[tokio::test]
    async fn test_range_without_activity_has_zero_totals() {
        let (_, port) = piano().await;
        let token = token(roles::TEACHER, None);
        let uri = "/api/v1/billing/summary?from=2024-07-01&to=2024-07-31";
        let (status, body) = send(app(port), get(uri, Some(&token))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&body["total_accrued"]), dec!(0));
        assert_eq!(decimal(&body["total_realized"]), dec!(0));
    }
}

mod statement {
    use super::*;

    #[tokio::test]
    async fn test_student_reads_own_statement() {
        let (scenario, port) = piano().await;
        let token = token(roles::STUDENT, Some(scenario.student.id));
        let uri = format!("/api/v1/students/{}/statement?{JUNE}", scenario.student.id);
        let (status, body) = send(app(port), get(&uri, Some(&token))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["student_name"], "Priya Raman");
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["items"][0]["title"], "Piano basics");
        assert_eq!(decimal(&body["items"][0]["charge"]), dec!(60));
        assert_eq!(body["payments"].as_array().unwrap().len(), 1);
        assert_eq!(body["payments"][0]["method"], "bank transfer");
        assert_eq!(decimal(&body["totals"]["balance"]), dec!(0));
        assert_eq!(body["totals"]["unresolved_items"], 0);
    }

    #[tokio::test]
    async fn test_statement_accepts_bare_uuid() {
        let (scenario, port) = piano().await;
        let token = token(roles::TEACHER, None);
        let uri = format!("/api/v1/students/{}/statement?{JUNE}", scenario.student.id.as_uuid());
        let (status, _) = send(app(port), get(&uri, Some(&token))).await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_student_is_not_found() {
        let (_, port) = piano().await;
        let token = token(roles::TEACHER, None);
        let uri = format!("/api/v1/students/{}/statement?{JUNE}", StudentId::new());
        let (status, body) = send(app(port), get(&uri, Some(&token))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_malformed_student_id_is_bad_request() {
        let (_, port) = piano().await;
        let token = token(roles::TEACHER, None);
        let (status, _) = send(app(port), get(&format!("/api/v1/students/not-an-id/statement?{JUNE}"), Some(&token))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod currencies {
    use super::*;

    #[tokio::test]
    async fn test_lists_supported_currencies_with_symbols() {
        let (_, port) = piano().await;
        let token = token(roles::STUDENT, None);
        let (status, body) = send(app(port), get("/api/v1/currencies", Some(&token))).await;

        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert!(!list.is_empty());
        assert!(list.iter().any(|c| c["code"] == "USD" && c["symbol"] == "$"));
        assert!(list.iter().any(|c| c["code"] == "INR" && c["symbol"] == "₹"));
    }
}

mod readiness {
    use super::*;

    #[tokio::test]
    async fn test_ready_when_store_healthy() {
        let (_, port) = piano().await;
        let (status, body) = send(app(port), get("/health/ready", None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data_environment"], "development");
    }

    #[tokio::test]
    async fn test_not_ready_when_store_down() {
        let (_, port) = piano().await;
        port.set_unavailable(true);
        let (status, _) = send(app(port), get("/health/ready", None)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
