//! Unit tests for error module.

use super::*;

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// ErrorResponse Tests
// ============================================================================

#[test]
fn test_error_response_serialization() {
    let response = ErrorResponse {
        error: "Something went wrong".to_string(),
        code: "INTERNAL_ERROR".to_string(),
    };

    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"error\":\"Something went wrong\""));
    assert!(json.contains("\"code\":\"INTERNAL_ERROR\""));
}

// ============================================================================
// ApiError Display Tests
// ============================================================================

#[test]
fn test_api_error_not_found_display() {
    let error = ApiError::NotFound("snapshot 42".to_string());
    assert_eq!(format!("{}", error), "Not found: snapshot 42");
}

#[test]
fn test_api_error_invalid_request_display() {
    let error = ApiError::InvalidRequest("symbols must not be empty".to_string());
    assert_eq!(
        format!("{}", error),
        "Invalid request: symbols must not be empty"
    );
}

#[test]
fn test_api_error_run_in_progress_display() {
    assert_eq!(
        format!("{}", ApiError::RunInProgress),
        "A snapshot run is already in progress"
    );
}

// ============================================================================
// IntoResponse Tests
// ============================================================================

#[test]
fn test_status_mapping() {
    let cases = [
        (ApiError::NotFound(String::new()), StatusCode::NOT_FOUND),
        (ApiError::InvalidRequest(String::new()), StatusCode::BAD_REQUEST),
        (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
        (ApiError::Forbidden(String::new()), StatusCode::FORBIDDEN),
        (ApiError::RunInProgress, StatusCode::CONFLICT),
        (ApiError::DataSource(String::new()), StatusCode::BAD_GATEWAY),
        (
            ApiError::Database(String::new()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            ApiError::Internal(String::new()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (error, expected) in cases {
        assert_eq!(error.into_response().status(), expected);
    }
}

#[tokio::test]
async fn test_api_error_body_has_code() {
    let response = ApiError::RunInProgress.into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = body_json(response).await;
    assert_eq!(json["code"], "RUN_IN_PROGRESS");
    assert_eq!(json["error"], "A snapshot run is already in progress");
}

#[tokio::test]
async fn test_api_error_data_source_body() {
    let response = ApiError::DataSource("upstream 503".to_string()).into_response();
    let json = body_json(response).await;
    assert_eq!(json["code"], "DATA_SOURCE_UNAVAILABLE");
}

// ============================================================================
// Conversion Tests
// ============================================================================

#[test]
fn test_from_sqlx_error() {
    let error: ApiError = sqlx::Error::RowNotFound.into();
    assert!(matches!(error, ApiError::Database(_)));
}

#[test]
fn test_from_job_error() {
    let upstream = JobError::DataSourceUnavailable(tradier_client::Error::from_status(
        503,
        "unavailable".to_string(),
    ));
    assert!(matches!(ApiError::from(upstream), ApiError::DataSource(_)));

    let persistence = JobError::Persistence(sqlx::Error::PoolTimedOut);
    assert!(matches!(ApiError::from(persistence), ApiError::Database(_)));
}
