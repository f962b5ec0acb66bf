use axum::http::StatusCode;

pub async fn health_check_handler() -> StatusCode {
    StatusCode::OK
}
