use axum::http::StatusCode;

pub async fn panic_handler() -> StatusCode {
    panic!("panic requested by the client");
}
