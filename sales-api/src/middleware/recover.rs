use std::any::Any;

use axum::response::{IntoResponse, Response};

use crate::error::AppError;

/// Response extension marking a 500 that came from a recovered panic.
#[derive(Debug, Clone, Copy)]
pub struct Panicked;

/// Turns a handler panic into an ordinary 500 rendered by [`AppError`].
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    let mut response = AppError::Internal(format!("panic: {detail}")).into_response();
    response.extensions_mut().insert(Panicked);
    response
}
