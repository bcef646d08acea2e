use serde::Serialize;

/// Success envelope shared by every JSON endpoint. Failures use the same
/// shape with `error` instead of `data` (see `AppError`).
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}
