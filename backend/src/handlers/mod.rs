//! HTTP handlers for the PrepPal forecasting API

mod accuracy;
mod forecast;
mod health;
mod planning;
mod retrain;

pub use accuracy::*;
pub use forecast::*;
pub use health::*;
pub use planning::*;
pub use retrain::*;

use serde::Serialize;

/// Successful response body: `success: true` plus the payload's fields
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
