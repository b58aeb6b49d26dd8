//! Domain models for the PrepPal forecasting platform

mod accuracy;
mod catalogue;
mod confidence;
mod features;
mod forecast;
mod recommendation;
mod retrain;
mod risk;
mod sales;

pub use accuracy::*;
pub use catalogue::*;
pub use confidence::*;
pub use features::*;
pub use forecast::*;
pub use recommendation::*;
pub use retrain::*;
pub use risk::*;
pub use sales::*;

/// Round half away from zero to `places` decimals
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
