pub mod discount_rate;
pub mod model;

pub use discount_rate::{derive_discount_rate, resolve_discount_rate, DEFAULT_DISCOUNT_RATE};
pub use model::{calculate_intrinsic_value, ValuationInputs, ValuationModel, ValuationOutput};
