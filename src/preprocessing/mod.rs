//! Data preprocessing module
//!
//! - Missing value imputation (mean, median, mode, drop)
//! - Feature standardization fitted on training data only

mod imputer;
mod scaler;

pub use imputer::{ImputationPolicy, Imputer};
pub use scaler::{ScalerParams, StandardScaler};
