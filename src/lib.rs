pub mod aggregation;
pub mod constants;
pub mod conversion;
pub mod distribution;
pub mod orientation;
pub mod progress;
pub mod rebin;
pub mod selection;
pub mod slice;
pub mod slice_errors;
pub mod slice_params;
pub mod support;

pub use slice::{slice2d, SliceGrid};
pub use slice_errors::SliceError;
pub use slice_params::SliceParams;
