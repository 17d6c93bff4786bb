//! A small, dependency-free tabular model (spec §9) used to carry and join
//! static SPARQL results with time-series results.

mod error;
mod frame;
mod scalar;

pub use error::{FrameError, FrameResult};
pub use frame::Frame;
pub use scalar::Scalar;
