//! External-bit back-propagation and time-series request planning (spec
//! §4.4, §4.5).

mod backprop;
mod error;
mod planner;
mod request;

pub use backprop::back_propagate;
pub use error::{PlanError, PlanResult};
pub use planner::plan;
pub use request::{Datatype, TimeSeriesRequest};
