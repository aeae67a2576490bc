//! Domain types for the network compiler.
//!
//! These types represent validated feed values. All types enforce their
//! invariants at construction time, so code that receives them can trust
//! their validity.

mod route_type;
mod stop_id;
mod time;

pub use route_type::RouteType;
pub use stop_id::{InvalidStopId, StopId};
pub use time::{FeedTime, SECONDS_PER_DAY, TimeError, hours_to_seconds};
