mod index;
pub mod layout;
mod materialize;
mod planner;
mod views;

pub use index::BucketIndex;
pub use materialize::{copy_new, move_new, Materializer, PlacementStats};
pub use planner::{PlacementAction, PlacementDecision, PlacementPlanner};
pub use views::{build_alphabetical_view, flatten_buckets, FlattenStats};
