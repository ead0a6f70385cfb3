use crate::trackers;
use crate::utils;

pub use trackers::road::track::VehicleTrack;
pub use trackers::road::tracker::RoadTracker;
pub use trackers::road::{
    Direction, RoadTrackerOptions, SpeedTiming, VehicleRecord, VehicleState,
};
pub use utils::rect::Rect;
