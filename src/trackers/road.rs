use crate::utils::rect::Rect;

/// Association engine operating on the per-frame detection pool
pub mod association;

/// A single tracked vehicle with lifecycle state and speed bookkeeping
pub mod track;

/// Per-session tracker that owns the live vehicle tracks
pub mod tracker;

/// Default fraction of the frame width reserved on each side as a speed-zone boundary
pub const DEFAULT_EDGE_FRACTION: f32 = 0.10;

/// Default minimum width of a spawnable detection, as a fraction of the frame width
pub const DEFAULT_MIN_SPAWN_WIDTH_FRACTION: f32 = 0.075;

/// Default minimum height of a spawnable detection, as a fraction of the frame height
pub const DEFAULT_MIN_SPAWN_HEIGHT_FRACTION: f32 = 0.05;

/// Default number of consecutive unmatched frames after which a track is expired
pub const DEFAULT_MAX_UNSEEN_FRAMES: usize = 10;

/// Default forward extension of the association probe rectangle, pixels
pub const DEFAULT_ASSOCIATION_EXTENSION: f32 = 50.0;

/// Default scene calibration: how many pixels cover one foot of road
pub const DEFAULT_PIXELS_PER_FOOT: f32 = 4.1;

/// Default minimum feet of travel for a speed measurement to be trusted
pub const DEFAULT_MIN_TRAVEL_FEET: f32 = 100.0;

/// Default offset of the center line, compensates asymmetric vehicle silhouettes
pub const DEFAULT_CENTER_FUDGE: f32 = 10.0;

/// Default tolerance of the center-line crossing check, pixels
pub const DEFAULT_CENTER_TOLERANCE: f32 = 30.0;

pub(crate) const FEET_PER_MILE: f32 = 5280.0;
pub(crate) const SECONDS_PER_HOUR: f32 = 3600.0;

/// Travel direction of a vehicle, fixed when the track is created
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    LeftToRight,
    RightToLeft,
}

impl Direction {
    pub fn signum(&self) -> i32 {
        match self {
            Direction::LeftToRight => 1,
            Direction::RightToLeft => -1,
        }
    }

    /// Single-character direction marker used in log lines
    pub fn glyph(&self) -> char {
        match self {
            Direction::LeftToRight => '>',
            Direction::RightToLeft => '<',
        }
    }
}

/// Lifecycle state of a tracked vehicle.
///
/// Transitions are monotonic, `New → Active → Done`, each firing at most once
/// per track.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VehicleState {
    /// Entered the frame but not yet crossed the start boundary
    New,
    /// Crossed the start boundary, speed measurement in progress
    Active,
    /// Crossed the stop boundary, speed result finalized
    Done,
}

/// Elapsed-time source for the speed formula
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpeedTiming {
    /// Wall-clock deltas. Assumes frames are processed at roughly their
    /// capture cadence; sustained processing lag biases the estimate.
    #[default]
    WallClock,
    /// Frame-count deltas divided by the nominal fps. Insensitive to
    /// processing lag, wrong when the source drops frames.
    FrameCount,
}

/// Scene calibration handed to the speed meter when a measurement is finalized
///
#[derive(Clone, Copy, Debug)]
pub struct SpeedCalibration {
    pub pixels_per_foot: f32,
    pub min_travel_feet: f32,
    pub timing: SpeedTiming,
    pub fps: f32,
}

/// Class that is used to configure the road tracker
#[derive(Debug, Clone)]
pub struct RoadTrackerOptions {
    pub(crate) edge_fraction: f32,
    pub(crate) min_spawn_width_fraction: f32,
    pub(crate) min_spawn_height_fraction: f32,
    pub(crate) max_unseen_frames: usize,
    pub(crate) association_extension: f32,
    pub(crate) pixels_per_foot: f32,
    pub(crate) min_travel_feet: f32,
    pub(crate) timing: SpeedTiming,
    pub(crate) center_fudge: f32,
    pub(crate) center_tolerance: f32,
}

impl RoadTrackerOptions {
    /// The fraction of the frame width reserved on each side of the frame as
    /// the speed-zone boundaries.
    ///
    /// With a 640 px frame and a fraction of `0.10` the measurement zone spans
    /// x ∈ [64, 576]: timing starts when the leading edge passes the boundary
    /// behind the travel direction and stops at the boundary ahead of it.
    ///
    pub fn edge_fraction(mut self, fraction: f32) -> Self {
        self.edge_fraction = fraction;
        self
    }

    /// Minimum width of a detection eligible to spawn a track, as a fraction
    /// of the frame width. Undersized leftovers are noise, not vehicles.
    ///
    pub fn min_spawn_width_fraction(mut self, fraction: f32) -> Self {
        self.min_spawn_width_fraction = fraction;
        self
    }

    /// Minimum height of a detection eligible to spawn a track, as a fraction
    /// of the frame height.
    ///
    pub fn min_spawn_height_fraction(mut self, fraction: f32) -> Self {
        self.min_spawn_height_fraction = fraction;
        self
    }

    /// The number of consecutive frames a track survives without a matching
    /// detection before it is removed.
    ///
    pub fn max_unseen_frames(mut self, n: usize) -> Self {
        self.max_unseen_frames = n;
        self
    }

    /// How far, in pixels, the association probe is extended ahead of the
    /// track's travel direction. Larger values forgive longer occlusions
    /// (trees, posts) at the cost of more aggressive merging.
    ///
    pub fn association_extension(mut self, pixels: f32) -> Self {
        self.association_extension = pixels;
        self
    }

    /// Scene calibration: how many pixels of the frame cover one foot of road.
    ///
    pub fn pixels_per_foot(mut self, pixels: f32) -> Self {
        self.pixels_per_foot = pixels;
        self
    }

    /// Minimum feet of travel between the start and stop boundaries for a
    /// measurement to be kept. A shorter traverse is assumed to be detector
    /// noise or a merge artifact and finalizes with a speed of zero.
    ///
    pub fn min_travel_feet(mut self, feet: f32) -> Self {
        self.min_travel_feet = feet;
        self
    }

    /// Selects the elapsed-time source for the speed formula, see [SpeedTiming].
    ///
    pub fn timing(mut self, timing: SpeedTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Offset applied to the frame center line before the center-crossing
    /// check, pixels. Improves the framing of photos taken at the crossing.
    ///
    pub fn center_fudge(mut self, pixels: f32) -> Self {
        self.center_fudge = pixels;
        self
    }

    /// Tolerance of the center-line crossing check, pixels.
    ///
    pub fn center_tolerance(mut self, pixels: f32) -> Self {
        self.center_tolerance = pixels;
        self
    }
}

impl Default for RoadTrackerOptions {
    fn default() -> Self {
        Self {
            edge_fraction: DEFAULT_EDGE_FRACTION,
            min_spawn_width_fraction: DEFAULT_MIN_SPAWN_WIDTH_FRACTION,
            min_spawn_height_fraction: DEFAULT_MIN_SPAWN_HEIGHT_FRACTION,
            max_unseen_frames: DEFAULT_MAX_UNSEEN_FRAMES,
            association_extension: DEFAULT_ASSOCIATION_EXTENSION,
            pixels_per_foot: DEFAULT_PIXELS_PER_FOOT,
            min_travel_feet: DEFAULT_MIN_TRAVEL_FEET,
            timing: SpeedTiming::default(),
            center_fudge: DEFAULT_CENTER_FUDGE,
            center_tolerance: DEFAULT_CENTER_TOLERANCE,
        }
    }
}

/// Point-in-time view of a tracked vehicle handed to the caller each frame
///
#[derive(Debug, Clone)]
pub struct VehicleRecord {
    /// id of the track
    ///
    pub id: u64,
    /// travel direction, fixed at creation
    ///
    pub direction: Direction,
    /// lifecycle state
    ///
    pub state: VehicleState,
    /// the last matched rectangle
    ///
    pub rect: Rect,
    /// measured speed; `0.0` until finalized or when rejected as noise
    ///
    pub speed_mph: f32,
    /// frame at which the vehicle center passed the frame center line
    ///
    pub center_frame: Option<usize>,
    /// frame at which the measurement finished
    ///
    pub done_frame: Option<usize>,
    /// frame at which the track was created
    ///
    pub start_frame: usize,
    /// consecutive frames without a matching detection
    ///
    pub frames_unseen: usize,
    /// number of rectangles accumulated in the track history
    ///
    pub length: usize,
}
