use crate::trackers::road::{
    Direction, SpeedCalibration, SpeedTiming, VehicleState, FEET_PER_MILE, SECONDS_PER_HOUR,
};
use crate::utils::rect::Rect;
use log::{debug, warn};
use std::time::Instant;

/// A vehicle being tracked as it moves through the frame.
///
/// The track owns its rectangle history exclusively. The history is seeded at
/// construction and only ever grows by append, so `last_rect` is always
/// available.
///
#[derive(Debug, Clone)]
pub struct VehicleTrack {
    id: u64,
    direction: Direction,
    rects: Vec<Rect>,
    start_frame: usize,
    state: VehicleState,
    frames_unseen: usize,
    speed_mph: f32,
    speed_start_edge: Option<f32>,
    speed_start_frame: Option<usize>,
    speed_start_time: Option<Instant>,
    center_frame: Option<usize>,
    done_frame: Option<usize>,
}

impl VehicleTrack {
    /// Creates a new track seeded with the detection that spawned it
    ///
    /// # Parameters
    /// * `id` - unique track id, assigned by the tracker, never reused
    /// * `direction` - travel direction derived from the entry edge
    /// * `rect` - the spawning detection rectangle
    /// * `start_frame` - frame number the track was created at
    ///
    pub fn new(id: u64, direction: Direction, rect: Rect, start_frame: usize) -> Self {
        Self {
            id,
            direction,
            rects: vec![rect],
            start_frame,
            state: VehicleState::New,
            frames_unseen: 0,
            speed_mph: 0.0,
            speed_start_edge: None,
            speed_start_frame: None,
            speed_start_time: None,
            center_frame: None,
            done_frame: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn state(&self) -> VehicleState {
        self.state
    }

    /// Measured speed; `0.0` until finalized or when rejected as noise
    pub fn speed_mph(&self) -> f32 {
        self.speed_mph
    }

    pub fn frames_unseen(&self) -> usize {
        self.frames_unseen
    }

    pub fn center_frame(&self) -> Option<usize> {
        self.center_frame
    }

    pub fn done_frame(&self) -> Option<usize> {
        self.done_frame
    }

    pub fn start_frame(&self) -> usize {
        self.start_frame
    }

    /// Matched rectangles in temporal order
    pub fn history(&self) -> &[Rect] {
        &self.rects
    }

    pub fn last_rect(&self) -> &Rect {
        self.rects.last().unwrap()
    }

    /// The x coordinate of the rectangle side facing the travel direction
    pub fn leading_edge(&self) -> f32 {
        self.last_rect().leading_edge(self.direction)
    }

    /// Track age in frames
    pub fn age(&self, frame_number: usize) -> usize {
        frame_number.saturating_sub(self.start_frame)
    }

    /// Appends a matched rectangle and resets the unseen counter
    pub(crate) fn apply_match(&mut self, rect: Rect) {
        self.rects.push(rect);
        self.frames_unseen = 0;
    }

    /// Counts a frame with no matching detection. Not an error, the vehicle is
    /// occluded or has departed.
    pub(crate) fn miss(&mut self) {
        self.frames_unseen += 1;
    }

    /// Enters the measurement zone: records the leading edge, the frame number
    /// and the wall-clock instant.
    pub(crate) fn start_speed(&mut self, frame_number: usize) {
        if self.state != VehicleState::New {
            warn!("start_speed: track [{}] state is not new", self.id);
            return;
        }

        self.state = VehicleState::Active;
        self.speed_start_edge = Some(self.leading_edge());
        self.speed_start_frame = Some(frame_number);
        self.speed_start_time = Some(Instant::now());
    }

    /// Leaves the measurement zone: finalizes the speed estimate.
    ///
    /// A traverse shorter than `calibration.min_travel_feet` is rejected as
    /// noise and the speed stays `0.0`. A zero-length timing window also
    /// yields `0.0`.
    pub(crate) fn stop_speed(&mut self, frame_number: usize, calibration: &SpeedCalibration) {
        if self.state != VehicleState::Active {
            warn!("stop_speed: track [{}] state is not active", self.id);
            return;
        }

        let edge = self.leading_edge();
        let start_edge = self.speed_start_edge.unwrap();
        let pixels = (edge - start_edge).abs();
        let feet = pixels / calibration.pixels_per_foot;
        let miles = feet / FEET_PER_MILE;

        let secs = match calibration.timing {
            SpeedTiming::WallClock => self.speed_start_time.unwrap().elapsed().as_secs_f32(),
            SpeedTiming::FrameCount => {
                frame_number.saturating_sub(self.speed_start_frame.unwrap()) as f32
                    / calibration.fps
            }
        };

        let mph = if secs > 0.0 {
            miles / (secs / SECONDS_PER_HOUR)
        } else {
            debug!("stop_speed: track [{}] zero-length timing window", self.id);
            0.0
        };

        if feet > calibration.min_travel_feet {
            self.speed_mph = mph;
            debug!(
                "{} [{}] {} mph:{:.1} px:{:.0} ({:.0}->{:.0}) ft:{:.1} s:{:.2}",
                frame_number,
                self.id,
                self.direction.glyph(),
                mph,
                pixels,
                start_edge,
                edge,
                feet,
                secs
            );
        } else {
            self.speed_mph = 0.0;
        }

        self.state = VehicleState::Done;
        self.done_frame = Some(frame_number);
    }

    /// One-shot center-line marker. Lets a collaborator capture a well-framed
    /// photo of the vehicle; no effect on the lifecycle state.
    pub(crate) fn mark_center(&mut self, frame_number: usize) {
        if self.center_frame.is_none() {
            self.center_frame = Some(frame_number);
        }
    }
}
