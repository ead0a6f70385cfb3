use crate::trackers::road::association::{associate, DetectionPool};
use crate::trackers::road::track::VehicleTrack;
use crate::trackers::road::{
    Direction, RoadTrackerOptions, SpeedCalibration, SpeedTiming, VehicleRecord, VehicleState,
};
use crate::utils::rect::Rect;
use crate::Errors;
use anyhow::Result;
use itertools::Itertools;
use log::{debug, warn};

/// Per-session registry that owns the live vehicle tracks.
///
/// One caller owns the tracker and drives it with a single [track](RoadTracker::track)
/// call per frame; all work for frame N completes before frame N+1 begins.
/// Geometry and configuration are fixed at construction.
///
pub struct RoadTracker {
    width: f32,
    height: f32,
    left_edge: f32,
    right_edge: f32,
    min_spawn_width: f32,
    min_spawn_height: f32,
    center_x: f32,
    center_tolerance: f32,
    association_extension: f32,
    max_unseen_frames: usize,
    calibration: SpeedCalibration,
    tracks: Vec<VehicleTrack>,
    wasted: Vec<VehicleTrack>,
    next_id: u64,
}

impl RoadTracker {
    /// Creates a new tracker for one video session
    ///
    /// # Parameters
    /// * `width`, `height` - frame geometry in pixels, fixed for the session
    /// * `fps` - nominal capture rate; consumed by the frame-count timing strategy, descriptive otherwise
    /// * `options` - tracker configuration, see [RoadTrackerOptions]
    ///
    pub fn new(width: f32, height: f32, fps: f32, options: RoadTrackerOptions) -> Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(Errors::InvalidFrameGeometry(width, height).into());
        }
        if !(options.edge_fraction > 0.0 && options.edge_fraction < 0.5) {
            return Err(Errors::InvalidEdgeFraction(options.edge_fraction).into());
        }
        for fraction in [
            options.min_spawn_width_fraction,
            options.min_spawn_height_fraction,
        ] {
            if !(fraction > 0.0 && fraction < 1.0) {
                return Err(Errors::InvalidSpawnFraction(fraction).into());
            }
        }
        if !(options.pixels_per_foot > 0.0) {
            return Err(Errors::InvalidCalibration(options.pixels_per_foot).into());
        }
        if options.timing == SpeedTiming::FrameCount && !(fps > 0.0) {
            return Err(Errors::InvalidFps(fps).into());
        }

        let edge_size = width * options.edge_fraction;
        let left_edge = edge_size;
        let right_edge = width - edge_size;
        let min_spawn_width = width * options.min_spawn_width_fraction;
        let min_spawn_height = height * options.min_spawn_height_fraction;
        let center_x = width / 2.0 - options.center_fudge;

        debug!(
            "RoadTracker left:{left_edge:.0} right:{right_edge:.0} minw:{min_spawn_width:.0} minh:{min_spawn_height:.0}"
        );

        Ok(Self {
            width,
            height,
            left_edge,
            right_edge,
            min_spawn_width,
            min_spawn_height,
            center_x,
            center_tolerance: options.center_tolerance,
            association_extension: options.association_extension,
            max_unseen_frames: options.max_unseen_frames,
            calibration: SpeedCalibration {
                pixels_per_foot: options.pixels_per_foot,
                min_travel_feet: options.min_travel_feet,
                timing: options.timing,
                fps,
            },
            tracks: Vec::new(),
            wasted: Vec::new(),
            next_id: 0,
        })
    }

    /// Feeds one frame of detections and returns the current set of live tracks
    ///
    /// # Parameters
    /// * `detections` - candidate rectangles from the detector, no identity
    /// * `frame_number` - monotonically increasing frame counter
    ///
    pub fn track(&mut self, detections: &[Rect], frame_number: usize) -> Vec<VehicleRecord> {
        let mut pool = DetectionPool::ingest(detections, self.width, self.height);

        let extension = self.association_extension;
        let (left_edge, right_edge) = (self.left_edge, self.right_edge);
        let (center_x, center_tolerance) = (self.center_x, self.center_tolerance);
        let calibration = self.calibration;

        // creation order: earlier tracks get first pick of the pool
        for track in self.tracks.iter_mut() {
            associate(track, &mut pool, extension);
            check_speed_zone(track, left_edge, right_edge, &calibration, frame_number);
            check_center(track, center_x, center_tolerance, frame_number);
        }

        self.remove_stale(frame_number);
        self.spawn_new(&mut pool, frame_number);

        if !self.tracks.is_empty() {
            debug!(
                "frame {}: live tracks [{}]",
                frame_number,
                self.tracks.iter().map(|t| t.id()).join(", ")
            );
        }

        self.tracks.iter().map(VehicleRecord::from).collect()
    }

    /// Tracks removed by the staleness rule since the last call.
    ///
    /// A track that expired while `Active` carries an incomplete measurement -
    /// the vehicle left the observed road before crossing the exit boundary.
    ///
    pub fn wasted(&mut self) -> Vec<VehicleTrack> {
        std::mem::take(&mut self.wasted)
    }

    /// Live tracks in creation order
    pub fn live(&self) -> &[VehicleTrack] {
        &self.tracks
    }

    pub fn left_edge(&self) -> f32 {
        self.left_edge
    }

    pub fn right_edge(&self) -> f32 {
        self.right_edge
    }

    pub fn min_spawn_width(&self) -> f32 {
        self.min_spawn_width
    }

    pub fn min_spawn_height(&self) -> f32 {
        self.min_spawn_height
    }

    fn remove_stale(&mut self, frame_number: usize) {
        let max_unseen_frames = self.max_unseen_frames;
        let (stale, live): (Vec<_>, Vec<_>) = self
            .tracks
            .drain(..)
            .partition(|t| t.frames_unseen() >= max_unseen_frames);

        for track in stale {
            if track.state() == VehicleState::Active {
                // started timing but never crossed the exit boundary, e.g. a
                // vehicle turning onto a cross street
                let first = track.history().first().unwrap();
                let last = track.last_rect();
                warn!(
                    "{} active vehicle [{}] exit ({:.0} {:.0})-({:.0} {:.0}) unseen:{} age:{}",
                    frame_number,
                    track.id(),
                    first.x,
                    first.right(),
                    last.x,
                    last.right(),
                    track.frames_unseen(),
                    track.age(frame_number)
                );
            }
            self.wasted.push(track);
        }

        self.tracks = live;
    }

    fn spawn_new(&mut self, pool: &mut DetectionPool, frame_number: usize) {
        while let Some(first) = pool.peek_first().copied() {
            if first.width <= self.min_spawn_width || first.height <= self.min_spawn_height {
                pool.discard_first();
                continue;
            }

            // vehicles only enter at the frame edges; a mid-frame leftover is
            // noise or an already-tracked fragment
            let direction = if first.x <= 0.0 {
                Direction::LeftToRight
            } else if first.right() >= self.width {
                Direction::RightToLeft
            } else {
                pool.discard_first();
                continue;
            };

            let id = self.next_id;
            self.next_id += 1;

            let mut track = VehicleTrack::new(id, direction, first, frame_number);
            // the seed is still in the pool: the newborn's first association
            // consumes it together with any sibling fragments of the vehicle
            associate(&mut track, pool, self.association_extension);

            debug!(
                "{} added vehicle [{}] {} {:?}",
                frame_number,
                id,
                direction.glyph(),
                first
            );
            self.tracks.push(track);
        }
    }
}

fn check_speed_zone(
    track: &mut VehicleTrack,
    left_edge: f32,
    right_edge: f32,
    calibration: &SpeedCalibration,
    frame_number: usize,
) {
    let rect = *track.last_rect();

    if track.state() == VehicleState::New {
        let crossed = match track.direction() {
            Direction::LeftToRight => rect.right() > left_edge,
            Direction::RightToLeft => rect.x < right_edge,
        };
        if crossed {
            track.start_speed(frame_number);
        }
    }

    // deliberately re-checked in the same frame: a fast vehicle may cross
    // both boundaries between two observations
    if track.state() == VehicleState::Active {
        let crossed = match track.direction() {
            Direction::LeftToRight => rect.right() > right_edge,
            Direction::RightToLeft => rect.x < left_edge,
        };
        if crossed {
            track.stop_speed(frame_number, calibration);
        }
    }
}

fn check_center(track: &mut VehicleTrack, center_x: f32, tolerance: f32, frame_number: usize) {
    if track.center_frame().is_none()
        && (track.last_rect().center_x() - center_x).abs() < tolerance
    {
        track.mark_center(frame_number);
    }
}

impl From<&VehicleTrack> for VehicleRecord {
    fn from(track: &VehicleTrack) -> Self {
        VehicleRecord {
            id: track.id(),
            direction: track.direction(),
            state: track.state(),
            rect: *track.last_rect(),
            speed_mph: track.speed_mph(),
            center_frame: track.center_frame(),
            done_frame: track.done_frame(),
            start_frame: track.start_frame(),
            frames_unseen: track.frames_unseen(),
            length: track.history().len(),
        }
    }
}

#[cfg(test)]
mod tracker_tests {
    use crate::trackers::road::tracker::RoadTracker;
    use crate::trackers::road::{Direction, RoadTrackerOptions, SpeedTiming, VehicleState};
    use crate::utils::rect::Rect;

    fn tracker() -> RoadTracker {
        RoadTracker::new(
            640.0,
            480.0,
            30.0,
            RoadTrackerOptions::default().timing(SpeedTiming::FrameCount),
        )
        .unwrap()
    }

    #[test]
    fn derived_geometry() {
        let t = tracker();
        assert_eq!(t.left_edge(), 64.0);
        assert_eq!(t.right_edge(), 576.0);
        assert_eq!(t.min_spawn_width(), 48.0);
        assert_eq!(t.min_spawn_height(), 24.0);
    }

    #[test]
    fn rejects_invalid_configuration() {
        let opts = RoadTrackerOptions::default;
        assert!(RoadTracker::new(0.0, 480.0, 30.0, opts()).is_err());
        assert!(RoadTracker::new(640.0, f32::NAN, 30.0, opts()).is_err());
        assert!(RoadTracker::new(640.0, 480.0, 30.0, opts().edge_fraction(0.6)).is_err());
        assert!(RoadTracker::new(640.0, 480.0, 30.0, opts().min_spawn_width_fraction(0.0)).is_err());
        assert!(RoadTracker::new(640.0, 480.0, 30.0, opts().pixels_per_foot(0.0)).is_err());
        assert!(
            RoadTracker::new(640.0, 480.0, 0.0, opts().timing(SpeedTiming::FrameCount)).is_err()
        );
        // the wall-clock strategy never consumes fps
        assert!(RoadTracker::new(640.0, 480.0, 0.0, opts()).is_ok());
    }

    #[test]
    fn undersized_edge_detection_does_not_spawn() {
        let mut t = tracker();
        let records = t.track(&[Rect::new(0.0, 200.0, 10.0, 10.0)], 1);
        assert!(records.is_empty());
    }

    #[test]
    fn mid_frame_detection_never_spawns() {
        let mut t = tracker();
        // large enough, but touches neither frame edge
        let records = t.track(&[Rect::new(300.0, 200.0, 80.0, 40.0)], 1);
        assert!(records.is_empty());
    }

    #[test]
    fn spawns_left_to_right_at_left_edge() {
        let mut t = tracker();
        let records = t.track(&[Rect::new(0.0, 200.0, 80.0, 40.0)], 1);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 0);
        assert_eq!(records[0].direction, Direction::LeftToRight);
        assert_eq!(records[0].state, VehicleState::New);
        assert_eq!(records[0].start_frame, 1);
        // seed plus the newborn's first association round
        assert_eq!(records[0].length, 2);
    }

    #[test]
    fn spawns_right_to_left_at_right_edge() {
        let mut t = tracker();
        let records = t.track(&[Rect::new(580.0, 200.0, 60.0, 30.0)], 1);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].direction, Direction::RightToLeft);
    }

    #[test]
    fn consumed_detection_cannot_spawn_a_second_track() {
        let mut t = tracker();
        t.track(&[Rect::new(0.0, 200.0, 80.0, 40.0)], 1);

        // qualifies for spawning on its own, but the existing track claims it
        let records = t.track(&[Rect::new(0.0, 210.0, 90.0, 40.0)], 2);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 0);
        assert_eq!(records[0].length, 3);
    }

    #[test]
    fn fragments_merge_into_one_vehicle() {
        let mut t = tracker();
        t.track(&[Rect::new(0.0, 200.0, 80.0, 40.0)], 1);

        // one vehicle split by a shadow into two detections
        let records = t.track(
            &[
                Rect::new(10.0, 200.0, 40.0, 40.0),
                Rect::new(60.0, 205.0, 50.0, 35.0),
            ],
            2,
        );

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rect, Rect::new(10.0, 200.0, 100.0, 40.0));
    }

    #[test]
    fn stale_track_removed_exactly_at_threshold() {
        let mut t = tracker();
        t.track(&[Rect::new(0.0, 200.0, 80.0, 40.0)], 1);

        for frame in 2..=10 {
            let records = t.track(&[], frame);
            assert_eq!(records.len(), 1, "frame {frame}");
            assert_eq!(records[0].frames_unseen, frame - 1);
        }

        // the tenth consecutive miss expires the track
        let records = t.track(&[], 11);
        assert!(records.is_empty());

        let wasted = t.wasted();
        assert_eq!(wasted.len(), 1);
        assert_eq!(wasted[0].id(), 0);
        assert!(t.wasted().is_empty());
    }

    #[test]
    fn full_pass_measures_speed() {
        let mut t = tracker();

        // enters at the left edge, short of the start boundary at x=64
        let records = t.track(&[Rect::new(0.0, 200.0, 50.0, 30.0)], 1);
        assert_eq!(records[0].state, VehicleState::New);

        // leading edge 70 crosses the start boundary
        let records = t.track(&[Rect::new(20.0, 200.0, 50.0, 30.0)], 2);
        assert_eq!(records[0].state, VehicleState::Active);

        let mut last = Vec::new();
        for frame in 3..=19 {
            let x = 20.0 + 30.0 * (frame - 2) as f32;
            last = t.track(&[Rect::new(x, 200.0, 50.0, 30.0)], frame);
            if frame < 19 {
                assert_eq!(last[0].state, VehicleState::Active, "frame {frame}");
            }
        }

        // leading edge 580 crossed the stop boundary at x=576 on frame 19
        assert_eq!(last[0].state, VehicleState::Done);
        assert_eq!(last[0].done_frame, Some(19));
        assert_eq!(last[0].center_frame, Some(10));
        // 510 px / 4.1 px-per-ft over 17 frames at 30 fps
        assert!((last[0].speed_mph - 149.67).abs() < 0.05);

        // a finished track stays visible until the staleness rule removes it
        for frame in 20..=28 {
            assert_eq!(t.track(&[], frame).len(), 1);
        }
        assert!(t.track(&[], 29).is_empty());

        let wasted = t.wasted();
        assert_eq!(wasted.len(), 1);
        assert_eq!(wasted[0].state(), VehicleState::Done);
        assert!((wasted[0].speed_mph() - 149.67).abs() < 0.05);
    }

    #[test]
    fn right_to_left_pass_measures_speed() {
        let mut t = tracker();

        // enters at the right edge; x=580 is still right of the start boundary
        let records = t.track(&[Rect::new(580.0, 200.0, 60.0, 30.0)], 1);
        assert_eq!(records[0].state, VehicleState::New);

        let mut last = Vec::new();
        for frame in 2..=19 {
            let x = 580.0 - 30.0 * (frame - 1) as f32;
            last = t.track(&[Rect::new(x, 200.0, 60.0, 30.0)], frame);
        }

        // x=40 crossed the stop boundary at x=64 on frame 19
        assert_eq!(last[0].direction, Direction::RightToLeft);
        assert_eq!(last[0].state, VehicleState::Done);
        assert!(last[0].speed_mph > 0.0);
    }

    #[test]
    fn too_short_traverse_finalizes_with_zero_speed() {
        // pixels-per-foot calibration that turns the whole zone into ~51 ft
        let mut t = RoadTracker::new(
            640.0,
            480.0,
            30.0,
            RoadTrackerOptions::default()
                .timing(SpeedTiming::FrameCount)
                .pixels_per_foot(10.0),
        )
        .unwrap();

        t.track(&[Rect::new(0.0, 200.0, 50.0, 30.0)], 1);

        let mut last = Vec::new();
        for frame in 2..=8 {
            let x = 20.0 + 90.0 * (frame - 2) as f32;
            last = t.track(&[Rect::new(x, 200.0, 50.0, 30.0)], frame);
        }

        assert_eq!(last[0].state, VehicleState::Done);
        assert_eq!(last[0].speed_mph, 0.0);
    }

    #[test]
    fn active_exit_surfaces_via_wasted() {
        let mut t = tracker();

        t.track(&[Rect::new(0.0, 200.0, 80.0, 40.0)], 1);
        // crosses the start boundary, then disappears (turned off the road)
        let records = t.track(&[Rect::new(30.0, 200.0, 80.0, 40.0)], 2);
        assert_eq!(records[0].state, VehicleState::Active);

        for frame in 3..=12 {
            t.track(&[], frame);
        }

        let wasted = t.wasted();
        assert_eq!(wasted.len(), 1);
        assert_eq!(wasted[0].state(), VehicleState::Active);
        assert_eq!(wasted[0].speed_mph(), 0.0);
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut t = tracker();

        t.track(&[Rect::new(0.0, 200.0, 80.0, 40.0)], 1);
        for frame in 2..=11 {
            t.track(&[], frame);
        }
        assert!(t.live().is_empty());

        let records = t.track(&[Rect::new(0.0, 300.0, 80.0, 40.0)], 12);
        assert_eq!(records[0].id, 1);
    }
}
