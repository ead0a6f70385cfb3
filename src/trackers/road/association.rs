use crate::trackers::road::track::VehicleTrack;
use crate::utils::rect::Rect;
use log::debug;

/// Mutable pool of one frame's candidate detections.
///
/// Detections carry no identity. Once consumed by a match they are removed
/// from consideration for the rest of the frame, so a rectangle claimed by one
/// track can neither feed another track nor spawn a new one.
///
#[derive(Debug, Clone, Default)]
pub struct DetectionPool {
    rects: Vec<Rect>,
}

impl DetectionPool {
    /// Builds the pool for one frame, dropping malformed detections.
    ///
    /// A rectangle with non-positive or non-finite dimensions, or lying fully
    /// outside the frame, is detector noise: it is rejected per-detection
    /// without aborting the frame.
    ///
    pub fn ingest(detections: &[Rect], frame_width: f32, frame_height: f32) -> Self {
        let mut rects = Vec::with_capacity(detections.len());
        for d in detections {
            if d.valid_for_frame(frame_width, frame_height) {
                rects.push(*d);
            } else {
                debug!("dropping malformed detection {d:?}");
            }
        }
        Self { rects }
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Removes every detection overlapping `probe` in x and returns their
    /// union.
    ///
    /// More than one overlapping detection means a single physical vehicle was
    /// fragmented by the detector (shadow, lane marking); the union
    /// re-assembles it into one rectangle.
    ///
    pub fn take_matching(&mut self, probe: &Rect) -> Option<Rect> {
        let mut merged: Option<Rect> = None;
        self.rects.retain(|r| {
            if probe.overlaps_x(r) {
                merged = Some(match merged {
                    Some(m) => m.union(r),
                    None => *r,
                });
                false
            } else {
                true
            }
        });
        merged
    }

    /// First remaining detection, if any. The spawn scan walks the pool in
    /// arrival order.
    pub fn peek_first(&self) -> Option<&Rect> {
        self.rects.first()
    }

    /// Drops the first remaining detection without consuming it into a track
    pub fn discard_first(&mut self) {
        if !self.rects.is_empty() {
            self.rects.remove(0);
        }
    }
}

/// Matches the pool against the track's last known position.
///
/// The probe rectangle is the last matched rectangle widened by `extension`
/// pixels ahead of the travel direction, which forgives the gap left when a
/// vehicle passes behind an obstruction. Every x-overlapping detection is
/// consumed and their union becomes the track's position for this frame.
///
/// No match is not an error, it is the normal occluded-or-departed case: the
/// track's unseen counter is advanced and its position is left unchanged.
///
pub fn associate(track: &mut VehicleTrack, pool: &mut DetectionPool, extension: f32) -> bool {
    let probe = track.last_rect().extend_ahead(track.direction(), extension);
    match pool.take_matching(&probe) {
        Some(merged) => {
            track.apply_match(merged);
            true
        }
        None => {
            track.miss();
            false
        }
    }
}
