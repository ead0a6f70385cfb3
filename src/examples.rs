use crate::trackers::road::Direction;
use crate::utils::rect::Rect;
use rand::distributions::Uniform;
use rand::prelude::ThreadRng;
use rand::Rng;

/// Synthetic per-frame detection stream for one vehicle pass.
///
/// Drives a rectangle across the frame at a fixed pixel step with jittered
/// geometry, occasionally splitting it into two fragments the way shadows and
/// lane markings fragment real detector output. Yields one detection list per
/// frame until the rectangle has fully left the frame.
///
pub struct VehiclePassGen {
    rect: Rect,
    direction: Direction,
    step: f32,
    frame_width: f32,
    jitter: Uniform<f32>,
    split_chance: f64,
    rng: ThreadRng,
}

impl VehiclePassGen {
    /// Creates a generator entering at the edge implied by `direction`
    ///
    /// # Parameters
    /// * `direction` - travel direction; also selects the entry edge
    /// * `y`, `width`, `height` - geometry of the synthetic silhouette
    /// * `step` - pixels moved per frame
    /// * `frame_width` - frame width the pass crosses
    ///
    pub fn new(
        direction: Direction,
        y: f32,
        width: f32,
        height: f32,
        step: f32,
        frame_width: f32,
    ) -> Self {
        let x = match direction {
            Direction::LeftToRight => 0.0,
            Direction::RightToLeft => frame_width - width,
        };
        Self {
            rect: Rect::new(x, y, width, height),
            direction,
            step,
            frame_width,
            jitter: Uniform::new(-2.0, 2.0),
            split_chance: 0.2,
            rng: rand::thread_rng(),
        }
    }

    /// Probability that a frame yields two fragments instead of one rectangle
    pub fn split_chance(mut self, chance: f64) -> Self {
        self.split_chance = chance;
        self
    }
}

impl Iterator for VehiclePassGen {
    type Item = Vec<Rect>;

    fn next(&mut self) -> Option<Vec<Rect>> {
        if self.rect.right() < 0.0 || self.rect.x > self.frame_width {
            return None;
        }

        let jitter = self.rng.sample(self.jitter);
        let shown = Rect::new(
            self.rect.x,
            self.rect.y + jitter,
            self.rect.width,
            self.rect.height,
        );

        // never split while touching an entry/exit edge: an edge frame must
        // stay whole to pass the tracker's spawn size gate
        let splittable = shown.width > 20.0 && shown.x > 0.0 && shown.right() < self.frame_width;

        let out = if splittable && self.rng.gen_bool(self.split_chance) {
            // fragment the silhouette in two, leaving a small gap
            let cut = (shown.width * 0.45).floor();
            vec![
                Rect::new(shown.x, shown.y, cut, shown.height),
                Rect::new(
                    shown.x + cut + 4.0,
                    shown.y,
                    shown.width - cut - 4.0,
                    shown.height,
                ),
            ]
        } else {
            vec![shown]
        };

        self.rect.x += self.step * self.direction.signum() as f32;
        Some(out)
    }
}

#[cfg(test)]
mod gen_tests {
    use crate::examples::VehiclePassGen;
    use crate::trackers::road::Direction;

    #[test]
    fn pass_crosses_the_frame_and_ends() {
        let pass = VehiclePassGen::new(Direction::LeftToRight, 200.0, 80.0, 40.0, 25.0, 640.0)
            .split_chance(0.5);

        let frames: Vec<_> = pass.collect();
        assert!(frames.len() >= (640.0_f32 / 25.0) as usize);
        assert!(frames.iter().all(|dets| !dets.is_empty() && dets.len() <= 2));
        // enters touching the left edge so the tracker can spawn from it
        assert_eq!(frames[0][0].x, 0.0);
    }
}
