#![feature(test)]

extern crate test;

use roadspeed::examples::VehiclePassGen;
use roadspeed::prelude::{Direction, Rect, RoadTracker, RoadTrackerOptions, SpeedTiming};
use test::Bencher;

#[bench]
fn bench_road_tracker_0001(b: &mut Bencher) {
    bench_passes(1, b);
}

#[bench]
fn bench_road_tracker_0010(b: &mut Bencher) {
    bench_passes(10, b);
}

#[bench]
fn bench_road_tracker_0050(b: &mut Bencher) {
    bench_passes(50, b);
}

fn bench_passes(vehicles: usize, b: &mut Bencher) {
    let (width, height, fps) = (1920.0, 1080.0, 30.0);

    // staggered single-vehicle passes: each one clears the frame and expires
    // before the next enters
    let mut frames: Vec<Vec<Rect>> = Vec::new();
    for v in 0..vehicles {
        let offset = v * 70;
        let pass = VehiclePassGen::new(Direction::LeftToRight, 400.0, 160.0, 56.0, 40.0, width)
            .split_chance(0.0);
        for (i, detections) in pass.enumerate() {
            while frames.len() <= offset + i {
                frames.push(Vec::new());
            }
            frames[offset + i].extend(detections);
        }
    }

    b.iter(|| {
        let mut tracker = RoadTracker::new(
            width,
            height,
            fps,
            RoadTrackerOptions::default().timing(SpeedTiming::FrameCount),
        )
        .unwrap();

        for (i, detections) in frames.iter().enumerate() {
            tracker.track(detections, i + 1);
        }
        tracker.wasted().len()
    });
}
