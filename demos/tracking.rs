use roadspeed::examples::VehiclePassGen;
use roadspeed::prelude::{Direction, RoadTracker, RoadTrackerOptions, SpeedTiming};

fn main() {
    env_logger::init();

    let (width, height, fps) = (640.0, 480.0, 30.0);

    // frame-count timing: the pass below is synthetic, there is no capture
    // cadence for the wall clock to follow
    let mut tracker = RoadTracker::new(
        width,
        height,
        fps,
        RoadTrackerOptions::default().timing(SpeedTiming::FrameCount),
    )
    .unwrap();

    let pass = VehiclePassGen::new(Direction::LeftToRight, 220.0, 64.0, 36.0, 24.0, width);

    let mut frame_number = 0;
    for detections in pass {
        frame_number += 1;
        for record in tracker.track(&detections, frame_number) {
            println!(
                "frame {:4} [{}] {} {:?} rect:({:.0},{:.0} {:.0}x{:.0}) mph:{:.1}",
                frame_number,
                record.id,
                record.direction.glyph(),
                record.state,
                record.rect.x,
                record.rect.y,
                record.rect.width,
                record.rect.height,
                record.speed_mph
            );
        }
    }

    // let the staleness rule flush the finished pass
    for _ in 0..12 {
        frame_number += 1;
        tracker.track(&[], frame_number);
    }

    for track in tracker.wasted() {
        println!(
            "vehicle [{}] finished: {:?} mph:{:.1} center_frame:{:?} done_frame:{:?}",
            track.id(),
            track.state(),
            track.speed_mph(),
            track.center_frame(),
            track.done_frame()
        );
    }
}
