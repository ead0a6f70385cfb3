use roadspeed::examples::VehiclePassGen;
use roadspeed::prelude::{
    Direction, Rect, RoadTracker, RoadTrackerOptions, SpeedTiming, VehicleState,
};

fn main() {
    env_logger::init();

    let (width, height, fps) = (1280.0, 720.0, 25.0);

    let options = RoadTrackerOptions::default()
        .timing(SpeedTiming::FrameCount)
        .pixels_per_foot(6.3);
    let mut tracker = RoadTracker::new(width, height, fps, options).unwrap();

    let mut eastbound =
        VehiclePassGen::new(Direction::LeftToRight, 300.0, 120.0, 60.0, 35.0, width)
            .split_chance(0.3);
    let mut westbound =
        VehiclePassGen::new(Direction::RightToLeft, 380.0, 110.0, 55.0, 28.0, width);

    // the passes are staggered: x-overlap association cannot tell two
    // vehicles apart while they cross each other in the frame
    for frame_number in 1..=110 {
        let mut detections: Vec<Rect> = Vec::new();
        detections.extend(eastbound.next().unwrap_or_default());
        if frame_number > 50 {
            detections.extend(westbound.next().unwrap_or_default());
        }
        tracker.track(&detections, frame_number);
    }

    for track in tracker.wasted() {
        match track.state() {
            VehicleState::Done => println!(
                "[{}] {} {:.1} mph ({} observations, done at frame {})",
                track.id(),
                track.direction().glyph(),
                track.speed_mph(),
                track.history().len(),
                track.done_frame().unwrap()
            ),
            state => println!("[{}] incomplete pass, expired while {state:?}", track.id()),
        }
    }
}
