use crate::trackers::road::Direction;
use crate::EstimateClose;

/// Bounding rectangle in the format (x, y, width, height), frame pixel units
///
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Constructor
    ///
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// True if the two rectangles overlap in the x interval.
    ///
    /// The vertical extent is deliberately ignored: in a near-horizontal lane
    /// the x interval is the discriminating signal, y is not.
    ///
    pub fn overlaps_x(&self, other: &Rect) -> bool {
        self.right() > other.x && self.x < other.right()
    }

    /// The minimal bounding rectangle covering both inputs
    ///
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    /// The x coordinate of the side facing the direction of travel
    ///
    pub fn leading_edge(&self, direction: Direction) -> f32 {
        match direction {
            Direction::LeftToRight => self.right(),
            Direction::RightToLeft => self.x,
        }
    }

    /// Widens the rectangle by `margin` pixels on the side ahead of the travel
    /// direction. Forgives the gap left in front of the last known edge when a
    /// vehicle reappears from behind trees or posts.
    ///
    pub fn extend_ahead(&self, direction: Direction, margin: f32) -> Rect {
        match direction {
            Direction::LeftToRight => Rect {
                width: self.width + margin,
                ..*self
            },
            Direction::RightToLeft => Rect {
                x: self.x - margin,
                width: self.width + margin,
                ..*self
            },
        }
    }

    /// A detection rectangle is usable when its dimensions are finite and
    /// positive and at least part of it lies within the frame.
    ///
    pub fn valid_for_frame(&self, frame_width: f32, frame_height: f32) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
            && self.right() > 0.0
            && self.x < frame_width
            && self.bottom() > 0.0
            && self.y < frame_height
    }
}

impl EstimateClose for Rect {
    fn almost_same(&self, other: &Self, eps: f32) -> bool {
        (self.x - other.x).abs() < eps
            && (self.y - other.y).abs() < eps
            && (self.width - other.width).abs() < eps
            && (self.height - other.height).abs() < eps
    }
}
