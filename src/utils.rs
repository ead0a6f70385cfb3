/// Axis-aligned rectangle in the format (x, y, width, height)
pub mod rect;
