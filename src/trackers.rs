/// Rule-based road-lane vehicle tracker with speed measurement
pub mod road;
