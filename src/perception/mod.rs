pub mod coords;
pub mod detector;

pub use coords::{parse_coordinates, TextReader};
pub use detector::{Detection, Detector};
