pub mod aggregate;
pub mod detectors;
pub mod intervals;
pub mod signal;
pub mod window;
