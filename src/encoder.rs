//! 磁気式エンコーダによる位置検出

pub mod as5600;
pub mod position_tracker;
pub mod sample_cell;
pub mod sensor;

pub use as5600::{As5600, BusReset, EncoderError, MagnetStatus};
pub use position_tracker::PositionTracker;
pub use sample_cell::{AngleSampleCell, SampleStatus};
pub use sensor::{PositionSensor, SensorError};
