pub mod types;
pub mod error;
pub mod config;

pub use error::{Error, Result};
pub use types::{BoundingBox, Command, Detection, FrameSize};
pub use config::{
    ChaserConfig, DetectorConfig, DeviceConfig, DriverConfig, PursuitConfig, SearchConfig,
    SelectionPolicy, StartupConfig,
};
