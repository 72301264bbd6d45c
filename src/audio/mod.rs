pub mod device_manager;
pub mod rodio_engine;

pub use device_manager::{OutputDeviceInfo, OutputDeviceManager};
pub use rodio_engine::RodioAudioEngine;
