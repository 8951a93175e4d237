//! Double-DQN agent implemented with [candle](https://crates.io/crates/candle-core).
pub mod dqn;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod util;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl From<candle_core::DeviceLocation> for Device {
    /// Metal devices are not supported and fall back to [`Device::Cpu`].
    fn from(location: candle_core::DeviceLocation) -> Self {
        match location {
            candle_core::DeviceLocation::Cpu => Device::Cpu,
            candle_core::DeviceLocation::Cuda { gpu_id } => Device::Cuda(gpu_id),
            candle_core::DeviceLocation::Metal { .. } => {
                log::warn!("Metal devices are not supported, using CPU instead");
                Device::Cpu
            }
        }
    }
}

impl TryFrom<Device> for candle_core::Device {
    type Error = candle_core::Error;

    fn try_from(device: Device) -> Result<Self, Self::Error> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => candle_core::Device::new_cuda(n),
        }
    }
}
