//! Identity provider adapters.

mod device;

pub use device::DeviceIdentityProvider;
