pub mod device;
pub mod dtos;
pub mod types;
pub mod user;

pub use device::{DeviceFingerprint, DeviceRecord};
pub use types::{Timestamp, Ulid};
pub use user::User;
