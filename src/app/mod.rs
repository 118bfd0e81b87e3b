pub mod mount_use_case;
pub mod ports;

pub use mount_use_case::{MountUseCase, MountedField};
