pub mod non_conformity;
pub mod role;
pub mod storage;

pub use non_conformity::{Priority, Status};
pub use role::{ParseEnumError, Role};
