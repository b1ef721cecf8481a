pub mod attendance;
pub mod employee;
pub mod holiday;
pub mod leave;
