pub mod day_status;
pub mod employee;
pub mod holiday;
pub mod leave;
pub mod role;
pub mod session;
pub mod stats;
pub mod status;
