pub mod attendance;
pub mod decision;
pub mod student;
