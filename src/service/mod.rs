pub mod attendance;
pub mod punch;
