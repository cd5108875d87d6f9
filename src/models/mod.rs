pub mod queue;
pub mod room;
pub mod round;
