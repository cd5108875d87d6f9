pub mod errors;
pub mod judge_service;
pub mod match_coordinator;
pub mod matchmaking_service;
pub mod room_service;
pub mod round_session;
