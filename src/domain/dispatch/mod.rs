pub mod dispatch_coordinator;
pub mod movement;
