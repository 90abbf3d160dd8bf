pub mod ground_control_endpoint;
pub mod ground_control_mock;
pub mod ground_control_trait;
pub mod http_ground_control;
