pub mod admin_dto;
pub mod charge_dto;
pub mod ground_control_dto;
pub mod service_config_dto;
