pub mod vehicle;
pub mod vehicle_pool;
