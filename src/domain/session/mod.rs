pub mod session_registry;
