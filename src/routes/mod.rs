pub mod system_routes;
pub mod update_routes;
