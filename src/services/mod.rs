pub mod update_service;
