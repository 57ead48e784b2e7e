/*****************************************************************************************
 *
 *  LarkPoll – Long-Polling Config Update Microservice in Rust
 *  -----------------------------------------------------------
 *
 *  Distributes small, versioned configuration updates from one publisher to
 *  many polling readers: per-key bounded history, per-key wake-up hub, and
 *  long-poll fetch semantics ("everything newer than version V, or wait").
 *
 *****************************************************************************************/

pub mod app;
pub mod config;
pub mod errors;
pub mod routes;
pub mod services;
pub mod state;
