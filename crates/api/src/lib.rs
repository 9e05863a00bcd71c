//! HTTP service: sign-in against the credentials API, server-side sessions
//! and the route guard in front of every screen.

pub mod app;
pub mod client;
pub mod config;
pub mod context;
pub mod middleware;
pub mod store;
