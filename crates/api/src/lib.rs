//! HTTP API: configuration, session middleware, request gate and routing.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
