//! Prometheus exporter for Steam and Old School RuneScape statistics
//!
//! Data flows from the upstream clients (`apis`) through the collectors,
//! which consult the shared cache, the Steam rate-limit coordinator and the
//! freshness policy before anything reaches the network. Handlers in
//! `webserver` render what the collectors return as Prometheus text; the
//! `poller` keeps requested entities warm in the background.

pub mod apis;
pub mod arguments;
pub mod cache;
pub mod clock;
pub mod collectors;
pub mod config;
pub mod errors;
pub mod freshness;
pub mod logger;
pub mod metrics;
pub mod poller;
pub mod ratelimit;
pub mod run;
pub mod webserver;
pub mod worlds;
