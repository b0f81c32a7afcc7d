pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod widget;

use std::time::Instant;

use config::Config;
use widget::WidgetRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: WidgetRegistry,
    pub config: Config,
    pub start_time: Instant,
}
