//! Restaurant order-management core.
//!
//! Waiters create orders against tables and seats, cashiers settle and
//! refund them, and administrators manage a menu with stock and time-of-day
//! availability. This crate owns the order lifecycle and settlement rules;
//! transport, authentication and exports live in the surrounding services.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod money;
pub mod services;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::AppServices;

/// Shared application state handed to the transport layer.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub event_sender: Arc<EventSender>,
    pub services: AppServices,
}

impl AppState {
    /// Connects the pool, wires the event channel and builds every service.
    /// Schema migrations are run separately via the `migrations` crate.
    pub async fn initialize(config: AppConfig) -> Result<Self, errors::ServiceError> {
        logging::init(&config.log_level, config.log_json);

        let db_config = db::DbConfig::from_app_config(&config);
        let db = Arc::new(db::establish_connection_with_config(&db_config).await?);

        let (event_sender, receiver) = events::channel(1024);
        tokio::spawn(events::run_logging_processor(receiver));
        let event_sender = Arc::new(event_sender);

        let services = AppServices::build(db.clone(), &config, Some(event_sender.clone()));

        Ok(Self {
            db,
            config,
            event_sender,
            services,
        })
    }
}
