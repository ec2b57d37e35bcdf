pub mod health;
pub mod metrics;
pub mod network;
pub mod notifications;
pub mod ping;
pub mod services;
pub mod settings;
