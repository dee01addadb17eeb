// Infrastructure layer (shared components)
pub mod infrastructure;

// Re-export infrastructure modules for backward compatibility
pub use infrastructure::config;
pub use infrastructure::error;
pub use infrastructure::metrics;
pub use infrastructure::postgres;

// Domain layer (business logic)
pub mod delivery;
pub mod email;
pub mod template;
pub mod transport;

// Application layer
pub mod api;
pub mod server;

// Supporting modules
pub mod telemetry;
