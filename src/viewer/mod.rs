//! Viewer state orchestration, configuration and the application shell

pub mod app;
pub mod config;
pub mod controller;
pub mod remote;

pub use app::ViewerApp;
pub use config::ViewerConfig;
pub use controller::{ViewerStatus, ViewportController};
pub use remote::{ControlBridge, ControlThread, PendingAction};
