// Library surface for headless/integration tests and reuse.
// The binary in main.rs only owns argument parsing and the terminal.
pub mod app;
pub mod app_dirs;
pub mod certificate;
pub mod config;
pub mod controller;
pub mod display;
pub mod history;
pub mod level;
pub mod logging;
pub mod metrics;
pub mod name;
pub mod paragraphs;
pub mod profile;
pub mod runtime;
pub mod session;
pub mod timer;
pub mod ui;
