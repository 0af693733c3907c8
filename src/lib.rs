//! Lua script host with a small raster window.
//!
//! A script is loaded from disk and run once under a protected call. Drawing
//! functions (`init_window`, `begin_drawing`, `draw_text`, ...) and, when
//! enabled, a few immediate-mode `gui_*` widgets are registered as globals.
//! On failure the error value, optionally expanded into a stack traceback,
//! is printed to standard output and the process exits with status 1.

pub mod config;
pub mod constants;
pub mod error;
pub mod interpreter;
pub mod logging;
pub mod picture;
pub mod render;

pub use config::HostConfig;
pub use interpreter::{RunOutcome, ScriptHost, run, run_to_exit_code};
