//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logging setup
//! - Time/frame delta
//! - Storage (LocalStorage on web, files on native)
//! - The browser entry point

pub mod storage;
pub mod time;
#[cfg(target_arch = "wasm32")]
pub mod web;

/// Install the platform logger. Safe to call more than once.
pub fn init_logging() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        // Already-installed logger is fine
        let _ = console_log::init_with_level(log::Level::Info);
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
    }
}
