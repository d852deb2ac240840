//! Test fixtures for gomodel
//!
//! [`GoFixture`] writes small source trees into a temporary directory and
//! [`MiniGo`] is a frontend for the subset of Go those trees use, so the
//! parser crate can be tested end to end without a Go toolchain.

pub mod minigo;
mod tree;

pub use minigo::MiniGo;
pub use tree::GoFixture;

use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness. Honors `RUST_LOG`;
/// safe to call from every test.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
