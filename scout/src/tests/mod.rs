mod config_tests;
mod object_map_tests;
mod outcome_tests;
mod poll_tests;
mod selector_tests;
mod simulated_tests;
mod text_tests;

// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_target(true)
        .with_thread_ids(false)
        .with_test_writer()
        .try_init();
}
