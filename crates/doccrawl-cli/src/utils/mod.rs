pub mod cli_args;
pub mod logging;
pub mod progress;

pub use logging::initialize_logging;
