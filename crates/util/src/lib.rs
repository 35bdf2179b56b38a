//! Small helpers shared by the Stepwire crates.

mod path_processing;
mod tracing_setup;

pub use path_processing::{expand_tilde, path_from_env};
pub use tracing_setup::init_tracing;
