//! CLI command handlers, one per file.

mod run;
mod status;
mod stop;
mod table;

pub use run::run_harvest;
pub use status::run_status;
pub use stop::run_stop;
