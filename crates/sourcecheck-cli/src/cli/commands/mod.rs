//! CLI command handlers. Each command is in its own file.

mod check;
mod import;
mod list;
mod remove;
mod stop;

pub use check::run_check;
pub use import::run_import;
pub use list::run_list;
pub use remove::run_remove;
pub use stop::run_stop;
