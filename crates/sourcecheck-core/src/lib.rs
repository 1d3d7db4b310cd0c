pub mod config;
pub mod logging;

pub mod annotate;
pub mod check;
pub mod control;
pub mod diagnostics;
pub mod pipeline;
pub mod scheduler;
pub mod source;
pub mod store;

#[cfg(test)]
mod testing;
