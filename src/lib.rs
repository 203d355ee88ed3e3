pub mod config;
pub mod pipeline;
pub mod plot;
pub mod process;
pub mod report;
pub mod schema;
pub mod stats;
