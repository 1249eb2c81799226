pub mod bcfstats;
pub mod engine;
pub mod error;
pub mod io;
pub mod meta;
pub mod metrics;
pub mod model;
