pub mod accumulator;
pub mod cli;
pub mod error;
pub mod ingest;
pub mod model;
pub mod parser;
pub mod record;
pub mod report;
