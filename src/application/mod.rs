pub mod analyzer;
pub mod grouping;
pub mod inventory;
pub mod monitoring;
pub mod plan;
pub mod report;
pub mod scoring;
