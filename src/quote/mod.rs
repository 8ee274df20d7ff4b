pub mod cache;    // time-bounded memo keyed by symbol
pub mod resolver; // picks the data source and derives change metrics
pub mod types;
