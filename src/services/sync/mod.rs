pub mod differ;
pub mod runner;
pub mod synchronizer;
