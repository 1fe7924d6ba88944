pub mod engine;
pub mod interval;
pub mod motion;
pub mod species;
pub mod types;
