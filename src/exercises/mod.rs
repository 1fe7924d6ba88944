pub mod cantus;
pub mod curriculum;
