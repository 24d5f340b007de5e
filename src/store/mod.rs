pub mod counters;
pub mod locations;
pub mod registry;
