pub mod chair;
pub mod ride;
