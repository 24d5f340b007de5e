pub mod backfill;
pub mod matching;
