use crate::models::ride::Coordinate;

pub const INITIAL_FARE: i64 = 500;
pub const FARE_PER_DISTANCE: i64 = 100;

pub fn manhattan_distance(a: Coordinate, b: Coordinate) -> i64 {
    (a.latitude - b.latitude).abs() + (a.longitude - b.longitude).abs()
}

/// Fare for a trip between two points: a flat base plus a per-unit
/// charge over the Manhattan distance.
pub fn fare(pickup: Coordinate, destination: Coordinate) -> i64 {
    INITIAL_FARE + FARE_PER_DISTANCE * manhattan_distance(pickup, destination)
}
