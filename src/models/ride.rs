use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Integer-valued grid coordinate. Both axes are whole units; distances
/// between points are Manhattan distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: i64,
    pub longitude: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RideStatus {
    Matching,
    Matched,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    pub id: Uuid,
    pub user_id: Uuid,
    pub pickup: Coordinate,
    pub destination: Coordinate,
    pub chair_id: Option<String>,
    pub status: RideStatus,
    pub evaluation: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
