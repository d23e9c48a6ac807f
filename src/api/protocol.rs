use crate::pipeline::StatsSnapshot;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub accepting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub counters: StatsSnapshot,
    pub primary_depth: usize,
    pub primary_capacity: usize,
    pub overflow_depth: usize,
    pub overflow_capacity: usize,
    pub workers: usize,
}
