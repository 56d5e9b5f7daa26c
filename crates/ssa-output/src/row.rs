//! Plain data row types written by output backends.

/// Every species' count at one log tick, in species registration order.
#[derive(Debug, Clone, PartialEq)]
pub struct CountRow {
    pub time:   f64,
    pub counts: Vec<u64>,
}

/// One unit that left an individual pool with removal reporting enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalRow {
    pub species:       String,
    pub created_at:    f64,
    pub removed_at:    f64,
    pub modifications: u64,
}
