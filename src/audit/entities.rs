use serde::Serialize;

/// A single day of usage of the target application on one computer. Field order is the order
/// of the printed JSON.
#[derive(PartialEq, Eq, Debug, Serialize, Clone)]
pub struct UsageRecord {
    pub date: String,
    pub name: String,
    pub serial: String,
    pub version: String,
    /// Seconds the application spent in the foreground.
    pub foreground: i64,
    pub open: i64,
}

/// Outcome of a usage lookup for one computer.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum UsageLookup {
    /// Always contains at least one record.
    Found(Vec<UsageRecord>),
    /// The request succeeded, but the application wasn't used in the window.
    EmptyWindow,
    /// The API answered with a non-success status. Nothing is known about usage.
    RequestFailed(u16),
}

impl From<Vec<UsageRecord>> for UsageLookup {
    fn from(records: Vec<UsageRecord>) -> Self {
        if records.is_empty() {
            UsageLookup::EmptyWindow
        } else {
            UsageLookup::Found(records)
        }
    }
}
