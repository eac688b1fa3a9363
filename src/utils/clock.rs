use chrono::{DateTime, Local, NaiveDate, Utc};

/// Represents an entity responsible for providing dates across application. This allows the
/// usage window to be pinned during testing.
pub trait Clock: Sync + Send {
    fn time(&self) -> DateTime<Utc>;

    /// Calendar date in the local timezone. Usage logs are kept per local day.
    fn today(&self) -> NaiveDate {
        self.time().with_timezone(&Local).date_naive()
    }
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
