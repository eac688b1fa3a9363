use std::collections::{BTreeSet, HashSet};

use chrono::Duration;

use crate::utils::percentage::{count_percentage, Percentage};

use super::entities::UsageRecord;

/// Totals of one computer's usage over the whole window.
#[derive(Debug, PartialEq, Eq)]
pub struct DeviceSummary {
    /// Number of distinct dates with usage.
    pub active_days: usize,
    pub foreground: Duration,
    pub opens: i64,
}

/// Returns [None] for an empty slice, a computer without records has nothing to summarize. Totals
/// that don't fit into a [Duration] or an `i64` also give [None].
pub fn summarize_device(records: &[UsageRecord]) -> Option<DeviceSummary> {
    if records.is_empty() {
        return None;
    }

    let mut dates = HashSet::new();
    let mut foreground = Duration::zero();
    let mut opens = 0i64;

    for record in records {
        dates.insert(record.date.as_str());
        foreground = Duration::try_seconds(record.foreground)
            .and_then(|v| foreground.checked_add(&v))?;
        opens = record.open.checked_add(opens)?;
    }

    Some(DeviceSummary {
        active_days: dates.len(),
        foreground,
        opens,
    })
}

/// Split of the installed computers. `without_usage` is always the complement of `with_usage`
/// in `installed`, so computers whose usage request failed end up there as well; `failed`
/// lists them separately.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Partition {
    pub installed: Vec<String>,
    pub with_usage: Vec<String>,
    pub without_usage: Vec<String>,
    pub failed: Vec<String>,
}

impl Partition {
    pub fn new(installed: Vec<String>, with_usage: Vec<String>, failed: Vec<String>) -> Self {
        let used = with_usage.iter().map(String::as_str).collect::<HashSet<_>>();
        let without_usage = installed
            .iter()
            .filter(|v| !used.contains(v.as_str()))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Self {
            installed,
            with_usage,
            without_usage,
            failed,
        }
    }

    pub fn usage_share(&self) -> Option<Percentage> {
        count_percentage(self.with_usage.len(), self.installed.len())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Duration;

    use crate::audit::entities::UsageRecord;

    use super::{summarize_device, Partition};

    fn record(date: &str, foreground: i64, open: i64) -> UsageRecord {
        UsageRecord {
            date: date.into(),
            name: "Docker.app".into(),
            serial: "A1".into(),
            version: "4.30.0".into(),
            foreground,
            open,
        }
    }

    #[test]
    fn test_summarize_device() {
        let summary = summarize_device(&[
            record("2024-05-01", 60, 1),
            record("2024-05-01", 30, 2),
            record("2024-05-04", 3600, 1),
        ])
        .unwrap();

        assert_eq!(summary.active_days, 2);
        assert_eq!(summary.foreground, Duration::seconds(3690));
        assert_eq!(summary.opens, 4);
    }

    #[test]
    fn test_summarize_overflowing_counters() {
        assert!(summarize_device(&[record("2024-05-01", i64::MAX, 1)]).is_none());
        assert!(summarize_device(&[record("2024-05-01", 1, i64::MAX), record("2024-05-02", 1, 1)])
            .is_none());
        assert!(summarize_device(&[record("2024-05-01", i64::MIN, 1)]).is_none());
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize_device(&[]).is_none());
    }

    #[test]
    fn test_partition_scenario() {
        let partition = Partition::new(
            vec!["A1".into(), "B2".into()],
            vec!["A1".into()],
            vec![],
        );
        assert_eq!(partition.with_usage, vec!["A1".to_string()]);
        assert_eq!(partition.without_usage, vec!["B2".to_string()]);
        assert_eq!(*partition.usage_share().unwrap(), 50.);
    }

    #[test]
    fn test_partition_is_complement_for_every_subset() {
        let installed = ["A1", "B2", "C3", "D4", "E5"]
            .map(String::from)
            .to_vec();

        for mask in 0u32..(1 << installed.len()) {
            let with_usage = installed
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, v)| v.clone())
                .collect::<Vec<_>>();

            let partition = Partition::new(installed.clone(), with_usage, vec![]);

            let used = partition.with_usage.iter().collect::<HashSet<_>>();
            let unused = partition.without_usage.iter().collect::<HashSet<_>>();
            let all = installed.iter().collect::<HashSet<_>>();

            assert!(used.is_disjoint(&unused), "mask {mask:b}");
            assert_eq!(&used | &unused, all, "mask {mask:b}");
        }
    }

    #[test]
    fn test_partition_empty_inventory() {
        let partition = Partition::new(vec![], vec![], vec![]);
        assert!(partition.without_usage.is_empty());
        assert!(partition.usage_share().is_none());
    }
}
