//! `logs`: read back the session's log ring (§4.7, §6).

use crate::session::Session;
use crate::stores::{LogEntry, LogLevel};

/// Every currently-retained log entry, oldest first. `min_level` filters
/// out anything less severe when set (`Error` is most severe, `Log`
/// least), matching the ring's chronological-but-unfiltered storage.
pub fn logs(session: &Session, min_level: Option<LogLevel>) -> Vec<LogEntry> {
    let entries = session.stores().log_ring.snapshot();
    match min_level {
        Some(min) => entries.into_iter().filter(|e| severity_rank(e.level) <= severity_rank(min)).collect(),
        None => entries,
    }
}

fn severity_rank(level: LogLevel) -> u8 {
    match level {
        LogLevel::Error => 0,
        LogLevel::Warning => 1,
        LogLevel::Info => 2,
        LogLevel::Log => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::LogRing;
    use chrono::Utc;

    #[test]
    fn severity_rank_orders_error_first() {
        assert!(severity_rank(LogLevel::Error) < severity_rank(LogLevel::Warning));
        assert!(severity_rank(LogLevel::Warning) < severity_rank(LogLevel::Info));
        assert!(severity_rank(LogLevel::Info) < severity_rank(LogLevel::Log));
    }

    #[test]
    fn filtering_by_min_level_excludes_lower_severity() {
        let ring = LogRing::new(10);
        ring.append(LogLevel::Error, "e", Utc::now());
        ring.append(LogLevel::Log, "l", Utc::now());

        let entries = ring.snapshot();
        let filtered: Vec<_> = entries
            .into_iter()
            .filter(|e| severity_rank(e.level) <= severity_rank(LogLevel::Warning))
            .collect();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].message, "e");
    }
}
