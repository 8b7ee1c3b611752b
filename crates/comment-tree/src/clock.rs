use chrono::{DateTime, SecondsFormat, Utc};

use crate::CommentId;

/// Source of creation times for new comments.
pub trait Clock {
    fn now(&mut self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&mut self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<F> Clock for F
where
    F: FnMut() -> DateTime<Utc>,
{
    fn now(&mut self) -> DateTime<Utc> {
        self()
    }
}

/// Issues creation-time derived ids that never repeat, even when the clock
/// stalls or runs backwards. The creation time it hands out with each id never
/// goes backwards either.
#[derive(Debug, Default)]
pub(crate) struct IdGenerator {
    last: Option<CommentId>,
    latest: Option<DateTime<Utc>>,
}

impl IdGenerator {
    /// Next id and its creation time, or `None` once no id above the last one
    /// is left.
    pub(crate) fn next(&mut self, now: DateTime<Utc>) -> Option<(CommentId, DateTime<Utc>)> {
        let now = match self.latest {
            Some(latest) if now < latest => latest,
            _ => now,
        };
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let candidate = CommentId::new(millis);
        let id = match self.last {
            Some(last) if candidate <= last => last.successor()?,
            _ => candidate,
        };
        self.last = Some(id);
        self.latest = Some(now);
        Some((id, now))
    }

    /// Record an id that is already in use so it is never issued again.
    pub(crate) fn observe(&mut self, id: CommentId) {
        if self.last.is_none_or(|last| id > last) {
            self.last = Some(id);
        }
    }

    /// Record a stored creation time. Strings that are not RFC 3339 are
    /// ignored.
    pub(crate) fn observe_timestamp(&mut self, timestamp: &str) {
        let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) else {
            return;
        };
        let parsed = parsed.with_timezone(&Utc);
        if self.latest.is_none_or(|latest| parsed > latest) {
            self.latest = Some(parsed);
        }
    }
}

pub(crate) fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}
