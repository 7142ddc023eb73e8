// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Session timing statistics.
//!
//! Splits the wall-clock span of a session into time the assistant spent
//! working (a user entry followed by an assistant entry) and time spent
//! waiting for the user (the reverse). Timing looks at log entries, not
//! rendered records, so entries that render nothing still count.

use crate::parser::{Activity, Role};
use chrono::TimeDelta;

/// Durations derived from entry timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    /// Time between the first and last timestamped entry.
    pub total: TimeDelta,
    /// Sum of user → assistant gaps.
    pub assistant_working: TimeDelta,
    /// Sum of assistant → user gaps.
    pub waiting_for_user: TimeDelta,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            total: TimeDelta::zero(),
            assistant_working: TimeDelta::zero(),
            waiting_for_user: TimeDelta::zero(),
        }
    }
}

impl SessionTiming {
    /// Computes timing from a session's activity.
    ///
    /// With fewer than two entries every duration is zero. System entries
    /// extend the total but break user/assistant pairs.
    #[must_use]
    pub fn from_activity(activity: &[Activity]) -> Self {
        let [first, .., last] = activity else {
            return Self::default();
        };

        let mut timing = Self {
            total: last.timestamp - first.timestamp,
            ..Self::default()
        };
        for pair in activity.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let gap = next.timestamp - prev.timestamp;
            match (prev.role, next.role) {
                (Role::User, Role::Assistant) => timing.assistant_working += gap,
                (Role::Assistant, Role::User) => timing.waiting_for_user += gap,
                _ => {}
            }
        }
        timing
    }
}

/// Formats a duration as `1h 2m 3s`, `4m 5s` or `6s`.
///
/// Negative durations (clock skew in the log) are shown as zero.
///
/// # Example
///
/// ```
/// use cc2html::timing::format_duration;
/// use chrono::TimeDelta;
///
/// assert_eq!(format_duration(TimeDelta::seconds(3723)), "1h 2m 3s");
/// assert_eq!(format_duration(TimeDelta::seconds(3600)), "1h 0m 0s");
/// assert_eq!(format_duration(TimeDelta::seconds(65)), "1m 5s");
/// assert_eq!(format_duration(TimeDelta::zero()), "0s");
/// ```
#[must_use]
pub fn format_duration(duration: TimeDelta) -> String {
    let total = duration.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_session;
    use chrono::{TimeZone, Utc};

    fn at(secs: i64, role: Role) -> Activity {
        Activity {
            role,
            timestamp: Utc.timestamp_opt(1_750_000_000 + secs, 0).unwrap(),
        }
    }

    fn user(secs: i64) -> Activity {
        at(secs, Role::User)
    }

    fn assistant(secs: i64) -> Activity {
        at(secs, Role::Assistant)
    }

    #[test]
    fn splits_working_and_waiting_time() {
        let activity = vec![user(0), assistant(30), assistant(40), user(100), assistant(105)];
        let timing = SessionTiming::from_activity(&activity);

        assert_eq!(timing.total, TimeDelta::seconds(105));
        assert_eq!(timing.assistant_working, TimeDelta::seconds(35));
        assert_eq!(timing.waiting_for_user, TimeDelta::seconds(60));
    }

    #[test]
    fn fewer_than_two_entries_is_zero() {
        assert_eq!(SessionTiming::from_activity(&[]), SessionTiming::default());
        assert_eq!(
            SessionTiming::from_activity(&[user(5)]),
            SessionTiming::default()
        );
    }

    #[test]
    fn system_entries_interrupt_pairs_and_extend_total() {
        let activity = vec![user(0), at(5, Role::System), assistant(20), at(50, Role::System)];
        let timing = SessionTiming::from_activity(&activity);

        assert_eq!(timing.total, TimeDelta::seconds(50));
        assert_eq!(timing.assistant_working, TimeDelta::zero());
        assert_eq!(timing.waiting_for_user, TimeDelta::zero());
    }

    #[test]
    fn counts_entries_that_render_nothing() {
        let session = parse_session(
            r#"{"type":"user","timestamp":"2025-06-01T10:00:00Z","message":{"content":"go"}}
{"type":"assistant","timestamp":"2025-06-01T10:00:10Z","message":{"content":[{"type":"thinking","thinking":""}]}}
{"type":"user","timestamp":"2025-06-01T10:00:40Z","message":{"content":[{"type":"image","source":{"media_type":"image/png"}}]}}
{"type":"assistant","timestamp":"2025-06-01T10:00:45Z","message":{"content":"done"}}
{"type":"system","timestamp":"2025-06-01T10:01:00Z","content":"stopped"}"#,
        )
        .unwrap();
        let timing = SessionTiming::from_activity(&session.activity);

        assert_eq!(timing.total, TimeDelta::seconds(60));
        assert_eq!(timing.assistant_working, TimeDelta::seconds(15));
        assert_eq!(timing.waiting_for_user, TimeDelta::seconds(30));
    }

    #[test]
    fn negative_durations_format_as_zero() {
        assert_eq!(format_duration(TimeDelta::seconds(-5)), "0s");
    }
}
