//! Threshold notifier
//!
//! Decides when the camera's running daily total first reaches its
//! configured threshold. The decision itself is a pure function; the session
//! keeps the fired-on date so the notification re-arms at calendar-day
//! rollover instead of staying latched for the lifetime of a long session.

use chrono::NaiveDate;

/// True exactly when the threshold notification should fire: the total has
/// reached the threshold and nothing fired yet. Pure function of its inputs.
pub fn check(total: i64, threshold: i64, already_notified: bool) -> bool {
    !already_notified && total >= threshold
}

/// Per-session notification bookkeeping
#[derive(Debug, Default)]
pub struct NotificationState {
    /// Date the notification last fired, if any
    notified_on: Option<NaiveDate>,
}

impl NotificationState {
    /// Whether a notification already fired for `today`. A fired-on date
    /// other than `today` means the day rolled over and the notifier is
    /// armed again.
    pub fn already_notified(&self, today: NaiveDate) -> bool {
        self.notified_on == Some(today)
    }

    /// Record that the notification fired for `today`
    pub fn mark(&mut self, today: NaiveDate) {
        self.notified_on = Some(today);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_fires_exactly_once_over_rising_totals() {
        let today = date("2025-03-10");
        let mut state = NotificationState::default();
        let mut fired_at = Vec::new();

        for total in [2, 4, 6, 8] {
            if check(total, 5, state.already_notified(today)) {
                state.mark(today);
                fired_at.push(total);
            }
        }
        assert_eq!(fired_at, vec![6]);
    }

    #[test]
    fn test_fires_when_total_equals_threshold() {
        assert!(check(5, 5, false));
    }

    #[test]
    fn test_no_fire_below_threshold() {
        assert!(!check(4, 5, false));
    }

    #[test]
    fn test_no_fire_when_already_notified() {
        assert!(!check(100, 5, true));
    }

    #[test]
    fn test_rearms_at_day_rollover() {
        let mut state = NotificationState::default();
        let monday = date("2025-03-10");
        let tuesday = date("2025-03-11");

        state.mark(monday);
        assert!(state.already_notified(monday));
        // Session spans midnight: next day's threshold crossing must notify
        assert!(!state.already_notified(tuesday));
        assert!(check(6, 5, state.already_notified(tuesday)));
    }
}
