use chrono::{DateTime, Datelike, Timelike, Utc};
use std::collections::{HashMap, VecDeque};

/// Per-user action history: recent actions, transition tables, and
/// hour-of-day / day-of-week histograms.
#[derive(Debug, Default)]
pub(crate) struct UserHistory {
    actions: VecDeque<String>,
    bigram: HashMap<String, HashMap<String, u32>>,
    trigram: HashMap<(String, String), HashMap<String, u32>>,
    hour_histogram: [u32; 24],
    weekday_histogram: [u32; 7],
}

impl UserHistory {
    pub(crate) fn record(&mut self, action: &str, at: DateTime<Utc>, window: usize) {
        self.hour_histogram[at.hour() as usize] += 1;
        self.weekday_histogram[at.weekday().num_days_from_monday() as usize] += 1;

        if let Some(last) = self.actions.back() {
            *self
                .bigram
                .entry(last.clone())
                .or_default()
                .entry(action.to_string())
                .or_insert(0) += 1;
        }

        if self.actions.len() >= 2 {
            let len = self.actions.len();
            let key = (
                self.actions[len - 2].clone(),
                self.actions[len - 1].clone(),
            );
            *self
                .trigram
                .entry(key)
                .or_default()
                .entry(action.to_string())
                .or_insert(0) += 1;
        }

        self.actions.push_back(action.to_string());
        while self.actions.len() > window {
            self.actions.pop_front();
        }
    }

    pub(crate) fn last_action(&self) -> Option<&str> {
        self.actions.back().map(|s| s.as_str())
    }

    pub(crate) fn last_two_actions(&self) -> Option<(&str, &str)> {
        let len = self.actions.len();
        if len < 2 {
            return None;
        }
        Some((self.actions[len - 2].as_str(), self.actions[len - 1].as_str()))
    }

    /// Bigram transition probability `last -> candidate`, or `None` if unseen.
    pub(crate) fn bigram_prob(&self, last: &str, candidate: &str) -> Option<f64> {
        let transitions = self.bigram.get(last)?;
        let total: u32 = transitions.values().sum();
        let count = *transitions.get(candidate)?;
        if total == 0 {
            None
        } else {
            Some(count as f64 / total as f64)
        }
    }

    /// Trigram transition probability `(prev, last) -> candidate`.
    pub(crate) fn trigram_prob(&self, prev: &str, last: &str, candidate: &str) -> Option<f64> {
        let transitions = self.trigram.get(&(prev.to_string(), last.to_string()))?;
        let total: u32 = transitions.values().sum();
        let count = *transitions.get(candidate)?;
        if total == 0 {
            None
        } else {
            Some(count as f64 / total as f64)
        }
    }

    /// Candidate actions with a non-zero bigram count from `last`.
    pub(crate) fn bigram_candidates(&self, last: &str) -> Vec<String> {
        self.bigram
            .get(last)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Normalized score in `[0, 1]` for how favorable `at` is for this user
    /// based on historical hour-of-day and day-of-week activity.
    pub(crate) fn time_score(&self, at: DateTime<Utc>) -> f64 {
        let hour_total: u32 = self.hour_histogram.iter().sum();
        let weekday_total: u32 = self.weekday_histogram.iter().sum();

        let hour_score = if hour_total == 0 {
            0.0
        } else {
            self.hour_histogram[at.hour() as usize] as f64 / hour_total as f64
        };

        let weekday_score = if weekday_total == 0 {
            0.0
        } else {
            self.weekday_histogram[at.weekday().num_days_from_monday() as usize] as f64
                / weekday_total as f64
        };

        (hour_score + weekday_score) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 20, hour, 0, 0).unwrap()
    }

    #[test]
    fn bigram_probability_tracks_transitions() {
        let mut history = UserHistory::default();
        history.record("view_home", ts(9), 100);
        history.record("view_list", ts(9), 100);
        history.record("view_home", ts(9), 100);
        history.record("view_list", ts(9), 100);

        assert_eq!(history.bigram_prob("view_home", "view_list"), Some(1.0));
    }

    #[test]
    fn trigram_requires_two_prior_actions() {
        let mut history = UserHistory::default();
        assert_eq!(history.trigram_prob("a", "b", "c"), None);

        history.record("a", ts(9), 100);
        history.record("b", ts(9), 100);
        history.record("c", ts(9), 100);

        assert_eq!(history.trigram_prob("a", "b", "c"), Some(1.0));
    }

    #[test]
    fn window_bounds_retained_actions() {
        let mut history = UserHistory::default();
        for i in 0..10 {
            history.record(&format!("action_{i}"), ts(9), 5);
        }
        assert_eq!(history.actions.len(), 5);
    }
}
