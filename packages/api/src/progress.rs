//! Daily progress buckets for the trailing week.
//!
//! A [`Window`] covers the 7 calendar days ending today, where days are cut at
//! midnight in a fixed UTC offset (`progress.utc_offset_minutes`). Each report
//! reduces the rows falling on a day to one value and always yields exactly 7
//! entries, oldest first, with zero for days without data.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use store::{FocusSession, Mood, Task};

/// Number of days in a report, today included.
pub const WINDOW_DAYS: i64 = 7;

/// Mood score used for labels missing from the table.
pub const DEFAULT_MOOD_SCORE: i64 = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusDay {
    pub date: NaiveDate,
    pub minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodDay {
    pub date: NaiveDate,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDay {
    pub date: NaiveDate,
    pub count: usize,
}

/// The 7-day reporting window ending on the local date of `now`.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    offset: FixedOffset,
    today: NaiveDate,
}

impl Window {
    pub fn ending_at(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            offset,
            today: now.with_timezone(&offset).date_naive(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        self.today - Duration::days(WINDOW_DAYS - 1)
    }

    /// Local midnight of the first day, as a UTC instant. Rows at or after it are in range.
    pub fn start(&self) -> DateTime<Utc> {
        let local_midnight = self.first_day().and_time(NaiveTime::MIN);
        let utc = local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        DateTime::from_naive_utc_and_offset(utc, Utc)
    }

    /// The days of the window, oldest first.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let first = self.first_day();
        (0..WINDOW_DAYS).map(move |n| first + Duration::days(n))
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// Group `rows` by local day and reduce each day, including empty ones.
    fn bucket<'a, T, V>(
        &self,
        rows: &'a [T],
        at: impl Fn(&T) -> DateTime<Utc>,
        reduce: impl Fn(&[&'a T]) -> V,
    ) -> Vec<(NaiveDate, V)> {
        self.days()
            .map(|day| {
                let matching: Vec<&T> = rows
                    .iter()
                    .filter(|row| self.local_date(at(*row)) == day)
                    .collect();
                (day, reduce(&matching))
            })
            .collect()
    }
}

/// `numerator / denominator` rounded half up. Both must be non-negative, denominator non-zero.
fn round_div(numerator: i64, denominator: i64) -> i64 {
    let (n, d) = (i128::from(numerator), i128::from(denominator));
    // the quotient never exceeds the numerator
    ((2 * n + d) / (2 * d)) as i64
}

/// Score for a mood label. Unknown labels score [`DEFAULT_MOOD_SCORE`].
pub fn mood_score(label: &str) -> i64 {
    match label.trim().to_lowercase().as_str() {
        "happy" => 5,
        "focused" => 4,
        "meh" => 3,
        "tired" | "stressed" => 2,
        "sad" => 1,
        _ => DEFAULT_MOOD_SCORE,
    }
}

/// Focused minutes per day. Each session is rounded to whole minutes before summing.
pub fn focus_minutes(window: &Window, sessions: &[FocusSession]) -> Vec<FocusDay> {
    window
        .bucket(sessions, |s| s.start_time, |day| {
            day.iter()
                .map(|s| round_div(s.duration.max(0), 60))
                .fold(0, i64::saturating_add)
        })
        .into_iter()
        .map(|(date, minutes)| FocusDay { date, minutes })
        .collect()
}

/// Mean mood score per day, rounded. Days without moods score 0.
pub fn mood_scores(window: &Window, moods: &[Mood]) -> Vec<MoodDay> {
    window
        .bucket(moods, |m| m.created_at, |day| {
            if day.is_empty() {
                return 0;
            }
            let total = day.iter().map(|m| mood_score(&m.mood)).fold(0, i64::saturating_add);
            round_div(total, day.len() as i64)
        })
        .into_iter()
        .map(|(date, score)| MoodDay { date, score })
        .collect()
}

/// Number of tasks created per day.
pub fn task_counts(window: &Window, tasks: &[Task]) -> Vec<TaskDay> {
    window
        .bucket(tasks, |t| t.created_at, |day| day.len())
        .into_iter()
        .map(|(date, count)| TaskDay { date, count })
        .collect()
}
