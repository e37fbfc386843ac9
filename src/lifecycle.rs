use chrono::{DateTime, Datelike, Days, Duration, Months, TimeZone, Utc};
use uuid::Uuid;

use crate::models::{Chore, Recurrence};

/// Result of flipping a chore's completion state.
#[derive(Debug, Clone, PartialEq)]
pub struct Toggled {
    /// The original chore with its new completion state.
    pub chore: Chore,
    /// The next occurrence of a recurring chore, still to be persisted.
    pub successor: Option<Chore>,
}

/// Flips `is_completed` on a copy of `chore`.
///
/// Completing a recurring chore also produces a successor due one period
/// after `now` (not after the old due date). Un-completing only clears
/// `completed_at`; a successor spawned earlier is left alone.
pub fn toggle_completion(chore: &Chore, now: DateTime<Utc>) -> Toggled {
    let mut updated = chore.clone();

    if chore.is_completed {
        updated.is_completed = false;
        updated.completed_at = None;
        return Toggled { chore: updated, successor: None };
    }

    updated.is_completed = true;
    updated.completed_at = Some(now);

    let successor = next_due_date(chore.recurring, now).map(|due| Chore {
        id: Uuid::new_v4(),
        is_completed: false,
        completed_at: None,
        due_date: Some(due),
        created_at: now,
        ..chore.clone()
    });

    Toggled { chore: updated, successor }
}

/// Due date of the next occurrence when a chore is completed at `from`.
///
/// Monthly recurrence keeps the day of month and lets it overflow into the
/// following month when the target month is shorter (Jan 31 -> Mar 3).
/// Returns `None` for non-recurring chores or when the date would leave
/// chrono's representable range.
pub fn next_due_date(recurring: Recurrence, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match recurring {
        Recurrence::None => None,
        Recurrence::Daily => from.checked_add_signed(Duration::days(1)),
        Recurrence::Weekly => from.checked_add_signed(Duration::days(7)),
        Recurrence::Monthly => add_month_overflowing(from),
    }
}

fn add_month_overflowing(from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let naive = from.naive_utc();
    let day = naive.day();
    // First of the month plus one month never clamps; the remaining days are
    // then added on top so they spill into the month after if needed.
    let next = naive
        .with_day(1)?
        .checked_add_months(Months::new(1))?
        .checked_add_days(Days::new(u64::from(day - 1)))?;
    Some(Utc.from_utc_datetime(&next))
}

/// A chore is overdue once its due date lies strictly before `now`.
pub fn is_overdue(chore: &Chore, now: DateTime<Utc>) -> bool {
    chore.due_date.is_some_and(|due| due < now)
}
