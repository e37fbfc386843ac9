use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::ChoreError;
use crate::models::{Category, Chore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    Category,
    Priority,
    DueDate,
    #[default]
    CreatedAt,
}

impl SortBy {
    pub const ALL: [SortBy; 4] = [SortBy::Category, SortBy::Priority, SortBy::DueDate, SortBy::CreatedAt];

    pub fn label(&self) -> &'static str {
        match self {
            SortBy::Category => "Category",
            SortBy::Priority => "Priority",
            SortBy::DueDate => "Due Date",
            SortBy::CreatedAt => "Date Created",
        }
    }

    /// The key after this one, wrapping around.
    pub fn next(&self) -> SortBy {
        match self {
            SortBy::Category => SortBy::Priority,
            SortBy::Priority => SortBy::DueDate,
            SortBy::DueDate => SortBy::CreatedAt,
            SortBy::CreatedAt => SortBy::Category,
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortBy {
    type Err = ChoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "category" => Ok(SortBy::Category),
            "priority" => Ok(SortBy::Priority),
            "due_date" | "due" => Ok(SortBy::DueDate),
            "created_at" | "created" => Ok(SortBy::CreatedAt),
            _ => Err(ChoreError::Validation(format!(
                "unknown sort key '{}'. Supported: category, priority, due_date, created_at.",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(&self) -> SortDirection {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        }
    }
}

/// Current sort selection of a chore view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub by: SortBy,
    pub direction: SortDirection,
}

impl SortState {
    /// Picking the active key again flips the direction, a new key starts ascending.
    pub fn select(self, by: SortBy) -> SortState {
        if by == self.by {
            SortState { by, direction: self.direction.flipped() }
        } else {
            SortState { by, direction: SortDirection::Asc }
        }
    }
}

fn compare(a: &Chore, b: &Chore, by: SortBy) -> Ordering {
    match by {
        SortBy::Category => a.category.name().cmp(b.category.name()),
        SortBy::Priority => a.priority.rank().cmp(&b.priority.rank()),
        // undated chores sort as the epoch
        SortBy::DueDate => {
            let key = |c: &Chore| c.due_date.map_or(0, |d| d.timestamp_millis());
            key(a).cmp(&key(b))
        }
        SortBy::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

/// Returns the chores ordered by `by`. The sort is stable in both directions:
/// descending only negates the comparison, ties keep their input order.
pub fn sort_chores(chores: &[Chore], by: SortBy, direction: SortDirection) -> Vec<Chore> {
    let mut sorted = chores.to_vec();
    sorted.sort_by(|a, b| {
        let ord = compare(a, b, by);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    sorted
}

/// Keeps chores whose category is in `active`. An empty filter keeps everything.
pub fn filter_by_category(chores: &[Chore], active: &[Category]) -> Vec<Chore> {
    if active.is_empty() {
        return chores.to_vec();
    }
    chores
        .iter()
        .filter(|c| active.contains(&c.category))
        .cloned()
        .collect()
}

/// Splits chores into the open and recently-done board columns, keeping order.
pub fn split_board(chores: &[Chore]) -> (Vec<Chore>, Vec<Chore>) {
    chores.iter().cloned().partition(|c| !c.is_completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, Recurrence};
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap()
    }

    fn chore(title: &str, category: Category, priority: Priority, due: Option<u32>, created: u32) -> Chore {
        Chore {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            category,
            icon: category.default_icon().into(),
            hate_points: 3,
            priority,
            recurring: Recurrence::None,
            due_date: due.map(at),
            is_completed: false,
            completed_at: None,
            assignees: Vec::new(),
            household_id: Uuid::nil(),
            created_by: "u1".into(),
            created_at: at(created),
        }
    }

    fn titles(chores: &[Chore]) -> Vec<&str> {
        chores.iter().map(|c| c.title.as_str()).collect()
    }

    fn sample() -> Vec<Chore> {
        vec![
            chore("a", Category::Shopping, Priority::High, Some(10), 3),
            chore("b", Category::Cleaning, Priority::Low, None, 1),
            chore("c", Category::PetCare, Priority::Medium, Some(5), 2),
            chore("d", Category::Cleaning, Priority::High, Some(7), 1),
        ]
    }

    #[test]
    fn sorts_by_priority_rank() {
        let sorted = sort_chores(&sample(), SortBy::Priority, SortDirection::Asc);
        assert_eq!(titles(&sorted), vec!["b", "c", "a", "d"]);

        let sorted = sort_chores(&sample(), SortBy::Priority, SortDirection::Desc);
        // ties (a, d) stay in input order
        assert_eq!(titles(&sorted), vec!["a", "d", "c", "b"]);
    }

    #[test]
    fn sorts_by_category_name() {
        let sorted = sort_chores(&sample(), SortBy::Category, SortDirection::Asc);
        assert_eq!(titles(&sorted), vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn undated_chores_sort_as_epoch() {
        let sorted = sort_chores(&sample(), SortBy::DueDate, SortDirection::Asc);
        assert_eq!(titles(&sorted), vec!["b", "c", "d", "a"]);
        let sorted = sort_chores(&sample(), SortBy::DueDate, SortDirection::Desc);
        assert_eq!(titles(&sorted), vec!["a", "d", "c", "b"]);
    }

    #[test]
    fn created_at_ties_keep_input_order() {
        let sorted = sort_chores(&sample(), SortBy::CreatedAt, SortDirection::Asc);
        assert_eq!(titles(&sorted), vec!["b", "d", "c", "a"]);
        let sorted = sort_chores(&sample(), SortBy::CreatedAt, SortDirection::Desc);
        assert_eq!(titles(&sorted), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn sorting_is_idempotent() {
        for by in SortBy::ALL {
            let once = sort_chores(&sample(), by, SortDirection::Asc);
            let twice = sort_chores(&once, by, SortDirection::Asc);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn descending_negates_ascending_for_distinct_keys() {
        let chores = sample();
        for by in SortBy::ALL {
            let asc = sort_chores(&chores, by, SortDirection::Asc);
            let desc = sort_chores(&chores, by, SortDirection::Desc);
            for x in &chores {
                for y in &chores {
                    if compare(x, y, by) == Ordering::Equal {
                        continue;
                    }
                    let pos = |list: &[Chore], c: &Chore| list.iter().position(|o| o.id == c.id).unwrap();
                    let asc_before = pos(&asc, x) < pos(&asc, y);
                    let desc_before = pos(&desc, x) < pos(&desc, y);
                    assert_ne!(asc_before, desc_before, "{:?} {} vs {}", by, x.title, y.title);
                }
            }
        }
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let chores = sample();
        assert_eq!(filter_by_category(&chores, &[]), chores);
    }

    #[test]
    fn filter_keeps_order() {
        let filtered = filter_by_category(&sample(), &[Category::Cleaning, Category::PetCare]);
        assert_eq!(titles(&filtered), vec!["b", "c", "d"]);
        assert!(filter_by_category(&sample(), &[Category::Outdoor]).is_empty());
    }

    #[test]
    fn selecting_same_key_flips_direction() {
        let state = SortState::default();
        let state = state.select(SortBy::Priority);
        assert_eq!(state, SortState { by: SortBy::Priority, direction: SortDirection::Asc });
        let state = state.select(SortBy::Priority);
        assert_eq!(state.direction, SortDirection::Desc);
        let state = state.select(SortBy::Category);
        assert_eq!(state.direction, SortDirection::Asc);
    }

    #[test]
    fn board_split_by_completion() {
        let mut chores = sample();
        chores[1].is_completed = true;
        chores[1].completed_at = Some(at(20));
        let (open, done) = split_board(&chores);
        assert_eq!(titles(&open), vec!["a", "c", "d"]);
        assert_eq!(titles(&done), vec!["b"]);
    }
}
