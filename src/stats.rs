use std::fmt;

use crate::models::{Category, Chore, HIGH_HATE_THRESHOLD};

/// Aggregate numbers shown above a household board.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoreStats {
    pub total_count: usize,
    pub completed_count: usize,
    pub pending_count: usize,
    /// Percentage in 0..=100, zero for an empty board.
    pub completion_rate: f64,
    /// Mean rating, zero for an empty board.
    pub avg_hate_points: f64,
    pub high_hate_count: usize,
    pub most_hated_category: Option<Category>,
}

impl ChoreStats {
    /// Category name or "None" for an empty board.
    pub fn most_hated_label(&self) -> &'static str {
        self.most_hated_category.map_or("None", |c| c.name())
    }
}

impl fmt::Display for ChoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.0}% done ({} of {}) | avg hate {:.1}/7 | {} pending | most hated: {}",
            self.completion_rate,
            self.completed_count,
            self.total_count,
            self.avg_hate_points,
            self.pending_count,
            self.most_hated_label()
        )
    }
}

pub fn compute_stats(chores: &[Chore]) -> ChoreStats {
    let total_count = chores.len();
    let completed_count = chores.iter().filter(|c| c.is_completed).count();
    let total_hate: u64 = chores.iter().map(|c| u64::from(c.hate_points)).sum();

    let (completion_rate, avg_hate_points) = if total_count == 0 {
        (0.0, 0.0)
    } else {
        (
            completed_count as f64 / total_count as f64 * 100.0,
            total_hate as f64 / total_count as f64,
        )
    };

    ChoreStats {
        total_count,
        completed_count,
        pending_count: total_count - completed_count,
        completion_rate,
        avg_hate_points,
        high_hate_count: chores.iter().filter(|c| c.hate_points >= HIGH_HATE_THRESHOLD).count(),
        most_hated_category: most_hated_category(chores),
    }
}

/// Category with the largest hate point sum. Ties go to the category that
/// shows up first in `chores`.
fn most_hated_category(chores: &[Chore]) -> Option<Category> {
    // first-seen order matters for tie breaking
    let mut sums: Vec<(Category, u64)> = Vec::new();
    for chore in chores {
        match sums.iter_mut().find(|(c, _)| *c == chore.category) {
            Some((_, sum)) => *sum += u64::from(chore.hate_points),
            None => sums.push((chore.category, u64::from(chore.hate_points))),
        }
    }

    let mut best: Option<(Category, u64)> = None;
    for (category, sum) in sums {
        match best {
            Some((_, top)) if sum <= top => {}
            _ => best = Some((category, sum)),
        }
    }
    best.map(|(category, _)| category)
}
