use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ChoreError;

/// Lowest and highest accepted hate point ratings.
pub const MIN_HATE_POINTS: u8 = 1;
pub const MAX_HATE_POINTS: u8 = 7;

/// Ratings at or above this count as "high hate".
pub const HIGH_HATE_THRESHOLD: u8 = 5;

/// Color coding shared by the CLI tables and the board. Each front end maps
/// a tone to its own terminal color type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Blue,
    Orange,
    Magenta,
    Gray,
    Green,
    Yellow,
    Red,
}

/// The fixed set of chore categories.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Cleaning,
    Cooking,
    Shopping,
    Maintenance,
    Outdoor,
    #[serde(rename = "Pet Care")]
    PetCare,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Cleaning,
        Category::Cooking,
        Category::Shopping,
        Category::Maintenance,
        Category::Outdoor,
        Category::PetCare,
    ];

    /// Display name, also used as the sort key for category ordering.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Cleaning => "Cleaning",
            Category::Cooking => "Cooking",
            Category::Shopping => "Shopping",
            Category::Maintenance => "Maintenance",
            Category::Outdoor => "Outdoor",
            Category::PetCare => "Pet Care",
        }
    }

    /// Icon a chore gets when none is chosen explicitly.
    pub fn default_icon(&self) -> &'static str {
        match self {
            Category::Cleaning => "🧹",
            Category::Cooking => "🍳",
            Category::Shopping => "🛒",
            Category::Maintenance => "🔧",
            Category::Outdoor => "🌱",
            Category::PetCare => "🐕",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Category::Cleaning => Tone::Blue,
            Category::Cooking => Tone::Orange,
            Category::Shopping => Tone::Magenta,
            Category::Maintenance => Tone::Gray,
            Category::Outdoor => Tone::Green,
            Category::PetCare => Tone::Yellow,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = ChoreError;

    /// Accepts the display name case-insensitively, with or without the space
    /// ("Pet Care", "pet-care", "petcare").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.name().replace(' ', "").to_lowercase() == key)
            .ok_or_else(|| ChoreError::Validation(format!(
                "unknown category '{}'. Supported: Cleaning, Cooking, Shopping, Maintenance, Outdoor, Pet Care.",
                s
            )))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Ordinal used for sorting: high=3, medium=2, low=1.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Priority::Low => Tone::Green,
            Priority::Medium => Tone::Yellow,
            Priority::High => Tone::Red,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ChoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ChoreError::Validation(format!(
                "unknown priority '{}'. Supported: low, medium, high.",
                s
            ))),
        }
    }
}

/// How often a chore comes back after it is completed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    pub fn is_recurring(&self) -> bool {
        *self != Recurrence::None
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::None => "none",
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recurrence {
    type Err = ChoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Recurrence::None),
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "monthly" => Ok(Recurrence::Monthly),
            _ => Err(ChoreError::Validation(format!(
                "unknown recurrence pattern '{}'. Supported: none, daily, weekly, monthly.",
                s
            ))),
        }
    }
}

/// A household member a chore is assigned to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Assignee {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Assignee {
    /// Initials shown when there is no avatar ("Jane Doe" -> "JD").
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .collect()
    }
}

/// A single chore on a household board.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Chore {
    /// Unique identifier, never reused.
    pub id: Uuid,
    /// Display title, never empty.
    pub title: String,
    /// Optional free text.
    #[serde(default)]
    pub description: Option<String>,
    pub category: Category,
    /// Display glyph, defaults from the category.
    pub icon: String,
    /// Unpleasantness rating in 1..=7.
    pub hate_points: u8,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub recurring: Recurrence,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_completed: bool,
    /// Set if and only if `is_completed` is true.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignees: Vec<Assignee>,
    pub household_id: Uuid,
    /// User id of whoever created the chore.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Chore {
    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assignees.iter().any(|a| a.user_id == user_id)
    }

    /// Adds an assignee, keeping the set unique by user id.
    ///
    /// Returns `false` if the user was already assigned.
    pub fn assign(&mut self, assignee: Assignee) -> bool {
        if self.is_assigned_to(&assignee.user_id) {
            return false;
        }
        self.assignees.push(assignee);
        true
    }

    /// Returns `false` if the user was not assigned.
    pub fn unassign(&mut self, user_id: &str) -> bool {
        let before = self.assignees.len();
        self.assignees.retain(|a| a.user_id != user_id);
        self.assignees.len() != before
    }
}

/// Unvalidated chore fields as collected from a form or the command line.
#[derive(Debug, Clone, Default)]
pub struct ChoreDraft {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub icon: Option<String>,
    pub hate_points: Option<u8>,
    pub priority: Priority,
    pub recurring: Recurrence,
    pub due_date: Option<DateTime<Utc>>,
    pub assignees: Vec<Assignee>,
}

impl ChoreDraft {
    pub fn new(title: impl Into<String>) -> Self {
        ChoreDraft {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Validates the draft and turns it into a chore owned by `household_id`.
    ///
    /// Category defaults to Cleaning, hate points to 1, the icon to the
    /// category's icon, and assignees to the creator.
    pub fn build(
        self,
        household_id: Uuid,
        creator: &Assignee,
        now: DateTime<Utc>,
    ) -> Result<Chore, ChoreError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ChoreError::Validation("title must not be empty".into()));
        }
        let hate_points = self.hate_points.unwrap_or(MIN_HATE_POINTS);
        validate_hate_points(hate_points)?;

        let category = self.category.unwrap_or(Category::Cleaning);
        let icon = match self.icon {
            Some(icon) if !icon.trim().is_empty() => icon,
            _ => category.default_icon().to_string(),
        };

        let mut chore = Chore {
            id: Uuid::new_v4(),
            title,
            description: self.description.filter(|d| !d.trim().is_empty()),
            category,
            icon,
            hate_points,
            priority: self.priority,
            recurring: self.recurring,
            due_date: self.due_date,
            is_completed: false,
            completed_at: None,
            assignees: Vec::new(),
            household_id,
            created_by: creator.user_id.clone(),
            created_at: now,
        };
        if self.assignees.is_empty() {
            chore.assign(creator.clone());
        } else {
            for a in self.assignees {
                chore.assign(a);
            }
        }
        Ok(chore)
    }
}

/// Partial update of a chore's editable fields. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct ChoreUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub icon: Option<String>,
    pub hate_points: Option<u8>,
    pub priority: Option<Priority>,
    pub recurring: Option<Recurrence>,
    pub due_date: Option<DateTime<Utc>>,
    /// Removes the due date; wins over `due_date`.
    pub clear_due_date: bool,
}

impl ChoreUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.icon.is_none()
            && self.hate_points.is_none()
            && self.priority.is_none()
            && self.recurring.is_none()
            && self.due_date.is_none()
            && !self.clear_due_date
    }

    pub fn validate(&self) -> Result<(), ChoreError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(ChoreError::Validation("title must not be empty".into()));
            }
        }
        if let Some(points) = self.hate_points {
            validate_hate_points(points)?;
        }
        Ok(())
    }

    /// Applies the update in place. Changing the category without an explicit
    /// icon switches the icon to the new category's default.
    pub fn apply(&self, chore: &mut Chore) {
        if let Some(t) = &self.title {
            chore.title = t.trim().to_string();
        }
        if let Some(d) = &self.description {
            chore.description = if d.trim().is_empty() { None } else { Some(d.clone()) };
        }
        if let Some(c) = self.category {
            chore.category = c;
            if self.icon.is_none() {
                chore.icon = c.default_icon().to_string();
            }
        }
        if let Some(i) = &self.icon {
            chore.icon = i.clone();
        }
        if let Some(h) = self.hate_points {
            chore.hate_points = h;
        }
        if let Some(p) = self.priority {
            chore.priority = p;
        }
        if let Some(r) = self.recurring {
            chore.recurring = r;
        }
        if self.clear_due_date {
            chore.due_date = None;
        } else if let Some(d) = self.due_date {
            chore.due_date = Some(d);
        }
    }
}

pub fn validate_hate_points(points: u8) -> Result<(), ChoreError> {
    if (MIN_HATE_POINTS..=MAX_HATE_POINTS).contains(&points) {
        Ok(())
    } else {
        Err(ChoreError::Validation(format!(
            "hate points must be between {} and {}, got {}",
            MIN_HATE_POINTS, MAX_HATE_POINTS, points
        )))
    }
}

/// Green up to 2 points, yellow up to 4, red above.
pub fn hate_tone(points: u8) -> Tone {
    match points {
        0..=2 => Tone::Green,
        3..=4 => Tone::Yellow,
        _ => Tone::Red,
    }
}

/// Human label for a hate point rating.
pub fn hate_label(points: u8) -> &'static str {
    match points {
        0 | 1 => "Mildly Annoying",
        2 => "I have done worse",
        3 => "This is worse",
        4 => "Hate it",
        5 => "Really hate it",
        6 => "Absolutely despise",
        _ => "Pure agony",
    }
}

/// A group of members sharing a chore board.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Household {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Admin => "admin",
            Role::Member => "member",
        })
    }
}

/// A user's membership in one household.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Member {
    pub id: Uuid,
    pub user_id: String,
    pub household_id: Uuid,
    pub role: Role,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn as_assignee(&self) -> Assignee {
        Assignee {
            user_id: self.user_id.clone(),
            name: self.name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}
