use std::io::{self, Write};

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Identity;
use crate::error::{ChoreError, Result};
use crate::lifecycle::{is_overdue, toggle_completion, Toggled};
use crate::models::{
    hate_label, hate_tone, Category, Chore, ChoreDraft, ChoreUpdate, Household, Member, Role, Tone,
};
use crate::stats::{compute_stats, ChoreStats};
use crate::storage::{ChoreStore, JsonStore};
use crate::views::{filter_by_category, sort_chores, SortState};

/// Parses a due date given as `YYYY-MM-DD` (local midnight) or RFC 3339.
pub fn parse_due(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
        return Ok(dt.with_timezone(&Utc));
    }
    let invalid = || ChoreError::Validation(format!("invalid due date '{}'. Use YYYY-MM-DD.", s));
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| invalid())?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(invalid)
}

/// First eight characters of an id, enough to address it on the command line.
pub fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

fn resolve_prefix<'a, T>(
    items: &'a [T],
    id: impl Fn(&T) -> Uuid,
    prefix: &str,
    kind: &'static str,
) -> Result<&'a T> {
    let needle = prefix.trim().to_lowercase().replace('-', "");
    if needle.is_empty() {
        return Err(ChoreError::UnknownId { kind, prefix: prefix.to_string() });
    }
    let matches: Vec<&T> = items
        .iter()
        .filter(|item| id(*item).simple().to_string().starts_with(&needle))
        .collect();
    match matches.len() {
        0 => Err(ChoreError::UnknownId { kind, prefix: prefix.to_string() }),
        1 => Ok(matches[0]),
        n => Err(ChoreError::AmbiguousId { kind, prefix: prefix.to_string(), matches: n }),
    }
}

/// Picks the household a command acts on.
///
/// An explicit id (or prefix) must name a household the user belongs to.
/// Without one, the user's only household is used.
pub fn resolve_household(
    store: &impl ChoreStore,
    identity: &Identity,
    explicit: Option<&str>,
) -> Result<Household> {
    let memberships = store.memberships(&identity.user_id)?;
    let households: Vec<Household> = store
        .list_households()?
        .into_iter()
        .filter(|h| memberships.iter().any(|m| m.household_id == h.id))
        .collect();

    if let Some(prefix) = explicit {
        return resolve_prefix(&households, |h| h.id, prefix, "household").cloned();
    }
    match households.len() {
        0 => Err(ChoreError::NoHousehold(
            "create one with `choreboard household create <NAME>` or join one".into(),
        )),
        1 => Ok(households[0].clone()),
        n => Err(ChoreError::NoHousehold(format!(
            "you belong to {} households; pass --household or set CHOREBOARD_HOUSEHOLD",
            n
        ))),
    }
}

fn resolve_chore(store: &impl ChoreStore, household: &Household, prefix: &str) -> Result<Chore> {
    let chores = store.list_chores(household.id)?;
    resolve_prefix(&chores, |c| c.id, prefix, "chore").cloned()
}

fn resolve_member(store: &impl ChoreStore, household: &Household, user_id: &str) -> Result<Member> {
    store
        .list_members(household.id)?
        .into_iter()
        .find(|m| m.user_id == user_id)
        .ok_or_else(|| ChoreError::NotAMember {
            user: user_id.to_string(),
            household: household.name.clone(),
        })
}

/// Creates a household; the creator becomes its admin.
pub fn cmd_household_create(
    store: &impl ChoreStore,
    identity: &Identity,
    name: String,
    description: Option<String>,
    silent: bool,
) -> Result<Household> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ChoreError::Validation("household name must not be empty".into()));
    }
    let now = Utc::now();
    let household = Household {
        id: Uuid::new_v4(),
        name,
        description,
        created_by: identity.user_id.clone(),
        created_at: now,
    };
    store.insert_household(&household)?;
    store.insert_member(&Member {
        id: Uuid::new_v4(),
        user_id: identity.user_id.clone(),
        household_id: household.id,
        role: Role::Admin,
        name: identity.name.clone(),
        avatar_url: identity.avatar_url.clone(),
        joined_at: now,
    })?;
    info!(household = %household.id, user = %identity.user_id, "household created");
    if !silent {
        println!("Household '{}' created (id = {})", household.name, short_id(household.id));
    }
    Ok(household)
}

/// Joins an existing household as a regular member.
pub fn cmd_household_join(
    store: &impl ChoreStore,
    identity: &Identity,
    household_prefix: &str,
    silent: bool,
) -> Result<Member> {
    let households = store.list_households()?;
    let household = resolve_prefix(&households, |h| h.id, household_prefix, "household")?;

    if let Some(existing) = store
        .list_members(household.id)?
        .into_iter()
        .find(|m| m.user_id == identity.user_id)
    {
        if !silent {
            println!("Already a member of '{}' ({}).", household.name, existing.role);
        }
        return Ok(existing);
    }

    let member = Member {
        id: Uuid::new_v4(),
        user_id: identity.user_id.clone(),
        household_id: household.id,
        role: Role::Member,
        name: identity.name.clone(),
        avatar_url: identity.avatar_url.clone(),
        joined_at: Utc::now(),
    };
    store.insert_member(&member)?;
    info!(household = %household.id, user = %identity.user_id, "joined household");
    if !silent {
        println!("Joined household '{}'.", household.name);
    }
    Ok(member)
}

/// Lists the households the acting user belongs to.
pub fn cmd_household_list(store: &impl ChoreStore, identity: &Identity) -> Result<()> {
    let memberships = store.memberships(&identity.user_id)?;
    let households: Vec<(Household, Role)> = store
        .list_households()?
        .into_iter()
        .filter_map(|h| {
            memberships
                .iter()
                .find(|m| m.household_id == h.id)
                .map(|m| (h, m.role))
        })
        .collect();
    if households.is_empty() {
        println!("No households found.");
        return Ok(());
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Name", "Description", "Role", "Members"]);
    for (h, role) in households {
        let members = store.list_members(h.id)?.len();
        table.add_row(vec![
            short_id(h.id),
            h.name,
            h.description.unwrap_or_else(|| "-".into()),
            role.to_string(),
            members.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Lists members of a household.
pub fn cmd_members(store: &impl ChoreStore, identity: &Identity, household: Option<&str>) -> Result<()> {
    let household = resolve_household(store, identity, household)?;
    let members = store.list_members(household.id)?;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["User", "Name", "Role", "Joined"]);
    for m in members {
        let role_color = match m.role {
            Role::Admin => Color::Magenta,
            Role::Member => Color::Reset,
        };
        table.add_row(vec![
            Cell::new(&m.user_id),
            Cell::new(&m.name),
            Cell::new(m.role).fg(role_color),
            Cell::new(m.joined_at.with_timezone(&Local).format("%Y-%m-%d")),
        ]);
    }
    println!("Members of '{}'", household.name);
    println!("{table}");
    Ok(())
}

/// Adds a new chore to a household.
///
/// `assign` lists user ids of household members; when empty, the chore is
/// assigned to the acting user.
pub fn cmd_add(
    store: &impl ChoreStore,
    identity: &Identity,
    household: Option<&str>,
    mut draft: ChoreDraft,
    assign: &[String],
    silent: bool,
) -> Result<Chore> {
    let household = resolve_household(store, identity, household)?;
    for user_id in assign {
        draft.assignees.push(resolve_member(store, &household, user_id)?.as_assignee());
    }
    let chore = draft.build(household.id, &identity.as_assignee(), Utc::now())?;
    store.insert_chore(&chore)?;
    info!(chore = %chore.id, household = %household.id, "chore added");
    if !silent {
        println!("Chore added (id = {})", short_id(chore.id));
    }
    Ok(chore)
}

/// Edits an existing chore's details.
pub fn cmd_edit(
    store: &impl ChoreStore,
    identity: &Identity,
    household: Option<&str>,
    id: &str,
    update: ChoreUpdate,
    silent: bool,
) -> Result<Chore> {
    update.validate()?;
    let household = resolve_household(store, identity, household)?;
    let chore = resolve_chore(store, &household, id)?;
    if update.is_empty() {
        if !silent {
            println!("Nothing to update.");
        }
        return Ok(chore);
    }
    let updated = store.update_chore(chore.id, &update)?;
    info!(chore = %chore.id, "chore updated");
    if !silent {
        println!("Chore {} updated.", short_id(chore.id));
    }
    Ok(updated)
}

/// Flips a stored chore's completion state and persists the outcome.
///
/// The completion is written first. A successor that fails to save is
/// logged and dropped from the returned value; the completion stands.
pub fn toggle_chore(store: &impl ChoreStore, chore: &Chore, now: DateTime<Utc>) -> Result<Toggled> {
    let mut toggled = toggle_completion(chore, now);
    store.save_chore(&toggled.chore)?;
    info!(chore = %chore.id, completed = toggled.chore.is_completed, "completion toggled");

    if let Some(successor) = &toggled.successor {
        if let Err(e) = store.insert_chore(successor) {
            warn!(chore = %chore.id, error = %e, "failed to create next occurrence");
            toggled.successor = None;
        } else {
            info!(chore = %chore.id, successor = %successor.id, "next occurrence created");
        }
    }
    Ok(toggled)
}

/// Marks a chore complete, or open again if it was already complete.
pub fn cmd_toggle(
    store: &impl ChoreStore,
    identity: &Identity,
    household: Option<&str>,
    id: &str,
    silent: bool,
) -> Result<Toggled> {
    let household = resolve_household(store, identity, household)?;
    let chore = resolve_chore(store, &household, id)?;
    let toggled = toggle_chore(store, &chore, Utc::now())?;
    if !silent {
        if toggled.chore.is_completed {
            println!("Chore {} marked as complete.", short_id(chore.id));
            match (&toggled.successor, chore.recurring.is_recurring()) {
                (Some(next), _) => {
                    if let Some(due) = next.due_date {
                        println!(
                            "Recurring chore created due on {} (id = {})",
                            due.with_timezone(&Local).format("%Y-%m-%d"),
                            short_id(next.id)
                        );
                    }
                }
                (None, true) => eprintln!("Could not create the next occurrence; see the log."),
                (None, false) => {}
            }
        } else {
            println!("Chore {} marked as open.", short_id(chore.id));
        }
    }
    Ok(toggled)
}

/// Assigns a household member to a chore.
pub fn cmd_assign(
    store: &impl ChoreStore,
    identity: &Identity,
    household: Option<&str>,
    id: &str,
    user_id: &str,
    silent: bool,
) -> Result<Chore> {
    let household = resolve_household(store, identity, household)?;
    let mut chore = resolve_chore(store, &household, id)?;
    let member = resolve_member(store, &household, user_id)?;
    if chore.assign(member.as_assignee()) {
        store.save_chore(&chore)?;
        info!(chore = %chore.id, user = %user_id, "assignee added");
        if !silent {
            println!("Assigned {} to chore {}.", member.name, short_id(chore.id));
        }
    } else if !silent {
        println!("{} is already assigned.", member.name);
    }
    Ok(chore)
}

/// Removes an assignee from a chore.
pub fn cmd_unassign(
    store: &impl ChoreStore,
    identity: &Identity,
    household: Option<&str>,
    id: &str,
    user_id: &str,
    silent: bool,
) -> Result<Chore> {
    let household = resolve_household(store, identity, household)?;
    let mut chore = resolve_chore(store, &household, id)?;
    if chore.unassign(user_id) {
        store.save_chore(&chore)?;
        info!(chore = %chore.id, user = %user_id, "assignee removed");
        if !silent {
            println!("Unassigned {} from chore {}.", user_id, short_id(chore.id));
        }
    } else if !silent {
        println!("{} was not assigned.", user_id);
    }
    Ok(chore)
}

/// Removes a chore from the database.
pub fn cmd_remove(
    store: &impl ChoreStore,
    identity: &Identity,
    household: Option<&str>,
    id: &str,
    silent: bool,
) -> Result<()> {
    let household = resolve_household(store, identity, household)?;
    let chore = resolve_chore(store, &household, id)?;
    store.delete_chore(chore.id)?;
    info!(chore = %chore.id, "chore removed");
    if !silent {
        println!("Chore {} removed.", short_id(chore.id));
    }
    Ok(())
}

/// Fetches a household's chores, filtered and sorted for display.
pub fn query_chores(
    store: &impl ChoreStore,
    household_id: Uuid,
    categories: &[Category],
    sort: SortState,
) -> Result<Vec<Chore>> {
    let chores = store.list_chores(household_id)?;
    let filtered = filter_by_category(&chores, categories);
    Ok(sort_chores(&filtered, sort.by, sort.direction))
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Blue => Color::Blue,
        Tone::Orange => Color::Rgb { r: 255, g: 165, b: 0 },
        Tone::Magenta => Color::Magenta,
        Tone::Gray => Color::Grey,
        Tone::Green => Color::Green,
        Tone::Yellow => Color::Yellow,
        Tone::Red => Color::Red,
    }
}

fn assignee_summary(chore: &Chore) -> String {
    let mut names: Vec<String> = chore.assignees.iter().take(3).map(|a| a.initials()).collect();
    if chore.assignees.len() > 3 {
        names.push(format!("+{}", chore.assignees.len() - 3));
    }
    names.join(" ")
}

/// Lists chores in a formatted table.
///
/// By default, hides completed chores unless `all` is true.
pub fn cmd_list(
    store: &impl ChoreStore,
    identity: &Identity,
    household: Option<&str>,
    categories: &[Category],
    sort: SortState,
    all: bool,
) -> Result<()> {
    let household = resolve_household(store, identity, household)?;
    let mut chores = query_chores(store, household.id, categories, sort)?;
    if !all {
        chores.retain(|c| !c.is_completed);
    }
    if chores.is_empty() {
        println!("No chores found.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Hate").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Repeat").add_attribute(Attribute::Bold),
            Cell::new("Assignees").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    let now = Utc::now();
    for c in &chores {
        let overdue = !c.is_completed && is_overdue(c, now);
        let due = c
            .due_date
            .map(|d| d.with_timezone(&Local).format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let repeat = if c.recurring.is_recurring() { c.recurring.to_string() } else { String::new() };
        let (status, status_color) = if c.is_completed {
            ("Done", Color::Green)
        } else if overdue {
            ("Overdue", Color::Red)
        } else {
            ("Open", Color::Yellow)
        };

        table.add_row(vec![
            Cell::new(short_id(c.id)),
            Cell::new(&c.icon),
            Cell::new(&c.title),
            Cell::new(c.category).fg(tone_color(c.category.tone())),
            Cell::new(c.priority).fg(tone_color(c.priority.tone())),
            Cell::new(format!("{}/7", c.hate_points)).fg(tone_color(hate_tone(c.hate_points))),
            Cell::new(due).fg(if overdue { Color::Red } else { Color::Reset }),
            Cell::new(repeat),
            Cell::new(assignee_summary(c)),
            Cell::new(status).fg(status_color),
        ]);
    }

    println!(
        "{} | sorted by {} {}",
        household.name,
        sort.by,
        sort.direction.arrow()
    );
    println!("{table}");
    Ok(())
}

/// Shows a chore in full.
pub fn cmd_show(
    store: &impl ChoreStore,
    identity: &Identity,
    household: Option<&str>,
    id: &str,
) -> Result<Chore> {
    let household = resolve_household(store, identity, household)?;
    let c = resolve_chore(store, &household, id)?;
    let fmt_time = |d: DateTime<Utc>| d.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.add_row(vec![Cell::new("ID"), Cell::new(c.id)]);
    table.add_row(vec![Cell::new("Title"), Cell::new(format!("{} {}", c.icon, c.title))]);
    table.add_row(vec![Cell::new("Description"), Cell::new(c.description.clone().unwrap_or_default())]);
    table.add_row(vec![Cell::new("Category"), Cell::new(c.category).fg(tone_color(c.category.tone()))]);
    table.add_row(vec![Cell::new("Priority"), Cell::new(c.priority).fg(tone_color(c.priority.tone()))]);
    table.add_row(vec![
        Cell::new("Hate"),
        Cell::new(format!("{}/7 {}", c.hate_points, hate_label(c.hate_points))).fg(tone_color(hate_tone(c.hate_points))),
    ]);
    table.add_row(vec![Cell::new("Repeat"), Cell::new(c.recurring)]);
    table.add_row(vec![Cell::new("Due"), Cell::new(c.due_date.map(fmt_time).unwrap_or_default())]);
    table.add_row(vec![
        Cell::new("Assignees"),
        Cell::new(c.assignees.iter().map(|a| a.name.as_str()).collect::<Vec<_>>().join(", ")),
    ]);
    table.add_row(vec![
        Cell::new("Completed"),
        Cell::new(c.completed_at.map(fmt_time).unwrap_or_else(|| "no".into())),
    ]);
    table.add_row(vec![Cell::new("Created"), Cell::new(format!("{} by {}", fmt_time(c.created_at), c.created_by))]);
    println!("{table}");
    Ok(c)
}

/// Prints household statistics.
pub fn cmd_stats(store: &impl ChoreStore, identity: &Identity, household: Option<&str>) -> Result<ChoreStats> {
    let household = resolve_household(store, identity, household)?;
    let stats = compute_stats(&store.list_chores(household.id)?);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Completion Rate", "Avg Hate Level", "Pending", "Most Hated"]);
    table.add_row(vec![
        Cell::new(format!(
            "{:.0}%\n{} of {} chores completed",
            stats.completion_rate, stats.completed_count, stats.total_count
        )),
        Cell::new(format!(
            "{:.1}/7\n{} high-hate chores (>=5 points)",
            stats.avg_hate_points, stats.high_hate_count
        ))
        .fg(tone_color(hate_tone(stats.avg_hate_points.round() as u8))),
        Cell::new(format!("{}\nchores awaiting completion", stats.pending_count)),
        Cell::new(stats.most_hated_label()),
    ]);
    println!("{}", household.name);
    println!("{table}");
    Ok(stats)
}

/// Resets the database by deleting all chores, households and members.
pub fn cmd_reset(store: &JsonStore, force: bool) -> Result<()> {
    if !force {
        print!("Are you sure you want to delete all chores and households? This cannot be undone. [y/N] ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }
    store.reset()?;
    info!("database reset");
    println!("Database reset successfully.");
    Ok(())
}
