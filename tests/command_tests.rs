use std::cell::Cell;

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use choreboard::commands::*;
use choreboard::config::Identity;
use choreboard::error::{ChoreError, StoreError};
use choreboard::models::*;
use choreboard::storage::{ChoreStore, JsonStore};
use choreboard::views::{SortBy, SortDirection, SortState};

/// Runs `f` against a fresh store in its own temp directory.
fn with_test_db<F>(test_name: &str, f: F)
where
    F: FnOnce(JsonStore),
{
    // removed on drop, also when an assertion fails
    let dir = tempfile::Builder::new()
        .prefix(&format!("choreboard_test_{}_", test_name))
        .tempdir()
        .unwrap();
    f(JsonStore::new(dir.path().join("chores.json")));
}

fn alice() -> Identity {
    Identity::new("alice", "Alice Smith")
}

fn bob() -> Identity {
    Identity::new("bob", "Bob Jones")
}

fn setup(store: &JsonStore) -> Household {
    cmd_household_create(store, &alice(), "Flat 3B".into(), None, true).unwrap()
}

#[test]
fn test_add_assigns_creator_by_default() {
    with_test_db("add_default", |store| {
        let household = setup(&store);
        let draft = ChoreDraft {
            category: Some(Category::PetCare),
            hate_points: Some(3),
            ..ChoreDraft::new("Walk the dog")
        };
        let chore = cmd_add(&store, &alice(), None, draft, &[], true).unwrap();

        let chores = store.list_chores(household.id).unwrap();
        assert_eq!(chores.len(), 1);
        assert_eq!(chores[0].id, chore.id);
        assert_eq!(chores[0].icon, "🐕");
        assert_eq!(chores[0].created_by, "alice");
        assert_eq!(chores[0].assignees.len(), 1);
        assert_eq!(chores[0].assignees[0].name, "Alice Smith");
    });
}

#[test]
fn test_add_rejects_invalid_chore() {
    with_test_db("add_invalid", |store| {
        let household = setup(&store);
        let draft = ChoreDraft { hate_points: Some(9), ..ChoreDraft::new("Taxes") };
        let res = cmd_add(&store, &alice(), None, draft, &[], true);
        assert!(matches!(res, Err(ChoreError::Validation(_))));

        let res = cmd_add(&store, &alice(), None, ChoreDraft::new(""), &[], true);
        assert!(matches!(res, Err(ChoreError::Validation(_))));

        assert!(store.list_chores(household.id).unwrap().is_empty());
    });
}

#[test]
fn test_add_requires_household() {
    with_test_db("no_household", |store| {
        let res = cmd_add(&store, &alice(), None, ChoreDraft::new("Dishes"), &[], true);
        assert!(matches!(res, Err(ChoreError::NoHousehold(_))));
    });
}

#[test]
fn test_multiple_households_need_explicit_choice() {
    with_test_db("multi_household", |store| {
        setup(&store);
        let second = cmd_household_create(&store, &alice(), "Cabin".into(), None, true).unwrap();

        let res = resolve_household(&store, &alice(), None);
        assert!(matches!(res, Err(ChoreError::NoHousehold(_))));

        let prefix = short_id(second.id);
        let picked = resolve_household(&store, &alice(), Some(&prefix)).unwrap();
        assert_eq!(picked.id, second.id);
    });
}

#[test]
fn test_join_and_assign() {
    with_test_db("join_assign", |store| {
        let household = setup(&store);
        let chore = cmd_add(&store, &alice(), None, ChoreDraft::new("Mow lawn"), &[], true).unwrap();
        let id = short_id(chore.id);

        // bob is not a member yet
        let res = cmd_assign(&store, &alice(), None, &id, "bob", true);
        assert!(matches!(res, Err(ChoreError::NotAMember { .. })));

        let member = cmd_household_join(&store, &bob(), &short_id(household.id), true).unwrap();
        assert_eq!(member.role, Role::Member);
        // joining twice keeps a single membership
        cmd_household_join(&store, &bob(), &short_id(household.id), true).unwrap();
        assert_eq!(store.list_members(household.id).unwrap().len(), 2);

        let updated = cmd_assign(&store, &alice(), None, &id, "bob", true).unwrap();
        assert_eq!(updated.assignees.len(), 2);
        assert!(updated.is_assigned_to("bob"));

        let updated = cmd_unassign(&store, &bob(), None, &id, "alice", true).unwrap();
        assert_eq!(updated.assignees.len(), 1);
        assert_eq!(store.get_chore(chore.id).unwrap().unwrap().assignees[0].user_id, "bob");
    });
}

#[test]
fn test_add_with_explicit_assignees() {
    with_test_db("explicit_assign", |store| {
        let household = setup(&store);
        cmd_household_join(&store, &bob(), &short_id(household.id), true).unwrap();

        let chore = cmd_add(&store, &alice(), None, ChoreDraft::new("Groceries"), &["bob".to_string()], true).unwrap();
        assert_eq!(chore.assignees.len(), 1);
        assert_eq!(chore.assignees[0].user_id, "bob");

        let res = cmd_add(&store, &alice(), None, ChoreDraft::new("Groceries"), &["carol".to_string()], true);
        assert!(matches!(res, Err(ChoreError::NotAMember { .. })));
    });
}

#[test]
fn test_toggle_recurring_creates_successor() {
    with_test_db("recurrence", |store| {
        let household = setup(&store);
        let draft = ChoreDraft { recurring: Recurrence::Daily, ..ChoreDraft::new("Feed cat") };
        let chore = cmd_add(&store, &alice(), None, draft, &[], true).unwrap();

        let before = Utc::now();
        let toggled = cmd_toggle(&store, &alice(), None, &short_id(chore.id), true).unwrap();
        let successor = toggled.successor.expect("daily chore rolls over");

        let chores = store.list_chores(household.id).unwrap();
        assert_eq!(chores.len(), 2);
        let completed = chores.iter().find(|c| c.is_completed).unwrap();
        let next = chores.iter().find(|c| !c.is_completed).unwrap();
        assert_eq!(completed.id, chore.id);
        assert!(completed.completed_at.is_some());
        assert_eq!(next.id, successor.id);
        assert_ne!(next.id, chore.id);
        assert_eq!(next.title, "Feed cat");

        let due = next.due_date.unwrap();
        assert!(due >= before + Duration::days(1));
        assert!(due <= Utc::now() + Duration::days(1));
    });
}

#[test]
fn test_uncomplete_keeps_successor() {
    with_test_db("uncomplete", |store| {
        let household = setup(&store);
        let draft = ChoreDraft { recurring: Recurrence::Weekly, ..ChoreDraft::new("Laundry") };
        let chore = cmd_add(&store, &alice(), None, draft, &[], true).unwrap();
        let id = short_id(chore.id);

        cmd_toggle(&store, &alice(), None, &id, true).unwrap();
        let undone = cmd_toggle(&store, &alice(), None, &id, true).unwrap();
        assert!(undone.successor.is_none());
        assert!(!undone.chore.is_completed);

        let chores = store.list_chores(household.id).unwrap();
        assert_eq!(chores.len(), 2);
        assert!(chores.iter().all(|c| !c.is_completed));
        assert!(chores.iter().all(|c| c.completed_at.is_none()));
    });
}

#[test]
fn test_toggle_non_recurring_twice() {
    with_test_db("toggle_twice", |store| {
        let household = setup(&store);
        let chore = cmd_add(&store, &alice(), None, ChoreDraft::new("Fix shelf"), &[], true).unwrap();
        let id = short_id(chore.id);

        let done = cmd_toggle(&store, &alice(), None, &id, true).unwrap();
        assert!(done.successor.is_none());
        cmd_toggle(&store, &alice(), None, &id, true).unwrap();

        let chores = store.list_chores(household.id).unwrap();
        assert_eq!(chores, vec![chore]);
    });
}

#[test]
fn test_monthly_rollover_overflows() {
    with_test_db("monthly", |store| {
        setup(&store);
        let jan31 = Utc.with_ymd_and_hms(2025, 1, 31, 9, 30, 0).unwrap();
        let draft = ChoreDraft {
            recurring: Recurrence::Monthly,
            due_date: Some(jan31),
            ..ChoreDraft::new("Pay rent")
        };
        let chore = cmd_add(&store, &alice(), None, draft, &[], true).unwrap();

        let toggled = toggle_chore(&store, &chore, jan31).unwrap();
        let next = toggled.successor.unwrap();
        assert_eq!(next.due_date, Some(Utc.with_ymd_and_hms(2025, 3, 3, 9, 30, 0).unwrap()));
        assert_eq!(store.get_chore(chore.id).unwrap().unwrap().due_date, Some(jan31));
    });
}

#[test]
fn test_edit_partial_update() {
    with_test_db("edit", |store| {
        setup(&store);
        let draft = ChoreDraft {
            description: Some("Counters and sink".into()),
            due_date: Some(Utc::now()),
            ..ChoreDraft::new("Clean kitchen")
        };
        let chore = cmd_add(&store, &alice(), None, draft, &[], true).unwrap();

        let update = ChoreUpdate {
            priority: Some(Priority::High),
            hate_points: Some(6),
            clear_due_date: true,
            ..Default::default()
        };
        let updated = cmd_edit(&store, &alice(), None, &short_id(chore.id), update, true).unwrap();
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.hate_points, 6);
        assert_eq!(updated.due_date, None);
        assert_eq!(updated.title, "Clean kitchen");
        assert_eq!(updated.description.as_deref(), Some("Counters and sink"));

        let bad = ChoreUpdate { hate_points: Some(0), ..Default::default() };
        let res = cmd_edit(&store, &alice(), None, &short_id(chore.id), bad, true);
        assert!(matches!(res, Err(ChoreError::Validation(_))));
        assert_eq!(store.get_chore(chore.id).unwrap().unwrap().hate_points, 6);
    });
}

#[test]
fn test_remove_and_unknown_ids() {
    with_test_db("remove", |store| {
        let household = setup(&store);
        let chore = cmd_add(&store, &alice(), None, ChoreDraft::new("Dust"), &[], true).unwrap();

        let res = cmd_remove(&store, &alice(), None, "zzzz", true);
        assert!(matches!(res, Err(ChoreError::UnknownId { .. })));

        cmd_remove(&store, &alice(), None, &chore.id.to_string(), true).unwrap();
        assert!(store.list_chores(household.id).unwrap().is_empty());
    });
}

#[test]
fn test_ambiguous_prefix() {
    with_test_db("ambiguous", |store| {
        setup(&store);
        for i in 0..40 {
            cmd_add(&store, &alice(), None, ChoreDraft::new(format!("Chore {}", i)), &[], true).unwrap();
        }
        // 40 random ids over 16 leading hex digits: some digit repeats
        let res = (0..16)
            .map(|d| format!("{:x}", d))
            .map(|p| cmd_show(&store, &alice(), None, &p))
            .find(|r| matches!(r, Err(ChoreError::AmbiguousId { .. })));
        assert!(res.is_some());
    });
}

#[test]
fn test_query_filters_and_sorts() {
    with_test_db("query", |store| {
        let household = setup(&store);
        let add = |title: &str, category: Category, priority: Priority| {
            let draft = ChoreDraft { category: Some(category), priority, ..ChoreDraft::new(title) };
            cmd_add(&store, &alice(), None, draft, &[], true).unwrap();
        };
        add("Sweep", Category::Cleaning, Priority::Low);
        add("Cook dinner", Category::Cooking, Priority::High);
        add("Vacuum", Category::Cleaning, Priority::High);
        add("Buy milk", Category::Shopping, Priority::Medium);

        let sort = SortState { by: SortBy::Priority, direction: SortDirection::Desc };
        let chores = query_chores(&store, household.id, &[Category::Cleaning, Category::Cooking], sort).unwrap();
        let titles: Vec<&str> = chores.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles.len(), 3);
        assert_eq!(titles[2], "Sweep");
        assert!(titles[..2].contains(&"Cook dinner"));
        assert!(titles[..2].contains(&"Vacuum"));

        let all = query_chores(&store, household.id, &[], SortState::default()).unwrap();
        assert_eq!(all.len(), 4);
    });
}

#[test]
fn test_stats_for_household() {
    with_test_db("stats", |store| {
        setup(&store);
        let hated = ChoreDraft { hate_points: Some(5), ..ChoreDraft::new("Scrub toilet") };
        cmd_add(&store, &alice(), None, hated, &[], true).unwrap();
        let easy = ChoreDraft { hate_points: Some(2), ..ChoreDraft::new("Wipe table") };
        let easy = cmd_add(&store, &alice(), None, easy, &[], true).unwrap();
        cmd_toggle(&store, &alice(), None, &short_id(easy.id), true).unwrap();

        let stats = cmd_stats(&store, &alice(), None).unwrap();
        assert_eq!(stats.completion_rate, 50.0);
        assert_eq!(stats.avg_hate_points, 3.5);
        assert_eq!(stats.high_hate_count, 1);
        assert_eq!(stats.most_hated_label(), "Cleaning");
    });
}

#[test]
fn test_parse_due_formats() {
    let rfc = parse_due("2025-07-01T10:00:00Z").unwrap();
    assert_eq!(rfc, Utc.with_ymd_and_hms(2025, 7, 1, 10, 0, 0).unwrap());
    assert!(parse_due("2025-07-01").is_ok());
    assert!(matches!(parse_due("next tuesday"), Err(ChoreError::Validation(_))));
}

/// Delegates to a `JsonStore` but refuses inserts once `fail_inserts` is set.
struct FlakyStore {
    inner: JsonStore,
    fail_inserts: Cell<bool>,
}

impl ChoreStore for FlakyStore {
    fn get_chore(&self, id: Uuid) -> Result<Option<Chore>, StoreError> {
        self.inner.get_chore(id)
    }
    fn list_chores(&self, household_id: Uuid) -> Result<Vec<Chore>, StoreError> {
        self.inner.list_chores(household_id)
    }
    fn insert_chore(&self, chore: &Chore) -> Result<(), StoreError> {
        if self.fail_inserts.get() {
            return Err(StoreError::NotFound { kind: "table", id: "chores".into() });
        }
        self.inner.insert_chore(chore)
    }
    fn save_chore(&self, chore: &Chore) -> Result<(), StoreError> {
        self.inner.save_chore(chore)
    }
    fn update_chore(&self, id: Uuid, update: &ChoreUpdate) -> Result<Chore, StoreError> {
        self.inner.update_chore(id, update)
    }
    fn delete_chore(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.delete_chore(id)
    }
    fn list_households(&self) -> Result<Vec<Household>, StoreError> {
        self.inner.list_households()
    }
    fn insert_household(&self, household: &Household) -> Result<(), StoreError> {
        self.inner.insert_household(household)
    }
    fn list_members(&self, household_id: Uuid) -> Result<Vec<Member>, StoreError> {
        self.inner.list_members(household_id)
    }
    fn memberships(&self, user_id: &str) -> Result<Vec<Member>, StoreError> {
        self.inner.memberships(user_id)
    }
    fn insert_member(&self, member: &Member) -> Result<(), StoreError> {
        self.inner.insert_member(member)
    }
    fn revision(&self) -> Result<Option<String>, StoreError> {
        self.inner.revision()
    }
}

#[test]
fn test_failed_successor_keeps_completion() {
    with_test_db("flaky", |inner| {
        let store = FlakyStore { inner, fail_inserts: Cell::new(false) };
        let household = cmd_household_create(&store, &alice(), "Flat".into(), None, true).unwrap();
        let draft = ChoreDraft { recurring: Recurrence::Daily, ..ChoreDraft::new("Water plants") };
        let chore = cmd_add(&store, &alice(), None, draft, &[], true).unwrap();

        store.fail_inserts.set(true);
        let toggled = toggle_chore(&store, &chore, Utc::now()).unwrap();
        assert!(toggled.chore.is_completed);
        assert!(toggled.successor.is_none());

        let chores = store.list_chores(household.id).unwrap();
        assert_eq!(chores.len(), 1);
        assert!(chores[0].is_completed);
    });
}

#[test]
fn test_reset_deletes_everything() {
    with_test_db("reset", |store| {
        let household = setup(&store);
        cmd_add(&store, &alice(), None, ChoreDraft::new("Dishes"), &[], true).unwrap();

        cmd_reset(&store, true).unwrap();
        assert!(store.list_chores(household.id).unwrap().is_empty());
        assert!(store.list_households().unwrap().is_empty());
        assert!(store.memberships("alice").unwrap().is_empty());
        assert_eq!(store.revision().unwrap(), None);
    });
}
