use chrono::Utc;
use ratatui::widgets::TableState;
use tracing::warn;

use crate::commands::{parse_due, query_chores, toggle_chore};
use crate::config::Identity;
use crate::error::{ChoreError, Result};
use crate::models::{validate_hate_points, Category, Chore, ChoreDraft, ChoreUpdate, Household};
use crate::stats::{compute_stats, ChoreStats};
use crate::storage::{ChoreStore, JsonStore};
use crate::views::{split_board, SortState};

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
    Adding,
}

/// Which board column has the cursor.
#[derive(PartialEq, Clone, Copy)]
pub enum Column {
    Open,
    Done,
}

/// State for the multi-step "Add Chore" wizard.
#[derive(Default)]
pub struct AddState {
    pub draft: ChoreDraft,
    pub step: usize, // 0: Title, 1: Category, 2: Hate, 3: Recur, 4: Due
}

pub struct App {
    pub store: JsonStore,
    pub identity: Identity,
    pub household: Household,
    pub open: Vec<Chore>,
    pub done: Vec<Chore>,
    pub stats: ChoreStats,
    pub open_state: TableState,
    pub done_state: TableState,
    pub column: Column,
    pub sort: SortState,
    pub filters: Vec<Category>,
    /// Category the `f`/`F` keys act on.
    pub filter_cursor: Option<Category>,
    pub input_mode: InputMode,
    pub input_buffer: String,
    pub add_state: AddState,
    /// Last message shown in the footer.
    pub status: Option<String>,
    /// Store revision the board was last loaded from.
    revision: Option<String>,
}

impl App {
    /// Creates a new App instance and loads initial data.
    pub fn new(store: JsonStore, identity: Identity, household: Household) -> Result<App> {
        let mut app = App {
            store,
            identity,
            household,
            open: Vec::new(),
            done: Vec::new(),
            stats: compute_stats(&[]),
            open_state: TableState::default(),
            done_state: TableState::default(),
            column: Column::Open,
            sort: SortState::default(),
            filters: Vec::new(),
            filter_cursor: None,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            add_state: AddState::default(),
            status: None,
            revision: None,
        };
        app.reload()?;
        Ok(app)
    }

    /// Re-fetches everything from the store and recomputes the board.
    ///
    /// The revision is read before fetching and only recorded once the fetch
    /// succeeded, so a failed or racing reload is retried on the next poll.
    pub fn reload(&mut self) -> Result<()> {
        let revision = self.store.revision()?;
        let all = self.store.list_chores(self.household.id)?;
        let shown = query_chores(&self.store, self.household.id, &self.filters, self.sort)?;

        self.stats = compute_stats(&all);
        let (open, done) = split_board(&shown);
        self.open = open;
        self.done = done;
        clamp_selection(&mut self.open_state, self.open.len());
        clamp_selection(&mut self.done_state, self.done.len());
        self.revision = revision;
        Ok(())
    }

    /// Reloads when another process has written to the store.
    pub fn refresh_if_stale(&mut self) -> Result<()> {
        if self.store.revision()? != self.revision {
            self.reload()?;
        }
        Ok(())
    }

    fn current(&mut self) -> (&Vec<Chore>, &mut TableState) {
        match self.column {
            Column::Open => (&self.open, &mut self.open_state),
            Column::Done => (&self.done, &mut self.done_state),
        }
    }

    pub fn selected_chore(&self) -> Option<&Chore> {
        match self.column {
            Column::Open => self.open_state.selected().and_then(|i| self.open.get(i)),
            Column::Done => self.done_state.selected().and_then(|i| self.done.get(i)),
        }
    }

    /// Selects the next chore in the focused column.
    pub fn next(&mut self) {
        let (items, state) = self.current();
        if items.is_empty() { return; }
        let i = match state.selected() {
            Some(i) if i + 1 < items.len() => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    /// Selects the previous chore in the focused column.
    pub fn previous(&mut self) {
        let (items, state) = self.current();
        if items.is_empty() { return; }
        let i = match state.selected() {
            Some(0) | None => items.len() - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    pub fn switch_column(&mut self) {
        self.column = match self.column {
            Column::Open => Column::Done,
            Column::Done => Column::Open,
        };
    }

    /// Completes the selected chore, or re-opens it from the done column.
    pub fn toggle_selected(&mut self) -> Result<()> {
        let chore = match self.selected_chore() {
            Some(c) => c.clone(),
            None => return Ok(()),
        };
        let toggled = toggle_chore(&self.store, &chore, Utc::now())?;
        self.status = Some(match (&toggled.successor, toggled.chore.is_completed) {
            (Some(_), _) => format!("Done: {} (next one scheduled)", chore.title),
            (None, true) if chore.recurring.is_recurring() => {
                format!("Done: {} (could not schedule the next one)", chore.title)
            }
            (None, true) => format!("Done: {}", chore.title),
            (None, false) => format!("Re-opened: {}", chore.title),
        });
        self.reload()
    }

    /// Deletes the selected chore.
    pub fn delete_selected(&mut self) -> Result<()> {
        if let Some(chore) = self.selected_chore().cloned() {
            self.store.delete_chore(chore.id)?;
            self.status = Some(format!("Removed: {}", chore.title));
            self.reload()?;
        }
        Ok(())
    }

    /// Next sort key, starting ascending.
    pub fn cycle_sort(&mut self) -> Result<()> {
        self.sort = self.sort.select(self.sort.by.next());
        self.reload()
    }

    /// Same sort key again, which flips the direction.
    pub fn flip_sort(&mut self) -> Result<()> {
        self.sort = self.sort.select(self.sort.by);
        self.reload()
    }

    /// Moves the filter cursor to the next category and filters on it alone.
    /// Past the last category the filter is cleared.
    pub fn cycle_filter(&mut self) -> Result<()> {
        let next = match self.filter_cursor {
            None => Category::ALL.first().copied(),
            Some(c) => Category::ALL
                .iter()
                .position(|&o| o == c)
                .and_then(|i| Category::ALL.get(i + 1).copied()),
        };
        self.filter_cursor = next;
        self.filters = next.into_iter().collect();
        self.reload()
    }

    /// Adds the category under the filter cursor, or removes it if active.
    pub fn toggle_filter(&mut self) -> Result<()> {
        let c = *self.filter_cursor.get_or_insert(Category::Cleaning);
        if let Some(i) = self.filters.iter().position(|&f| f == c) {
            self.filters.remove(i);
        } else {
            self.filters.push(c);
        }
        self.reload()
    }

    pub fn clear_filters(&mut self) -> Result<()> {
        self.filters.clear();
        self.filter_cursor = None;
        self.reload()
    }

    /// Initiates the "Add Chore" wizard.
    pub fn start_add(&mut self) {
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.status = None;
        self.input_buffer.clear();
    }

    /// Starts editing the selected chore's title.
    pub fn start_edit(&mut self) {
        if let Some(title) = self.selected_chore().map(|c| c.title.clone()) {
            self.input_mode = InputMode::Editing;
            self.input_buffer = title;
            self.status = None;
        }
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    /// Shows a failed action in the footer.
    pub fn report(&mut self, res: Result<()>) {
        if let Err(e) = res {
            warn!(error = %e, "action failed");
            self.status = Some(e.to_string());
        }
    }

    /// Handles text input based on the current mode.
    ///
    /// A rejected value keeps the input open; the error lands in `status`
    /// through [`App::report`].
    pub fn handle_input(&mut self) -> Result<()> {
        self.status = None;
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input(),
            InputMode::Editing => self.handle_editing_input(),
            InputMode::Normal => Ok(()),
        }
    }

    /// Handles input for the "Add Chore" wizard.
    fn handle_adding_input(&mut self) -> Result<()> {
        let input = self.input_buffer.trim().to_string();
        match self.add_state.step {
            0 => { // Title
                if input.is_empty() { return Ok(()); }
                self.add_state.draft.title = input;
            }
            1 => { // Category
                if !input.is_empty() {
                    self.add_state.draft.category = Some(input.parse()?);
                }
            }
            2 => { // Hate
                if !input.is_empty() {
                    let points = input
                        .parse::<u8>()
                        .map_err(|_| ChoreError::Validation(format!("'{}' is not a number", input)))?;
                    validate_hate_points(points)?;
                    self.add_state.draft.hate_points = Some(points);
                }
            }
            3 => { // Recur
                self.add_state.draft.recurring = input.parse()?;
            }
            _ => { // Due, then finish
                if !input.is_empty() {
                    self.add_state.draft.due_date = Some(parse_due(&input)?);
                }
                let draft = std::mem::take(&mut self.add_state.draft);
                let chore = draft.build(self.household.id, &self.identity.as_assignee(), Utc::now())?;
                self.store.insert_chore(&chore)?;
                self.status = Some(format!("Added: {}", chore.title));
                self.input_mode = InputMode::Normal;
                self.input_buffer.clear();
                return self.reload();
            }
        }
        self.add_state.step += 1;
        self.input_buffer.clear();
        Ok(())
    }

    /// Handles input for the "Edit Title" mode.
    fn handle_editing_input(&mut self) -> Result<()> {
        if let Some(id) = self.selected_chore().map(|c| c.id) {
            let update = ChoreUpdate { title: Some(self.input_buffer.clone()), ..Default::default() };
            update.validate()?;
            self.store.update_chore(id, &update)?;
        }
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
        self.reload()
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
    } else if let Some(i) = state.selected() {
        if i >= len {
            state.select(Some(len - 1));
        }
    } else {
        state.select(Some(0));
    }
}
