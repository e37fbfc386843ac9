//! # Choreboard
//!
//! A terminal chore board for shared households. Members of a household add
//! chores, rate how much they hate them, assign them to each other and tick
//! them off. Recurring chores come back automatically.
//!
//! ## Features
//!
//! *   **Households**: Create a household, let others join it, share one board.
//! *   **Hate Points**: Rate every chore from 1 (mildly annoying) to 7 (pure agony).
//! *   **Recurrence**: Daily, weekly and monthly chores spawn their next occurrence
//!     when completed, due one period after the moment of completion.
//! *   **Sorting & Filters**: Sort by category, priority, due date or creation date;
//!     filter by category.
//! *   **Stats**: Completion rate, average hate level, pending count and the most
//!     hated category.
//! *   **Dual Interface**: A scriptable CLI and an interactive board (TUI).
//!
//! ## Usage
//!
//! ```bash
//! # Start a household (you become its admin)
//! choreboard household create "Flat 3B"
//!
//! # Add a chore
//! choreboard add "Take out trash" --category cleaning --hate 4 --recur weekly --due 2025-07-01
//!
//! # List open chores sorted by priority, highest first
//! choreboard list --sort priority --desc
//!
//! # Complete (or re-open) a chore by id prefix
//! choreboard toggle 3f2a
//!
//! # Board view
//! choreboard ui
//! ```
//!
//! ## Configuration
//!
//! *   `CHORES_DB`: path of the chores file (default `~/.local/share/choreboard/chores.json`).
//! *   `CHOREBOARD_USER`, `CHOREBOARD_NAME`, `CHOREBOARD_AVATAR`: who you are.
//! *   `CHOREBOARD_HOUSEHOLD`: default household id when you belong to several.
//! *   `CHOREBOARD_LOG`: log filter, e.g. `info` or `choreboard=debug`.

use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

use choreboard::commands::*;
use choreboard::config::Config;
use choreboard::error::Result;
use choreboard::logging;
use choreboard::models::{Category, ChoreDraft, ChoreUpdate};
use choreboard::storage::JsonStore;
use choreboard::tui::run_tui;
use choreboard::views::{SortBy, SortDirection, SortState};

#[derive(Parser)]
#[command(name = "choreboard")]
#[command(about = "Shared household chore board", long_about = None)]
struct Cli {
    /// Household id (or prefix) to act on
    #[arg(long, global = true)]
    household: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage households
    Household {
        #[command(subcommand)]
        command: HouseholdCommands,
    },
    /// List members of the household
    Members,
    /// Add a new chore
    Add {
        /// Chore title (quoted if it has spaces)
        title: String,
        /// Longer description
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// Cleaning, Cooking, Shopping, Maintenance, Outdoor or "Pet Care"
        #[arg(short, long)]
        category: Option<String>,
        /// Icon, defaults to the category's icon
        #[arg(short, long)]
        icon: Option<String>,
        /// Hate points from 1 to 7
        #[arg(short = 'x', long)]
        hate: Option<u8>,
        /// low, medium or high
        #[arg(short, long)]
        priority: Option<String>,
        /// Recurrence (none, daily, weekly, monthly)
        #[arg(short, long)]
        recur: Option<String>,
        /// Due date in YYYY-MM-DD
        #[arg(short, long)]
        due: Option<String>,
        /// User id of a member to assign (repeatable, defaults to you)
        #[arg(short, long)]
        assign: Vec<String>,
    },
    /// Edit a chore
    Edit {
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New description (empty string clears it)
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// New category
        #[arg(short, long)]
        category: Option<String>,
        /// New icon
        #[arg(short, long)]
        icon: Option<String>,
        /// New hate points
        #[arg(short = 'x', long)]
        hate: Option<u8>,
        /// New priority
        #[arg(short, long)]
        priority: Option<String>,
        /// New recurrence
        #[arg(short, long)]
        recur: Option<String>,
        /// New due date
        #[arg(short, long)]
        due: Option<String>,
        /// Remove the due date
        #[arg(long, conflicts_with = "due")]
        no_due: bool,
    },
    /// Mark a chore as complete, or open again
    #[command(alias = "complete")]
    Toggle { id: String },
    /// Assign a member to a chore
    Assign { id: String, user: String },
    /// Remove a member from a chore
    Unassign { id: String, user: String },
    /// Remove a chore
    Remove { id: String },
    /// Show all details of a chore
    Show { id: String },
    /// List chores
    List {
        /// Only these categories (repeatable)
        #[arg(short, long)]
        category: Vec<String>,
        /// Sort key: category, priority, due_date, created_at
        #[arg(short, long, default_value = "created_at")]
        sort: String,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Show completed chores
        #[arg(short, long)]
        all: bool,
    },
    /// Show household statistics
    Stats,
    /// Reset the database (delete all chores and households)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive board
    Ui,
}

#[derive(Subcommand)]
enum HouseholdCommands {
    /// Create a household
    Create {
        name: String,
        /// Short description
        #[arg(short = 'D', long)]
        description: Option<String>,
    },
    /// List your households
    List,
    /// Join a household by id
    Join { id: String },
}

fn run(cli: Cli, config: Config) -> Result<()> {
    let store = JsonStore::new(config.db_path.clone());
    let me = &config.identity;
    let household = cli.household.as_deref().or(config.household.as_deref());

    match cli.command {
        Some(Commands::Household { command }) => match command {
            HouseholdCommands::Create { name, description } => {
                cmd_household_create(&store, me, name, description, false).map(|_| ())
            }
            HouseholdCommands::List => cmd_household_list(&store, me),
            HouseholdCommands::Join { id } => cmd_household_join(&store, me, &id, false).map(|_| ()),
        },
        Some(Commands::Members) => cmd_members(&store, me, household),
        Some(Commands::Add { title, description, category, icon, hate, priority, recur, due, assign }) => {
            let draft = ChoreDraft {
                title,
                description,
                category: category.map(|c| c.parse()).transpose()?,
                icon,
                hate_points: hate,
                priority: priority.map(|p| p.parse()).transpose()?.unwrap_or_default(),
                recurring: recur.map(|r| r.parse()).transpose()?.unwrap_or_default(),
                due_date: due.map(|d| parse_due(&d)).transpose()?,
                assignees: Vec::new(),
            };
            cmd_add(&store, me, household, draft, &assign, false).map(|_| ())
        }
        Some(Commands::Edit { id, title, description, category, icon, hate, priority, recur, due, no_due }) => {
            let update = ChoreUpdate {
                title,
                description,
                category: category.map(|c| c.parse()).transpose()?,
                icon,
                hate_points: hate,
                priority: priority.map(|p| p.parse()).transpose()?,
                recurring: recur.map(|r| r.parse()).transpose()?,
                due_date: due.map(|d| parse_due(&d)).transpose()?,
                clear_due_date: no_due,
            };
            cmd_edit(&store, me, household, &id, update, false).map(|_| ())
        }
        Some(Commands::Toggle { id }) => cmd_toggle(&store, me, household, &id, false).map(|_| ()),
        Some(Commands::Assign { id, user }) => cmd_assign(&store, me, household, &id, &user, false).map(|_| ()),
        Some(Commands::Unassign { id, user }) => cmd_unassign(&store, me, household, &id, &user, false).map(|_| ()),
        Some(Commands::Remove { id }) => cmd_remove(&store, me, household, &id, false),
        Some(Commands::Show { id }) => cmd_show(&store, me, household, &id).map(|_| ()),
        Some(Commands::List { category, sort, desc, all }) => {
            let categories = category
                .iter()
                .map(|c| c.parse::<Category>())
                .collect::<Result<Vec<_>>>()?;
            let sort = SortState {
                by: sort.parse::<SortBy>()?,
                direction: if desc { SortDirection::Desc } else { SortDirection::Asc },
            };
            cmd_list(&store, me, household, &categories, sort, all)
        }
        Some(Commands::Stats) => cmd_stats(&store, me, household).map(|_| ()),
        Some(Commands::Reset { force }) => cmd_reset(&store, force),
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return Ok(());
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "choreboard", &mut io::stdout());
            Ok(())
        }
        Some(Commands::Ui) | None => {
            let household = resolve_household(&store, me, household)?;
            run_tui(store, config.identity.clone(), household)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::from_env();
    if matches!(cli.command, Some(Commands::Ui) | None) {
        logging::init_file(&config);
    } else {
        logging::init_stderr(&config);
    }

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
