use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Chore, ChoreUpdate, Household, Member};

/// Durable home of chores, households and memberships.
///
/// Callers treat every list as a snapshot: when [`ChoreStore::revision`]
/// changes, they re-fetch instead of merging deltas.
pub trait ChoreStore {
    fn get_chore(&self, id: Uuid) -> Result<Option<Chore>, StoreError>;

    /// Chores of one household, newest first.
    fn list_chores(&self, household_id: Uuid) -> Result<Vec<Chore>, StoreError>;

    fn insert_chore(&self, chore: &Chore) -> Result<(), StoreError>;

    /// Replaces a stored chore wholesale.
    fn save_chore(&self, chore: &Chore) -> Result<(), StoreError>;

    /// Applies a partial update and returns the stored result.
    fn update_chore(&self, id: Uuid, update: &ChoreUpdate) -> Result<Chore, StoreError>;

    /// Returns `false` if there was nothing to delete.
    fn delete_chore(&self, id: Uuid) -> Result<bool, StoreError>;

    fn list_households(&self) -> Result<Vec<Household>, StoreError>;

    fn insert_household(&self, household: &Household) -> Result<(), StoreError>;

    fn list_members(&self, household_id: Uuid) -> Result<Vec<Member>, StoreError>;

    /// All memberships of one user across households.
    fn memberships(&self, user_id: &str) -> Result<Vec<Member>, StoreError>;

    fn insert_member(&self, member: &Member) -> Result<(), StoreError>;

    /// Change token for the stored data; `None` while nothing has been written.
    /// Any write that changes the stored data changes the token.
    fn revision(&self) -> Result<Option<String>, StoreError>;
}

/// Stores everything as pretty-printed JSON files in one directory:
/// `chores.json`, `households.json` and `members.json`.
///
/// Each file is replaced atomically, so readers never see a torn write.
/// Mutations are read-modify-write without a lock: two processes mutating
/// the same file at once can lose one of the writes.
#[derive(Debug, Clone)]
pub struct JsonStore {
    chores_path: PathBuf,
}

impl JsonStore {
    /// `chores_path` names the chores file; the other files sit next to it.
    pub fn new(chores_path: impl Into<PathBuf>) -> Self {
        JsonStore { chores_path: chores_path.into() }
    }

    pub fn chores_path(&self) -> &Path {
        &self.chores_path
    }

    fn sibling(&self, name: &str) -> PathBuf {
        let mut p = self.chores_path.clone();
        p.pop();
        p.push(name);
        p
    }

    fn households_path(&self) -> PathBuf {
        self.sibling("households.json")
    }

    fn members_path(&self) -> PathBuf {
        self.sibling("members.json")
    }

    fn load_chores(&self) -> Result<Vec<Chore>, StoreError> {
        load_list(&self.chores_path)
    }

    fn save_chores(&self, chores: &[Chore]) -> Result<(), StoreError> {
        save_list(&self.chores_path, chores)
    }

    /// Deletes all data files.
    pub fn reset(&self) -> Result<(), StoreError> {
        for path in [self.chores_path.clone(), self.households_path(), self.members_path()] {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed data file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(StoreError::Io { path, source }),
            }
        }
        Ok(())
    }
}

impl ChoreStore for JsonStore {
    fn get_chore(&self, id: Uuid) -> Result<Option<Chore>, StoreError> {
        Ok(self.load_chores()?.into_iter().find(|c| c.id == id))
    }

    fn list_chores(&self, household_id: Uuid) -> Result<Vec<Chore>, StoreError> {
        let mut chores: Vec<Chore> = self
            .load_chores()?
            .into_iter()
            .filter(|c| c.household_id == household_id)
            .collect();
        chores.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(chores)
    }

    fn insert_chore(&self, chore: &Chore) -> Result<(), StoreError> {
        let mut chores = self.load_chores()?;
        chores.push(chore.clone());
        self.save_chores(&chores)
    }

    fn save_chore(&self, chore: &Chore) -> Result<(), StoreError> {
        let mut chores = self.load_chores()?;
        match chores.iter_mut().find(|c| c.id == chore.id) {
            Some(c) => *c = chore.clone(),
            None => return Err(not_found("chore", chore.id)),
        }
        self.save_chores(&chores)
    }

    fn update_chore(&self, id: Uuid, update: &ChoreUpdate) -> Result<Chore, StoreError> {
        let mut chores = self.load_chores()?;
        let chore = chores
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("chore", id))?;
        update.apply(chore);
        let updated = chore.clone();
        self.save_chores(&chores)?;
        Ok(updated)
    }

    fn delete_chore(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut chores = self.load_chores()?;
        let len_before = chores.len();
        chores.retain(|c| c.id != id);
        if chores.len() == len_before {
            return Ok(false);
        }
        self.save_chores(&chores)?;
        Ok(true)
    }

    fn list_households(&self) -> Result<Vec<Household>, StoreError> {
        load_list(&self.households_path())
    }

    fn insert_household(&self, household: &Household) -> Result<(), StoreError> {
        let path = self.households_path();
        let mut households: Vec<Household> = load_list(&path)?;
        households.push(household.clone());
        save_list(&path, &households)
    }

    fn list_members(&self, household_id: Uuid) -> Result<Vec<Member>, StoreError> {
        let members: Vec<Member> = load_list(&self.members_path())?;
        Ok(members.into_iter().filter(|m| m.household_id == household_id).collect())
    }

    fn memberships(&self, user_id: &str) -> Result<Vec<Member>, StoreError> {
        let members: Vec<Member> = load_list(&self.members_path())?;
        Ok(members.into_iter().filter(|m| m.user_id == user_id).collect())
    }

    fn insert_member(&self, member: &Member) -> Result<(), StoreError> {
        let path = self.members_path();
        let mut members: Vec<Member> = load_list(&path)?;
        members.push(member.clone());
        save_list(&path, &members)
    }

    fn revision(&self) -> Result<Option<String>, StoreError> {
        let mut hasher = Sha256::new();
        let mut seen = false;
        for path in [self.chores_path.clone(), self.households_path(), self.members_path()] {
            let bytes = match fs::read(&path) {
                Ok(b) => b,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    hasher.update([0u8]);
                    continue;
                }
                Err(source) => return Err(StoreError::Io { path, source }),
            };
            seen = true;
            hasher.update([1u8]);
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
        }
        Ok(seen.then(|| format!("{:x}", hasher.finalize())))
    }
}

fn not_found(kind: &'static str, id: Uuid) -> StoreError {
    StoreError::NotFound { kind, id: id.to_string() }
}

/// Reads a JSON array from `path`. A missing file is an empty list.
fn load_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(StoreError::Io { path: path.to_path_buf(), source }),
    };
    debug!(path = %path.display(), bytes = s.len(), "loaded data file");
    serde_json::from_str(&s).map_err(|source| StoreError::Json { path: path.to_path_buf(), source })
}

/// Replaces `path` with `items`, creating the parent directory if needed.
///
/// The data goes to a temp file in the same directory first and is then
/// renamed over `path`.
fn save_list<T: Serialize>(path: &Path, items: &[T]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io { path: path.to_path_buf(), source };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(io_err)?;
    let s = serde_json::to_string_pretty(items)
        .map_err(|source| StoreError::Json { path: path.to_path_buf(), source })?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(s.as_bytes()).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    debug!(path = %path.display(), items = items.len(), "saved data file");
    Ok(())
}
