//! Project ("tracker") management
//!
//! The project list is one JSON array in the local store. Each project also
//! owns up to three side records (settings, installment ledger, expense
//! ledger) which are removed with it and brought back by an undo.

use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::keys;
use crate::model::{GlobalSettings, Project, ProjectKind, ProjectSettings};
use crate::secret;
use crate::storage::{get_json, set_json, KeyValueStore, Stores};

/// How long a deleted project can be restored
pub const UNDO_WINDOW: Duration = Duration::from_secs(7);

/// Date format used for reminder bookkeeping
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Project errors
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("Please enter a valid project name")]
    EmptyName,

    #[error("Project not found: {0}")]
    NotFound(i64),

    #[error("Project already exists: {0}")]
    AlreadyExists(i64),

    #[error("Incorrect PIN")]
    IncorrectPin,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for project operations
pub type Result<T> = std::result::Result<T, ProjectError>;

/// Everything needed to put a deleted project back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoTicket {
    pub project: Project,
    /// Position the project held in the list
    pub index: usize,
    pub settings: Option<String>,
    pub installment: Option<String>,
    pub expense: Option<String>,
}

/// Holds the most recent [`UndoTicket`] for a limited time
#[derive(Debug)]
pub struct UndoWindow {
    pending: Option<(UndoTicket, Instant)>,
    ttl: Duration,
}

impl Default for UndoWindow {
    fn default() -> Self {
        Self::new(UNDO_WINDOW)
    }
}

impl UndoWindow {
    /// Create a window with a custom lifetime
    pub fn new(ttl: Duration) -> Self {
        Self { pending: None, ttl }
    }

    /// Offer a ticket, replacing any earlier one
    pub fn offer(&mut self, ticket: UndoTicket) {
        self.pending = Some((ticket, Instant::now()));
    }

    /// Whether a ticket can still be taken
    pub fn is_open(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|(_, at)| at.elapsed() <= self.ttl)
    }

    /// Take the ticket if it has not expired
    pub fn take(&mut self) -> Option<UndoTicket> {
        let open = self.is_open();
        let (ticket, _) = self.pending.take()?;
        open.then_some(ticket)
    }

    /// Drop any pending ticket
    pub fn close(&mut self) {
        self.pending = None;
    }
}

/// Project list stored in the local store
pub struct ProjectBook {
    stores: Stores,
    fallback_secret: String,
}

impl ProjectBook {
    /// Create a book over `stores`
    ///
    /// `fallback_secret` authorizes deletion while no PIN has been stored.
    pub fn new(stores: Stores, fallback_secret: impl Into<String>) -> Self {
        Self {
            stores,
            fallback_secret: fallback_secret.into(),
        }
    }

    /// All projects in stored order
    pub fn list(&self) -> Result<Vec<Project>> {
        Ok(get_json(self.stores.local.as_ref(), keys::PROJECTS)?.unwrap_or_default())
    }

    fn save(&self, projects: &[Project]) -> Result<()> {
        set_json(self.stores.local.as_ref(), keys::PROJECTS, &projects)?;
        Ok(())
    }

    /// Look up one project
    pub fn get(&self, id: i64) -> Result<Project> {
        self.list()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or(ProjectError::NotFound(id))
    }

    /// Create a project now and make it the current project
    pub fn create(&self, name: &str, kind: ProjectKind) -> Result<Project> {
        self.create_at(name, kind, Utc::now())
    }

    /// Create a project stamped with `now`
    pub fn create_at(&self, name: &str, kind: ProjectKind, now: DateTime<Utc>) -> Result<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProjectError::EmptyName);
        }

        let mut projects = self.list()?;
        let mut id = now.timestamp_millis();
        if let Some(max) = projects.iter().map(|p| p.id).max() {
            if id <= max {
                id = max + 1;
            }
        }

        let project = Project {
            id,
            name: name.to_string(),
            kind,
        };
        projects.push(project.clone());
        self.save(&projects)?;

        set_json(
            self.stores.local.as_ref(),
            &keys::project_settings(id),
            &ProjectSettings::initial(kind),
        )?;
        self.stores
            .session
            .set(keys::CURRENT_PROJECT, &id.to_string())?;

        tracing::info!("Created project {} ({})", id, kind.label());
        Ok(project)
    }

    /// Make `id` the project the tracker page opens
    pub fn open(&self, id: i64) -> Result<Project> {
        let project = self.get(id)?;
        self.stores
            .session
            .set(keys::CURRENT_PROJECT, &id.to_string())?;
        Ok(project)
    }

    /// Currently opened project id, if any
    pub fn current(&self) -> Result<Option<i64>> {
        Ok(self
            .stores
            .session
            .get(keys::CURRENT_PROJECT)?
            .and_then(|raw| raw.parse().ok()))
    }

    /// Rename a project
    ///
    /// Returns `false` when the new name is blank or unchanged.
    pub fn rename(&self, id: i64, new_name: &str) -> Result<bool> {
        let mut projects = self.list()?;
        let project = projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(ProjectError::NotFound(id))?;

        let new_name = new_name.trim();
        if new_name.is_empty() || new_name == project.name {
            return Ok(false);
        }

        project.name = new_name.to_string();
        self.save(&projects)?;
        Ok(true)
    }

    /// Delete a project after checking the PIN
    pub fn delete(&self, id: i64, pin: &str) -> Result<UndoTicket> {
        if !secret::verify_or_fallback(self.stores.local.as_ref(), pin, &self.fallback_secret)? {
            tracing::warn!("Rejected project deletion: incorrect PIN");
            return Err(ProjectError::IncorrectPin);
        }

        let mut projects = self.list()?;
        let index = projects
            .iter()
            .position(|p| p.id == id)
            .ok_or(ProjectError::NotFound(id))?;

        let local = self.stores.local.as_ref();
        let ticket = UndoTicket {
            project: projects.remove(index),
            index,
            settings: local.get(&keys::project_settings(id))?,
            installment: local.get(&keys::project_installment(id))?,
            expense: local.get(&keys::project_expense(id))?,
        };

        self.save(&projects)?;
        if let Err(e) = Self::remove_records(local, id) {
            tracing::warn!("Could not remove records of project {}: {}", id, e);
            self.restore(ticket)?;
            return Err(e.into());
        }

        tracing::info!("Deleted project {}", id);
        Ok(ticket)
    }

    fn remove_records(local: &dyn KeyValueStore, id: i64) -> std::result::Result<(), StoreError> {
        local.remove(&keys::project_settings(id))?;
        local.remove(&keys::project_installment(id))?;
        local.remove(&keys::project_expense(id))
    }

    /// Put a deleted project back where it was
    pub fn restore(&self, ticket: UndoTicket) -> Result<Project> {
        let mut projects = self.list()?;
        let id = ticket.project.id;
        if projects.iter().any(|p| p.id == id) {
            return Err(ProjectError::AlreadyExists(id));
        }

        let index = ticket.index.min(projects.len());
        projects.insert(index, ticket.project.clone());
        self.save(&projects)?;

        let local = self.stores.local.as_ref();
        let records = [
            (keys::project_settings(id), &ticket.settings),
            (keys::project_installment(id), &ticket.installment),
            (keys::project_expense(id), &ticket.expense),
        ];
        for (key, value) in records {
            if let Some(value) = value {
                local.set(&key, value)?;
            }
        }

        tracing::info!("Restored project {}", id);
        Ok(ticket.project)
    }

    /// Projects whose name contains `term`, case-insensitively
    pub fn search(&self, term: &str) -> Result<Vec<Project>> {
        let needle = term.trim().to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect())
    }

    /// Whether the installment reminder banner should show on `today`
    pub fn reminder_due(&self, settings: &GlobalSettings, today: NaiveDate) -> Result<bool> {
        use chrono::Datelike;

        let reminder = match settings.installment_reminder {
            Some(r) if r.enabled => r,
            _ => return Ok(false),
        };
        if today.day() != reminder.day_of_month {
            return Ok(false);
        }

        let today_str = today.format(DATE_FORMAT).to_string();
        let local = self.stores.local.as_ref();
        if local.get(keys::LAST_INSTALLMENT_ADDED)?.as_deref() == Some(today_str.as_str())
            || local.get(keys::LAST_REMINDER_DISMISSED)?.as_deref() == Some(today_str.as_str())
        {
            return Ok(false);
        }

        Ok(self
            .list()?
            .iter()
            .any(|p| p.kind == ProjectKind::Installment))
    }

    /// Hide the reminder banner for the rest of `today`
    pub fn dismiss_reminder(&self, today: NaiveDate) -> Result<()> {
        self.stores.local.set(
            keys::LAST_REMINDER_DISMISSED,
            &today.format(DATE_FORMAT).to_string(),
        )?;
        Ok(())
    }

    /// Record that an installment was entered on `today`
    pub fn record_installment_added(&self, today: NaiveDate) -> Result<()> {
        self.stores.local.set(
            keys::LAST_INSTALLMENT_ADDED,
            &today.format(DATE_FORMAT).to_string(),
        )?;
        Ok(())
    }
}
