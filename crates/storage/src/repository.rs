//! Repository Implementation

use crate::StorageError;
use chrono::{DateTime, Utc};
use route_safety::{IncidentReport, ReportSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

/// User profile document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub state: Option<String>,
    pub photo_url: Option<String>,
    /// Up to 4 emergency contact numbers
    pub emergency_contacts: Vec<String>,
    /// "en" or "hi"
    pub language: String,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted on signup
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub state: Option<String>,
    pub photo_url: Option<String>,
    pub emergency_contacts: Vec<String>,
    pub language: String,
}

/// Partial profile update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub photo_url: Option<String>,
    pub emergency_contacts: Option<Vec<String>>,
    pub language: Option<String>,
}

/// Issued login session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// Stored unsafe-area report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub severity: u8,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted on report submission
#[derive(Debug, Clone)]
pub struct NewReport {
    pub lat: f64,
    pub lng: f64,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub severity: u8,
    pub user_id: Option<String>,
}

impl From<&ReportRecord> for IncidentReport {
    fn from(record: &ReportRecord) -> Self {
        IncidentReport {
            id: Some(record.id),
            lat: record.lat,
            lng: record.lng,
            severity: record.severity,
            user_id: record.user_id.clone(),
            description: record.description.clone(),
            photo_url: record.photo_url.clone(),
            created_at: Some(record.created_at),
        }
    }
}

/// Repository for data access (in-memory implementation)
pub struct Repository {
    users: Mutex<HashMap<Uuid, User>>,
    sessions: Mutex<Vec<Session>>,
    /// Reports in insertion order, which is also `created_at` order
    reports: Mutex<Vec<ReportRecord>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))
}

fn parse_id(id: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(id).map_err(|_| StorageError::NotFound)
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        info!("Creating in-memory repository");
        Self {
            users: Mutex::new(HashMap::new()),
            sessions: Mutex::new(Vec::new()),
            reports: Mutex::new(Vec::with_capacity(1000)),
        }
    }

    /// Create a user, rejecting a duplicate email or phone
    pub fn create_user(&self, new_user: NewUser) -> Result<User, StorageError> {
        let mut users = lock(&self.users)?;

        if users
            .values()
            .any(|u| u.email == new_user.email || u.phone == new_user.phone)
        {
            return Err(StorageError::Duplicate(
                "User with this email or phone already exists".to_string(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            phone: new_user.phone,
            address: new_user.address,
            state: new_user.state,
            photo_url: new_user.photo_url,
            emergency_contacts: new_user.emergency_contacts,
            language: new_user.language,
            created_at: Utc::now(),
        };

        users.insert(user.id, user.clone());
        info!("Created user {}", user.id);
        Ok(user)
    }

    /// Find the user matching both email and phone
    pub fn find_user_by_credentials(&self, email: &str, phone: &str) -> Result<User, StorageError> {
        let users = lock(&self.users)?;
        users
            .values()
            .find(|u| u.email == email && u.phone == phone)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    /// Get a user by id
    pub fn get_user(&self, id: &str) -> Result<User, StorageError> {
        let id = parse_id(id)?;
        let users = lock(&self.users)?;
        users.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    /// Apply the `Some` fields of an update
    pub fn update_user(&self, id: &str, update: UserUpdate) -> Result<User, StorageError> {
        let id = parse_id(id)?;
        let mut users = lock(&self.users)?;
        let user = users.get_mut(&id).ok_or(StorageError::NotFound)?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(address) = update.address {
            user.address = Some(address);
        }
        if let Some(state) = update.state {
            user.state = Some(state);
        }
        if let Some(photo_url) = update.photo_url {
            user.photo_url = Some(photo_url);
        }
        if let Some(contacts) = update.emergency_contacts {
            user.emergency_contacts = contacts;
        }
        if let Some(language) = update.language {
            user.language = language;
        }

        debug!("Updated user {}", id);
        Ok(user.clone())
    }

    /// Delete a user and their sessions; reports are kept
    ///
    /// Returns whether a user was removed.
    pub fn delete_user(&self, id: &str) -> Result<bool, StorageError> {
        let Ok(id) = parse_id(id) else {
            return Ok(false);
        };

        let removed = lock(&self.users)?.remove(&id).is_some();
        lock(&self.sessions)?.retain(|s| s.user_id != id);

        if removed {
            info!("Deleted user {}", id);
        }
        Ok(removed)
    }

    /// Issue a session with a fresh 32-hex-char token
    ///
    /// Replaces any earlier session of the same user, so each user holds at
    /// most one.
    pub fn create_session(&self, user_id: Uuid) -> Result<Session, StorageError> {
        let session = Session {
            user_id,
            token: Uuid::new_v4().simple().to_string(),
            created_at: Utc::now(),
        };

        let mut sessions = lock(&self.sessions)?;
        sessions.retain(|s| s.user_id != user_id);
        sessions.push(session.clone());
        debug!("Issued session for user {}", user_id);
        Ok(session)
    }

    /// Store a report and return its id
    pub fn insert_report(&self, report: NewReport) -> Result<Uuid, StorageError> {
        let record = ReportRecord {
            id: Uuid::new_v4(),
            user_id: report.user_id,
            lat: report.lat,
            lng: report.lng,
            description: report.description,
            photo_url: report.photo_url,
            severity: report.severity,
            created_at: Utc::now(),
        };

        let id = record.id;
        lock(&self.reports)?.push(record);
        debug!("Inserted report with ID {}", id);
        Ok(id)
    }

    /// Most recent reports, newest first
    pub fn recent_reports(&self, limit: usize) -> Result<Vec<ReportRecord>, StorageError> {
        let reports = lock(&self.reports)?;
        Ok(reports.iter().rev().take(limit).cloned().collect())
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().map(|u| u.len()).unwrap_or(0)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn report_count(&self) -> usize {
        self.reports.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSource for Repository {
    type Error = StorageError;

    /// Every stored report, unfiltered
    fn snapshot(&self) -> Result<Vec<IncidentReport>, StorageError> {
        let reports = lock(&self.reports)?;
        Ok(reports.iter().map(IncidentReport::from).collect())
    }
}
