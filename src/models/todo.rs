//! Todo record model and the small vocabulary types built around it.
//!
//! This is the one canonical todo shape. The wire format is camelCase; the
//! legacy `isArchieved` misspelling is accepted on input via a serde alias
//! and never escapes this boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Label applied when a todo is created without one.
pub const DEFAULT_LABEL: &str = "General";

/// Wire/document field names, shared by queries and sort validation.
pub mod fields {
    pub const OWNER: &str = "owner";
    pub const CONTENT: &str = "content";
    pub const LABEL: &str = "label";
    pub const IS_COMPLETED: &str = "isCompleted";
    pub const IS_ARCHIVED: &str = "isArchived";
    pub const DUE_DATE: &str = "dueDate";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// A single todo record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// UUID in server mode, millisecond-timestamp string in guest mode
    pub id: String,
    pub content: String,
    pub label: String,
    pub is_completed: bool,
    #[serde(alias = "isArchieved")]
    pub is_archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Owning user id; absent for guest-mode records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl Todo {
    /// Build a new record with already-normalized content/label.
    pub fn new(
        id: String,
        content: String,
        label: String,
        due_date: Option<DateTime<Utc>>,
        owner: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            content,
            label,
            is_completed: false,
            is_archived: false,
            due_date,
            created_at: now,
            updated_at: now,
            owner,
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.is_completed && !self.is_archived
    }

    /// Past due date, and neither completed nor archived.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && self.due_date.is_some_and(|due| due < now)
    }

    /// Apply a partial update in place, bumping `updatedAt`.
    ///
    /// Fails with the offending field name when a provided content/label
    /// trims to empty; callers must discard the record on failure.
    pub fn apply_patch(
        &mut self,
        patch: &TodoPatch,
        now: DateTime<Utc>,
    ) -> Result<(), &'static str> {
        if let Some(content) = &patch.content {
            self.content = normalize_required(content).ok_or(fields::CONTENT)?;
        }
        if let Some(label) = &patch.label {
            self.label = normalize_required(label).ok_or(fields::LABEL)?;
        }
        if let Some(completed) = patch.is_completed {
            self.is_completed = completed;
        }
        if let Some(archived) = patch.is_archived {
            self.is_archived = archived;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Trim a required string field, rejecting empty results.
pub fn normalize_required(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Partial update to a todo. `dueDate: null` clears the deadline, an absent
/// `dueDate` leaves it untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(alias = "isArchieved", skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Distinguish "field absent" from "field set to null" for `Option<Option<T>>`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Status bucket selector used by list queries and the client-side filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    All,
    Pending,
    Completed,
    Archived,
}

impl StatusFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Bucket membership. Archived wins over completed.
    pub fn matches(&self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Pending => !todo.is_completed && !todo.is_archived,
            Self::Completed => todo.is_completed && !todo.is_archived,
            Self::Archived => todo.is_archived,
        }
    }
}

/// Operation applied by PATCH `/todos/bulk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BulkOperation {
    MarkCompleted,
    MarkPending,
    Archive,
    Unarchive,
    Delete,
}

impl BulkOperation {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "markCompleted" => Some(Self::MarkCompleted),
            "markPending" => Some(Self::MarkPending),
            "archive" => Some(Self::Archive),
            "unarchive" => Some(Self::Unarchive),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    /// The patch equivalent for non-delete operations.
    pub fn as_patch(&self) -> Option<TodoPatch> {
        let patch = match self {
            Self::MarkCompleted => TodoPatch {
                is_completed: Some(true),
                ..Default::default()
            },
            Self::MarkPending => TodoPatch {
                is_completed: Some(false),
                ..Default::default()
            },
            Self::Archive => TodoPatch {
                is_archived: Some(true),
                ..Default::default()
            },
            Self::Unarchive => TodoPatch {
                is_archived: Some(false),
                ..Default::default()
            },
            Self::Delete => return None,
        };
        Some(patch)
    }
}

/// Sort key whitelist for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    CreatedAt,
    UpdatedAt,
    DueDate,
    Content,
    Label,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            "dueDate" => Some(Self::DueDate),
            "content" => Some(Self::Content),
            "label" => Some(Self::Label),
            _ => None,
        }
    }

    /// Document field name to order by.
    pub fn field(&self) -> &'static str {
        match self {
            Self::CreatedAt => fields::CREATED_AT,
            Self::UpdatedAt => fields::UPDATED_AT,
            Self::DueDate => fields::DUE_DATE,
            Self::Content => fields::CONTENT,
            Self::Label => fields::LABEL,
        }
    }

    /// Comparator for in-memory sorting (guest mode).
    pub fn compare(&self, a: &Todo, b: &Todo) -> std::cmp::Ordering {
        match self {
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            Self::DueDate => a.due_date.cmp(&b.due_date),
            Self::Content => a.content.cmp(&b.content),
            Self::Label => a.label.cmp(&b.label),
        }
    }
}
