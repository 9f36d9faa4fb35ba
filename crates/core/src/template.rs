//! Template record model
//!
//! A template is a reusable task blueprint. The store owns every record:
//! records are created from a [`TemplateDraft`], changed through a
//! [`TemplatePatch`] or the usage/favorite mutators, and projected onto new
//! tasks as a [`TaskDraft`].
//!
//! Records serialize with camelCase keys. `dueDate` is always written (as
//! `null` when absent); the other optional fields are omitted when absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// TemplateId
// ============================================================================

/// Opaque template identifier
///
/// Assigned by the store on creation. Generated ids are random UUIDs, so they
/// are never reused within a process or across the collection's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    /// Generate a fresh, unique id
    pub fn generate() -> Self {
        TemplateId(Uuid::new_v4().to_string())
    }

    /// Wrap an existing id string
    pub fn new(id: impl Into<String>) -> Self {
        TemplateId(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(id: &str) -> Self {
        TemplateId(id.to_string())
    }
}

impl From<String> for TemplateId {
    fn from(id: String) -> Self {
        TemplateId(id)
    }
}

// ============================================================================
// Closed enumerations
// ============================================================================

/// Template category (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    /// Work tasks
    Work,
    /// Personal tasks
    Personal,
    /// Project tasks
    Project,
    /// Meetings
    Meeting,
    /// Recurring routines
    Routine,
    /// Anything else
    #[default]
    Other,
}

impl TemplateCategory {
    /// All categories, in display order
    pub const ALL: [TemplateCategory; 6] = [
        TemplateCategory::Work,
        TemplateCategory::Personal,
        TemplateCategory::Project,
        TemplateCategory::Meeting,
        TemplateCategory::Routine,
        TemplateCategory::Other,
    ];

    /// Wire name of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateCategory::Work => "work",
            TemplateCategory::Personal => "personal",
            TemplateCategory::Project => "project",
            TemplateCategory::Meeting => "meeting",
            TemplateCategory::Routine => "routine",
            TemplateCategory::Other => "other",
        }
    }

    /// Parse a wire name, `None` if outside the closed set
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl std::fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Task priority (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
    /// Urgent
    Urgent,
}

impl Priority {
    /// All priorities, lowest first
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];

    /// Wire name of the priority
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Parse a wire name, `None` if outside the closed set
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

/// Recurrence frequency (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every N days
    Daily,
    /// Every N weeks
    Weekly,
    /// Every N months
    Monthly,
    /// Every N years
    Yearly,
}

impl Frequency {
    /// All frequencies
    pub const ALL: [Frequency; 4] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Yearly,
    ];

    /// Wire name of the frequency
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    /// Parse a wire name, `None` if outside the closed set
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }
}

/// Recurrence configuration copied verbatim into generated tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    /// How often the task repeats
    pub frequency: Frequency,
    /// Repeat every `interval` units of `frequency` (>= 1)
    pub interval: u32,
    /// Weekdays (0 = Sunday) for weekly recurrence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,
    /// Last date the recurrence applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl Recurrence {
    /// Recurrence every `interval` units of `frequency`
    pub fn every(interval: u32, frequency: Frequency) -> Self {
        Recurrence {
            frequency,
            interval,
            days_of_week: None,
            end_date: None,
        }
    }
}

// ============================================================================
// Template
// ============================================================================

/// A persisted, reusable task blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Store-assigned identifier
    pub id: TemplateId,
    /// Display name
    pub name: String,
    /// Display description
    pub description: String,
    /// Category
    pub category: TemplateCategory,
    /// Title given to tasks created from this template
    pub task_title: String,
    /// Description given to tasks created from this template
    pub task_description: String,
    /// Priority given to created tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Ordered label references
    pub labels: Vec<String>,
    /// Relative or absolute due date; written as `null` when absent
    pub due_date: Option<String>,
    /// Recurrence for created tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
    /// Creation time, fixed
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation of the record
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    /// Number of tasks created from this template; never decreases
    pub usage_count: u64,
    /// User-toggled favorite flag
    pub is_favorite: bool,
    /// Board scoping hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_id: Option<String>,
    /// Column scoping hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_id: Option<String>,
}

impl Template {
    /// Build a fresh record from form data
    ///
    /// `created_at == updated_at == now` and `usage_count == 0`.
    pub fn new(id: TemplateId, draft: TemplateDraft, now: DateTime<Utc>) -> Self {
        Template {
            id,
            name: draft.name,
            description: draft.description,
            category: draft.category,
            task_title: draft.task_title,
            task_description: draft.task_description,
            priority: draft.priority,
            labels: draft.labels,
            due_date: draft.due_date,
            recurrence: draft.recurrence,
            created_at: now,
            updated_at: now,
            usage_count: 0,
            is_favorite: draft.is_favorite,
            board_id: draft.board_id,
            column_id: draft.column_id,
        }
    }

    /// Refresh `updated_at`
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Project this template onto the payload of a new task
    pub fn to_task_draft(&self) -> TaskDraft {
        TaskDraft {
            template_id: self.id.clone(),
            title: self.task_title.clone(),
            description: self.task_description.clone(),
            priority: self.priority,
            labels: self.labels.clone(),
            due_date: self.due_date.clone(),
            recurrence: self.recurrence.clone(),
            board_id: self.board_id.clone(),
            column_id: self.column_id.clone(),
        }
    }
}

// ============================================================================
// Drafts and patches
// ============================================================================

/// Form data for creating a template
///
/// Everything except the store-owned fields (`id`, timestamps, `usage_count`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateDraft {
    /// Display name
    pub name: String,
    /// Display description
    pub description: String,
    /// Category
    pub category: TemplateCategory,
    /// Title for created tasks
    pub task_title: String,
    /// Description for created tasks
    pub task_description: String,
    /// Priority for created tasks
    pub priority: Option<Priority>,
    /// Ordered label references
    pub labels: Vec<String>,
    /// Due date for created tasks
    pub due_date: Option<String>,
    /// Recurrence for created tasks
    pub recurrence: Option<Recurrence>,
    /// Start out as a favorite
    pub is_favorite: bool,
    /// Board scoping hint
    pub board_id: Option<String>,
    /// Column scoping hint
    pub column_id: Option<String>,
}

impl TemplateDraft {
    /// Draft with the three fields every template form asks for
    pub fn new(
        name: impl Into<String>,
        task_title: impl Into<String>,
        category: TemplateCategory,
    ) -> Self {
        TemplateDraft {
            name: name.into(),
            task_title: task_title.into(),
            category,
            ..Default::default()
        }
    }

    /// Set the template description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the task description
    pub fn with_task_description(mut self, task_description: impl Into<String>) -> Self {
        self.task_description = task_description.into();
        self
    }

    /// Set the task priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the label references
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Set the due date
    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    /// Set the recurrence
    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }
}

/// Partial update of a template
///
/// `None` leaves a field untouched. Nullable fields use `Option<Option<_>>` so
/// `Some(None)` clears them. `id`, `created_at` and `usage_count` cannot be
/// patched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplatePatch {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New category
    pub category: Option<TemplateCategory>,
    /// New task title
    pub task_title: Option<String>,
    /// New task description
    pub task_description: Option<String>,
    /// Set or clear the priority
    pub priority: Option<Option<Priority>>,
    /// Replace the label references
    pub labels: Option<Vec<String>>,
    /// Set or clear the due date
    pub due_date: Option<Option<String>>,
    /// Set or clear the recurrence
    pub recurrence: Option<Option<Recurrence>>,
    /// Set the favorite flag
    pub is_favorite: Option<bool>,
    /// Set or clear the board hint
    pub board_id: Option<Option<String>>,
    /// Set or clear the column hint
    pub column_id: Option<Option<String>>,
}

impl TemplatePatch {
    /// True if the patch changes nothing
    pub fn is_empty(&self) -> bool {
        *self == TemplatePatch::default()
    }

    /// Merge the patch into `template` (does not touch `updated_at`)
    pub fn apply_to(self, template: &mut Template) {
        if let Some(name) = self.name {
            template.name = name;
        }
        if let Some(description) = self.description {
            template.description = description;
        }
        if let Some(category) = self.category {
            template.category = category;
        }
        if let Some(task_title) = self.task_title {
            template.task_title = task_title;
        }
        if let Some(task_description) = self.task_description {
            template.task_description = task_description;
        }
        if let Some(priority) = self.priority {
            template.priority = priority;
        }
        if let Some(labels) = self.labels {
            template.labels = labels;
        }
        if let Some(due_date) = self.due_date {
            template.due_date = due_date;
        }
        if let Some(recurrence) = self.recurrence {
            template.recurrence = recurrence;
        }
        if let Some(is_favorite) = self.is_favorite {
            template.is_favorite = is_favorite;
        }
        if let Some(board_id) = self.board_id {
            template.board_id = board_id;
        }
        if let Some(column_id) = self.column_id {
            template.column_id = column_id;
        }
    }
}

/// Payload for a task created from a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    /// Template the task was created from
    pub template_id: TemplateId,
    /// Task title
    pub title: String,
    /// Task description
    pub description: String,
    /// Task priority
    pub priority: Option<Priority>,
    /// Ordered label references
    pub labels: Vec<String>,
    /// Due date
    pub due_date: Option<String>,
    /// Recurrence
    pub recurrence: Option<Recurrence>,
    /// Target board
    pub board_id: Option<String>,
    /// Target column
    pub column_id: Option<String>,
}
