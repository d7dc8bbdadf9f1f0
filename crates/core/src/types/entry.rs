//! Laundry entries and the intake form that creates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{EntryId, StudentId, UserId};
use super::status::{EntryAction, EntryStatus, Role};

/// One line of an entry: a garment type and how many of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaundryItem {
    /// Free-form garment type, e.g. "Shirt".
    pub item_type: String,
    /// Number of pieces, at least 1.
    pub quantity: u32,
}

impl LaundryItem {
    /// Create an item.
    #[must_use]
    pub fn new(item_type: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_type: item_type.into(),
            quantity,
        }
    }
}

impl std::fmt::Display for LaundryItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x{}", self.item_type, self.quantity)
    }
}

/// A laundry submission as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaundryEntry {
    /// Backend-assigned identifier.
    pub entry_id: EntryId,
    /// Owning student.
    pub student_id: StudentId,
    /// Owning student's display name at intake time.
    pub student_name: String,
    /// Items in the order they were entered.
    pub items: Vec<LaundryItem>,
    /// Sum of `items[*].quantity`, computed by the backend.
    pub total_items: u32,
    /// Current lifecycle stage.
    pub status: EntryStatus,
    /// When the entry was recorded.
    pub submission_date: DateTime<Utc>,
    /// When the entry was marked completed.
    #[serde(default)]
    pub completion_date: Option<DateTime<Utc>>,
    /// Worker who recorded the intake.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<UserId>,
}

impl LaundryEntry {
    /// Sum of the item quantities, or `None` if it does not fit a `u32`.
    #[must_use]
    pub fn computed_total(&self) -> Option<u32> {
        sum_quantities(&self.items)
    }

    /// Whether `total_items` agrees with the items. An overflowing sum never
    /// agrees.
    #[must_use]
    pub fn has_consistent_total(&self) -> bool {
        self.computed_total() == Some(self.total_items)
    }

    /// Whether the entry is waiting at the counter.
    #[must_use]
    pub fn is_ready_for_pickup(&self) -> bool {
        self.status == EntryStatus::Completed
    }

    /// The action `role` may take on this entry right now.
    #[must_use]
    pub const fn available_action(&self, role: Role) -> Option<EntryAction> {
        self.status.available_action(role)
    }
}

fn sum_quantities(items: &[LaundryItem]) -> Option<u32> {
    items
        .iter()
        .try_fold(0u32, |total, item| total.checked_add(item.quantity))
}

/// Validation failures for [`NewEntry`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    /// Student ID was blank.
    #[error("student ID is required")]
    MissingStudentId,
    /// Student name was blank.
    #[error("student name is required")]
    MissingStudentName,
    /// No items were given.
    #[error("at least one item is required")]
    NoItems,
    /// An item had a blank type.
    #[error("item {position}: item type is required")]
    MissingItemType {
        /// 1-based position in the form.
        position: usize,
    },
    /// An item had a zero quantity.
    #[error("item {position}: quantity must be at least 1")]
    ZeroQuantity {
        /// 1-based position in the form.
        position: usize,
    },
    /// The quantities add up to more than a `u32` holds.
    #[error("total quantity is too large")]
    TotalTooLarge,
}

/// A validated intake form, ready to send to `POST /laundry/create`.
///
/// The only way to build one is [`NewEntry::new`], so a `NewEntry` value
/// always satisfies the intake preconditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewEntry {
    student_id: StudentId,
    student_name: String,
    items: Vec<LaundryItem>,
    #[serde(skip)]
    total_items: u32,
}

impl NewEntry {
    /// Validate an intake form.
    ///
    /// Names and item types are trimmed.
    ///
    /// # Errors
    ///
    /// Returns the first [`EntryError`] found, checking the student fields
    /// before the items.
    pub fn new(
        student_id: impl Into<String>,
        student_name: impl Into<String>,
        items: Vec<LaundryItem>,
    ) -> Result<Self, EntryError> {
        let student_id = student_id.into().trim().to_owned();
        if student_id.is_empty() {
            return Err(EntryError::MissingStudentId);
        }

        let student_name = student_name.into().trim().to_owned();
        if student_name.is_empty() {
            return Err(EntryError::MissingStudentName);
        }

        if items.is_empty() {
            return Err(EntryError::NoItems);
        }

        let mut cleaned = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let position = index + 1;
            let item_type = item.item_type.trim();
            if item_type.is_empty() {
                return Err(EntryError::MissingItemType { position });
            }
            if item.quantity == 0 {
                return Err(EntryError::ZeroQuantity { position });
            }
            cleaned.push(LaundryItem::new(item_type, item.quantity));
        }

        let total_items = sum_quantities(&cleaned).ok_or(EntryError::TotalTooLarge)?;

        Ok(Self {
            student_id: StudentId::new(student_id),
            student_name,
            items: cleaned,
            total_items,
        })
    }

    /// Student the entry is for.
    #[must_use]
    pub const fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    /// Student display name.
    #[must_use]
    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    /// Validated items.
    #[must_use]
    pub fn items(&self) -> &[LaundryItem] {
        &self.items
    }

    /// Total pieces the backend will record.
    #[must_use]
    pub const fn total_items(&self) -> u32 {
        self.total_items
    }
}
