//! Organization domain models
//!
//! This module provides the Organization entity. An organization is the tenant
//! boundary: every user and invitation belongs to exactly one, and it is the unit
//! over which administrators are counted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An organization groups users and invitations.
///
/// Administrator totals are not derived from an in-memory member list; they are
/// always read from storage so they stay consistent under concurrent mutation.
///
/// # Examples
///
/// ```
/// use roster_org::Organization;
///
/// let org = Organization::new("Acme Corp").with_description("Rockets and anvils");
/// assert_eq!(org.name, "Acme Corp");
/// assert_eq!(org.description.as_deref(), Some("Rockets and anvils"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier for the organization
    pub id: Uuid,

    /// Unique human-readable name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// When the organization was created
    pub created_at: DateTime<Utc>,

    /// When the organization was last updated
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Creates a new organization.
    ///
    /// The organization is created with a newly generated UUID v7 ID, no
    /// description and the current timestamp for created_at and updated_at.
    ///
    /// # Arguments
    ///
    /// * `name` - The organization name (must be unique)
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set both creation and update timestamps.
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self.updated_at = at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organization_creation() {
        let org = Organization::new("Acme Corp");

        assert_eq!(org.name, "Acme Corp");
        assert!(org.description.is_none());
        assert_eq!(org.created_at, org.updated_at);
    }

    #[test]
    fn test_created_at() {
        let at = Utc::now() - chrono::Duration::days(3);
        let org = Organization::new("Acme").created_at(at);
        assert_eq!(org.created_at, at);
        assert_eq!(org.updated_at, at);
    }
}
