//! Accounts and the authenticated principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, WorkflowError};
use crate::types::{Email, UserId, UserRole};

/// A stored account.
///
/// The storage key of the row is always `id`.
#[derive(Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub role: UserRole,
    pub phone: String,
    pub address: String,
    pub image_url: Option<String>,
    pub active: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .field("active", &self.active)
            .field("deleted", &self.deleted)
            .finish_non_exhaustive()
    }
}

impl User {
    #[must_use]
    pub const fn can_sign_in(&self) -> bool {
        self.active && !self.deleted
    }

    #[must_use]
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }

    /// Profile fields safe to return to the account owner.
    #[must_use]
    pub fn profile(&self) -> Profile {
        Profile {
            user_id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            phone: self.phone.clone(),
            address: self.address.clone(),
            image_url: self.image_url.clone(),
        }
    }
}

/// Account details without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub user_id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    pub phone: String,
    pub address: String,
    pub image_url: Option<String>,
}

/// The signed-in identity carried in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub email: Email,
    pub name: String,
    pub role: UserRole,
}

impl Principal {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Gate for administrator-only operations.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Forbidden`] naming `action` for non-admins.
    pub fn require_admin(&self, action: &str) -> Result<(), WorkflowError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(WorkflowError::Forbidden(format!(
                "{action} requires an administrator"
            )))
        }
    }
}

/// Sign-up form.
#[derive(Clone, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub address: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Editable profile fields. The image URL comes from an external blob store.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ProfileUpdate {
    /// Trim fields; name is required, the rest may be blank.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] for a blank name.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(ValidationError::missing("name"));
        }
        Ok(Self {
            name,
            phone: self.phone.trim().to_owned(),
            address: self.address.trim().to_owned(),
            image_url: self
                .image_url
                .map(|url| url.trim().to_owned())
                .filter(|url| !url.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: UserRole) -> Principal {
        Principal {
            user_id: UserId::new(1),
            email: Email::parse("a@shop.example").unwrap_or_else(|e| panic!("{e}")),
            name: "A".to_owned(),
            role,
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(principal(UserRole::Admin).require_admin("transition").is_ok());
        assert!(matches!(
            principal(UserRole::User).require_admin("transition"),
            Err(WorkflowError::Forbidden(_))
        ));
    }

    #[test]
    fn test_profile_update_drops_blank_image() {
        let update = ProfileUpdate {
            name: " Bob ".to_owned(),
            phone: "555".to_owned(),
            address: String::new(),
            image_url: Some("  ".to_owned()),
        }
        .normalized()
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(update.name, "Bob");
        assert_eq!(update.image_url, None);
    }
}
