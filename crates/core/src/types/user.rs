//! Identity returned by the backend's auth endpoints.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::{StudentId, UserId};
use super::status::Role;

/// The `user` object of an auth response, persisted alongside the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Backend account ID.
    pub user_id: UserId,
    /// Account e-mail.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Account role.
    pub role: Role,
    /// Roll number; present for students.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<StudentId>,
    /// Avatar URL from the identity provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl SessionUser {
    /// Whether the identity carries what its role needs.
    ///
    /// Students must have a non-empty `student_id`; their entries are
    /// fetched by it.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        match self.role {
            Role::Student => self
                .student_id
                .as_ref()
                .is_some_and(|id| !id.as_str().trim().is_empty()),
            Role::Worker => true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_payload_without_student_id() {
        let json = r#"{
            "user_id": "user_1a2b3c4d5e6f",
            "email": "counter@iiitdwd.ac.in",
            "name": "Ravi",
            "role": "worker"
        }"#;
        let user: SessionUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.role, Role::Worker);
        assert!(user.is_well_formed());
    }

    #[test]
    fn test_student_requires_student_id() {
        let json = r#"{
            "user_id": "user_aaaaaaaaaaaa",
            "email": "21bcs042@iiitdwd.ac.in",
            "name": "Asha",
            "role": "student",
            "student_id": null
        }"#;
        let mut user: SessionUser = serde_json::from_str(json).unwrap();
        assert!(!user.is_well_formed());

        user.student_id = Some(StudentId::new("21BCS042"));
        assert!(user.is_well_formed());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let json = r#"{"user_id": "u", "email": "a@b.c", "name": "X", "role": "janitor"}"#;
        assert!(serde_json::from_str::<SessionUser>(json).is_err());
    }
}
