//! Team policy: access keys and role checks.

use crate::auth::password;
use crate::errors::AppError;
use crate::models::{Role, Team, User};

/// Whether `candidate` opens `team`.
///
/// A team without a stored key admits any candidate, including an empty one.
/// Otherwise the candidate is verified against the stored hash; plaintext keys
/// are never compared.
pub fn access_keys_match(team: &Team, candidate: &str) -> bool {
    if team.encrypted_access_key.is_empty() {
        return true;
    }
    password::verify_secret(candidate, &team.encrypted_access_key)
}

/// The value to store as the team's access key: empty clears the gate.
pub fn encrypt_access_key(new_key: &str) -> Result<String, AppError> {
    if new_key.is_empty() {
        return Ok(String::new());
    }
    password::hash_secret(new_key).map_err(Into::into)
}

pub fn require_owner(actor: &User, team: &Team) -> Result<(), AppError> {
    if team.owner_id == actor.id {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "You need to be the owner of this team".to_string(),
    ))
}

/// Parse a role that may be assigned to an existing member.
///
/// Ownership is fixed at team creation and cannot be handed out here.
pub fn assignable_role(role: &str) -> Result<Role, AppError> {
    match role.parse::<Role>()? {
        Role::Owner => Err(AppError::Validation(
            "The owner role cannot be assigned".to_string(),
        )),
        role => Ok(role),
    }
}

/// Role changes and removals never target the owner.
pub fn require_not_owner(team: &Team, target: &User) -> Result<(), AppError> {
    if team.owner_id == target.id {
        return Err(AppError::Forbidden(
            "The team owner cannot be changed or removed".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn team(encrypted_access_key: String) -> Team {
        Team {
            id: 1,
            name: "core".to_string(),
            encrypted_access_key,
            owner_id: 7,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_key_admits_anyone() {
        let open = team(encrypt_access_key("").unwrap());
        assert!(access_keys_match(&open, ""));
        assert!(access_keys_match(&open, "anything"));
    }

    #[test]
    fn test_hashed_key_is_verified() {
        let stored = encrypt_access_key("sesame").unwrap();
        assert_ne!(stored, "sesame");

        let gated = team(stored);
        assert!(access_keys_match(&gated, "sesame"));
        assert!(!access_keys_match(&gated, "sesam"));
        assert!(!access_keys_match(&gated, ""));
    }

    #[test]
    fn test_assignable_roles() {
        assert_eq!(assignable_role("member").unwrap(), Role::Member);
        assert_eq!(assignable_role("moderator").unwrap(), Role::Moderator);
        assert!(matches!(
            assignable_role("owner"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            assignable_role("admin"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_owner_checks() {
        let owner = User {
            id: 7,
            ..Default::default()
        };
        let other = User {
            id: 8,
            ..Default::default()
        };
        let t = team(String::new());

        assert!(require_owner(&owner, &t).is_ok());
        assert!(matches!(require_owner(&other, &t), Err(AppError::Forbidden(_))));
        assert!(require_not_owner(&t, &other).is_ok());
        assert!(require_not_owner(&t, &owner).is_err());
    }
}
