//! Credential store: the `users` table and the admin account lifecycle rules.

use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    model::{
        role::Role,
        user::{User, UserPublic},
    },
    utils::db_utils::is_unique_violation,
};

pub const MIN_PASSWORD_LEN: usize = 6;

const USER_COLUMNS: &str =
    "id, username, password_hash, full_name, role, profile_picture_url, created_at";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployee {
    #[schema(example = "alice")]
    pub username: Option<String>,
    #[schema(example = "secret1")]
    pub password: Option<String>,
    #[schema(example = "Alice A")]
    pub full_name: Option<String>,
    /// `employee` when omitted
    #[schema(example = "employee")]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployee {
    #[schema(example = "Alice Anderson")]
    pub full_name: Option<String>,
    #[schema(example = "alice")]
    pub username: Option<String>,
    #[schema(example = "employee")]
    pub role: Option<String>,
}

/// A create request that passed validation.
#[derive(Debug, PartialEq, Eq)]
pub struct NewEmployee {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

#[derive(Debug, PartialEq, Eq)]
pub struct EmployeeChanges {
    pub full_name: String,
    pub username: String,
    pub role: Role,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_role(raw: &str) -> Result<Role, AppError> {
    raw.parse()
        .map_err(|_| AppError::InvalidInput(format!("Invalid role '{raw}'. Expected employee or admin.")))
}

impl CreateEmployee {
    pub fn validate(&self) -> Result<NewEmployee, AppError> {
        let (Some(username), Some(full_name)) = (present(&self.username), present(&self.full_name))
        else {
            return Err(AppError::InvalidInput(
                "Username, password, and full name are required.".to_string(),
            ));
        };
        let password = match self.password.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => {
                return Err(AppError::InvalidInput(
                    "Username, password, and full name are required.".to_string(),
                ));
            }
        };

        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long."
            )));
        }

        let role = match present(&self.role) {
            Some(raw) => parse_role(raw)?,
            None => Role::default(),
        };

        Ok(NewEmployee {
            username: username.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            role,
        })
    }
}

impl UpdateEmployee {
    pub fn validate(&self) -> Result<EmployeeChanges, AppError> {
        match (
            present(&self.full_name),
            present(&self.username),
            present(&self.role),
        ) {
            (Some(full_name), Some(username), Some(role)) => Ok(EmployeeChanges {
                full_name: full_name.to_string(),
                username: username.to_string(),
                role: parse_role(role)?,
            }),
            _ => Err(AppError::InvalidInput(
                "Full name, username, and role are required.".to_string(),
            )),
        }
    }
}

/// An admin may delete anyone but themselves.
pub fn ensure_not_self(target_id: u64, caller_id: u64) -> Result<(), AppError> {
    if target_id == caller_id {
        return Err(AppError::SelfDeleteForbidden);
    }
    Ok(())
}

pub async fn find_by_username(pool: &MySqlPool, username: &str) -> Result<Option<User>, AppError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &MySqlPool, user_id: u64) -> Result<Option<User>, AppError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// true => some other account already holds `username`
pub async fn is_username_taken(
    pool: &MySqlPool,
    username: &str,
    except_id: Option<u64>,
) -> Result<bool, AppError> {
    let taken = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? AND id <> ? LIMIT 1)",
    )
    .bind(username)
    .bind(except_id.unwrap_or(0))
    .fetch_one(pool)
    .await?;

    Ok(taken != 0)
}

pub async fn admin_exists(pool: &MySqlPool) -> Result<bool, AppError> {
    let exists =
        sqlx::query_scalar::<_, i64>("SELECT EXISTS(SELECT 1 FROM users WHERE role = ? LIMIT 1)")
            .bind(Role::Admin.as_str())
            .fetch_one(pool)
            .await?;

    Ok(exists != 0)
}

/// Inserts a user whose password is already hashed. Returns the new id.
pub async fn insert_user(
    pool: &MySqlPool,
    username: &str,
    password_hash: &str,
    full_name: &str,
    role: Role,
) -> Result<u64, AppError> {
    if is_username_taken(pool, username, None).await? {
        return Err(AppError::DuplicateUsername(username.to_string()));
    }

    let result = sqlx::query(
        "INSERT INTO users (username, password_hash, full_name, role) VALUES (?, ?, ?, ?)",
    )
    .bind(username)
    .bind(password_hash)
    .bind(full_name)
    .bind(role.as_str())
    .execute(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::DuplicateUsername(username.to_string())
        } else {
            AppError::from(e)
        }
    })?;

    let user_id = result.last_insert_id();
    info!(user_id, username, role = %role, "User created");
    Ok(user_id)
}

pub async fn list_users(pool: &MySqlPool) -> Result<Vec<UserPublic>, AppError> {
    let users = sqlx::query_as::<_, UserPublic>(
        r#"
        SELECT id, username, full_name, role, profile_picture_url, created_at
        FROM users
        ORDER BY full_name
        "#,
    )
    .fetch_all(pool)
    .await?;

    debug!(count = users.len(), "Listed users");
    Ok(users)
}

pub async fn update_user(
    pool: &MySqlPool,
    user_id: u64,
    changes: &EmployeeChanges,
) -> Result<(), AppError> {
    if find_by_id(pool, user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User with ID {user_id} not found.")));
    }
    if is_username_taken(pool, &changes.username, Some(user_id)).await? {
        return Err(AppError::DuplicateUsername(changes.username.clone()));
    }

    sqlx::query("UPDATE users SET full_name = ?, username = ?, role = ? WHERE id = ?")
        .bind(&changes.full_name)
        .bind(&changes.username)
        .bind(changes.role.as_str())
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateUsername(changes.username.clone())
            } else {
                AppError::from(e)
            }
        })?;

    info!(user_id, username = %changes.username, role = %changes.role, "User updated");
    Ok(())
}

/// Attendance rows go with the user through the foreign key cascade.
pub async fn delete_user(pool: &MySqlPool, user_id: u64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User with ID {user_id} not found.")));
    }

    info!(user_id, "User deleted");
    Ok(())
}

pub async fn set_profile_picture(
    pool: &MySqlPool,
    user_id: u64,
    filename: &str,
) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE users SET profile_picture_url = ? WHERE id = ?")
        .bind(filename)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User with ID {user_id} not found.")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(username: &str, password: &str, full_name: &str, role: Option<&str>) -> CreateEmployee {
        CreateEmployee {
            username: Some(username.into()),
            password: Some(password.into()),
            full_name: Some(full_name.into()),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn create_defaults_to_employee() {
        let valid = create("alice", "secret1", "Alice A", None).validate().unwrap();
        assert_eq!(
            valid,
            NewEmployee {
                username: "alice".into(),
                password: "secret1".into(),
                full_name: "Alice A".into(),
                role: Role::Employee,
            }
        );
    }

    #[test]
    fn five_character_password_is_rejected() {
        let err = create("bob", "short", "Bob B", None).validate().unwrap_err();
        match err {
            AppError::InvalidInput(msg) => assert!(msg.contains("at least 6")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn missing_fields_are_rejected() {
        let mut req = create("carol", "secret1", "Carol C", None);
        req.full_name = Some("   ".into());
        assert!(matches!(req.validate(), Err(AppError::InvalidInput(_))));

        let req = CreateEmployee {
            username: Some("carol".into()),
            password: None,
            full_name: Some("Carol C".into()),
            role: None,
        };
        assert!(matches!(req.validate(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = create("dave", "secret1", "Dave D", Some("manager"))
            .validate()
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let admin = create("erin", "secret1", "Erin E", Some("admin")).validate().unwrap();
        assert_eq!(admin.role, Role::Admin);
    }

    #[test]
    fn update_requires_all_three_fields() {
        let full = UpdateEmployee {
            full_name: Some("Alice Anderson".into()),
            username: Some("alice".into()),
            role: Some("admin".into()),
        };
        assert_eq!(full.validate().unwrap().role, Role::Admin);

        let partial = UpdateEmployee {
            full_name: Some("Alice Anderson".into()),
            username: None,
            role: Some("admin".into()),
        };
        assert!(matches!(partial.validate(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn admin_cannot_delete_self() {
        assert!(matches!(ensure_not_self(4, 4), Err(AppError::SelfDeleteForbidden)));
        assert!(ensure_not_self(5, 4).is_ok());
    }
}
