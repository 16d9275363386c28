/// Hash-field encoding for stored records
///
/// Users and tasks are stored as flat Redis hashes of strings. Timestamps are
/// RFC 3339, booleans are `"1"`/`"0"`, and a null `deleted_at` is the empty
/// string so that a single HSET always rewrites every field.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use super::RepositoryError;
use crate::models::{Task, User};

pub type Fields = Vec<(&'static str, String)>;

pub fn user_to_fields(user: &User) -> Fields {
    vec![
        ("id", user.id.to_string()),
        ("email", user.email.clone()),
        ("display_name", user.display_name.clone()),
        ("password_hash", user.password_hash.clone()),
        ("is_admin", encode_bool(user.is_admin)),
        ("created_at", user.created_at.to_rfc3339()),
        ("updated_at", user.updated_at.to_rfc3339()),
    ]
}

pub fn user_from_fields(fields: &HashMap<String, String>) -> Result<User, RepositoryError> {
    Ok(User {
        id: uuid_field(fields, "id")?,
        email: string_field(fields, "email")?,
        display_name: string_field(fields, "display_name")?,
        password_hash: string_field(fields, "password_hash")?,
        is_admin: bool_field(fields, "is_admin")?,
        created_at: time_field(fields, "created_at")?,
        updated_at: time_field(fields, "updated_at")?,
    })
}

pub fn task_to_fields(task: &Task) -> Fields {
    vec![
        ("id", task.id.to_string()),
        ("user_id", task.user_id.to_string()),
        ("description", task.description.clone()),
        ("category", task.category.clone()),
        ("completed", encode_bool(task.completed)),
        ("created_at", task.created_at.to_rfc3339()),
        ("updated_at", task.updated_at.to_rfc3339()),
        (
            "deleted_at",
            task.deleted_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
        ),
    ]
}

pub fn task_from_fields(fields: &HashMap<String, String>) -> Result<Task, RepositoryError> {
    let deleted_at = match fields.get("deleted_at").map(String::as_str) {
        None | Some("") => None,
        Some(raw) => Some(parse_time("deleted_at", raw)?),
    };

    Ok(Task {
        id: uuid_field(fields, "id")?,
        user_id: uuid_field(fields, "user_id")?,
        description: string_field(fields, "description")?,
        category: fields.get("category").cloned().unwrap_or_default(),
        completed: bool_field(fields, "completed")?,
        created_at: time_field(fields, "created_at")?,
        updated_at: time_field(fields, "updated_at")?,
        deleted_at,
    })
}

fn encode_bool(value: bool) -> String {
    let encoded = if value { "1" } else { "0" };
    encoded.to_string()
}

fn string_field(fields: &HashMap<String, String>, name: &str) -> Result<String, RepositoryError> {
    fields
        .get(name)
        .cloned()
        .ok_or_else(|| RepositoryError::Corrupt(format!("missing field '{}'", name)))
}

fn uuid_field(fields: &HashMap<String, String>, name: &str) -> Result<Uuid, RepositoryError> {
    let raw = string_field(fields, name)?;
    Uuid::parse_str(&raw)
        .map_err(|e| RepositoryError::Corrupt(format!("field '{}': {}", name, e)))
}

fn bool_field(fields: &HashMap<String, String>, name: &str) -> Result<bool, RepositoryError> {
    match string_field(fields, name)?.as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(RepositoryError::Corrupt(format!(
            "field '{}': invalid boolean '{}'",
            name, other
        ))),
    }
}

fn time_field(
    fields: &HashMap<String, String>,
    name: &str,
) -> Result<DateTime<Utc>, RepositoryError> {
    let raw = string_field(fields, name)?;
    parse_time(name, &raw)
}

fn parse_time(name: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Corrupt(format!("field '{}': {}", name, e)))
}
