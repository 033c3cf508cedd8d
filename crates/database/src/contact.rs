//! Contact persistence.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Contact;

const CONTACT_COLUMNS: &str = "id, name, email, organization_id, source, created_at";

/// Create a new contact. The email must already be normalized (lower-cased).
pub async fn create_contact(pool: &SqlitePool, contact: &Contact) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO contacts (id, name, email, organization_id, source, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&contact.id)
    .bind(&contact.name)
    .bind(&contact.email)
    .bind(&contact.organization_id)
    .bind(&contact.source)
    .bind(&contact.created_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Contact",
                    id: contact.email.clone().unwrap_or_else(|| contact.id.clone()),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get a contact by ID.
pub async fn get_contact(pool: &SqlitePool, id: &str) -> Result<Contact> {
    sqlx::query_as::<_, Contact>(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Contact",
        id: id.to_string(),
    })
}

/// Find a contact by normalized email.
pub async fn get_contact_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Contact>> {
    let contact = sqlx::query_as::<_, Contact>(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts WHERE email = ?"
    ))
    .bind(crate::normalize_email(email))
    .fetch_optional(pool)
    .await?;

    Ok(contact)
}

/// Count total contacts.
pub async fn count_contacts(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM contacts")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
