use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{OptionalExtension, params};
use tokio_rusqlite::{Connection, Result};
use tracing::info;

use shared::types::profile::{NewProfile, Profile};

fn row_to_profile(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        password_hash: row.get(3)?,
        login_count: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const PROFILE_COLUMNS: &str = "id, name, phone, password_hash, login_count, created_at, updated_at";

/// Insert a new profile and return its assigned id.
pub async fn save_profile(conn: &Connection, new_profile: NewProfile) -> Result<i64> {
    let created_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    conn.call(move |conn| {
        conn.execute(
            "INSERT INTO profile (name, phone, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                new_profile.name,
                new_profile.phone,
                new_profile.password_hash,
                created_at,
            ],
        )?;
        info!("New profile created for {}", new_profile.phone);

        Ok(conn.last_insert_rowid())
    })
    .await
}

/// Get a profile by phone number, the authentication lookup key.
pub async fn get_profile_by_phone(conn: &Connection, phone: String) -> Result<Option<Profile>> {
    conn.call(move |conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM profile WHERE phone = ?1",
            PROFILE_COLUMNS
        ))?;

        let profile = stmt.query_row(params![phone], row_to_profile).optional()?;

        Ok(profile)
    })
    .await
}

/// Get a profile by id.
pub async fn get_profile_by_id(conn: &Connection, id: i64) -> Result<Option<Profile>> {
    conn.call(move |conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM profile WHERE id = ?1",
            PROFILE_COLUMNS
        ))?;

        let profile = stmt.query_row(params![id], row_to_profile).optional()?;

        Ok(profile)
    })
    .await
}

/// Check whether a phone number is already registered.
pub async fn phone_exists(conn: &Connection, phone: String) -> Result<bool> {
    conn.call(move |conn| {
        let mut stmt = conn.prepare("SELECT COUNT(*) FROM profile WHERE phone = ?1")?;
        let count: i64 = stmt.query_row(params![phone], |row| row.get(0))?;
        Ok(count > 0)
    })
    .await
}

/// Set the login count to an absolute value.
///
/// The caller computes `current + 1`; the count only ever moves up.
pub async fn update_login_count(conn: &Connection, id: i64, login_count: i64) -> Result<()> {
    conn.call(move |conn| {
        conn.execute(
            "UPDATE profile SET login_count = ?1 WHERE id = ?2",
            params![login_count, id],
        )?;
        Ok(())
    })
    .await
}

/// Update name and phone, stamping `updated_at`.
pub async fn update_profile(conn: &Connection, id: i64, name: String, phone: String) -> Result<()> {
    let updated_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    conn.call(move |conn| {
        conn.execute(
            "UPDATE profile SET name = ?1, phone = ?2, updated_at = ?3 WHERE id = ?4",
            params![name, phone, updated_at, id],
        )?;
        info!("Profile {} updated", id);
        Ok(())
    })
    .await
}

/// True when `err` is a SQLite uniqueness-constraint failure, the race
/// window between a phone pre-check and the write.
pub fn is_unique_violation(err: &tokio_rusqlite::Error) -> bool {
    matches!(
        err,
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create::create_tables;

    async fn test_db() -> Connection {
        let conn = Connection::open_in_memory().await.unwrap();
        create_tables(&conn).await.unwrap();
        conn
    }

    fn narto() -> NewProfile {
        NewProfile {
            name: "narto".to_string(),
            phone: "+6281122334455".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".to_string(),
        }
    }

    #[tokio::test]
    async fn save_then_fetch_roundtrip() {
        let conn = test_db().await;
        let id = save_profile(&conn, narto()).await.unwrap();

        let by_phone = get_profile_by_phone(&conn, "+6281122334455".to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_phone.id, id);
        assert_eq!(by_phone.name, "narto");
        assert_eq!(by_phone.login_count, 0);
        assert!(by_phone.created_at > 0);
        assert!(by_phone.updated_at.is_none());

        let by_id = get_profile_by_id(&conn, id).await.unwrap().unwrap();
        assert_eq!(by_id.phone, by_phone.phone);
    }

    #[tokio::test]
    async fn missing_rows_come_back_as_none() {
        let conn = test_db().await;
        assert!(
            get_profile_by_phone(&conn, "+6299999999999".to_string())
                .await
                .unwrap()
                .is_none()
        );
        assert!(get_profile_by_id(&conn, 999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn phone_exists_tracks_inserts() {
        let conn = test_db().await;
        assert!(!phone_exists(&conn, "+6281122334455".to_string()).await.unwrap());
        save_profile(&conn, narto()).await.unwrap();
        assert!(phone_exists(&conn, "+6281122334455".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_phone_is_a_unique_violation() {
        let conn = test_db().await;
        save_profile(&conn, narto()).await.unwrap();
        let err = save_profile(&conn, narto()).await.unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn login_count_is_set_absolutely() {
        let conn = test_db().await;
        let id = save_profile(&conn, narto()).await.unwrap();

        update_login_count(&conn, id, 1).await.unwrap();
        let p = get_profile_by_id(&conn, id).await.unwrap().unwrap();
        assert_eq!(p.login_count, 1);

        update_login_count(&conn, id, p.login_count + 1).await.unwrap();
        let p = get_profile_by_id(&conn, id).await.unwrap().unwrap();
        assert_eq!(p.login_count, 2);
    }

    #[tokio::test]
    async fn update_stamps_updated_at() {
        let conn = test_db().await;
        let id = save_profile(&conn, narto()).await.unwrap();

        update_profile(&conn, id, "sasuke".to_string(), "+6281122334466".to_string())
            .await
            .unwrap();

        let p = get_profile_by_id(&conn, id).await.unwrap().unwrap();
        assert_eq!(p.name, "sasuke");
        assert_eq!(p.phone, "+6281122334466");
        assert!(p.updated_at.is_some());
    }

    #[tokio::test]
    async fn update_to_an_existing_phone_violates_uniqueness() {
        let conn = test_db().await;
        let first = save_profile(&conn, narto()).await.unwrap();
        let _second = save_profile(
            &conn,
            NewProfile {
                name: "sasuke".to_string(),
                phone: "+6281122334466".to_string(),
                password_hash: "$argon2id$v=19$m=19456,t=2,p=1$ghi$jkl".to_string(),
            },
        )
        .await
        .unwrap();

        let err = update_profile(&conn, first, "narto".to_string(), "+6281122334466".to_string())
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err));
    }
}
