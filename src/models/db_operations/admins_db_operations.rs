use bcrypt::{hash, verify, BcryptError};
use rusqlite::{params, Connection, Error as RusqliteError};

use crate::models::Admin;

fn bcrypt_to_rusqlite_error(e: BcryptError) -> RusqliteError {
    RusqliteError::ToSqlConversionFailure(Box::new(e))
}

pub fn create_admin(
    conn: &Connection,
    username: &str,
    password: &str,
    email: Option<&str>,
) -> Result<(), RusqliteError> {
    let hashed_password = hash(password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    conn.execute(
        "INSERT INTO admins (username, password_hash, email) VALUES (?1, ?2, ?3)",
        params![username, hashed_password, email],
    )?;
    Ok(())
}

pub fn read_all_admins(conn: &Connection) -> Result<Vec<Admin>, RusqliteError> {
    let mut stmt = conn.prepare("SELECT id, username, email FROM admins ORDER BY username")?;
    let admin_iter = stmt.query_map([], |row| {
        Ok(Admin {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
        })
    })?;
    Ok(admin_iter.filter_map(|a| a.ok()).collect())
}

/// Checks a username/password pair against the stored bcrypt hash. Returns
/// the username on success so the session can carry it as the approver id.
pub fn verify_credentials(conn: &Connection, username: &str, password: &str) -> Option<String> {
    let stored_hash: rusqlite::Result<String> = conn.query_row(
        "SELECT password_hash FROM admins WHERE username = ?1",
        [username],
        |row| row.get(0),
    );

    match stored_hash {
        Ok(stored) if verify(password, &stored).unwrap_or(false) => Some(username.to_string()),
        _ => None,
    }
}

pub fn change_password(
    conn: &Connection,
    username: &str,
    new_password: &str,
) -> Result<usize, RusqliteError> {
    let hashed_password =
        hash(new_password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    conn.execute(
        "UPDATE admins SET password_hash = ?1 WHERE username = ?2",
        params![hashed_password, username],
    )
}

pub fn change_username(
    conn: &Connection,
    old_username: &str,
    new_username: &str,
) -> Result<usize, RusqliteError> {
    conn.execute(
        "UPDATE admins SET username = ?1 WHERE username = ?2",
        params![new_username, old_username],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::db_setup;

    #[test]
    fn credentials_verify_only_with_matching_password() {
        let mut conn = Connection::open_in_memory().unwrap();
        db_setup::setup_database(&mut conn).unwrap();

        create_admin(&conn, "alice", "correct horse", None).unwrap();
        assert_eq!(
            verify_credentials(&conn, "alice", "correct horse").as_deref(),
            Some("alice")
        );
        assert!(verify_credentials(&conn, "alice", "wrong").is_none());
        assert!(verify_credentials(&conn, "nobody", "correct horse").is_none());
    }
}
