use rusqlite::{params, Connection, Error as RusqliteError};

use crate::models::Contact;

/// Adds an address to the mailing list. Resubscribing an existing address is
/// a silent no-op (the email column is UNIQUE).
pub fn add_contact(
    conn: &Connection,
    email: &str,
    name: Option<&str>,
    affiliation: Option<&str>,
) -> Result<usize, RusqliteError> {
    conn.execute(
        "INSERT OR IGNORE INTO contacts (email, name, affiliation) VALUES (?1, ?2, ?3)",
        params![email, name, affiliation],
    )
}

pub fn read_all_contacts(conn: &Connection) -> Result<Vec<Contact>, RusqliteError> {
    let mut stmt =
        conn.prepare("SELECT id, email, name, affiliation FROM contacts ORDER BY created_at")?;
    let contact_iter = stmt.query_map([], |row| {
        Ok(Contact {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            affiliation: row.get(3)?,
        })
    })?;
    Ok(contact_iter.filter_map(|c| c.ok()).collect())
}

pub fn delete_contact(conn: &Connection, id: i64) -> Result<usize, RusqliteError> {
    conn.execute("DELETE FROM contacts WHERE id = ?1", [id])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::db_setup;

    #[test]
    fn duplicate_subscription_is_ignored() {
        let mut conn = Connection::open_in_memory().unwrap();
        db_setup::setup_database(&mut conn).unwrap();

        assert_eq!(add_contact(&conn, "a@example.org", Some("A"), None).unwrap(), 1);
        assert_eq!(add_contact(&conn, "a@example.org", Some("A again"), None).unwrap(), 0);
        assert_eq!(read_all_contacts(&conn).unwrap().len(), 1);
    }
}
