use rusqlite::{params, Connection, OptionalExtension};

use crate::helper::sanitization_helpers;
use crate::models::db_operations::DbError;
use crate::models::{
    ApprovalStatus, ContentKey, ContentKind, Member, MemberDraft, News, NewsDraft, PendingItem,
    Publication, PublicationDraft, Seminar, SeminarDraft, Workshop, WorkshopDraft,
    parse_related_links, STATUS_PENDING,
};

fn links_json(links: &[crate::models::RelatedLink]) -> Result<String, DbError> {
    Ok(serde_json::to_string(links)?)
}

fn image_parts(
    image: &Option<crate::models::ImageUpload>,
) -> (Option<&[u8]>, Option<&str>) {
    match image {
        Some(upload) => (Some(upload.bytes.as_slice()), Some(upload.mime.as_str())),
        None => (None, None),
    }
}

// ====================================================================
// ========================== APPROVAL GATE ===========================
// ====================================================================

/// Reads the raw approval document for any content row.
pub fn read_status(
    conn: &Connection,
    kind: ContentKind,
    key: &ContentKey,
) -> Result<Option<String>, DbError> {
    let sql = format!(
        "SELECT approval_status FROM {} WHERE {} = ?1",
        kind.table(),
        kind.key_column()
    );
    let raw: Option<Option<String>> = conn
        .query_row(&sql, params![key], |row| row.get(0))
        .optional()?;
    match raw {
        Some(value) => Ok(value),
        None => Err(DbError::NotFound(format!("{} {}", kind.as_str(), key))),
    }
}

/// Marks a row approved, stamping the acting admin and the approval time.
/// Approving an already-approved row just refreshes the stamp.
pub fn approve_item(
    conn: &Connection,
    kind: ContentKind,
    key: &ContentKey,
    actor: &str,
) -> Result<(), DbError> {
    let raw = read_status(conn, kind, key)?;
    let prior = ApprovalStatus::parse(raw.as_deref());
    let next = ApprovalStatus::approved(actor, prior.as_ref());
    let sql = format!(
        "UPDATE {} SET approval_status = ?1 WHERE {} = ?2",
        kind.table(),
        kind.key_column()
    );
    conn.execute(&sql, params![next.to_json(), key])?;
    Ok(())
}

/// Unconditional hard delete. There is no tombstone; rejection is deletion.
pub fn delete_item(
    conn: &Connection,
    kind: ContentKind,
    key: &ContentKey,
) -> Result<usize, DbError> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?1",
        kind.table(),
        kind.key_column()
    );
    Ok(conn.execute(&sql, params![key])?)
}

/// Collects the pending queue across all five content tables. A row whose
/// status column does not parse is omitted rather than failing the listing;
/// a table whose query fails is skipped with a warning.
pub fn read_pending_items(conn: &Connection) -> Vec<PendingItem> {
    let mut items: Vec<PendingItem> = Vec::new();
    for kind in ContentKind::ALL {
        match read_pending_for_kind(conn, kind) {
            Ok(mut rows) => items.append(&mut rows),
            Err(e) => log::warn!(
                "Skipping '{}' in the pending queue; query failed: {}",
                kind.table(),
                e
            ),
        }
    }
    // Newest submissions first; unparsable timestamps cannot occur here since
    // unparsable statuses were already dropped.
    items.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    items
}

fn read_pending_for_kind(
    conn: &Connection,
    kind: ContentKind,
) -> Result<Vec<PendingItem>, DbError> {
    let sql = format!(
        "SELECT {}, {}, approval_status FROM {}",
        kind.key_column(),
        kind.title_column(),
        kind.table()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], move |row| {
        let key = match kind {
            ContentKind::News => row.get::<_, String>(0)?,
            _ => row.get::<_, i64>(0)?.to_string(),
        };
        let title: String = row.get(1)?;
        let raw_status: Option<String> = row.get(2)?;
        Ok((key, title, raw_status))
    })?;

    let items = rows
        .filter_map(|r| r.ok())
        .filter_map(|(key, title, raw_status)| {
            let status = ApprovalStatus::parse(raw_status.as_deref())?;
            if status.status != STATUS_PENDING {
                return None;
            }
            Some(PendingItem {
                kind,
                key,
                title,
                submitted_at: status.submitted_at,
            })
        })
        .collect();
    Ok(items)
}

// ====================================================================
// =============================== NEWS ===============================
// ====================================================================

fn map_news(row: &rusqlite::Row) -> rusqlite::Result<News> {
    Ok(News {
        slug: row.get(0)?,
        title: row.get(1)?,
        date: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        body: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        has_image: row.get(4)?,
        related_links: parse_related_links(row.get::<_, Option<String>>(5)?.as_deref()),
        approval_status: row.get(6)?,
    })
}

const NEWS_COLUMNS: &str =
    "slug, title, date, body, image_data IS NOT NULL, related_links, approval_status";

pub fn create_news(
    conn: &Connection,
    draft: &NewsDraft,
    status: &ApprovalStatus,
) -> Result<String, DbError> {
    let slug = sanitization_helpers::make_slug(&draft.title);
    let (image_bytes, image_mime) = image_parts(&draft.image);
    conn.execute(
        "INSERT INTO news (slug, title, date, body, image_data, image_mime, related_links, approval_status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            slug,
            draft.title,
            draft.date,
            draft.body,
            image_bytes,
            image_mime,
            links_json(&draft.related_links)?,
            status.to_json(),
        ],
    )?;
    Ok(slug)
}

pub fn read_all_news(conn: &Connection) -> Result<Vec<News>, DbError> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM news", NEWS_COLUMNS))?;
    let rows = stmt.query_map([], map_news)?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

pub fn read_news_by_slug(conn: &Connection, slug: &str) -> Result<Option<News>, DbError> {
    let sql = format!("SELECT {} FROM news WHERE slug = ?1", NEWS_COLUMNS);
    Ok(conn.query_row(&sql, [slug], map_news).optional()?)
}

/// Full field overwrite. A new upload replaces the stored image; editing
/// without one keeps the existing bytes. The slug never changes.
pub fn update_news(
    conn: &Connection,
    slug: &str,
    draft: &NewsDraft,
    status: &ApprovalStatus,
) -> Result<(), DbError> {
    let links = links_json(&draft.related_links)?;
    let updated = match &draft.image {
        Some(upload) => conn.execute(
            "UPDATE news SET title = ?1, date = ?2, body = ?3, related_links = ?4,
             approval_status = ?5, image_data = ?6, image_mime = ?7 WHERE slug = ?8",
            params![
                draft.title,
                draft.date,
                draft.body,
                links,
                status.to_json(),
                upload.bytes,
                upload.mime,
                slug
            ],
        )?,
        None => conn.execute(
            "UPDATE news SET title = ?1, date = ?2, body = ?3, related_links = ?4,
             approval_status = ?5 WHERE slug = ?6",
            params![draft.title, draft.date, draft.body, links, status.to_json(), slug],
        )?,
    };
    if updated == 0 {
        return Err(DbError::NotFound(format!("news {}", slug)));
    }
    Ok(())
}

// ====================================================================
// ============================= SEMINARS =============================
// ====================================================================

fn map_seminar(row: &rusqlite::Row) -> rusqlite::Result<Seminar> {
    Ok(Seminar {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        speaker: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        affiliation: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        date: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        announcement_date: row.get(6)?,
        abstract_text: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        location: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        has_image: row.get(9)?,
        related_links: parse_related_links(row.get::<_, Option<String>>(10)?.as_deref()),
        approval_status: row.get(11)?,
    })
}

const SEMINAR_COLUMNS: &str = "id, slug, title, speaker, affiliation, date, announcement_date, \
     abstract, location, image_data IS NOT NULL, related_links, approval_status";

pub fn create_seminar(
    conn: &Connection,
    draft: &SeminarDraft,
    status: &ApprovalStatus,
) -> Result<i64, DbError> {
    let slug = sanitization_helpers::make_slug(&draft.title);
    let (image_bytes, image_mime) = image_parts(&draft.image);
    conn.execute(
        "INSERT INTO seminars (slug, title, speaker, affiliation, date, announcement_date,
         abstract, location, image_data, image_mime, related_links, approval_status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            slug,
            draft.title,
            draft.speaker,
            draft.affiliation,
            draft.date,
            draft.announcement_date,
            draft.abstract_text,
            draft.location,
            image_bytes,
            image_mime,
            links_json(&draft.related_links)?,
            status.to_json(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_all_seminars(conn: &Connection) -> Result<Vec<Seminar>, DbError> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM seminars", SEMINAR_COLUMNS))?;
    let rows = stmt.query_map([], map_seminar)?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

pub fn read_seminar_by_id(conn: &Connection, id: i64) -> Result<Option<Seminar>, DbError> {
    let sql = format!("SELECT {} FROM seminars WHERE id = ?1", SEMINAR_COLUMNS);
    Ok(conn.query_row(&sql, [id], map_seminar).optional()?)
}

pub fn update_seminar(
    conn: &Connection,
    id: i64,
    draft: &SeminarDraft,
    status: &ApprovalStatus,
) -> Result<(), DbError> {
    let links = links_json(&draft.related_links)?;
    let updated = match &draft.image {
        Some(upload) => conn.execute(
            "UPDATE seminars SET title = ?1, speaker = ?2, affiliation = ?3, date = ?4,
             announcement_date = ?5, abstract = ?6, location = ?7, related_links = ?8,
             approval_status = ?9, image_data = ?10, image_mime = ?11 WHERE id = ?12",
            params![
                draft.title,
                draft.speaker,
                draft.affiliation,
                draft.date,
                draft.announcement_date,
                draft.abstract_text,
                draft.location,
                links,
                status.to_json(),
                upload.bytes,
                upload.mime,
                id
            ],
        )?,
        None => conn.execute(
            "UPDATE seminars SET title = ?1, speaker = ?2, affiliation = ?3, date = ?4,
             announcement_date = ?5, abstract = ?6, location = ?7, related_links = ?8,
             approval_status = ?9 WHERE id = ?10",
            params![
                draft.title,
                draft.speaker,
                draft.affiliation,
                draft.date,
                draft.announcement_date,
                draft.abstract_text,
                draft.location,
                links,
                status.to_json(),
                id
            ],
        )?,
    };
    if updated == 0 {
        return Err(DbError::NotFound(format!("seminar {}", id)));
    }
    Ok(())
}

// ====================================================================
// ============================ WORKSHOPS =============================
// ====================================================================

fn map_workshop(row: &rusqlite::Row) -> rusqlite::Result<Workshop> {
    Ok(Workshop {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        start_date: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        end_date: row.get(4)?,
        announcement_date: row.get(5)?,
        description: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        location: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        has_image: row.get(8)?,
        related_links: parse_related_links(row.get::<_, Option<String>>(9)?.as_deref()),
        approval_status: row.get(10)?,
    })
}

const WORKSHOP_COLUMNS: &str = "id, slug, title, start_date, end_date, announcement_date, \
     description, location, image_data IS NOT NULL, related_links, approval_status";

pub fn create_workshop(
    conn: &Connection,
    draft: &WorkshopDraft,
    status: &ApprovalStatus,
) -> Result<i64, DbError> {
    let slug = sanitization_helpers::make_slug(&draft.title);
    let (image_bytes, image_mime) = image_parts(&draft.image);
    conn.execute(
        "INSERT INTO workshops (slug, title, start_date, end_date, announcement_date,
         description, location, image_data, image_mime, related_links, approval_status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            slug,
            draft.title,
            draft.start_date,
            draft.end_date,
            draft.announcement_date,
            draft.description,
            draft.location,
            image_bytes,
            image_mime,
            links_json(&draft.related_links)?,
            status.to_json(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_all_workshops(conn: &Connection) -> Result<Vec<Workshop>, DbError> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM workshops", WORKSHOP_COLUMNS))?;
    let rows = stmt.query_map([], map_workshop)?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

pub fn read_workshop_by_id(conn: &Connection, id: i64) -> Result<Option<Workshop>, DbError> {
    let sql = format!("SELECT {} FROM workshops WHERE id = ?1", WORKSHOP_COLUMNS);
    Ok(conn.query_row(&sql, [id], map_workshop).optional()?)
}

pub fn update_workshop(
    conn: &Connection,
    id: i64,
    draft: &WorkshopDraft,
    status: &ApprovalStatus,
) -> Result<(), DbError> {
    let links = links_json(&draft.related_links)?;
    let updated = match &draft.image {
        Some(upload) => conn.execute(
            "UPDATE workshops SET title = ?1, start_date = ?2, end_date = ?3,
             announcement_date = ?4, description = ?5, location = ?6, related_links = ?7,
             approval_status = ?8, image_data = ?9, image_mime = ?10 WHERE id = ?11",
            params![
                draft.title,
                draft.start_date,
                draft.end_date,
                draft.announcement_date,
                draft.description,
                draft.location,
                links,
                status.to_json(),
                upload.bytes,
                upload.mime,
                id
            ],
        )?,
        None => conn.execute(
            "UPDATE workshops SET title = ?1, start_date = ?2, end_date = ?3,
             announcement_date = ?4, description = ?5, location = ?6, related_links = ?7,
             approval_status = ?8 WHERE id = ?9",
            params![
                draft.title,
                draft.start_date,
                draft.end_date,
                draft.announcement_date,
                draft.description,
                draft.location,
                links,
                status.to_json(),
                id
            ],
        )?,
    };
    if updated == 0 {
        return Err(DbError::NotFound(format!("workshop {}", id)));
    }
    Ok(())
}

// ====================================================================
// =========================== PUBLICATIONS ===========================
// ====================================================================

fn map_publication(row: &rusqlite::Row) -> rusqlite::Result<Publication> {
    Ok(Publication {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        authors: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        year: row.get(4)?,
        description: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        link: row.get(6)?,
        approval_status: row.get(7)?,
    })
}

const PUBLICATION_COLUMNS: &str =
    "id, slug, title, authors, year, description, link, approval_status";

pub fn create_publication(
    conn: &Connection,
    draft: &PublicationDraft,
    status: &ApprovalStatus,
) -> Result<i64, DbError> {
    let slug = sanitization_helpers::make_slug(&draft.title);
    conn.execute(
        "INSERT INTO publications (slug, title, authors, year, description, link, approval_status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            slug,
            draft.title,
            draft.authors,
            draft.year,
            draft.description,
            draft.link,
            status.to_json(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_all_publications(conn: &Connection) -> Result<Vec<Publication>, DbError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM publications ORDER BY year DESC, id DESC",
        PUBLICATION_COLUMNS
    ))?;
    let rows = stmt.query_map([], map_publication)?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

pub fn read_publication_by_id(conn: &Connection, id: i64) -> Result<Option<Publication>, DbError> {
    let sql = format!("SELECT {} FROM publications WHERE id = ?1", PUBLICATION_COLUMNS);
    Ok(conn.query_row(&sql, [id], map_publication).optional()?)
}

pub fn update_publication(
    conn: &Connection,
    id: i64,
    draft: &PublicationDraft,
    status: &ApprovalStatus,
) -> Result<(), DbError> {
    let updated = conn.execute(
        "UPDATE publications SET title = ?1, authors = ?2, year = ?3, description = ?4,
         link = ?5, approval_status = ?6 WHERE id = ?7",
        params![
            draft.title,
            draft.authors,
            draft.year,
            draft.description,
            draft.link,
            status.to_json(),
            id
        ],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("publication {}", id)));
    }
    Ok(())
}

// ====================================================================
// ============================= MEMBERS ==============================
// ====================================================================

fn map_member(row: &rusqlite::Row) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        slug: row.get(1)?,
        name: row.get(2)?,
        affiliation: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        email: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        statement: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        website: row.get(6)?,
        has_image: row.get(7)?,
        approval_status: row.get(8)?,
    })
}

const MEMBER_COLUMNS: &str = "id, slug, name, affiliation, email, statement, website, \
     image_data IS NOT NULL, approval_status";

pub fn create_member(
    conn: &Connection,
    draft: &MemberDraft,
    status: &ApprovalStatus,
) -> Result<i64, DbError> {
    let slug = sanitization_helpers::make_slug(&draft.name);
    let (image_bytes, image_mime) = image_parts(&draft.image);
    conn.execute(
        "INSERT INTO members (slug, name, affiliation, email, statement, website,
         image_data, image_mime, approval_status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            slug,
            draft.name,
            draft.affiliation,
            draft.email,
            draft.statement,
            draft.website,
            image_bytes,
            image_mime,
            status.to_json(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_all_members(conn: &Connection) -> Result<Vec<Member>, DbError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM members ORDER BY name",
        MEMBER_COLUMNS
    ))?;
    let rows = stmt.query_map([], map_member)?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

pub fn read_member_by_id(conn: &Connection, id: i64) -> Result<Option<Member>, DbError> {
    let sql = format!("SELECT {} FROM members WHERE id = ?1", MEMBER_COLUMNS);
    Ok(conn.query_row(&sql, [id], map_member).optional()?)
}

pub fn update_member(
    conn: &Connection,
    id: i64,
    draft: &MemberDraft,
    status: &ApprovalStatus,
) -> Result<(), DbError> {
    let updated = match &draft.image {
        Some(upload) => conn.execute(
            "UPDATE members SET name = ?1, affiliation = ?2, email = ?3, statement = ?4,
             website = ?5, approval_status = ?6, image_data = ?7, image_mime = ?8 WHERE id = ?9",
            params![
                draft.name,
                draft.affiliation,
                draft.email,
                draft.statement,
                draft.website,
                status.to_json(),
                upload.bytes,
                upload.mime,
                id
            ],
        )?,
        None => conn.execute(
            "UPDATE members SET name = ?1, affiliation = ?2, email = ?3, statement = ?4,
             website = ?5, approval_status = ?6 WHERE id = ?7",
            params![
                draft.name,
                draft.affiliation,
                draft.email,
                draft.statement,
                draft.website,
                status.to_json(),
                id
            ],
        )?,
    };
    if updated == 0 {
        return Err(DbError::NotFound(format!("member {}", id)));
    }
    Ok(())
}

// ====================================================================
// ============================== IMAGES ==============================
// ====================================================================

/// Loads the inline image for a content row. Returns None when the row is
/// missing or carries no image.
pub fn read_image(
    conn: &Connection,
    kind: ContentKind,
    key: &ContentKey,
) -> Result<Option<(Vec<u8>, String)>, DbError> {
    let sql = format!(
        "SELECT image_data, image_mime FROM {} WHERE {} = ?1",
        kind.table(),
        kind.key_column()
    );
    let row: Option<(Option<Vec<u8>>, Option<String>)> = conn
        .query_row(&sql, params![key], |row| Ok((row.get(0)?, row.get(1)?)))
        .optional()?;
    match row {
        Some((Some(bytes), mime)) => Ok(Some((
            bytes,
            mime.unwrap_or_else(|| "application/octet-stream".to_string()),
        ))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::STATUS_APPROVED;
    use crate::setup::db_setup;

    fn test_conn() -> Connection {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        db_setup::setup_database(&mut conn).expect("create schema");
        conn
    }

    fn news_draft(title: &str, date: &str) -> NewsDraft {
        NewsDraft {
            title: title.to_string(),
            date: date.to_string(),
            body: "Body text.".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn submission_starts_pending_and_invisible() {
        let conn = test_conn();
        let slug = create_news(&conn, &news_draft("Kickoff", "2026-02-05"), &ApprovalStatus::pending())
            .unwrap();
        let row = read_news_by_slug(&conn, &slug).unwrap().unwrap();
        assert!(!ApprovalStatus::is_approved(row.approval_status.as_deref()));

        let status = ApprovalStatus::parse(row.approval_status.as_deref()).unwrap();
        assert_eq!(status.status, STATUS_PENDING);
        assert!(status.submitted_at.is_some());
    }

    #[test]
    fn approve_stamps_actor_and_is_idempotent() {
        let conn = test_conn();
        let slug = create_news(&conn, &news_draft("Kickoff", "2026-02-05"), &ApprovalStatus::pending())
            .unwrap();
        let key = ContentKey::Slug(slug.clone());

        approve_item(&conn, ContentKind::News, &key, "alice").unwrap();
        approve_item(&conn, ContentKind::News, &key, "bob").unwrap();

        let row = read_news_by_slug(&conn, &slug).unwrap().unwrap();
        let status = ApprovalStatus::parse(row.approval_status.as_deref()).unwrap();
        assert_eq!(status.status, STATUS_APPROVED);
        assert_eq!(status.approved_by.as_deref(), Some("bob"));
    }

    #[test]
    fn approve_missing_row_is_not_found() {
        let conn = test_conn();
        let err = approve_item(
            &conn,
            ContentKind::Seminar,
            &ContentKey::Id(999),
            "alice",
        )
        .unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[test]
    fn edit_resets_approval_unless_explicitly_kept() {
        let conn = test_conn();
        let slug = create_news(&conn, &news_draft("Kickoff", "2026-02-05"), &ApprovalStatus::pending())
            .unwrap();
        let key = ContentKey::Slug(slug.clone());
        approve_item(&conn, ContentKind::News, &key, "alice").unwrap();

        // An edit that does not re-assert "approved" revokes visibility.
        let prior = ApprovalStatus::parse(
            read_status(&conn, ContentKind::News, &key).unwrap().as_deref(),
        );
        let reset = ApprovalStatus::from_edit("pending_approval", "bob", prior.as_ref());
        update_news(&conn, &slug, &news_draft("Kickoff (edited)", "2026-02-06"), &reset).unwrap();

        let row = read_news_by_slug(&conn, &slug).unwrap().unwrap();
        assert!(!ApprovalStatus::is_approved(row.approval_status.as_deref()));
        assert_eq!(row.title, "Kickoff (edited)");
    }

    #[test]
    fn delete_uses_slug_for_news_and_id_for_the_rest() {
        let conn = test_conn();
        let slug = create_news(&conn, &news_draft("Kickoff", "2026-02-05"), &ApprovalStatus::pending())
            .unwrap();
        let seminar_id = create_seminar(
            &conn,
            &SeminarDraft {
                title: "Spectral methods".to_string(),
                speaker: "Dr. Chen".to_string(),
                date: "2026-03-01".to_string(),
                ..Default::default()
            },
            &ApprovalStatus::pending(),
        )
        .unwrap();

        assert_eq!(
            delete_item(&conn, ContentKind::News, &ContentKey::Slug(slug.clone())).unwrap(),
            1
        );
        assert_eq!(
            delete_item(&conn, ContentKind::Seminar, &ContentKey::Id(seminar_id)).unwrap(),
            1
        );
        assert!(read_news_by_slug(&conn, &slug).unwrap().is_none());
        assert!(read_seminar_by_id(&conn, seminar_id).unwrap().is_none());
    }

    #[test]
    fn pending_queue_omits_rows_with_corrupt_status() {
        let conn = test_conn();
        create_news(&conn, &news_draft("Valid", "2026-02-05"), &ApprovalStatus::pending()).unwrap();
        conn.execute(
            "INSERT INTO news (slug, title, date, body, approval_status)
             VALUES ('corrupt-1', 'Corrupt', '', '', '{not json')",
            [],
        )
        .unwrap();

        let pending = read_pending_items(&conn);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "Valid");
    }

    #[test]
    fn pending_queue_excludes_approved_rows() {
        let conn = test_conn();
        let slug = create_news(&conn, &news_draft("Kickoff", "2026-02-05"), &ApprovalStatus::pending())
            .unwrap();
        assert_eq!(read_pending_items(&conn).len(), 1);

        approve_item(&conn, ContentKind::News, &ContentKey::Slug(slug), "alice").unwrap();
        assert!(read_pending_items(&conn).is_empty());
    }

    #[test]
    fn image_round_trip_and_absence() {
        let conn = test_conn();
        let mut draft = news_draft("With image", "2026-02-05");
        draft.image = Some(crate::models::ImageUpload {
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
            mime: "image/png".to_string(),
        });
        let slug = create_news(&conn, &draft, &ApprovalStatus::pending()).unwrap();

        let (bytes, mime) =
            read_image(&conn, ContentKind::News, &ContentKey::Slug(slug.clone()))
                .unwrap()
                .unwrap();
        assert_eq!(bytes, vec![0x89, 0x50, 0x4e, 0x47]);
        assert_eq!(mime, "image/png");

        let bare = create_news(&conn, &news_draft("No image", ""), &ApprovalStatus::pending())
            .unwrap();
        assert!(read_image(&conn, ContentKind::News, &ContentKey::Slug(bare))
            .unwrap()
            .is_none());
    }
}
