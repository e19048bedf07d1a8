use actix_web::web;
use thiserror::Error;

use crate::models::db_operations::{
    admins_db_operations, contacts_db_operations, content_db_operations, DbError,
};
use crate::models::{
    ApprovalStatus, Contact, ContentKey, ContentKind, Member, MemberDraft, News, NewsDraft,
    PendingItem, Publication, PublicationDraft, Seminar, SeminarDraft, Workshop, WorkshopDraft,
};
use crate::DbPool;

#[derive(Error, Debug)]
pub enum AdminHelperError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Content error: {0}")]
    Content(#[from] DbError),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

fn get_conn(
    pool: &web::Data<DbPool>,
) -> Result<r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager>, AdminHelperError> {
    pool.get().map_err(AdminHelperError::Pool)
}

pub fn verify_admin_credentials(
    pool: &web::Data<DbPool>,
    username: &str,
    password: &str,
) -> Option<String> {
    let conn = pool.get().ok()?;
    admins_db_operations::verify_credentials(&conn, username, password)
}

/// The approval queue across all five content tables, newest first. Pool
/// failure degrades to an empty queue with a logged error.
pub fn fetch_pending_items(pool: &web::Data<DbPool>) -> Vec<PendingItem> {
    match pool.get() {
        Ok(conn) => content_db_operations::read_pending_items(&conn),
        Err(e) => {
            log::error!("Could not get DB connection for pending queue: {}", e);
            Vec::new()
        }
    }
}

pub fn approve_content(
    pool: &web::Data<DbPool>,
    kind: ContentKind,
    key: &ContentKey,
    actor: &str,
) -> Result<(), AdminHelperError> {
    let conn = get_conn(pool)?;
    content_db_operations::approve_item(&conn, kind, key, actor)?;
    Ok(())
}

pub fn delete_content(
    pool: &web::Data<DbPool>,
    kind: ContentKind,
    key: &ContentKey,
) -> Result<usize, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(content_db_operations::delete_item(&conn, kind, key)?)
}

/// The stored approval document for a row being edited, so the edit can
/// preserve the original submission timestamp when approval is re-asserted.
pub fn prior_status(
    pool: &web::Data<DbPool>,
    kind: ContentKind,
    key: &ContentKey,
) -> Option<ApprovalStatus> {
    let conn = pool.get().ok()?;
    let raw = content_db_operations::read_status(&conn, kind, key).ok()?;
    ApprovalStatus::parse(raw.as_deref())
}

// --- Create/update passthroughs (admin-created rows also start pending) ---

pub fn create_news(
    pool: &web::Data<DbPool>,
    draft: &NewsDraft,
) -> Result<String, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(content_db_operations::create_news(&conn, draft, &ApprovalStatus::pending())?)
}

pub fn update_news(
    pool: &web::Data<DbPool>,
    slug: &str,
    draft: &NewsDraft,
    status: &ApprovalStatus,
) -> Result<(), AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(content_db_operations::update_news(&conn, slug, draft, status)?)
}

pub fn create_seminar(
    pool: &web::Data<DbPool>,
    draft: &SeminarDraft,
) -> Result<i64, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(content_db_operations::create_seminar(&conn, draft, &ApprovalStatus::pending())?)
}

pub fn update_seminar(
    pool: &web::Data<DbPool>,
    id: i64,
    draft: &SeminarDraft,
    status: &ApprovalStatus,
) -> Result<(), AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(content_db_operations::update_seminar(&conn, id, draft, status)?)
}

pub fn create_workshop(
    pool: &web::Data<DbPool>,
    draft: &WorkshopDraft,
) -> Result<i64, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(content_db_operations::create_workshop(&conn, draft, &ApprovalStatus::pending())?)
}

pub fn update_workshop(
    pool: &web::Data<DbPool>,
    id: i64,
    draft: &WorkshopDraft,
    status: &ApprovalStatus,
) -> Result<(), AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(content_db_operations::update_workshop(&conn, id, draft, status)?)
}

pub fn create_publication(
    pool: &web::Data<DbPool>,
    draft: &PublicationDraft,
) -> Result<i64, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(content_db_operations::create_publication(&conn, draft, &ApprovalStatus::pending())?)
}

pub fn update_publication(
    pool: &web::Data<DbPool>,
    id: i64,
    draft: &PublicationDraft,
    status: &ApprovalStatus,
) -> Result<(), AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(content_db_operations::update_publication(&conn, id, draft, status)?)
}

pub fn create_member(
    pool: &web::Data<DbPool>,
    draft: &MemberDraft,
) -> Result<i64, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(content_db_operations::create_member(&conn, draft, &ApprovalStatus::pending())?)
}

pub fn update_member(
    pool: &web::Data<DbPool>,
    id: i64,
    draft: &MemberDraft,
    status: &ApprovalStatus,
) -> Result<(), AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(content_db_operations::update_member(&conn, id, draft, status)?)
}

// --- Ungated single-row fetches for the admin edit forms ---

pub fn fetch_news_any(pool: &web::Data<DbPool>, slug: &str) -> Option<News> {
    let conn = pool.get().ok()?;
    content_db_operations::read_news_by_slug(&conn, slug).ok().flatten()
}

pub fn fetch_seminar_any(pool: &web::Data<DbPool>, id: i64) -> Option<Seminar> {
    let conn = pool.get().ok()?;
    content_db_operations::read_seminar_by_id(&conn, id).ok().flatten()
}

pub fn fetch_workshop_any(pool: &web::Data<DbPool>, id: i64) -> Option<Workshop> {
    let conn = pool.get().ok()?;
    content_db_operations::read_workshop_by_id(&conn, id).ok().flatten()
}

pub fn fetch_publication_any(pool: &web::Data<DbPool>, id: i64) -> Option<Publication> {
    let conn = pool.get().ok()?;
    content_db_operations::read_publication_by_id(&conn, id).ok().flatten()
}

pub fn fetch_member_any(pool: &web::Data<DbPool>, id: i64) -> Option<Member> {
    let conn = pool.get().ok()?;
    content_db_operations::read_member_by_id(&conn, id).ok().flatten()
}

pub fn fetch_contacts(pool: &web::Data<DbPool>) -> Result<Vec<Contact>, AdminHelperError> {
    let conn = get_conn(pool)?;
    Ok(contacts_db_operations::read_all_contacts(&conn)?)
}
