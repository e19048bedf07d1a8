use actix_web::web;

use crate::helper::feed_helpers::{self, FeedItem};
use crate::models::db_operations::{contacts_db_operations, content_db_operations};
use crate::models::{
    ApprovalStatus, ContentKey, ContentKind, Member, MemberDraft, News, Publication, Seminar,
    Workshop,
};
use crate::DbPool;

/// The merged home/updates feed. Pool exhaustion degrades to an empty feed
/// rather than a 500; the page still renders.
pub fn fetch_feed(pool: &web::Data<DbPool>, limit: Option<usize>) -> Vec<FeedItem> {
    match pool.get() {
        Ok(conn) => feed_helpers::get_feed(&conn, limit),
        Err(e) => {
            log::error!("Could not get DB connection for feed: {}", e);
            Vec::new()
        }
    }
}

pub fn fetch_approved_news(pool: &web::Data<DbPool>) -> Vec<News> {
    let conn = match pool.get() {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Could not get DB connection for news listing: {}", e);
            return Vec::new();
        }
    };
    match content_db_operations::read_all_news(&conn) {
        Ok(rows) => {
            let mut rows: Vec<News> = rows
                .into_iter()
                .filter(|n| ApprovalStatus::is_approved(n.approval_status.as_deref()))
                .collect();
            rows.sort_by(|a, b| {
                feed_helpers::news_sort_key(b).cmp(&feed_helpers::news_sort_key(a))
            });
            rows
        }
        Err(e) => {
            log::error!("Failed to fetch news listing: {}", e);
            Vec::new()
        }
    }
}

pub fn fetch_news_by_slug(pool: &web::Data<DbPool>, slug: &str) -> Option<News> {
    let conn = pool.get().ok()?;
    content_db_operations::read_news_by_slug(&conn, slug)
        .ok()
        .flatten()
        .filter(|n| ApprovalStatus::is_approved(n.approval_status.as_deref()))
}

pub fn fetch_approved_seminars(pool: &web::Data<DbPool>) -> Vec<Seminar> {
    let conn = match pool.get() {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Could not get DB connection for seminar listing: {}", e);
            return Vec::new();
        }
    };
    match content_db_operations::read_all_seminars(&conn) {
        Ok(rows) => {
            let mut rows: Vec<Seminar> = rows
                .into_iter()
                .filter(|s| ApprovalStatus::is_approved(s.approval_status.as_deref()))
                .collect();
            rows.sort_by(|a, b| {
                feed_helpers::seminar_sort_key(b).cmp(&feed_helpers::seminar_sort_key(a))
            });
            rows
        }
        Err(e) => {
            log::error!("Failed to fetch seminar listing: {}", e);
            Vec::new()
        }
    }
}

pub fn fetch_seminar_by_id(pool: &web::Data<DbPool>, id: i64) -> Option<Seminar> {
    let conn = pool.get().ok()?;
    content_db_operations::read_seminar_by_id(&conn, id)
        .ok()
        .flatten()
        .filter(|s| ApprovalStatus::is_approved(s.approval_status.as_deref()))
}

pub fn fetch_approved_workshops(pool: &web::Data<DbPool>) -> Vec<Workshop> {
    let conn = match pool.get() {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Could not get DB connection for workshop listing: {}", e);
            return Vec::new();
        }
    };
    match content_db_operations::read_all_workshops(&conn) {
        Ok(rows) => {
            let mut rows: Vec<Workshop> = rows
                .into_iter()
                .filter(|w| ApprovalStatus::is_approved(w.approval_status.as_deref()))
                .collect();
            rows.sort_by(|a, b| {
                feed_helpers::workshop_sort_key(b).cmp(&feed_helpers::workshop_sort_key(a))
            });
            rows
        }
        Err(e) => {
            log::error!("Failed to fetch workshop listing: {}", e);
            Vec::new()
        }
    }
}

pub fn fetch_workshop_by_id(pool: &web::Data<DbPool>, id: i64) -> Option<Workshop> {
    let conn = pool.get().ok()?;
    content_db_operations::read_workshop_by_id(&conn, id)
        .ok()
        .flatten()
        .filter(|w| ApprovalStatus::is_approved(w.approval_status.as_deref()))
}

pub fn fetch_approved_publications(pool: &web::Data<DbPool>) -> Vec<Publication> {
    let conn = match pool.get() {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Could not get DB connection for publication listing: {}", e);
            return Vec::new();
        }
    };
    match content_db_operations::read_all_publications(&conn) {
        Ok(rows) => rows
            .into_iter()
            .filter(|p| ApprovalStatus::is_approved(p.approval_status.as_deref()))
            .collect(),
        Err(e) => {
            log::error!("Failed to fetch publication listing: {}", e);
            Vec::new()
        }
    }
}

pub fn fetch_approved_members(pool: &web::Data<DbPool>) -> Vec<Member> {
    let conn = match pool.get() {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Could not get DB connection for member listing: {}", e);
            return Vec::new();
        }
    };
    match content_db_operations::read_all_members(&conn) {
        Ok(rows) => rows
            .into_iter()
            .filter(|m| ApprovalStatus::is_approved(m.approval_status.as_deref()))
            .collect(),
        Err(e) => {
            log::error!("Failed to fetch member listing: {}", e);
            Vec::new()
        }
    }
}

/// Serves inline image bytes for an approved row only; the gate applies to
/// the byte-serving route exactly as it does to listings.
pub fn fetch_image(
    pool: &web::Data<DbPool>,
    kind: ContentKind,
    key: &ContentKey,
) -> Option<(Vec<u8>, String)> {
    let conn = pool.get().ok()?;
    let status = content_db_operations::read_status(&conn, kind, key).ok()?;
    if !ApprovalStatus::is_approved(status.as_deref()) {
        return None;
    }
    content_db_operations::read_image(&conn, kind, key).ok().flatten()
}

/// Public membership application: always enters the queue pending.
pub fn submit_member_application(
    pool: &web::Data<DbPool>,
    draft: &MemberDraft,
) -> Result<i64, Box<dyn std::error::Error>> {
    let conn = pool.get()?;
    let id = content_db_operations::create_member(&conn, draft, &ApprovalStatus::pending())?;
    Ok(id)
}

pub fn subscribe_contact(
    pool: &web::Data<DbPool>,
    email: &str,
    name: Option<&str>,
    affiliation: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;
    contacts_db_operations::add_contact(&conn, email, name, affiliation)?;
    Ok(())
}
