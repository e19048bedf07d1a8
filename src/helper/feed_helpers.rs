use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use rusqlite::Connection;
use serde::Serialize;

use crate::helper::sanitization_helpers;
use crate::models::db_operations::content_db_operations;
use crate::models::{ApprovalStatus, ContentKind, News, Seminar, Workshop};

/// Character budget for feed teasers.
pub const SUMMARY_LENGTH: usize = 200;

/// Unparsable dates resolve to the minimum value so they sink to the bottom
/// of the descending feed instead of failing the page render.
pub const DATE_SENTINEL: NaiveDateTime = NaiveDateTime::MIN;

/// One entry of the merged public feed, ready for template rendering.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FeedItem {
    pub kind: ContentKind,
    pub title: String,
    pub date: String,
    pub image_url: Option<String>,
    pub target_url: String,
    pub summary: String,
}

/// Best-effort parse of the mixed date formats in the content tables.
///
/// Manually submitted rows carry ISO-8601; rows scraped from the legacy site
/// carry human strings like "Thursday, February 5th, 2026". Strict ISO is
/// tried first (any timezone stripped to a naive value), then the human
/// forms with ordinal suffixes removed. Anything else gets the sentinel.
pub fn parse_date(raw: &str) -> NaiveDateTime {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DATE_SENTINEL;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.naive_local();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return dt;
    }
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).unwrap_or(DATE_SENTINEL);
    }

    // "February 5th, 2026" -> "February 5, 2026"
    let ordinal_re = Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").unwrap();
    let cleaned = ordinal_re.replace_all(trimmed, "$1");
    for format in ["%B %d, %Y", "%b %d, %Y", "%B %d %Y", "%A, %B %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(&cleaned, format) {
            return d.and_hms_opt(0, 0, 0).unwrap_or(DATE_SENTINEL);
        }
    }

    DATE_SENTINEL
}

/// Seminars and workshops sort by when they were announced, falling back to
/// when they happen; news has no announcement date and always sorts by its
/// own date. The asymmetry is a product rule, not an oversight.
fn preferred_date<'a>(announcement: Option<&'a str>, primary: &'a str) -> &'a str {
    match announcement {
        Some(a) if !a.trim().is_empty() => a,
        _ => primary,
    }
}

pub fn news_sort_key(item: &News) -> NaiveDateTime {
    parse_date(&item.date)
}

pub fn seminar_sort_key(item: &Seminar) -> NaiveDateTime {
    parse_date(preferred_date(item.announcement_date.as_deref(), &item.date))
}

pub fn workshop_sort_key(item: &Workshop) -> NaiveDateTime {
    parse_date(preferred_date(
        item.announcement_date.as_deref(),
        &item.start_date,
    ))
}

fn news_feed_item(item: &News) -> FeedItem {
    FeedItem {
        kind: ContentKind::News,
        title: item.title.clone(),
        date: item.date.clone(),
        image_url: item
            .has_image
            .then(|| format!("/news/{}/image", item.slug)),
        target_url: format!("/news/{}", item.slug),
        summary: sanitization_helpers::summarize(&item.body, SUMMARY_LENGTH),
    }
}

fn seminar_feed_item(item: &Seminar) -> FeedItem {
    FeedItem {
        kind: ContentKind::Seminar,
        title: item.title.clone(),
        date: item.date.clone(),
        image_url: item
            .has_image
            .then(|| format!("/seminars/{}/image", item.id)),
        target_url: format!("/seminars/{}", item.id),
        summary: sanitization_helpers::summarize(&item.abstract_text, SUMMARY_LENGTH),
    }
}

fn workshop_feed_item(item: &Workshop) -> FeedItem {
    FeedItem {
        kind: ContentKind::Workshop,
        title: item.title.clone(),
        date: item.start_date.clone(),
        image_url: item
            .has_image
            .then(|| format!("/workshops/{}/image", item.id)),
        target_url: format!("/workshops/{}", item.id),
        summary: sanitization_helpers::summarize(&item.description, SUMMARY_LENGTH),
    }
}

/// Merges news, seminars, and workshops into one reverse-chronological feed.
///
/// Every row is fetched and the approval gate applied after the fact, so a
/// row with a corrupt status column is silently invisible rather than a 500.
/// A collection whose query fails outright is dropped from this render and
/// the rest of the feed still goes out. `limit` truncates strictly after the
/// sort; truncating earlier would bias the feed toward fetch order.
pub fn get_feed(conn: &Connection, limit: Option<usize>) -> Vec<FeedItem> {
    let mut entries: Vec<(NaiveDateTime, FeedItem)> = Vec::new();

    match content_db_operations::read_all_news(conn) {
        Ok(rows) => {
            for item in rows
                .iter()
                .filter(|n| ApprovalStatus::is_approved(n.approval_status.as_deref()))
            {
                entries.push((news_sort_key(item), news_feed_item(item)));
            }
        }
        Err(e) => log::warn!("Dropping news from feed; query failed: {}", e),
    }

    match content_db_operations::read_all_seminars(conn) {
        Ok(rows) => {
            for item in rows
                .iter()
                .filter(|s| ApprovalStatus::is_approved(s.approval_status.as_deref()))
            {
                entries.push((seminar_sort_key(item), seminar_feed_item(item)));
            }
        }
        Err(e) => log::warn!("Dropping seminars from feed; query failed: {}", e),
    }

    match content_db_operations::read_all_workshops(conn) {
        Ok(rows) => {
            for item in rows
                .iter()
                .filter(|w| ApprovalStatus::is_approved(w.approval_status.as_deref()))
            {
                entries.push((workshop_sort_key(item), workshop_feed_item(item)));
            }
        }
        Err(e) => log::warn!("Dropping workshops from feed; query failed: {}", e),
    }

    // Stable sort: ties keep fetch order.
    entries.sort_by(|a, b| b.0.cmp(&a.0));

    let mut items: Vec<FeedItem> = entries.into_iter().map(|(_, item)| item).collect();
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::db_operations::content_db_operations::{approve_item, create_news};
    use crate::models::{ContentKey, NewsDraft};
    use crate::setup::db_setup;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn test_conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        db_setup::setup_database(&mut conn).unwrap();
        conn
    }

    fn insert_approved_news(conn: &Connection, title: &str, date: &str) -> String {
        let slug = create_news(
            conn,
            &NewsDraft {
                title: title.to_string(),
                date: date.to_string(),
                body: "body".to_string(),
                ..Default::default()
            },
            &ApprovalStatus::pending(),
        )
        .unwrap();
        approve_item(conn, ContentKind::News, &ContentKey::Slug(slug.clone()), "admin").unwrap();
        slug
    }

    #[test]
    fn unparsable_dates_resolve_to_the_sentinel() {
        assert_eq!(parse_date(""), DATE_SENTINEL);
        assert_eq!(parse_date("   "), DATE_SENTINEL);
        assert_eq!(parse_date("TBD"), DATE_SENTINEL);
        assert_eq!(parse_date("2026-13-45"), DATE_SENTINEL);
        assert_eq!(parse_date("sometime next spring"), DATE_SENTINEL);
    }

    #[test]
    fn iso_dates_parse_with_timezone_stripped() {
        assert_eq!(parse_date("2026-02-05"), date(2026, 2, 5));
        assert_eq!(
            parse_date("2026-02-05T16:30:00"),
            date(2026, 2, 5) + chrono::Duration::hours(16) + chrono::Duration::minutes(30)
        );
        // Offset is dropped, not converted: the wall-clock value wins.
        assert_eq!(
            parse_date("2026-02-05T16:30:00-06:00"),
            parse_date("2026-02-05T16:30:00Z")
        );
    }

    #[test]
    fn ordinal_suffixes_are_stripped() {
        assert_eq!(parse_date("February 5th, 2026"), parse_date("February 5, 2026"));
        assert_eq!(parse_date("March 1st, 2025"), date(2025, 3, 1));
        assert_eq!(parse_date("August 22nd, 2025"), date(2025, 8, 22));
        assert_eq!(parse_date("June 3rd 2024"), date(2024, 6, 3));
    }

    #[test]
    fn legacy_weekday_prefixed_dates_parse() {
        assert_eq!(parse_date("Thursday, February 5, 2026"), date(2026, 2, 5));
    }

    #[test]
    fn seminars_prefer_announcement_date_news_never_has_one() {
        let seminar = Seminar {
            id: 1,
            slug: "s".to_string(),
            title: "t".to_string(),
            speaker: String::new(),
            affiliation: String::new(),
            date: "2026-02-05".to_string(),
            announcement_date: Some("2025-01-01".to_string()),
            abstract_text: String::new(),
            location: String::new(),
            has_image: false,
            related_links: Vec::new(),
            approval_status: None,
        };
        assert_eq!(seminar_sort_key(&seminar), date(2025, 1, 1));

        let news = News {
            slug: "n".to_string(),
            title: "t".to_string(),
            date: "2026-02-05".to_string(),
            body: String::new(),
            has_image: false,
            related_links: Vec::new(),
            approval_status: None,
        };
        assert_eq!(news_sort_key(&news), date(2026, 2, 5));
    }

    #[test]
    fn empty_announcement_date_falls_back_to_primary() {
        let workshop = Workshop {
            id: 1,
            slug: "w".to_string(),
            title: "t".to_string(),
            start_date: "2026-06-01".to_string(),
            end_date: None,
            announcement_date: Some("   ".to_string()),
            description: String::new(),
            location: String::new(),
            has_image: false,
            related_links: Vec::new(),
            approval_status: None,
        };
        assert_eq!(workshop_sort_key(&workshop), date(2026, 6, 1));
    }

    #[test]
    fn feed_contains_only_approved_items() {
        let conn = test_conn();
        insert_approved_news(&conn, "Visible", "2026-01-01");
        create_news(
            &conn,
            &NewsDraft {
                title: "Hidden".to_string(),
                date: "2026-01-02".to_string(),
                body: "body".to_string(),
                ..Default::default()
            },
            &ApprovalStatus::pending(),
        )
        .unwrap();
        // A corrupt status column hides the row instead of breaking the page.
        conn.execute(
            "INSERT INTO news (slug, title, date, body, approval_status)
             VALUES ('corrupt-2', 'Corrupt', '2026-01-03', '', 'garbage{')",
            [],
        )
        .unwrap();

        let feed = get_feed(&conn, None);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].title, "Visible");
    }

    #[test]
    fn limit_truncates_after_sorting() {
        let conn = test_conn();
        // Insertion order deliberately scrambled relative to date order.
        for (title, d) in [
            ("rank5", "2026-01-05"),
            ("rank3", "2026-01-03"),
            ("rank1", "2026-01-01"),
            ("rank4", "2026-01-04"),
            ("rank2", "2026-01-02"),
        ] {
            insert_approved_news(&conn, title, d);
        }

        let feed = get_feed(&conn, Some(3));
        let titles: Vec<&str> = feed.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["rank5", "rank4", "rank3"]);
    }

    #[test]
    fn feed_survives_a_missing_collection() {
        let conn = test_conn();
        insert_approved_news(&conn, "Still here", "2026-01-01");
        conn.execute("DROP TABLE workshops", []).unwrap();

        let feed = get_feed(&conn, None);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].title, "Still here");
    }

    #[test]
    fn dateless_item_is_listed_last_once_approved() {
        // Submission with no date: pending and invisible, then approved and
        // visible with the empty date string, sorted below everything dated.
        let conn = test_conn();
        let slug = create_news(
            &conn,
            &NewsDraft {
                title: "Dateless".to_string(),
                date: String::new(),
                body: "body".to_string(),
                ..Default::default()
            },
            &ApprovalStatus::pending(),
        )
        .unwrap();
        assert!(get_feed(&conn, None).is_empty());

        approve_item(&conn, ContentKind::News, &ContentKey::Slug(slug), "admin").unwrap();
        insert_approved_news(&conn, "Dated", "2026-01-01");

        let feed = get_feed(&conn, None);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].title, "Dated");
        assert_eq!(feed[1].title, "Dateless");
        assert_eq!(feed[1].date, "");
    }

    #[test]
    fn mixed_kinds_merge_into_one_ordering() {
        let conn = test_conn();
        insert_approved_news(&conn, "News item", "2026-01-02");

        conn.execute(
            "INSERT INTO seminars (slug, title, speaker, date, abstract, approval_status)
             VALUES ('sem-1', 'Seminar item', 'Dr. Chen', '2026-01-03', 'a', ?1)",
            [ApprovalStatus::approved("admin", None).to_json()],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO workshops (slug, title, start_date, description, approval_status)
             VALUES ('ws-1', 'Workshop item', '2026-01-01', 'd', ?1)",
            [ApprovalStatus::approved("admin", None).to_json()],
        )
        .unwrap();

        let feed = get_feed(&conn, None);
        let titles: Vec<&str> = feed.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Seminar item", "News item", "Workshop item"]);
        assert_eq!(feed[0].target_url, "/seminars/1");
        assert!(feed[1].target_url.starts_with("/news/"));
    }
}
