use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STATUS_PENDING: &str = "pending_approval";
pub const STATUS_APPROVED: &str = "approved";

/// The approval document stored as JSON in the `approval_status` TEXT column
/// of every content table. Rows migrated from the legacy site sometimes carry
/// only a `status` field, so every other field tolerates absence.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApprovalStatus {
    pub status: String,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
}

impl ApprovalStatus {
    pub fn pending() -> Self {
        ApprovalStatus {
            status: STATUS_PENDING.to_string(),
            submitted_at: Some(Utc::now()),
            approved_by: None,
            approved_at: None,
        }
    }

    /// Approval overwrites the status document wholesale, keeping the original
    /// submission timestamp when the previous document still had one.
    pub fn approved(actor: &str, prior: Option<&ApprovalStatus>) -> Self {
        ApprovalStatus {
            status: STATUS_APPROVED.to_string(),
            submitted_at: prior.and_then(|p| p.submitted_at).or_else(|| Some(Utc::now())),
            approved_by: Some(actor.to_string()),
            approved_at: Some(Utc::now()),
        }
    }

    /// Admin edits overwrite every field, the status included. Only the literal
    /// string "approved" keeps the row publicly visible (stamping the editor as
    /// approver); anything else sends the row back to the pending queue.
    pub fn from_edit(choice: &str, actor: &str, prior: Option<&ApprovalStatus>) -> Self {
        if choice == STATUS_APPROVED {
            ApprovalStatus::approved(actor, prior)
        } else {
            ApprovalStatus::pending()
        }
    }

    /// Parses the raw column value. An absent column, empty string, or
    /// malformed JSON all yield None; callers treat None as not approved.
    pub fn parse(raw: Option<&str>) -> Option<ApprovalStatus> {
        let raw = raw?.trim();
        if raw.is_empty() {
            return None;
        }
        serde_json::from_str(raw).ok()
    }

    /// The single visibility gate for every public listing and detail route.
    /// Fails closed: anything that does not parse to `status == "approved"`
    /// is invisible.
    pub fn is_approved(raw: Option<&str>) -> bool {
        ApprovalStatus::parse(raw).map_or(false, |s| s.status == STATUS_APPROVED)
    }

    pub fn to_json(&self) -> String {
        // Serializing a struct of strings and timestamps cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// The five content variants, each backed by its own SQLite table. News is
/// keyed by slug; everything else by rowid. The asymmetry is historical and
/// preserved on purpose — public news URLs predate the other tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    News,
    Seminar,
    Workshop,
    Publication,
    Member,
}

impl ContentKind {
    pub const ALL: [ContentKind; 5] = [
        ContentKind::News,
        ContentKind::Seminar,
        ContentKind::Workshop,
        ContentKind::Publication,
        ContentKind::Member,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            ContentKind::News => "news",
            ContentKind::Seminar => "seminars",
            ContentKind::Workshop => "workshops",
            ContentKind::Publication => "publications",
            ContentKind::Member => "members",
        }
    }

    pub fn key_column(&self) -> &'static str {
        match self {
            ContentKind::News => "slug",
            _ => "id",
        }
    }

    /// Column shown as the item's title in the admin pending queue.
    pub fn title_column(&self) -> &'static str {
        match self {
            ContentKind::Member => "name",
            _ => "title",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::News => "news",
            ContentKind::Seminar => "seminar",
            ContentKind::Workshop => "workshop",
            ContentKind::Publication => "publication",
            ContentKind::Member => "member",
        }
    }

    pub fn from_str(s: &str) -> Option<ContentKind> {
        match s {
            "news" => Some(ContentKind::News),
            "seminar" => Some(ContentKind::Seminar),
            "workshop" => Some(ContentKind::Workshop),
            "publication" => Some(ContentKind::Publication),
            "member" => Some(ContentKind::Member),
            _ => None,
        }
    }
}

/// Primary key of a content row: a slug for news, a rowid for the rest.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentKey {
    Slug(String),
    Id(i64),
}

impl ContentKey {
    /// Parses the key the way the owning table expects it.
    pub fn parse(kind: ContentKind, raw: &str) -> Option<ContentKey> {
        match kind {
            ContentKind::News => {
                let slug = raw.trim();
                if slug.is_empty() {
                    None
                } else {
                    Some(ContentKey::Slug(slug.to_string()))
                }
            }
            _ => raw.trim().parse::<i64>().ok().map(ContentKey::Id),
        }
    }
}

impl std::fmt::Display for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKey::Slug(s) => write!(f, "{}", s),
            ContentKey::Id(id) => write!(f, "{}", id),
        }
    }
}

impl rusqlite::ToSql for ContentKey {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        match self {
            ContentKey::Slug(s) => s.to_sql(),
            ContentKey::Id(id) => id.to_sql(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RelatedLink {
    pub title: String,
    pub url: String,
}

/// Parses the `related_links` TEXT column (a JSON array of {title, url}).
/// Malformed or absent JSON degrades to an empty list rather than failing a
/// page render over one bad row.
pub fn parse_related_links(raw: Option<&str>) -> Vec<RelatedLink> {
    match raw {
        Some(s) if !s.trim().is_empty() => serde_json::from_str(s).unwrap_or_default(),
        _ => Vec::new(),
    }
}

// --- Row structs (listing queries never load image blobs) ---

#[derive(Debug, Serialize, Clone)]
pub struct News {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub body: String,
    pub has_image: bool,
    pub related_links: Vec<RelatedLink>,
    pub approval_status: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct Seminar {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub speaker: String,
    pub affiliation: String,
    pub date: String,
    pub announcement_date: Option<String>,
    pub abstract_text: String,
    pub location: String,
    pub has_image: bool,
    pub related_links: Vec<RelatedLink>,
    pub approval_status: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct Workshop {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub announcement_date: Option<String>,
    pub description: String,
    pub location: String,
    pub has_image: bool,
    pub related_links: Vec<RelatedLink>,
    pub approval_status: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct Publication {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub authors: String,
    pub year: i64,
    pub description: String,
    pub link: Option<String>,
    pub approval_status: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct Member {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub affiliation: String,
    pub email: String,
    pub statement: String,
    pub website: Option<String>,
    pub has_image: bool,
    pub approval_status: Option<String>,
}

// --- Submission payloads (validated form data, before persistence) ---

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub mime: String,
}

#[derive(Debug, Default)]
pub struct NewsDraft {
    pub title: String,
    pub date: String,
    pub body: String,
    pub related_links: Vec<RelatedLink>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Default)]
pub struct SeminarDraft {
    pub title: String,
    pub speaker: String,
    pub affiliation: String,
    pub date: String,
    pub announcement_date: Option<String>,
    pub abstract_text: String,
    pub location: String,
    pub related_links: Vec<RelatedLink>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Default)]
pub struct WorkshopDraft {
    pub title: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub announcement_date: Option<String>,
    pub description: String,
    pub location: String,
    pub related_links: Vec<RelatedLink>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Default)]
pub struct PublicationDraft {
    pub title: String,
    pub authors: String,
    pub year: i64,
    pub description: String,
    pub link: Option<String>,
}

#[derive(Debug, Default)]
pub struct MemberDraft {
    pub name: String,
    pub affiliation: String,
    pub email: String,
    pub statement: String,
    pub website: Option<String>,
    pub image: Option<ImageUpload>,
}

/// One row of the admin pending-approvals queue. Rows whose status column
/// fails to parse are omitted from the queue entirely.
#[derive(Debug, Serialize)]
pub struct PendingItem {
    pub kind: ContentKind,
    pub key: String,
    pub title: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Contact {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub affiliation: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    pub message: String,
    pub r#type: String, // 'success' or 'error'
}

pub mod db_operations;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_malformed_status_is_not_approved() {
        assert!(!ApprovalStatus::is_approved(None));
        assert!(!ApprovalStatus::is_approved(Some("")));
        assert!(!ApprovalStatus::is_approved(Some("   ")));
        assert!(!ApprovalStatus::is_approved(Some("not json at all")));
        assert!(!ApprovalStatus::is_approved(Some("{\"truncated\":")));
        assert!(!ApprovalStatus::is_approved(Some("{}")));
        assert!(!ApprovalStatus::is_approved(Some("[1,2,3]")));
    }

    #[test]
    fn pending_status_is_not_approved() {
        let raw = ApprovalStatus::pending().to_json();
        assert!(!ApprovalStatus::is_approved(Some(&raw)));
    }

    #[test]
    fn bare_legacy_status_still_parses() {
        // Migrated rows carry only the status field.
        assert!(ApprovalStatus::is_approved(Some("{\"status\":\"approved\"}")));
        assert!(!ApprovalStatus::is_approved(Some("{\"status\":\"pending_approval\"}")));
    }

    #[test]
    fn approve_is_idempotent() {
        let first = ApprovalStatus::approved("alice", None);
        let raw = first.to_json();
        assert!(ApprovalStatus::is_approved(Some(&raw)));

        let prior = ApprovalStatus::parse(Some(&raw));
        let second = ApprovalStatus::approved("bob", prior.as_ref());
        assert!(ApprovalStatus::is_approved(Some(&second.to_json())));
        assert_eq!(second.approved_by.as_deref(), Some("bob"));
        // Original submission timestamp survives a re-approval.
        assert_eq!(second.submitted_at, first.submitted_at);
    }

    #[test]
    fn edit_with_any_other_value_revokes_approval() {
        let approved = ApprovalStatus::approved("alice", None);
        let edited = ApprovalStatus::from_edit("pending_approval", "bob", Some(&approved));
        assert_eq!(edited.status, STATUS_PENDING);
        assert!(edited.approved_by.is_none());
        assert!(edited.approved_at.is_none());

        let still = ApprovalStatus::from_edit("approved", "bob", Some(&approved));
        assert_eq!(still.status, STATUS_APPROVED);
        assert_eq!(still.approved_by.as_deref(), Some("bob"));
    }

    #[test]
    fn related_links_degrade_to_empty() {
        assert!(parse_related_links(None).is_empty());
        assert!(parse_related_links(Some("")).is_empty());
        assert!(parse_related_links(Some("{broken")).is_empty());

        let links = parse_related_links(Some(
            "[{\"title\":\"Registration\",\"url\":\"https://example.org/register\"}]",
        ));
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].title, "Registration");
    }

    #[test]
    fn content_key_parse_respects_table_keying() {
        assert_eq!(
            ContentKey::parse(ContentKind::News, "annual-meeting-1700000000"),
            Some(ContentKey::Slug("annual-meeting-1700000000".to_string()))
        );
        assert_eq!(
            ContentKey::parse(ContentKind::Seminar, "42"),
            Some(ContentKey::Id(42))
        );
        assert_eq!(ContentKey::parse(ContentKind::Seminar, "not-a-number"), None);
        assert_eq!(ContentKey::parse(ContentKind::News, "  "), None);
    }
}
