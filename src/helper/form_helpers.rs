use actix_multipart::Multipart;
use actix_web::web::BytesMut;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use std::collections::{BTreeMap, HashMap};
use url::form_urlencoded;

use crate::helper::sanitization_helpers;
use crate::models::{
    ImageUpload, MemberDraft, NewsDraft, PublicationDraft, RelatedLink, SeminarDraft,
    WorkshopDraft,
};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_IMAGE_MIMES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Parses URL-encoded form data from bytes, handling potential UTF-8 errors
/// gracefully.
pub fn parse_form(form_bytes: &web::Bytes) -> Result<HashMap<String, String>, HttpResponse> {
    let body = match String::from_utf8(form_bytes.to_vec()) {
        Ok(s) => s,
        Err(_) => return Err(HttpResponse::BadRequest().body("Invalid UTF-8 in request body.")),
    };
    Ok(form_urlencoded::parse(body.as_bytes()).into_owned().collect())
}

/// Drains a multipart payload into plain text fields plus an optional image
/// upload (the field named "image"). An empty file input is treated as "no
/// image supplied" rather than an error.
pub async fn collect_multipart(
    mut payload: Multipart,
) -> Result<(HashMap<String, String>, Option<ImageUpload>), Box<dyn std::error::Error>> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut image: Option<ImageUpload> = None;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let field_name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_string();

        if field_name == "image" {
            let content_type = field
                .content_type()
                .map(|ct| ct.to_string())
                .unwrap_or_default();
            let filename = field
                .content_disposition()
                .get_filename()
                .unwrap_or("")
                .to_string();

            let mut data = BytesMut::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk?;
                if data.len() + chunk.len() > MAX_IMAGE_BYTES {
                    return Err("Image is too large (5 MB maximum).".into());
                }
                data.extend_from_slice(&chunk);
            }

            if filename.is_empty() || data.is_empty() {
                continue;
            }
            if !ALLOWED_IMAGE_MIMES.contains(&content_type.as_str()) {
                return Err(format!("Unsupported image type: '{}'.", content_type).into());
            }
            image = Some(ImageUpload {
                bytes: data.to_vec(),
                mime: content_type,
            });
        } else {
            let mut data = BytesMut::new();
            while let Some(chunk) = field.next().await {
                data.extend_from_slice(&chunk?);
            }
            let value = String::from_utf8(data.to_vec())
                .map_err(|_| "Invalid UTF-8 in form field.")?;
            fields.insert(field_name, value);
        }
    }

    Ok((fields, image))
}

pub type FieldErrors = BTreeMap<String, String>;

/// Field-level validation that collects every violation before rejecting,
/// so a failed submission can redisplay the form with all errors at once.
pub struct FieldValidator<'a> {
    fields: &'a HashMap<String, String>,
    errors: FieldErrors,
}

impl<'a> FieldValidator<'a> {
    pub fn new(fields: &'a HashMap<String, String>) -> Self {
        FieldValidator {
            fields,
            errors: BTreeMap::new(),
        }
    }

    pub fn required(&mut self, name: &str) -> String {
        let value = self.optional(name).unwrap_or_default();
        if value.is_empty() {
            self.errors
                .insert(name.to_string(), "This field is required.".to_string());
        }
        value
    }

    pub fn required_email(&mut self, name: &str) -> String {
        let value = self.required(name);
        if !value.is_empty() && !value.contains('@') {
            self.errors
                .insert(name.to_string(), "Enter a valid email address.".to_string());
        }
        value
    }

    pub fn required_year(&mut self, name: &str) -> i64 {
        let value = self.required(name);
        if value.is_empty() {
            return 0;
        }
        match value.parse::<i64>() {
            Ok(year) => year,
            Err(_) => {
                self.errors
                    .insert(name.to_string(), "Enter a numeric year.".to_string());
                0
            }
        }
    }

    /// Trimmed, tag-stripped value; None when absent or blank.
    pub fn optional(&self, name: &str) -> Option<String> {
        let raw = self.fields.get(name)?.trim();
        if raw.is_empty() {
            return None;
        }
        Some(sanitization_helpers::strip_all_html(raw))
    }

    /// Multi-line text kept verbatim (rendered through the markdown
    /// sanitizer later, never raw).
    pub fn text_block(&self, name: &str) -> String {
        self.fields
            .get(name)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    pub fn required_text_block(&mut self, name: &str) -> String {
        let value = self.text_block(name);
        if value.is_empty() {
            self.errors
                .insert(name.to_string(), "This field is required.".to_string());
        }
        value
    }

    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Admin forms enter related links one per line as "Title | URL"; a bare URL
/// line becomes its own title.
pub fn parse_links_field(raw: &str) -> Vec<RelatedLink> {
    raw.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            match line.split_once('|') {
                Some((title, url)) => Some(RelatedLink {
                    title: title.trim().to_string(),
                    url: url.trim().to_string(),
                }),
                None => Some(RelatedLink {
                    title: line.to_string(),
                    url: line.to_string(),
                }),
            }
        })
        .collect()
}

// --- Per-variant draft builders ---

pub fn validate_news(
    fields: &HashMap<String, String>,
    image: Option<ImageUpload>,
) -> Result<NewsDraft, FieldErrors> {
    let mut v = FieldValidator::new(fields);
    let title = v.required("title");
    let body = v.required_text_block("body");
    let date = v.optional("date").unwrap_or_default();
    let related_links = parse_links_field(&v.text_block("related_links"));
    v.finish()?;
    Ok(NewsDraft {
        title,
        date,
        body,
        related_links,
        image,
    })
}

pub fn validate_seminar(
    fields: &HashMap<String, String>,
    image: Option<ImageUpload>,
) -> Result<SeminarDraft, FieldErrors> {
    let mut v = FieldValidator::new(fields);
    let title = v.required("title");
    let speaker = v.required("speaker");
    let date = v.required("date");
    let abstract_text = v.required_text_block("abstract");
    let affiliation = v.optional("affiliation").unwrap_or_default();
    let announcement_date = v.optional("announcement_date");
    let location = v.optional("location").unwrap_or_default();
    let related_links = parse_links_field(&v.text_block("related_links"));
    v.finish()?;
    Ok(SeminarDraft {
        title,
        speaker,
        affiliation,
        date,
        announcement_date,
        abstract_text,
        location,
        related_links,
        image,
    })
}

pub fn validate_workshop(
    fields: &HashMap<String, String>,
    image: Option<ImageUpload>,
) -> Result<WorkshopDraft, FieldErrors> {
    let mut v = FieldValidator::new(fields);
    let title = v.required("title");
    let start_date = v.required("start_date");
    let description = v.required_text_block("description");
    let end_date = v.optional("end_date");
    let announcement_date = v.optional("announcement_date");
    let location = v.optional("location").unwrap_or_default();
    let related_links = parse_links_field(&v.text_block("related_links"));
    v.finish()?;
    Ok(WorkshopDraft {
        title,
        start_date,
        end_date,
        announcement_date,
        description,
        location,
        related_links,
        image,
    })
}

pub fn validate_publication(
    fields: &HashMap<String, String>,
) -> Result<PublicationDraft, FieldErrors> {
    let mut v = FieldValidator::new(fields);
    let title = v.required("title");
    let authors = v.required("authors");
    let year = v.required_year("year");
    let description = v.text_block("description");
    let link = v.optional("link");
    v.finish()?;
    Ok(PublicationDraft {
        title,
        authors,
        year,
        description,
        link,
    })
}

pub fn validate_member(
    fields: &HashMap<String, String>,
    image: Option<ImageUpload>,
) -> Result<MemberDraft, FieldErrors> {
    let mut v = FieldValidator::new(fields);
    let name = v.required("name");
    let affiliation = v.required("affiliation");
    let email = v.required_email("email");
    let statement = v.required_text_block("statement");
    let website = v.optional("website");
    v.finish()?;
    Ok(MemberDraft {
        name,
        affiliation,
        email,
        statement,
        website,
        image,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn member_validation_collects_every_violation() {
        let err = validate_member(&fields(&[("email", "not-an-email")]), None).unwrap_err();
        // name, affiliation, statement missing; email malformed.
        assert_eq!(err.len(), 4);
        assert!(err.contains_key("name"));
        assert!(err.contains_key("affiliation"));
        assert!(err.contains_key("statement"));
        assert_eq!(err.get("email").unwrap(), "Enter a valid email address.");
    }

    #[test]
    fn valid_member_passes_with_optional_fields_absent() {
        let draft = validate_member(
            &fields(&[
                ("name", "Dr. Chen"),
                ("affiliation", "Example University"),
                ("email", "chen@example.edu"),
                ("statement", "I study epidemic models."),
            ]),
            None,
        )
        .unwrap();
        assert_eq!(draft.name, "Dr. Chen");
        assert!(draft.website.is_none());
    }

    #[test]
    fn news_date_is_optional_but_title_is_not() {
        let err = validate_news(&fields(&[("body", "text")]), None).unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err.contains_key("title"));

        let draft = validate_news(&fields(&[("title", "T"), ("body", "text")]), None).unwrap();
        assert_eq!(draft.date, "");
    }

    #[test]
    fn publication_year_must_be_numeric() {
        let err = validate_publication(&fields(&[
            ("title", "Paper"),
            ("authors", "A, B"),
            ("year", "MMXXVI"),
        ]))
        .unwrap_err();
        assert_eq!(err.get("year").unwrap(), "Enter a numeric year.");
    }

    #[test]
    fn links_field_accepts_titled_and_bare_lines() {
        let links = parse_links_field("Registration | https://example.org/register\n\nhttps://example.org\n");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].title, "Registration");
        assert_eq!(links[0].url, "https://example.org/register");
        assert_eq!(links[1].title, "https://example.org");
    }
}
