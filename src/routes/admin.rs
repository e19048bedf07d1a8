use actix_csrf::extractor::{Csrf, CsrfGuarded, CsrfToken};
use actix_multipart::Multipart;
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::Config;
use crate::helper::{admin_helpers, form_helpers};
use crate::middleware::AuthenticatedAdmin;
use crate::models::{
    ApprovalStatus, ContentKey, ContentKind, ImageUpload, Notification, STATUS_APPROVED,
    STATUS_PENDING,
};
use crate::DbPool;

#[derive(Deserialize)]
struct LoginForm {
    csrf_token: CsrfToken,
    username: String,
    password: String,
}

impl CsrfGuarded for LoginForm {
    fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}

pub fn config_login(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::get().to(show_admin_login_form))
        .route("/login", web::post().to(handle_admin_login))
        .route("/logout", web::post().to(handle_admin_logout));
}

pub fn config_dashboard(cfg: &mut web::ServiceConfig) {
    cfg.route("/dashboard", web::get().to(show_admin_dashboard))
        .route("/approve", web::post().to(approve_action))
        .route("/delete", web::post().to(delete_action))
        .route("/contacts", web::get().to(show_contacts))
        .route("/create/{kind}", web::get().to(show_create_form))
        .route("/create/{kind}", web::post().to(create_action))
        .route("/edit/{kind}/{key}", web::get().to(show_edit_form))
        .route("/edit/{kind}/{key}", web::post().to(edit_action));
}

fn set_notification(session: &Session, message: &str, r#type: &str) {
    session
        .insert(
            "notification",
            &Notification {
                message: message.to_string(),
                r#type: r#type.to_string(),
            },
        )
        .unwrap();
}

fn dashboard_url(config: &Config) -> String {
    format!("/management/{}/dashboard", config.admin_url_prefix)
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .append_header(("location", location.to_string()))
        .finish()
}

fn render_page(tera: &Tera, template: &str, ctx: &Context) -> HttpResponse {
    match tera.render(template, ctx) {
        Ok(rendered) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(rendered),
        Err(err) => {
            log::error!("Template rendering error for '{}': {}", template, err);
            HttpResponse::InternalServerError().body("Template error")
        }
    }
}

// --- Login/Logout ---

async fn show_admin_login_form(
    session: Session,
    tera: web::Data<Tera>,
    token: CsrfToken,
    config: web::Data<Config>,
) -> impl Responder {
    if session.get::<String>("role").unwrap_or(None) == Some("admin".to_string()) {
        return redirect(&dashboard_url(&config));
    }

    let mut ctx = Context::new();
    ctx.insert("admin_url_prefix", &config.admin_url_prefix);
    ctx.insert("csrf_token", token.get());

    if let Some(error) = session.get::<String>("error").unwrap_or(None) {
        ctx.insert("error", &error);
        session.remove("error");
    }

    render_page(&tera, "admin/login.html", &ctx)
}

async fn handle_admin_login(
    session: Session,
    pool: web::Data<DbPool>,
    form: Csrf<web::Form<LoginForm>>,
    config: web::Data<Config>,
) -> impl Responder {
    let login_url = format!("/management/{}/login", config.admin_url_prefix);
    let login_data = form.into_inner();

    match admin_helpers::verify_admin_credentials(&pool, &login_data.username, &login_data.password)
    {
        Some(username) => {
            session.insert("username", username).unwrap();
            session.insert("role", "admin").unwrap();
            session.remove("error");
            redirect(&dashboard_url(&config))
        }
        None => {
            session.insert("error", "Invalid credentials.").unwrap();
            redirect(&login_url)
        }
    }
}

async fn handle_admin_logout(session: Session, config: web::Data<Config>) -> impl Responder {
    let login_url = format!("/management/{}/login", config.admin_url_prefix);
    session.clear();
    redirect(&login_url)
}

// --- Dashboard: the pending-approvals queue ---

async fn show_admin_dashboard(
    auth_user: AuthenticatedAdmin,
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    token: CsrfToken,
    config: web::Data<Config>,
) -> impl Responder {
    let mut ctx = Context::new();
    ctx.insert("admin_url_prefix", &config.admin_url_prefix);
    ctx.insert("user", &auth_user);
    ctx.insert("csrf_token", token.get());

    if let Ok(Some(notification)) = session.get::<Notification>("notification") {
        ctx.insert("notification", &notification);
        session.remove("notification");
    }

    ctx.insert("pending_items", &admin_helpers::fetch_pending_items(&pool));
    render_page(&tera, "admin/dashboard.html", &ctx)
}

fn parse_target(parsed: &HashMap<String, String>) -> Option<(ContentKind, ContentKey)> {
    let kind = ContentKind::from_str(parsed.get("kind")?.as_str())?;
    let key = ContentKey::parse(kind, parsed.get("key")?.as_str())?;
    Some((kind, key))
}

async fn approve_action(
    session: Session,
    auth_user: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    form: web::Bytes,
    config: web::Data<Config>,
) -> impl Responder {
    let dashboard = dashboard_url(&config);
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };

    let (kind, key) = match parse_target(&parsed) {
        Some(target) => target,
        None => {
            set_notification(&session, "Invalid approval target.", "error");
            return redirect(&dashboard);
        }
    };

    match admin_helpers::approve_content(&pool, kind, &key, &auth_user.username) {
        Ok(()) => set_notification(
            &session,
            &format!("Approved {} '{}'.", kind.as_str(), key),
            "success",
        ),
        // Best effort: log and return to the queue without messaging.
        Err(e) => log::error!("Failed to approve {} '{}': {}", kind.as_str(), key, e),
    }
    redirect(&dashboard)
}

async fn delete_action(
    session: Session,
    pool: web::Data<DbPool>,
    form: web::Bytes,
    config: web::Data<Config>,
) -> impl Responder {
    let dashboard = dashboard_url(&config);
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };

    let (kind, key) = match parse_target(&parsed) {
        Some(target) => target,
        None => {
            set_notification(&session, "Invalid delete target.", "error");
            return redirect(&dashboard);
        }
    };

    match admin_helpers::delete_content(&pool, kind, &key) {
        Ok(0) => set_notification(&session, "Item not found; nothing deleted.", "error"),
        Ok(_) => set_notification(
            &session,
            &format!("Deleted {} '{}'.", kind.as_str(), key),
            "success",
        ),
        Err(e) => log::error!("Failed to delete {} '{}': {}", kind.as_str(), key, e),
    }
    redirect(&dashboard)
}

async fn show_contacts(
    auth_user: AuthenticatedAdmin,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let mut ctx = Context::new();
    ctx.insert("admin_url_prefix", &config.admin_url_prefix);
    ctx.insert("user", &auth_user);

    match admin_helpers::fetch_contacts(&pool) {
        Ok(contacts) => ctx.insert("contacts", &contacts),
        Err(e) => {
            log::error!("Failed to fetch mailing-list contacts: {}", e);
            ctx.insert("contacts", &Vec::<String>::new());
        }
    }
    render_page(&tera, "admin/contacts.html", &ctx)
}

// --- Content create/edit ---

enum SaveOutcome {
    Saved,
    Invalid(form_helpers::FieldErrors),
    Failed(String),
}

fn create_item(
    pool: &web::Data<DbPool>,
    kind: ContentKind,
    fields: &HashMap<String, String>,
    image: Option<ImageUpload>,
) -> SaveOutcome {
    let result = match kind {
        ContentKind::News => match form_helpers::validate_news(fields, image) {
            Ok(draft) => admin_helpers::create_news(pool, &draft).map(|_| ()),
            Err(errors) => return SaveOutcome::Invalid(errors),
        },
        ContentKind::Seminar => match form_helpers::validate_seminar(fields, image) {
            Ok(draft) => admin_helpers::create_seminar(pool, &draft).map(|_| ()),
            Err(errors) => return SaveOutcome::Invalid(errors),
        },
        ContentKind::Workshop => match form_helpers::validate_workshop(fields, image) {
            Ok(draft) => admin_helpers::create_workshop(pool, &draft).map(|_| ()),
            Err(errors) => return SaveOutcome::Invalid(errors),
        },
        ContentKind::Publication => match form_helpers::validate_publication(fields) {
            Ok(draft) => admin_helpers::create_publication(pool, &draft).map(|_| ()),
            Err(errors) => return SaveOutcome::Invalid(errors),
        },
        ContentKind::Member => match form_helpers::validate_member(fields, image) {
            Ok(draft) => admin_helpers::create_member(pool, &draft).map(|_| ()),
            Err(errors) => return SaveOutcome::Invalid(errors),
        },
    };
    match result {
        Ok(()) => SaveOutcome::Saved,
        Err(e) => SaveOutcome::Failed(e.to_string()),
    }
}

fn update_item(
    pool: &web::Data<DbPool>,
    kind: ContentKind,
    key: &ContentKey,
    status: &ApprovalStatus,
    fields: &HashMap<String, String>,
    image: Option<ImageUpload>,
) -> SaveOutcome {
    let result = match (kind, key) {
        (ContentKind::News, ContentKey::Slug(slug)) => {
            match form_helpers::validate_news(fields, image) {
                Ok(draft) => admin_helpers::update_news(pool, slug, &draft, status),
                Err(errors) => return SaveOutcome::Invalid(errors),
            }
        }
        (ContentKind::Seminar, ContentKey::Id(id)) => {
            match form_helpers::validate_seminar(fields, image) {
                Ok(draft) => admin_helpers::update_seminar(pool, *id, &draft, status),
                Err(errors) => return SaveOutcome::Invalid(errors),
            }
        }
        (ContentKind::Workshop, ContentKey::Id(id)) => {
            match form_helpers::validate_workshop(fields, image) {
                Ok(draft) => admin_helpers::update_workshop(pool, *id, &draft, status),
                Err(errors) => return SaveOutcome::Invalid(errors),
            }
        }
        (ContentKind::Publication, ContentKey::Id(id)) => {
            match form_helpers::validate_publication(fields) {
                Ok(draft) => admin_helpers::update_publication(pool, *id, &draft, status),
                Err(errors) => return SaveOutcome::Invalid(errors),
            }
        }
        (ContentKind::Member, ContentKey::Id(id)) => {
            match form_helpers::validate_member(fields, image) {
                Ok(draft) => admin_helpers::update_member(pool, *id, &draft, status),
                Err(errors) => return SaveOutcome::Invalid(errors),
            }
        }
        _ => return SaveOutcome::Failed("Mismatched content key.".to_string()),
    };
    match result {
        Ok(()) => SaveOutcome::Saved,
        Err(e) => SaveOutcome::Failed(e.to_string()),
    }
}

fn form_template(kind: ContentKind) -> String {
    format!("admin/{}_form.html", kind.as_str())
}

fn base_form_ctx(auth_user: &AuthenticatedAdmin, config: &Config, kind: ContentKind) -> Context {
    let mut ctx = Context::new();
    ctx.insert("admin_url_prefix", &config.admin_url_prefix);
    ctx.insert("user", auth_user);
    ctx.insert("kind", kind.as_str());
    ctx
}

async fn show_create_form(
    auth_user: AuthenticatedAdmin,
    kind: web::Path<String>,
    tera: web::Data<Tera>,
    config: web::Data<Config>,
) -> impl Responder {
    let kind = match ContentKind::from_str(&kind) {
        Some(kind) => kind,
        None => return HttpResponse::NotFound().body("Unknown content type"),
    };
    let ctx = base_form_ctx(&auth_user, &config, kind);
    render_page(&tera, &form_template(kind), &ctx)
}

async fn create_action(
    auth_user: AuthenticatedAdmin,
    session: Session,
    kind: web::Path<String>,
    payload: Multipart,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let kind = match ContentKind::from_str(&kind) {
        Some(kind) => kind,
        None => return HttpResponse::NotFound().body("Unknown content type"),
    };

    let (fields, image) = match form_helpers::collect_multipart(payload).await {
        Ok(parts) => parts,
        Err(e) => {
            let mut ctx = base_form_ctx(&auth_user, &config, kind);
            ctx.insert("form_error", &e.to_string());
            return render_page(&tera, &form_template(kind), &ctx);
        }
    };

    match create_item(&pool, kind, &fields, image) {
        SaveOutcome::Saved => {
            set_notification(
                &session,
                &format!("Created {}; it is awaiting approval.", kind.as_str()),
                "success",
            );
            redirect(&dashboard_url(&config))
        }
        SaveOutcome::Invalid(errors) => {
            let mut ctx = base_form_ctx(&auth_user, &config, kind);
            ctx.insert("errors", &errors);
            ctx.insert("values", &fields);
            render_page(&tera, &form_template(kind), &ctx)
        }
        SaveOutcome::Failed(message) => {
            log::error!("Failed to create {}: {}", kind.as_str(), message);
            set_notification(&session, "Failed to save the new item.", "error");
            redirect(&dashboard_url(&config))
        }
    }
}

async fn show_edit_form(
    auth_user: AuthenticatedAdmin,
    path: web::Path<(String, String)>,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let (kind_raw, key_raw) = path.into_inner();
    let kind = match ContentKind::from_str(&kind_raw) {
        Some(kind) => kind,
        None => return HttpResponse::NotFound().body("Unknown content type"),
    };
    let key = match ContentKey::parse(kind, &key_raw) {
        Some(key) => key,
        None => return HttpResponse::NotFound().body("Invalid item key"),
    };

    let mut ctx = base_form_ctx(&auth_user, &config, kind);
    ctx.insert("item_key", &key.to_string());

    // The edit form pre-selects the stored approval state; an absent or
    // corrupt document shows as pending.
    let status = admin_helpers::prior_status(&pool, kind, &key)
        .map(|s| s.status)
        .unwrap_or_else(|| STATUS_PENDING.to_string());
    ctx.insert("current_status", &status);

    let found = match (kind, &key) {
        (ContentKind::News, ContentKey::Slug(slug)) => {
            match admin_helpers::fetch_news_any(&pool, slug) {
                Some(item) => {
                    ctx.insert("item", &item);
                    true
                }
                None => false,
            }
        }
        (ContentKind::Seminar, ContentKey::Id(id)) => {
            match admin_helpers::fetch_seminar_any(&pool, *id) {
                Some(item) => {
                    ctx.insert("item", &item);
                    true
                }
                None => false,
            }
        }
        (ContentKind::Workshop, ContentKey::Id(id)) => {
            match admin_helpers::fetch_workshop_any(&pool, *id) {
                Some(item) => {
                    ctx.insert("item", &item);
                    true
                }
                None => false,
            }
        }
        (ContentKind::Publication, ContentKey::Id(id)) => {
            match admin_helpers::fetch_publication_any(&pool, *id) {
                Some(item) => {
                    ctx.insert("item", &item);
                    true
                }
                None => false,
            }
        }
        (ContentKind::Member, ContentKey::Id(id)) => {
            match admin_helpers::fetch_member_any(&pool, *id) {
                Some(item) => {
                    ctx.insert("item", &item);
                    true
                }
                None => false,
            }
        }
        _ => false,
    };

    if !found {
        return HttpResponse::NotFound().body("Item not found");
    }
    render_page(&tera, &form_template(kind), &ctx)
}

/// Full-overwrite edit. The submitted approval_status field decides
/// visibility: the literal "approved" stamps the editing admin as approver;
/// anything else re-enters the pending queue with a fresh timestamp.
async fn edit_action(
    auth_user: AuthenticatedAdmin,
    session: Session,
    path: web::Path<(String, String)>,
    payload: Multipart,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let (kind_raw, key_raw) = path.into_inner();
    let kind = match ContentKind::from_str(&kind_raw) {
        Some(kind) => kind,
        None => return HttpResponse::NotFound().body("Unknown content type"),
    };
    let key = match ContentKey::parse(kind, &key_raw) {
        Some(key) => key,
        None => return HttpResponse::NotFound().body("Invalid item key"),
    };

    let (fields, image) = match form_helpers::collect_multipart(payload).await {
        Ok(parts) => parts,
        Err(e) => {
            let mut ctx = base_form_ctx(&auth_user, &config, kind);
            ctx.insert("item_key", &key.to_string());
            ctx.insert("form_error", &e.to_string());
            return render_page(&tera, &form_template(kind), &ctx);
        }
    };

    let choice = fields
        .get("approval_status")
        .map(|s| s.as_str())
        .unwrap_or(STATUS_PENDING);
    let prior = admin_helpers::prior_status(&pool, kind, &key);
    let status = ApprovalStatus::from_edit(choice, &auth_user.username, prior.as_ref());

    match update_item(&pool, kind, &key, &status, &fields, image) {
        SaveOutcome::Saved => {
            let verb = if status.status == STATUS_APPROVED {
                "updated and approved"
            } else {
                "updated; it is awaiting approval"
            };
            set_notification(
                &session,
                &format!("{} '{}' {}.", kind.as_str(), key, verb),
                "success",
            );
            redirect(&dashboard_url(&config))
        }
        SaveOutcome::Invalid(errors) => {
            let mut ctx = base_form_ctx(&auth_user, &config, kind);
            ctx.insert("item_key", &key.to_string());
            ctx.insert("current_status", &choice);
            ctx.insert("errors", &errors);
            ctx.insert("values", &fields);
            render_page(&tera, &form_template(kind), &ctx)
        }
        SaveOutcome::Failed(message) => {
            log::error!("Failed to update {} '{}': {}", kind.as_str(), key, message);
            set_notification(&session, "Failed to save changes.", "error");
            redirect(&dashboard_url(&config))
        }
    }
}
