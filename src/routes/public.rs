use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use tera::{Context, Tera};

use crate::helper::{form_helpers, public_helpers, sanitization_helpers};
use crate::models::{ContentKey, ContentKind};
use crate::DbPool;

pub fn config_public(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(show_home))
        .route("/updates", web::get().to(show_updates))
        .route("/news", web::get().to(show_news_list))
        .route("/news/{slug}", web::get().to(show_news_detail))
        .route("/news/{slug}/image", web::get().to(serve_news_image))
        .route("/seminars", web::get().to(show_seminar_list))
        .route("/seminars/{id}", web::get().to(show_seminar_detail))
        .route("/seminars/{id}/image", web::get().to(serve_seminar_image))
        .route("/workshops", web::get().to(show_workshop_list))
        .route("/workshops/{id}", web::get().to(show_workshop_detail))
        .route("/workshops/{id}/image", web::get().to(serve_workshop_image))
        .route("/publications", web::get().to(show_publication_list))
        .route("/members", web::get().to(show_member_list))
        .route("/members/{id}/image", web::get().to(serve_member_image))
        .route("/join", web::get().to(show_join_form))
        .route("/join", web::post().to(handle_join))
        .route("/subscribe", web::post().to(handle_subscribe));
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

fn serve_image(pool: &web::Data<DbPool>, kind: ContentKind, key: ContentKey) -> HttpResponse {
    match public_helpers::fetch_image(pool, kind, &key) {
        Some((bytes, mime)) => HttpResponse::Ok().content_type(mime).body(bytes),
        None => HttpResponse::NotFound().body("Image not found"),
    }
}

async fn show_home(tera: web::Data<Tera>, pool: web::Data<DbPool>) -> impl Responder {
    let mut ctx = Context::new();
    ctx.insert("feed_items", &public_helpers::fetch_feed(&pool, Some(3)));
    render_page(&tera, "public/home.html", &ctx)
}

async fn show_updates(tera: web::Data<Tera>, pool: web::Data<DbPool>) -> impl Responder {
    let mut ctx = Context::new();
    ctx.insert("feed_items", &public_helpers::fetch_feed(&pool, None));
    render_page(&tera, "public/updates.html", &ctx)
}

async fn show_news_list(tera: web::Data<Tera>, pool: web::Data<DbPool>) -> impl Responder {
    let mut ctx = Context::new();
    ctx.insert("news_items", &public_helpers::fetch_approved_news(&pool));
    render_page(&tera, "public/news_list.html", &ctx)
}

async fn show_news_detail(
    slug: web::Path<String>,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
) -> impl Responder {
    match public_helpers::fetch_news_by_slug(&pool, &slug) {
        Some(item) => {
            let mut ctx = Context::new();
            ctx.insert("body_html", &sanitization_helpers::render_markdown(&item.body));
            ctx.insert("item", &item);
            render_page(&tera, "public/news_detail.html", &ctx)
        }
        None => HttpResponse::NotFound().body("News item not found"),
    }
}

async fn serve_news_image(slug: web::Path<String>, pool: web::Data<DbPool>) -> impl Responder {
    serve_image(&pool, ContentKind::News, ContentKey::Slug(slug.into_inner()))
}

async fn show_seminar_list(tera: web::Data<Tera>, pool: web::Data<DbPool>) -> impl Responder {
    let mut ctx = Context::new();
    ctx.insert("seminars", &public_helpers::fetch_approved_seminars(&pool));
    render_page(&tera, "public/seminar_list.html", &ctx)
}

async fn show_seminar_detail(
    id: web::Path<i64>,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
) -> impl Responder {
    match public_helpers::fetch_seminar_by_id(&pool, id.into_inner()) {
        Some(item) => {
            let mut ctx = Context::new();
            ctx.insert(
                "abstract_html",
                &sanitization_helpers::render_markdown(&item.abstract_text),
            );
            ctx.insert("item", &item);
            render_page(&tera, "public/seminar_detail.html", &ctx)
        }
        None => HttpResponse::NotFound().body("Seminar not found"),
    }
}

async fn serve_seminar_image(id: web::Path<i64>, pool: web::Data<DbPool>) -> impl Responder {
    serve_image(&pool, ContentKind::Seminar, ContentKey::Id(id.into_inner()))
}

async fn show_workshop_list(tera: web::Data<Tera>, pool: web::Data<DbPool>) -> impl Responder {
    let mut ctx = Context::new();
    ctx.insert("workshops", &public_helpers::fetch_approved_workshops(&pool));
    render_page(&tera, "public/workshop_list.html", &ctx)
}

async fn show_workshop_detail(
    id: web::Path<i64>,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
) -> impl Responder {
    match public_helpers::fetch_workshop_by_id(&pool, id.into_inner()) {
        Some(item) => {
            let mut ctx = Context::new();
            ctx.insert(
                "description_html",
                &sanitization_helpers::render_markdown(&item.description),
            );
            ctx.insert("item", &item);
            render_page(&tera, "public/workshop_detail.html", &ctx)
        }
        None => HttpResponse::NotFound().body("Workshop not found"),
    }
}

async fn serve_workshop_image(id: web::Path<i64>, pool: web::Data<DbPool>) -> impl Responder {
    serve_image(&pool, ContentKind::Workshop, ContentKey::Id(id.into_inner()))
}

async fn show_publication_list(tera: web::Data<Tera>, pool: web::Data<DbPool>) -> impl Responder {
    let mut ctx = Context::new();
    ctx.insert(
        "publications",
        &public_helpers::fetch_approved_publications(&pool),
    );
    render_page(&tera, "public/publication_list.html", &ctx)
}

async fn show_member_list(tera: web::Data<Tera>, pool: web::Data<DbPool>) -> impl Responder {
    let mut ctx = Context::new();
    ctx.insert("members", &public_helpers::fetch_approved_members(&pool));
    render_page(&tera, "public/member_list.html", &ctx)
}

async fn serve_member_image(id: web::Path<i64>, pool: web::Data<DbPool>) -> impl Responder {
    serve_image(&pool, ContentKind::Member, ContentKey::Id(id.into_inner()))
}

async fn show_join_form(tera: web::Data<Tera>) -> impl Responder {
    render_page(&tera, "public/join.html", &Context::new())
}

/// Membership application. A failed validation redisplays the form with
/// every field error and the previously entered values; a successful one
/// lands the applicant in the pending queue.
async fn handle_join(
    payload: Multipart,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
) -> impl Responder {
    let (fields, image) = match form_helpers::collect_multipart(payload).await {
        Ok(parts) => parts,
        Err(e) => {
            let mut ctx = Context::new();
            ctx.insert("form_error", &e.to_string());
            return render_page(&tera, "public/join.html", &ctx);
        }
    };

    match form_helpers::validate_member(&fields, image) {
        Ok(draft) => match public_helpers::submit_member_application(&pool, &draft) {
            Ok(_) => {
                let mut ctx = Context::new();
                ctx.insert("submitted", &true);
                render_page(&tera, "public/join.html", &ctx)
            }
            Err(e) => {
                log::error!("Failed to store membership application: {}", e);
                let mut ctx = Context::new();
                ctx.insert("form_error", "Could not store your application. Please try again.");
                render_page(&tera, "public/join.html", &ctx)
            }
        },
        Err(errors) => {
            let mut ctx = Context::new();
            ctx.insert("errors", &errors);
            ctx.insert("values", &fields);
            render_page(&tera, "public/join.html", &ctx)
        }
    }
}

async fn handle_subscribe(form: web::Bytes, pool: web::Data<DbPool>) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };

    let email = parsed.get("email").map(|s| s.trim()).unwrap_or("");
    if email.is_empty() || !email.contains('@') {
        return HttpResponse::Found()
            .append_header(("location", "/?subscribed=0"))
            .finish();
    }

    let name = parsed.get("name").map(|s| s.trim()).filter(|s| !s.is_empty());
    let affiliation = parsed
        .get("affiliation")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());

    if let Err(e) = public_helpers::subscribe_contact(&pool, email, name, affiliation) {
        log::error!("Failed to store mailing-list signup: {}", e);
    }
    HttpResponse::Found()
        .append_header(("location", "/?subscribed=1"))
        .finish()
}
