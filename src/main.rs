use actix_csrf::CsrfMiddleware;
use actix_session::{storage::CookieSessionStore, SessionExt, SessionMiddleware};
use actix_web::{
    cookie::Key,
    middleware::{DefaultHeaders, Logger},
    web, App, HttpServer,
};
use clap::Parser;
use glimprint_backend::{config::Config, middleware::admin_guard, routes};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rand::prelude::StdRng;
use std::convert::TryFrom;
use std::fs;
use std::path::PathBuf;
use tera::Tera;

#[derive(Parser, Debug)]
#[command(name = "glimprint_server", author, version, about = "Starts the Glimprint web server.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    let tera = Tera::new("templates/**/*.html").expect("Tera initialization failed");

    fs::create_dir_all(&config.database_path)
        .expect("Failed to create database directory");

    let manager = SqliteConnectionManager::file(config.db_path());
    let pool = Pool::builder()
        .build(manager)
        .expect("FATAL: Failed to create Rusqlite connection pool. Run 'cargo run --bin setup_cli -- --env-file <path> db setup' first.");

    let session_key_bytes = hex::decode(&config.session_secret_key)
        .expect("FATAL: SESSION_SECRET_KEY in .env is not a valid hex string.");
    let session_key = Key::try_from(session_key_bytes.as_slice())
        .expect("FATAL: The decoded SESSION_SECRET_KEY is not long enough (minimum 64 bytes required).");

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    println!("Server starting at http://{}", server_address);

    HttpServer::new(move || {
        let session_mw =
            SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
                .cookie_secure(config.use_secure_cookies)
                .cookie_http_only(true)
                .cookie_same_site(actix_web::cookie::SameSite::Lax)
                .build();

        let admin_url_prefix = config.admin_url_prefix.clone();

        App::new()
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(tera.clone()))
            .app_data(web::Data::new(pool.clone()))
            .service(actix_files::Files::new("/static", "./static"))
            // Admin pages sit under /management behind the session; the
            // public site needs no session at all.
            .service(
                web::scope("/management")
                    .wrap(session_mw)
                    .service(
                        web::scope(&admin_url_prefix)
                            .wrap(
                                CsrfMiddleware::<StdRng>::new()
                                    .set_cookie(
                                        actix_web::http::Method::GET,
                                        format!("/management/{}/login", admin_url_prefix),
                                    )
                                    .set_cookie(
                                        actix_web::http::Method::GET,
                                        format!("/management/{}/dashboard", admin_url_prefix),
                                    )
                                    .set_cookie(
                                        actix_web::http::Method::GET,
                                        format!("/management/{}/create/{{kind}}", admin_url_prefix),
                                    )
                                    .set_cookie(
                                        actix_web::http::Method::GET,
                                        format!(
                                            "/management/{}/edit/{{kind}}/{{key}}",
                                            admin_url_prefix
                                        ),
                                    ),
                            )
                            .configure(routes::admin::config_login)
                            .service(
                                web::scope("")
                                    .guard(actix_web::guard::fn_guard(|ctx| {
                                        admin_guard(&ctx.get_session())
                                    }))
                                    .configure(routes::admin::config_dashboard),
                            ),
                    ),
            )
            .configure(routes::public::config_public)
    })
    .bind(server_address)?
    .run()
    .await
}
