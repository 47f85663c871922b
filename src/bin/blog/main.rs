use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::web::{Data, PayloadConfig};
use actix_web::{App, HttpServer};
use backontheblog::config::Config;
use backontheblog::db::init_db;
use backontheblog::middleware::ClientCtx;
use backontheblog::s3::S3Bucket;
use backontheblog::session::{get_session_key, new_session_middleware};
use backontheblog::storage::BlobStorage;
use env_logger::Env;

/// Form bodies carry whole posts; the actix default of 256 KiB is too small.
const FORM_PAYLOAD_LIMIT: usize = 2 * 1024 * 1024;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_lib_mods();

    let config = Config::from_env().expect("Configuration failed to load.");
    let db = init_db(config.database_url.to_owned())
        .await
        .expect("Database failed to initialize.");
    let bucket = S3Bucket::from_config(&config.s3).expect("S3 failed to initialize.");
    let storage: Arc<dyn BlobStorage> = Arc::new(bucket);
    // Generated once so every worker signs cookies with the same key.
    let secret_key = get_session_key(&config);
    let bind_addr = config.bind_addr.to_owned();

    log::info!("Listening on {}", bind_addr);

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(Data::new(db.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(storage.clone()))
            .app_data(PayloadConfig::new(FORM_PAYLOAD_LIMIT))
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::BAD_REQUEST, backontheblog::web::error::render_400)
                    .handler(StatusCode::NOT_FOUND, backontheblog::web::error::render_404)
                    .handler(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        backontheblog::web::error::render_500,
                    ),
            )
            .wrap(ClientCtx::default())
            .wrap(new_session_middleware(
                secret_key.clone(),
                config.cookie_secure,
            ))
            .wrap(Logger::new("%a %r %s %Dms"))
            .configure(backontheblog::web::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    // A missing .env is fine; the environment may already be set.
    if let Err(e) = dotenv::dotenv() {
        eprintln!("dotenv: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
