pub mod asset;
pub mod error;
pub mod index;
pub mod login;
pub mod post;
pub mod reply;
pub mod upload;

use actix_web::http::header;
use actix_web::HttpResponse;
use serde::Deserialize;

/// Configures the web app
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Descending order. Higher traffic routes first.
    index::configure(conf);
    post::configure(conf);
    reply::configure(conf);
    upload::configure(conf);
    login::configure(conf);
    asset::configure(conf);
}

/// `?error=1` flag set by redirects after a rejected form.
#[derive(Deserialize)]
pub struct ErrorFlag {
    error: Option<String>,
}

impl ErrorFlag {
    pub fn is_set(&self) -> bool {
        self.error.as_deref().map_or(false, |e| !e.is_empty())
    }
}

/// 302 to another page of the site.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, location))
        .finish()
}

/// Every page except the login form sends guests here.
pub fn redirect_to_login() -> HttpResponse {
    redirect("/login")
}
