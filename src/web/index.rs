use super::redirect_to_login;
use crate::middleware::ClientCtx;
use crate::orm::posts;
use crate::post::get_posts;
use actix_web::{error, get, web, Error, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_index);
}

#[derive(Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub client: ClientCtx,
    pub posts: Vec<posts::Model>,
    /// Trimmed search term; empty when not searching.
    pub search: String,
}

#[get("/")]
async fn view_index(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, Error> {
    if !client.is_authenticated() {
        return Ok(redirect_to_login());
    }

    let search = query.q.as_deref().unwrap_or_default().trim().to_owned();
    let posts = get_posts(db.get_ref(), Some(&search))
        .await
        .map_err(|e| {
            log::error!("view_index: get_posts(): {}", e);
            error::ErrorInternalServerError("Could not load posts.")
        })?;

    Ok(IndexTemplate {
        client,
        posts,
        search,
    }
    .to_response())
}
