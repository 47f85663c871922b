use super::{redirect, ErrorFlag};
use crate::config::Config;
use crate::middleware::ClientCtx;
use crate::session::{set_authenticated, validate_password};
use actix_session::Session;
use actix_web::{get, post, web, Error, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_login)
        .service(post_login)
        .service(view_logout);
}

#[derive(Deserialize)]
pub struct FormData {
    #[serde(default)]
    password: String,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub client: ClientCtx,
    pub has_error: bool,
}

#[get("/login")]
async fn view_login(client: ClientCtx, query: web::Query<ErrorFlag>) -> HttpResponse {
    if client.is_authenticated() {
        return redirect("/");
    }

    LoginTemplate {
        client,
        has_error: query.is_set(),
    }
    .to_response()
}

#[post("/login")]
async fn post_login(
    cookies: Session,
    config: web::Data<Config>,
    form: web::Form<FormData>,
) -> Result<HttpResponse, Error> {
    if !validate_password(&config, &form.password) {
        log::info!("post_login: rejected password");
        return Ok(redirect("/login?error=1"));
    }

    set_authenticated(&cookies)?;
    Ok(redirect("/"))
}

#[get("/logout")]
async fn view_logout(cookies: Session) -> HttpResponse {
    cookies.purge();
    redirect("/login")
}
