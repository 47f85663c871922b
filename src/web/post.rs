use super::{redirect, redirect_to_login, ErrorFlag};
use crate::attachment::{
    attachments_html, get_attachments_by_post_ids, get_attachments_by_reply_ids, NewAttachment,
};
use crate::config::Config;
use crate::form::FormFields;
use crate::markdown::render_markdown;
use crate::middleware::ClientCtx;
use crate::orm::{posts, replies};
use crate::post::{create_post_with_attachments, get_post, NewPost, MAX_POST_ATTACHMENTS};
use crate::reply::{get_replies, MAX_REPLY_ATTACHMENTS};
use actix_web::{error, get, post, web, Error, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{DatabaseConnection, DbErr};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_new_post)
        .service(view_post)
        .service(create_post);
}

#[derive(Template)]
#[template(path = "new_post.html")]
pub struct NewPostTemplate {
    pub client: ClientCtx,
    pub authors: Vec<String>,
    pub has_error: bool,
    pub max_attachments: usize,
}

/// A reply with its body and attachments already rendered.
pub struct ReplyForTemplate {
    pub reply: replies::Model,
    pub content: String,
    pub attachments: String,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub client: ClientCtx,
    pub post: posts::Model,
    pub content: String,
    pub attachments: String,
    pub replies: Vec<ReplyForTemplate>,
    pub authors: Vec<String>,
    pub has_error: bool,
    pub max_attachments: usize,
}

fn db_error(e: DbErr) -> Error {
    log::error!("view_post: {}", e);
    error::ErrorInternalServerError("Could not load post.")
}

#[get("/new")]
async fn view_new_post(
    client: ClientCtx,
    config: web::Data<Config>,
    query: web::Query<ErrorFlag>,
) -> HttpResponse {
    if !client.is_authenticated() {
        return redirect_to_login();
    }

    NewPostTemplate {
        client,
        authors: config.authors.to_owned(),
        has_error: query.is_set(),
        max_attachments: MAX_POST_ATTACHMENTS,
    }
    .to_response()
}

#[get("/post/{post_id}")]
async fn view_post(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    path: web::Path<String>,
    query: web::Query<ErrorFlag>,
) -> Result<HttpResponse, Error> {
    if !client.is_authenticated() {
        return Ok(redirect_to_login());
    }

    let post_id: i32 = path
        .parse()
        .map_err(|_| error::ErrorNotFound("Post not found."))?;
    let post = get_post(db.get_ref(), post_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Post not found."))?;

    let replies = get_replies(db.get_ref(), post.id).await.map_err(db_error)?;
    let mut post_attachments = get_attachments_by_post_ids(db.get_ref(), vec![post.id])
        .await
        .map_err(db_error)?;
    let mut reply_attachments =
        get_attachments_by_reply_ids(db.get_ref(), replies.iter().map(|r| r.id).collect())
            .await
            .map_err(db_error)?;

    let replies = replies
        .into_iter()
        .map(|reply| ReplyForTemplate {
            content: render_markdown(&reply.content),
            attachments: attachments_html(
                &reply_attachments.remove(&reply.id).unwrap_or_default(),
            ),
            reply,
        })
        .collect();

    Ok(PostTemplate {
        client,
        content: render_markdown(&post.content),
        attachments: attachments_html(&post_attachments.remove(&post.id).unwrap_or_default()),
        post,
        replies,
        authors: config.authors.to_owned(),
        has_error: query.is_set(),
        max_attachments: MAX_REPLY_ATTACHMENTS,
    }
    .to_response())
}

#[post("/api/post")]
async fn create_post(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    body: web::Bytes,
) -> HttpResponse {
    if !client.is_authenticated() {
        return redirect_to_login();
    }

    let form = FormFields::parse(&body);
    let validated = NewPost::from_form(&form, &config).and_then(|post| {
        NewAttachment::from_form(&form, MAX_POST_ATTACHMENTS).map(|files| (post, files))
    });
    let (new_post, attachments) = match validated {
        Ok(validated) => validated,
        Err(e) => {
            log::info!("create_post: rejected form: {}", e);
            return redirect("/new?error=1");
        }
    };

    match create_post_with_attachments(db.get_ref(), &new_post, &attachments).await {
        Ok(post) => {
            log::info!("create_post: post {} by {}", post.id, post.author);
            redirect(&post.get_url())
        }
        Err(e) => {
            log::error!("create_post: {}", e);
            redirect("/new?error=1")
        }
    }
}
