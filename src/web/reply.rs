use super::{redirect, redirect_to_login};
use crate::attachment::NewAttachment;
use crate::config::Config;
use crate::form::FormFields;
use crate::middleware::ClientCtx;
use crate::post::get_post;
use crate::reply::{create_reply_with_attachments, NewReply, MAX_REPLY_ATTACHMENTS};
use actix_web::{error, post, web, Error, HttpResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(create_reply);
}

#[post("/api/reply")]
async fn create_reply(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    body: web::Bytes,
) -> Result<HttpResponse, Error> {
    if !client.is_authenticated() {
        return Ok(redirect_to_login());
    }

    let form = FormFields::parse(&body);
    let post_id = match form.get("postId").and_then(|id| id.trim().parse::<i32>().ok()) {
        Some(post_id) => post_id,
        None => {
            log::info!("create_reply: missing or malformed postId");
            return Ok(redirect("/"));
        }
    };
    let error_url = format!("/post/{}?error=1", post_id);

    let validated = NewReply::from_form(&form, &config).and_then(|reply| {
        NewAttachment::from_form(&form, MAX_REPLY_ATTACHMENTS).map(|files| (reply, files))
    });
    let (new_reply, attachments) = match validated {
        Ok(validated) => validated,
        Err(e) => {
            log::info!("create_reply: rejected form: {}", e);
            return Ok(redirect(&error_url));
        }
    };

    match get_post(db.get_ref(), post_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(error::ErrorNotFound("Post not found.")),
        Err(e) => {
            log::error!("create_reply: get_post(): {}", e);
            return Ok(redirect(&error_url));
        }
    }

    match create_reply_with_attachments(db.get_ref(), post_id, &new_reply, &attachments).await {
        Ok(reply) => {
            log::info!("create_reply: reply {} on post {}", reply.id, post_id);
            Ok(redirect(&format!("/post/{}", post_id)))
        }
        Err(e) => {
            log::error!("create_reply: {}", e);
            Ok(redirect(&error_url))
        }
    }
}
