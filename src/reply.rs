use crate::attachment::{insert_attachment, AttachmentOwner, NewAttachment};
use crate::config::Config;
use crate::form::{FormError, FormFields};
use crate::orm::replies;
use chrono::prelude::Utc;
use sea_orm::{entity::*, query::*};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};

/// Attachments accepted with a single reply.
pub const MAX_REPLY_ATTACHMENTS: usize = 3;

/// Validated contents of the reply form.
#[derive(Clone, Debug, PartialEq)]
pub struct NewReply {
    pub content: String,
    pub author: String,
}

impl NewReply {
    pub fn from_form(form: &FormFields, config: &Config) -> Result<Self, FormError> {
        let content = form.require("content")?;
        let author = form.require("author")?;

        if !config.is_author(&author) {
            return Err(FormError::UnknownAuthor(author));
        }

        Ok(Self { content, author })
    }
}

impl replies::Model {
    /// e.g. "Mar 4, 2024 09:15"
    pub fn get_created_at_string(&self) -> String {
        self.created_at.format("%b %-d, %Y %H:%M").to_string()
    }
}

/// Returns the replies to a post, oldest first.
pub async fn get_replies<C: ConnectionTrait>(
    db: &C,
    post_id: i32,
) -> Result<Vec<replies::Model>, DbErr> {
    replies::Entity::find()
        .filter(replies::Column::PostId.eq(post_id))
        .order_by_asc(replies::Column::CreatedAt)
        .order_by_asc(replies::Column::Id)
        .all(db)
        .await
}

pub async fn insert_reply<C: ConnectionTrait>(
    db: &C,
    post_id: i32,
    reply: &NewReply,
) -> Result<replies::Model, DbErr> {
    replies::ActiveModel {
        post_id: Set(post_id),
        content: Set(reply.content.to_owned()),
        author: Set(reply.author.to_owned()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Inserts a reply and its attachments in one transaction.
pub async fn create_reply_with_attachments(
    db: &DatabaseConnection,
    post_id: i32,
    reply: &NewReply,
    attachments: &[NewAttachment],
) -> Result<replies::Model, DbErr> {
    let txn = db.begin().await?;

    let reply = insert_reply(&txn, post_id, reply).await?;
    for attachment in attachments {
        insert_attachment(&txn, AttachmentOwner::Reply(reply.id), attachment).await?;
    }

    txn.commit().await?;
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_requires_content_and_author() {
        let config = Config::default();

        let form = FormFields::parse(b"postId=1&content=+&author=ConfigMage");
        assert_eq!(
            NewReply::from_form(&form, &config),
            Err(FormError::MissingField("content"))
        );

        let form = FormFields::parse(b"postId=1&content=hi");
        assert_eq!(
            NewReply::from_form(&form, &config),
            Err(FormError::MissingField("author"))
        );

        let form = FormFields::parse(b"postId=1&content=+hi+&author=DarkForestMushroom");
        assert_eq!(
            NewReply::from_form(&form, &config),
            Ok(NewReply {
                content: "hi".to_owned(),
                author: "DarkForestMushroom".to_owned(),
            })
        );
    }
}
