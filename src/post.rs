use crate::attachment::{insert_attachment, AttachmentOwner, NewAttachment};
use crate::config::Config;
use crate::form::{FormError, FormFields};
use crate::orm::posts;
use chrono::prelude::Utc;
use sea_orm::{entity::*, query::*, sea_query::Expr};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, DbErr, TransactionTrait};

/// Attachments accepted with a single post.
pub const MAX_POST_ATTACHMENTS: usize = 5;

/// Longest title the posts table stores.
pub const MAX_TITLE_LEN: usize = 255;

/// Validated contents of the new post form.
#[derive(Clone, Debug, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub content: String,
    pub author: String,
}

impl NewPost {
    pub fn from_form(form: &FormFields, config: &Config) -> Result<Self, FormError> {
        let title = form.require("title")?;
        let content = form.require("content")?;
        let author = form.require("author")?;

        if title.chars().count() > MAX_TITLE_LEN {
            return Err(FormError::TooLong {
                field: "title",
                max: MAX_TITLE_LEN,
            });
        }
        if !config.is_author(&author) {
            return Err(FormError::UnknownAuthor(author));
        }

        Ok(Self {
            title,
            description: form.optional("description"),
            content,
            author,
        })
    }
}

impl posts::Model {
    pub fn get_url(&self) -> String {
        format!("/post/{}", self.id)
    }

    /// e.g. "Mar 4, 2024"
    pub fn get_created_at_short(&self) -> String {
        self.created_at.format("%b %-d, %Y").to_string()
    }

    /// e.g. "March 4, 2024 at 09:15 UTC"
    pub fn get_created_at_long(&self) -> String {
        self.created_at.format("%B %-d, %Y at %H:%M UTC").to_string()
    }
}

/// Returns posts newest first.
/// A non-blank `search` keeps posts whose title or content contains it, ignoring case.
pub async fn get_posts<C: ConnectionTrait>(
    db: &C,
    search: Option<&str>,
) -> Result<Vec<posts::Model>, DbErr> {
    let mut select = posts::Entity::find();

    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        select = select.filter(search_condition(db.get_database_backend(), term));
    }

    select
        .order_by_desc(posts::Column::CreatedAt)
        .order_by_desc(posts::Column::Id)
        .all(db)
        .await
}

/// Title or content contains `term`, ignoring case.
/// SQLite's `LOWER()` folds ASCII only, so the term is folded the same way there.
fn search_condition(backend: DbBackend, term: &str) -> Condition {
    let (title, content, pattern) = match backend {
        DbBackend::Postgres => ("title ILIKE ?", "content ILIKE ?", format!("%{}%", term)),
        _ => (
            "LOWER(title) LIKE ?",
            "LOWER(content) LIKE ?",
            format!("%{}%", term.to_ascii_lowercase()),
        ),
    };

    Condition::any()
        .add(Expr::cust_with_values(title, vec![pattern.to_owned()]))
        .add(Expr::cust_with_values(content, vec![pattern]))
}

pub async fn get_post<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<posts::Model>, DbErr> {
    posts::Entity::find_by_id(id).one(db).await
}

pub async fn insert_post<C: ConnectionTrait>(
    db: &C,
    post: &NewPost,
) -> Result<posts::Model, DbErr> {
    posts::ActiveModel {
        title: Set(post.title.to_owned()),
        description: Set(post.description.to_owned()),
        content: Set(post.content.to_owned()),
        author: Set(post.author.to_owned()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Inserts a post and its attachments in one transaction.
pub async fn create_post_with_attachments(
    db: &DatabaseConnection,
    post: &NewPost,
    attachments: &[NewAttachment],
) -> Result<posts::Model, DbErr> {
    let txn = db.begin().await?;

    let post = insert_post(&txn, post).await?;
    for attachment in attachments {
        insert_attachment(&txn, AttachmentOwner::Post(post.id), attachment).await?;
    }

    txn.commit().await?;
    Ok(post)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            site_password: "hunter2".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_post_is_trimmed() {
        let form = FormFields::parse(
            b"title=+Hello+&description=&content=%0Abody%0A&author=ConfigMage",
        );
        let post = NewPost::from_form(&form, &config()).unwrap();
        assert_eq!(post.title, "Hello");
        assert_eq!(post.description, "");
        assert_eq!(post.content, "body");
        assert_eq!(post.author, "ConfigMage");
    }

    #[test]
    fn empty_title_or_content_is_rejected() {
        let config = config();
        let form = FormFields::parse(b"title=&content=body&author=ConfigMage");
        assert_eq!(
            NewPost::from_form(&form, &config),
            Err(FormError::MissingField("title"))
        );
        let form = FormFields::parse(b"title=Hi&content=+%0A+&author=ConfigMage");
        assert_eq!(
            NewPost::from_form(&form, &config),
            Err(FormError::MissingField("content"))
        );
    }

    #[test]
    fn author_must_be_allowed() {
        let form = FormFields::parse(b"title=Hi&content=body&author=Mallory");
        assert_eq!(
            NewPost::from_form(&form, &config()),
            Err(FormError::UnknownAuthor("Mallory".to_owned()))
        );
    }

    #[test]
    fn long_titles_are_rejected() {
        let body = format!("title={}&content=body&author=ConfigMage", "a".repeat(256));
        let form = FormFields::parse(body.as_bytes());
        assert!(matches!(
            NewPost::from_form(&form, &config()),
            Err(FormError::TooLong { field: "title", .. })
        ));
    }

    #[test]
    fn search_folds_case_per_backend() {
        let sql = posts::Entity::find()
            .filter(search_condition(DbBackend::Postgres, "ÄRGER"))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains("ILIKE"));
        assert!(sql.contains("%ÄRGER%"));

        let sql = posts::Entity::find()
            .filter(search_condition(DbBackend::Sqlite, "ÄRGER"))
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(sql.contains("LOWER(title) LIKE"));
        assert!(sql.contains("%Ärger%"));
    }
}
