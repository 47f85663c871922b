use crate::form::{FormError, FormFields};
use crate::orm::attachments;
use askama_actix::Template;
use chrono::Utc;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};
use std::collections::HashMap;

/// The single row an attachment hangs off.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttachmentOwner {
    Post(i32),
    Reply(i32),
}

/// Metadata of a file already in object storage, as submitted with a form.
#[derive(Clone, Debug, PartialEq)]
pub struct NewAttachment {
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
    pub file_size: i64,
}

impl NewAttachment {
    /// Zips the parallel `attachment_*` form lists by index.
    /// Incomplete or malformed entries are dropped.
    pub fn from_form(form: &FormFields, limit: usize) -> Result<Vec<Self>, FormError> {
        let urls = form.get_all("attachment_urls");
        let names = form.get_all("attachment_names");
        let types = form.get_all("attachment_types");
        let sizes = form.get_all("attachment_sizes");

        if urls.len() > limit {
            return Err(FormError::TooManyAttachments {
                limit,
                count: urls.len(),
            });
        }

        let mut result = Vec::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            let url = url.trim();
            let name = names.get(i).map(|n| n.trim()).unwrap_or_default();
            let size = sizes.get(i).and_then(|s| s.trim().parse::<i64>().ok());

            match (types.get(i), size) {
                (Some(file_type), Some(size))
                    if is_public_url(url) && !name.is_empty() && size >= 0 =>
                {
                    let file_type = file_type.trim();
                    result.push(Self {
                        file_name: name.to_owned(),
                        file_url: url.to_owned(),
                        file_type: if file_type.is_empty() {
                            mime::APPLICATION_OCTET_STREAM.to_string()
                        } else {
                            file_type.to_owned()
                        },
                        file_size: size,
                    });
                }
                _ => log::warn!("NewAttachment::from_form: dropping malformed entry {}", i),
            }
        }

        Ok(result)
    }
}

fn is_public_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

pub async fn insert_attachment<C: ConnectionTrait>(
    db: &C,
    owner: AttachmentOwner,
    attachment: &NewAttachment,
) -> Result<attachments::Model, DbErr> {
    let (post_id, reply_id) = match owner {
        AttachmentOwner::Post(id) => (Some(id), None),
        AttachmentOwner::Reply(id) => (None, Some(id)),
    };

    attachments::ActiveModel {
        post_id: Set(post_id),
        reply_id: Set(reply_id),
        file_name: Set(attachment.file_name.to_owned()),
        file_url: Set(attachment.file_url.to_owned()),
        file_type: Set(attachment.file_type.to_owned()),
        file_size: Set(attachment.file_size),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Returns attachments in an associative hashmap of `post_id: [attachment,]`.
pub async fn get_attachments_by_post_ids<C: ConnectionTrait>(
    db: &C,
    ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<attachments::Model>>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let attachments = attachments::Entity::find()
        .filter(attachments::Column::PostId.is_in(ids))
        .order_by_asc(attachments::Column::CreatedAt)
        .order_by_asc(attachments::Column::Id)
        .all(db)
        .await?;

    Ok(group_by_owner(attachments, |a| a.post_id))
}

/// Returns attachments in an associative hashmap of `reply_id: [attachment,]`.
pub async fn get_attachments_by_reply_ids<C: ConnectionTrait>(
    db: &C,
    ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<attachments::Model>>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let attachments = attachments::Entity::find()
        .filter(attachments::Column::ReplyId.is_in(ids))
        .order_by_asc(attachments::Column::CreatedAt)
        .order_by_asc(attachments::Column::Id)
        .all(db)
        .await?;

    Ok(group_by_owner(attachments, |a| a.reply_id))
}

fn group_by_owner(
    attachments: Vec<attachments::Model>,
    owner: impl Fn(&attachments::Model) -> Option<i32>,
) -> HashMap<i32, Vec<attachments::Model>> {
    let mut result: HashMap<i32, Vec<attachments::Model>> = HashMap::new();

    for attachment in attachments {
        if let Some(id) = owner(&attachment) {
            result.entry(id).or_default().push(attachment);
        }
    }

    result
}

impl attachments::Model {
    pub fn is_image(&self) -> bool {
        self.file_type.starts_with("image/")
    }

    pub fn get_file_size_string(&self) -> String {
        format_file_size(self.file_size)
    }
}

pub fn format_file_size(bytes: i64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[derive(Template)]
#[template(path = "util/attachments.html")]
struct AttachmentListTemplate<'a> {
    images: Vec<&'a attachments::Model>,
    files: Vec<&'a attachments::Model>,
}

/// Images render as linked thumbnails, everything else as a download row.
pub fn attachments_html(attachments: &[attachments::Model]) -> String {
    if attachments.is_empty() {
        return String::new();
    }

    let (images, files): (Vec<_>, Vec<_>) = attachments.iter().partition(|a| a.is_image());
    let mut buffer = String::new();
    match (AttachmentListTemplate { images, files }).render_into(&mut buffer) {
        Ok(()) => buffer,
        Err(e) => {
            log::error!("attachments_html: {}", e);
            "[Attachment Error]".to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn model(id: i32, name: &str, file_type: &str, size: i64) -> attachments::Model {
        attachments::Model {
            id,
            post_id: Some(1),
            reply_id: None,
            file_name: name.to_owned(),
            file_url: format!("https://files.example.com/{}", name),
            file_type: file_type.to_owned(),
            file_size: size,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap(),
        }
    }

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(4 * 1024 * 1024), "4.0 MB");
    }

    #[test]
    fn attachment_fields_are_zipped() {
        let form = FormFields::parse(
            b"attachment_urls=https%3A%2F%2Fcdn.example.com%2Fa.png&attachment_names=a.png\
&attachment_types=image%2Fpng&attachment_sizes=42\
&attachment_urls=https%3A%2F%2Fcdn.example.com%2Fb.rs&attachment_names=b.rs\
&attachment_types=&attachment_sizes=7",
        );
        let parsed = NewAttachment::from_form(&form, 5).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].file_name, "a.png");
        assert_eq!(parsed[0].file_type, "image/png");
        assert_eq!(parsed[0].file_size, 42);
        assert_eq!(parsed[1].file_url, "https://cdn.example.com/b.rs");
        assert_eq!(parsed[1].file_type, "application/octet-stream");
    }

    #[test]
    fn malformed_entries_are_dropped() {
        let form = FormFields::parse(
            b"attachment_urls=javascript%3Aalert(1)&attachment_names=x&attachment_types=text%2Fplain&attachment_sizes=1\
&attachment_urls=https%3A%2F%2Fcdn.example.com%2Fy&attachment_names=y&attachment_types=text%2Fplain&attachment_sizes=NaN\
&attachment_urls=https%3A%2F%2Fcdn.example.com%2Fz",
        );
        assert!(NewAttachment::from_form(&form, 5).unwrap().is_empty());
    }

    #[test]
    fn attachment_limit() {
        let form = FormFields::parse(b"attachment_urls=a&attachment_urls=b&attachment_urls=c");
        assert_eq!(
            NewAttachment::from_form(&form, 2),
            Err(FormError::TooManyAttachments { limit: 2, count: 3 })
        );
    }

    #[test]
    fn no_attachments_render_nothing() {
        assert_eq!(attachments_html(&[]), "");
    }

    #[test]
    fn images_and_files_render_differently() {
        let html = attachments_html(&[
            model(1, "shot.png", "image/png", 2048),
            model(2, "notes.txt", "text/plain", 12),
        ]);
        assert!(html.contains("<img"));
        assert!(html.contains("shot.png"));
        assert!(html.contains("notes.txt"));
        assert!(html.contains("(12 B)"));
    }

    #[test]
    fn grouping_by_owner() {
        let mut a = model(1, "a", "text/plain", 1);
        a.post_id = None;
        a.reply_id = Some(7);
        let mut b = model(2, "b", "text/plain", 1);
        b.post_id = None;
        b.reply_id = Some(7);
        let c = model(3, "c", "text/plain", 1);

        let grouped = group_by_owner(vec![a, b, c], |m| m.reply_id);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[&7].len(), 2);
    }
}
