pub mod attachments;
pub mod posts;
pub mod replies;
