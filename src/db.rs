use crate::orm::{attachments, posts, replies};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
    Statement,
};
use std::time::Duration;

const INDEXES: [&str; 4] = [
    "CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts (created_at)",
    "CREATE INDEX IF NOT EXISTS idx_replies_post_id ON replies (post_id)",
    "CREATE INDEX IF NOT EXISTS idx_attachments_post_id ON attachments (post_id)",
    "CREATE INDEX IF NOT EXISTS idx_attachments_reply_id ON attachments (reply_id)",
];

/// Opens the database URL and prepares the schema.
/// The returned connection is shared by every worker for the life of the process.
pub async fn init_db(database_url: String) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    create_schema(&db).await?;

    Ok(db)
}

/// Creates tables and indexes that do not exist yet.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    // Parents first, foreign keys must resolve.
    create_table(db, &schema, posts::Entity).await?;
    create_table(db, &schema, replies::Entity).await?;
    create_table(db, &schema, attachments::Entity).await?;

    for sql in INDEXES {
        db.execute(Statement::from_string(backend, sql.to_owned()))
            .await?;
    }

    log::info!("Database schema ready.");
    Ok(())
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(db.get_database_backend().build(&stmt)).await?;
    Ok(())
}
