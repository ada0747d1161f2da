use sqlx::PgPool;

/// Execute the engine schema DDL (idempotent CREATE TABLE / CREATE INDEX
/// statements from `sql/schema.sql`).
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(include_str!("../../sql/schema.sql"))
        .execute(pool)
        .await?;
    Ok(())
}
