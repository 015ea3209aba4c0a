use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

/// 存活记录上 original_url 唯一的部分索引名
///
/// 存储层通过唯一约束冲突信息里是否带 `original_url` 来区分去重命中与 short_id 碰撞。
pub const LIVE_ORIGINAL_INDEX: &str = "idx_short_urls_original_url_live";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 short_urls 表
        manager
            .create_table(
                Table::create()
                    .table(ShortUrl::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShortUrl::ShortId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ShortUrl::OriginalUrl).text().not_null())
                    .col(ColumnDef::new(ShortUrl::OwnerId).string().not_null())
                    .col(
                        ColumnDef::new(ShortUrl::Deleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        // 按用户列出链接
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_short_urls_owner_id")
                    .table(ShortUrl::Table)
                    .col(ShortUrl::OwnerId)
                    .to_owned(),
            )
            .await?;

        // original_url 只在未删除的记录中唯一，已删除的 URL 可以重新缩短
        match manager.get_database_backend() {
            DatabaseBackend::Postgres | DatabaseBackend::Sqlite => {
                manager
                    .get_connection()
                    .execute_unprepared(&format!(
                        "CREATE UNIQUE INDEX IF NOT EXISTS {} ON short_urls (original_url) WHERE deleted = false",
                        LIVE_ORIGINAL_INDEX
                    ))
                    .await?;
            }
            other => {
                return Err(DbErr::Migration(format!(
                    "unsupported database backend for short_urls: {:?}",
                    other
                )));
            }
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(&format!("DROP INDEX IF EXISTS {}", LIVE_ORIGINAL_INDEX))
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .name("idx_short_urls_owner_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ShortUrl::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ShortUrl {
    #[sea_orm(iden = "short_urls")]
    Table,
    ShortId,
    OriginalUrl,
    OwnerId,
    Deleted,
}
