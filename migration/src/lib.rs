pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20251001_000001_short_urls;

pub use m20251001_000001_short_urls::LIVE_ORIGINAL_INDEX;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20251001_000001_short_urls::Migration)]
    }
}
