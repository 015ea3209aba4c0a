use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "short_urls")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub short_id: String,
    #[sea_orm(column_type = "Text")]
    pub original_url: String,
    pub owner_id: String,
    pub deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
