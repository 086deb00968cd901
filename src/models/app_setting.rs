use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::uuid;

/// Singleton row; created on first read with this fixed id.
pub const SINGLETON_APP_SETTING_ID: Uuid = uuid!("00000000-0000-0000-0000-000000000001");

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "app_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub result_publication_active: bool,
    pub admit_card_active: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
