use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "academic_classes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub academic_session_id: Uuid,
    pub grade: String,
    pub section: String,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::academic_session::Entity",
        from = "Column::AcademicSessionId",
        to = "super::academic_session::Column::Id"
    )]
    AcademicSession,
    #[sea_orm(has_many = "super::academic_class_subject::Entity")]
    ClassSubjects,
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollments,
    #[sea_orm(has_many = "super::date_sheet::Entity")]
    DateSheets,
}

impl Related<super::academic_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AcademicSession.def()
    }
}

impl Related<super::academic_class_subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassSubjects.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::date_sheet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DateSheets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
