use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Binds a student to a class for one session; unique per student+session.
/// `image` holds an externally stored photo URL.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub student_id: Uuid,
    pub academic_session_id: Uuid,
    pub academic_class_id: Uuid,
    pub image: Option<String>,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::academic_session::Entity",
        from = "Column::AcademicSessionId",
        to = "super::academic_session::Column::Id"
    )]
    AcademicSession,
    #[sea_orm(
        belongs_to = "super::academic_class::Entity",
        from = "Column::AcademicClassId",
        to = "super::academic_class::Column::Id"
    )]
    AcademicClass,
    #[sea_orm(has_many = "super::report_card::Entity")]
    ReportCards,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::academic_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AcademicSession.def()
    }
}

impl Related<super::academic_class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AcademicClass.def()
    }
}

impl Related<super::report_card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportCards.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
