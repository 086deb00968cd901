use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Exam timetable for one class+term.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "date_sheets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub academic_class_id: Uuid,
    pub academic_term_id: Uuid,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::academic_class::Entity",
        from = "Column::AcademicClassId",
        to = "super::academic_class::Column::Id"
    )]
    AcademicClass,
    #[sea_orm(
        belongs_to = "super::academic_term::Entity",
        from = "Column::AcademicTermId",
        to = "super::academic_term::Column::Id"
    )]
    AcademicTerm,
    #[sea_orm(has_many = "super::date_sheet_subject::Entity")]
    DateSheetSubjects,
}

impl Related<super::academic_class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AcademicClass.def()
    }
}

impl Related<super::academic_term::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AcademicTerm.def()
    }
}

impl Related<super::date_sheet_subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DateSheetSubjects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
