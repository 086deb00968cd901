use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A subject as taught in one class for one term.
///
/// `position` orders the subject within its (class, term, is_additional)
/// group and is unique there. `highest_marks`/`average_marks` are maintained
/// by the aggregation service as marks come in, never written by clients.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "academic_class_subjects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub academic_class_id: Uuid,
    pub subject_id: Uuid,
    pub academic_term_id: Uuid,
    pub is_additional: bool,
    pub position: i32,
    pub highest_marks: Option<i32>,
    pub average_marks: Option<i32>,
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
        belongs_to = "super::subject::Entity",
        from = "Column::SubjectId",
        to = "super::subject::Column::Id"
    )]
    Subject,
    #[sea_orm(
        belongs_to = "super::academic_term::Entity",
        from = "Column::AcademicTermId",
        to = "super::academic_term::Column::Id"
    )]
    AcademicTerm,
    #[sea_orm(has_many = "super::report_card_subject::Entity")]
    ReportCardSubjects,
    #[sea_orm(has_many = "super::date_sheet_subject::Entity")]
    DateSheetSubjects,
}

impl Related<super::academic_class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AcademicClass.def()
    }
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subject.def()
    }
}

impl Related<super::academic_term::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AcademicTerm.def()
    }
}

impl Related<super::report_card_subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportCardSubjects.def()
    }
}

impl Related<super::date_sheet_subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DateSheetSubjects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
