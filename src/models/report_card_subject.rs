use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One student's marks for one class-subject on one report card.
/// All mark fields are optional; unfilled components count as zero in the
/// aggregation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report_card_subjects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub report_card_id: Uuid,
    pub academic_class_subject_id: Uuid,
    pub mid_term: Option<i32>,
    pub notebook: Option<i32>,
    pub assignment: Option<i32>,
    pub class_test: Option<i32>,
    pub final_term: Option<i32>,
    pub final_marks: Option<i32>,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::report_card::Entity",
        from = "Column::ReportCardId",
        to = "super::report_card::Column::Id"
    )]
    ReportCard,
    #[sea_orm(
        belongs_to = "super::academic_class_subject::Entity",
        from = "Column::AcademicClassSubjectId",
        to = "super::academic_class_subject::Column::Id"
    )]
    AcademicClassSubject,
}

impl Related<super::report_card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportCard.def()
    }
}

impl Related<super::academic_class_subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AcademicClassSubject.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
