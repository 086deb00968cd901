use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "report_card_grade")]
pub enum ReportCardGrade {
    #[sea_orm(string_value = "A")]
    A,
    #[sea_orm(string_value = "B")]
    B,
    #[sea_orm(string_value = "C")]
    C,
    #[sea_orm(string_value = "D")]
    D,
    #[sea_orm(string_value = "E")]
    E,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "report_card_result")]
pub enum ReportCardResult {
    #[sea_orm(string_value = "promoted")]
    #[serde(rename = "promoted")]
    Promoted,
    #[sea_orm(string_value = "passed")]
    #[serde(rename = "passed")]
    Passed,
    #[sea_orm(string_value = "need_improvement")]
    #[serde(rename = "need_improvement")]
    NeedImprovement,
    #[sea_orm(string_value = "result_withheld")]
    #[serde(rename = "result_withheld")]
    ResultWithheld,
}

/// One report card per enrollment+term. Overall percentage and class rank
/// are derived at read time, never stored.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report_cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub academic_term_id: Uuid,
    pub behaviour_grade: Option<ReportCardGrade>,
    pub work_education_grade: Option<ReportCardGrade>,
    pub art_education_grade: Option<ReportCardGrade>,
    pub physical_education_grade: Option<ReportCardGrade>,
    pub attendance_present: Option<i32>,
    pub result: Option<ReportCardResult>,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::enrollment::Entity",
        from = "Column::EnrollmentId",
        to = "super::enrollment::Column::Id"
    )]
    Enrollment,
    #[sea_orm(
        belongs_to = "super::academic_term::Entity",
        from = "Column::AcademicTermId",
        to = "super::academic_term::Column::Id"
    )]
    AcademicTerm,
    #[sea_orm(has_many = "super::report_card_subject::Entity")]
    ReportCardSubjects,
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollment.def()
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

impl ActiveModelBehavior for ActiveModel {}
