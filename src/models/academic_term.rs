use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The three grading periods of a session, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "academic_term_type")]
pub enum AcademicTermType {
    #[sea_orm(string_value = "quarterly")]
    #[serde(rename = "quarterly")]
    Quarterly,
    #[sea_orm(string_value = "half-yearly")]
    #[serde(rename = "half-yearly")]
    HalfYearly,
    #[sea_orm(string_value = "annual")]
    #[serde(rename = "annual")]
    Annual,
}

impl AcademicTermType {
    pub fn as_str(self) -> &'static str {
        match self {
            AcademicTermType::Quarterly => "quarterly",
            AcademicTermType::HalfYearly => "half-yearly",
            AcademicTermType::Annual => "annual",
        }
    }

    /// Sort key used wherever terms are listed chronologically.
    pub fn rank(self) -> i32 {
        match self {
            AcademicTermType::Quarterly => 0,
            AcademicTermType::HalfYearly => 1,
            AcademicTermType::Annual => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "academic_terms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub academic_session_id: Uuid,
    pub term_type: AcademicTermType,
    pub working_days: Option<i32>,
    pub exam_result_date: Option<Date>,
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
    #[sea_orm(has_many = "super::report_card::Entity")]
    ReportCards,
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

impl Related<super::report_card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportCards.def()
    }
}

impl Related<super::date_sheet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DateSheets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
