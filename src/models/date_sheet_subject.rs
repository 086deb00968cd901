use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "date_sheet_subjects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub date_sheet_id: Uuid,
    pub academic_class_subject_id: Uuid,
    pub paper_code: Option<String>,
    pub exam_date: Option<Date>,
    pub start_time: Option<Time>,
    pub end_time: Option<Time>,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::date_sheet::Entity",
        from = "Column::DateSheetId",
        to = "super::date_sheet::Column::Id"
    )]
    DateSheet,
    #[sea_orm(
        belongs_to = "super::academic_class_subject::Entity",
        from = "Column::AcademicClassSubjectId",
        to = "super::academic_class_subject::Column::Id"
    )]
    AcademicClassSubject,
}

impl Related<super::date_sheet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DateSheet.def()
    }
}

impl Related<super::academic_class_subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AcademicClassSubject.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
