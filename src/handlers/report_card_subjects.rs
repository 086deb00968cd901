use actix_web::{web, HttpResponse, Responder};
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::ListResponse;
use crate::models::{
    academic_class_subject, enrollment, report_card, report_card_subject, subject,
};
use crate::services::catalog_sync::backfill_report_card_subjects;
use crate::services::report_totals::refresh_class_subject_stats;
use crate::utils::errors::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListReportCardSubjectsQuery {
    pub report_card_id: Uuid,
}

/// Marks update. A field that is absent stays untouched; an explicit null
/// clears the mark.
#[derive(Debug, Deserialize)]
pub struct UpdateMarksRequest {
    #[serde(default, with = "crate::handlers::double_option")]
    pub mid_term: Option<Option<i32>>,
    #[serde(default, with = "crate::handlers::double_option")]
    pub notebook: Option<Option<i32>>,
    #[serde(default, with = "crate::handlers::double_option")]
    pub assignment: Option<Option<i32>>,
    #[serde(default, with = "crate::handlers::double_option")]
    pub class_test: Option<Option<i32>>,
    #[serde(default, with = "crate::handlers::double_option")]
    pub final_term: Option<Option<i32>>,
    #[serde(default, with = "crate::handlers::double_option")]
    pub final_marks: Option<Option<i32>>,
}

#[derive(Debug, Serialize)]
pub struct ReportCardSubjectDetail {
    #[serde(flatten)]
    pub report_card_subject: report_card_subject::Model,
    pub class_subject: Option<academic_class_subject::Model>,
    pub subject: Option<subject::Model>,
}

fn check_mark(value: Option<Option<i32>>, field: &str) -> Result<(), ApiError> {
    if let Some(Some(mark)) = value {
        if mark < 0 {
            return Err(ApiError::Validation(format!(
                "{} cannot be negative",
                field
            )));
        }
    }
    Ok(())
}

/// Subject rows of one card in catalog order, with missing rows for
/// subjects added to the class after the card was created filled in first,
/// so the card always shows the full catalog.
pub async fn ordered_card_subjects(
    db: &DatabaseConnection,
    card: &report_card::Model,
    academic_class_id: Uuid,
) -> Result<Vec<ReportCardSubjectDetail>, ApiError> {
    backfill_report_card_subjects(db, card.id, academic_class_id, card.academic_term_id).await?;

    let rows = report_card_subject::Entity::find()
        .filter(report_card_subject::Column::ReportCardId.eq(card.id))
        .find_also_related(academic_class_subject::Entity)
        .order_by_asc(academic_class_subject::Column::IsAdditional)
        .order_by_asc(academic_class_subject::Column::Position)
        .order_by_desc(report_card_subject::Column::CreatedAt)
        .all(db)
        .await?;

    let subject_ids: Vec<Uuid> = rows
        .iter()
        .filter_map(|(_, cs)| cs.as_ref().map(|cs| cs.subject_id))
        .collect();
    let subjects: std::collections::HashMap<Uuid, subject::Model> = subject::Entity::find()
        .filter(subject::Column::Id.is_in(subject_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    Ok(rows
        .into_iter()
        .map(|(row, class_subject)| {
            let subject = class_subject
                .as_ref()
                .and_then(|cs| subjects.get(&cs.subject_id).cloned());
            ReportCardSubjectDetail {
                report_card_subject: row,
                class_subject,
                subject,
            }
        })
        .collect())
}

/// GET /report-card-subjects?report_card_id=...
pub async fn list_report_card_subjects(
    db: web::Data<DatabaseConnection>,
    query: web::Query<ListReportCardSubjectsQuery>,
) -> Result<impl Responder, ApiError> {
    let card = report_card::Entity::find_by_id(query.report_card_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Report card"))?;
    let enrollment = enrollment::Entity::find_by_id(card.enrollment_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Enrollment"))?;

    let items = ordered_card_subjects(db.as_ref(), &card, enrollment.academic_class_id).await?;
    let total = items.len() as u64;
    Ok(HttpResponse::Ok().json(ListResponse { total, items }))
}

/// PATCH /report-card-subjects/{id}
///
/// Writes the given marks, then refreshes the class-subject's highest and
/// average figures.
pub async fn update_report_card_subject(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateMarksRequest>,
) -> Result<impl Responder, ApiError> {
    let row = report_card_subject::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Report card subject"))?;

    check_mark(payload.mid_term, "Mid-term marks")?;
    check_mark(payload.notebook, "Notebook marks")?;
    check_mark(payload.assignment, "Assignment marks")?;
    check_mark(payload.class_test, "Class test marks")?;
    check_mark(payload.final_term, "Final term marks")?;
    check_mark(payload.final_marks, "Final marks")?;

    let class_subject_id = row.academic_class_subject_id;
    let mut row: report_card_subject::ActiveModel = row.into();
    if let Some(value) = payload.mid_term {
        row.mid_term = Set(value);
    }
    if let Some(value) = payload.notebook {
        row.notebook = Set(value);
    }
    if let Some(value) = payload.assignment {
        row.assignment = Set(value);
    }
    if let Some(value) = payload.class_test {
        row.class_test = Set(value);
    }
    if let Some(value) = payload.final_term {
        row.final_term = Set(value);
    }
    if let Some(value) = payload.final_marks {
        row.final_marks = Set(value);
    }
    let row = row.update(db.as_ref()).await?;

    refresh_class_subject_stats(db.as_ref(), class_subject_id).await?;
    Ok(HttpResponse::Ok().json(row))
}
