use actix_web::{web, HttpResponse, Responder};
use sea_orm::sea_query::NullOrdering;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::ListResponse;
use crate::models::{academic_class_subject, date_sheet, date_sheet_subject, subject};
use crate::services::catalog_sync::backfill_date_sheet_subjects;
use crate::utils::errors::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListDateSheetSubjectsQuery {
    pub date_sheet_id: Uuid,
}

/// Schedule update; explicit nulls clear a field back to unscheduled.
#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    #[serde(default, with = "crate::handlers::double_option")]
    pub paper_code: Option<Option<String>>,
    #[serde(default, with = "crate::handlers::double_option")]
    pub exam_date: Option<Option<chrono::NaiveDate>>,
    #[serde(default, with = "crate::handlers::double_option")]
    pub start_time: Option<Option<chrono::NaiveTime>>,
    #[serde(default, with = "crate::handlers::double_option")]
    pub end_time: Option<Option<chrono::NaiveTime>>,
}

#[derive(Debug, Serialize)]
pub struct DateSheetSubjectDetail {
    #[serde(flatten)]
    pub date_sheet_subject: date_sheet_subject::Model,
    pub class_subject: Option<academic_class_subject::Model>,
    pub subject: Option<subject::Model>,
}

/// Subject rows of one sheet, scheduled papers first in chronological order
/// with unscheduled rows at the end in catalog order. Backfills rows for
/// subjects added since the sheet was created.
pub async fn ordered_sheet_subjects(
    db: &DatabaseConnection,
    sheet: &date_sheet::Model,
) -> Result<Vec<DateSheetSubjectDetail>, ApiError> {
    backfill_date_sheet_subjects(db, sheet.id, sheet.academic_class_id, sheet.academic_term_id)
        .await?;

    let rows = date_sheet_subject::Entity::find()
        .filter(date_sheet_subject::Column::DateSheetId.eq(sheet.id))
        .find_also_related(academic_class_subject::Entity)
        .order_by_with_nulls(
            date_sheet_subject::Column::ExamDate,
            Order::Asc,
            NullOrdering::Last,
        )
        .order_by_with_nulls(
            date_sheet_subject::Column::StartTime,
            Order::Asc,
            NullOrdering::Last,
        )
        .order_by_with_nulls(
            date_sheet_subject::Column::EndTime,
            Order::Asc,
            NullOrdering::Last,
        )
        .order_by_asc(academic_class_subject::Column::IsAdditional)
        .order_by_asc(academic_class_subject::Column::Position)
        .order_by_desc(date_sheet_subject::Column::CreatedAt)
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
            DateSheetSubjectDetail {
                date_sheet_subject: row,
                class_subject,
                subject,
            }
        })
        .collect())
}

/// GET /date-sheet-subjects?date_sheet_id=...
pub async fn list_date_sheet_subjects(
    db: web::Data<DatabaseConnection>,
    query: web::Query<ListDateSheetSubjectsQuery>,
) -> Result<impl Responder, ApiError> {
    let sheet = date_sheet::Entity::find_by_id(query.date_sheet_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Date sheet"))?;
    let items = ordered_sheet_subjects(db.as_ref(), &sheet).await?;
    let total = items.len() as u64;
    Ok(HttpResponse::Ok().json(ListResponse { total, items }))
}

/// PATCH /date-sheet-subjects/{id}
pub async fn update_date_sheet_subject(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateScheduleRequest>,
) -> Result<impl Responder, ApiError> {
    let row = date_sheet_subject::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Date sheet subject"))?;

    // Validate against the effective values after the patch is applied.
    let start = payload.start_time.unwrap_or(row.start_time);
    let end = payload.end_time.unwrap_or(row.end_time);
    if let (Some(start), Some(end)) = (start, end) {
        if end <= start {
            return Err(ApiError::Validation(
                "End time must be after start time".into(),
            ));
        }
    }

    let mut row: date_sheet_subject::ActiveModel = row.into();
    if let Some(value) = payload.paper_code.clone() {
        row.paper_code = Set(value);
    }
    if let Some(value) = payload.exam_date {
        row.exam_date = Set(value);
    }
    if let Some(value) = payload.start_time {
        row.start_time = Set(value);
    }
    if let Some(value) = payload.end_time {
        row.end_time = Set(value);
    }
    let row = row.update(db.as_ref()).await?;
    Ok(HttpResponse::Ok().json(row))
}
