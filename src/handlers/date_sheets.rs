use actix_web::{web, HttpResponse, Responder};
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::date_sheet_subjects::{ordered_sheet_subjects, DateSheetSubjectDetail};
use crate::handlers::{ListResponse, MessageResponse, Pagination};
use crate::models::{academic_class, academic_term, date_sheet, date_sheet_subject};
use crate::services::catalog_sync::backfill_date_sheet_subjects;
use crate::utils::errors::{conflict_on_unique, ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateDateSheetRequest {
    pub academic_class_id: Uuid,
    pub academic_term_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct FindDateSheetQuery {
    pub academic_class_id: Uuid,
    pub academic_term_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ListDateSheetsQuery {
    pub academic_class_id: Option<Uuid>,
    pub academic_term_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DateSheetWithSubjects {
    #[serde(flatten)]
    pub date_sheet: date_sheet::Model,
    pub subjects: Vec<DateSheetSubjectDetail>,
}

/// POST /date-sheets
///
/// A new sheet starts with one unscheduled row per class-subject of the
/// class+term, created in the same transaction.
pub async fn create_date_sheet(
    db: web::Data<DatabaseConnection>,
    payload: web::Json<CreateDateSheetRequest>,
) -> Result<impl Responder, ApiError> {
    let class = academic_class::Entity::find_by_id(payload.academic_class_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic class"))?;
    let term = academic_term::Entity::find_by_id(payload.academic_term_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic term"))?;
    if term.academic_session_id != class.academic_session_id {
        return Err(ApiError::Validation(
            "Term does not belong to the class's academic session".into(),
        ));
    }

    let txn = db.begin().await?;
    let sheet = date_sheet::ActiveModel {
        id: Set(Uuid::new_v4()),
        academic_class_id: Set(class.id),
        academic_term_id: Set(term.id),
        created_at: Set(chrono::Utc::now()),
    };
    let sheet = date_sheet::Entity::insert(sheet)
        .exec_with_returning(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, "Date sheet already exists for this class and term"))?;
    backfill_date_sheet_subjects(&txn, sheet.id, class.id, term.id).await?;
    txn.commit().await?;

    Ok(HttpResponse::Ok().json(sheet))
}

/// GET /date-sheets
pub async fn list_date_sheets(
    db: web::Data<DatabaseConnection>,
    query: web::Query<ListDateSheetsQuery>,
    pagination: web::Query<Pagination>,
) -> Result<impl Responder, ApiError> {
    let mut find = date_sheet::Entity::find();
    if let Some(class_id) = query.academic_class_id {
        find = find.filter(date_sheet::Column::AcademicClassId.eq(class_id));
    }
    if let Some(term_id) = query.academic_term_id {
        find = find.filter(date_sheet::Column::AcademicTermId.eq(term_id));
    }
    let total = find.clone().count(db.as_ref()).await?;
    let (offset, limit) = pagination.page();
    let items = find
        .order_by_desc(date_sheet::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(db.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(ListResponse { total, items }))
}

/// GET /date-sheets/find?academic_class_id=...&academic_term_id=...
///
/// Returns the sheet together with its ordered subject rows, as printed.
pub async fn find_date_sheet(
    db: web::Data<DatabaseConnection>,
    query: web::Query<FindDateSheetQuery>,
) -> Result<impl Responder, ApiError> {
    let sheet = date_sheet::Entity::find()
        .filter(date_sheet::Column::AcademicClassId.eq(query.academic_class_id))
        .filter(date_sheet::Column::AcademicTermId.eq(query.academic_term_id))
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Date sheet"))?;
    let subjects = ordered_sheet_subjects(db.as_ref(), &sheet).await?;
    Ok(HttpResponse::Ok().json(DateSheetWithSubjects {
        date_sheet: sheet,
        subjects,
    }))
}

/// GET /date-sheets/{id}
pub async fn get_date_sheet(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let sheet = date_sheet::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Date sheet"))?;
    Ok(HttpResponse::Ok().json(sheet))
}

/// DELETE /date-sheets/{id}
pub async fn delete_date_sheet(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let sheet = date_sheet::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Date sheet"))?;

    let txn = db.begin().await?;
    date_sheet_subject::Entity::delete_many()
        .filter(date_sheet_subject::Column::DateSheetId.eq(sheet.id))
        .exec(&txn)
        .await?;
    date_sheet::Entity::delete_by_id(sheet.id).exec(&txn).await?;
    txn.commit().await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "Date sheet and its subject rows deleted",
    )))
}
