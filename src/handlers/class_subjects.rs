use actix_web::{web, HttpResponse, Responder};
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::{ListResponse, MessageResponse};
use crate::models::{academic_class, academic_class_subject, academic_term, subject};
use crate::services::catalog_sync::{
    delete_class_subject as delete_class_subject_rows, reorder_class_subjects, sync_new_class_subject,
    ReorderItem,
};
use crate::utils::errors::{conflict_on_unique, ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateClassSubjectRequest {
    pub academic_class_id: Uuid,
    pub subject_id: Uuid,
    pub academic_term_id: Uuid,
    #[serde(default)]
    pub is_additional: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClassSubjectRequest {
    pub is_additional: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListClassSubjectsQuery {
    pub academic_class_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub academic_term_id: Option<Uuid>,
    pub is_additional: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub items: Vec<ReorderEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderEntry {
    pub id: Uuid,
    pub position: i32,
}

/// A class-subject row with its catalog subject attached, as the frontend
/// renders them in one table.
#[derive(Debug, Serialize)]
pub struct ClassSubjectWithSubject {
    #[serde(flatten)]
    pub class_subject: academic_class_subject::Model,
    pub subject: Option<subject::Model>,
}

async fn next_position(
    db: &DatabaseConnection,
    class_id: Uuid,
    term_id: Uuid,
    is_additional: bool,
) -> Result<i32, DbErr> {
    let max = academic_class_subject::Entity::find()
        .filter(academic_class_subject::Column::AcademicClassId.eq(class_id))
        .filter(academic_class_subject::Column::AcademicTermId.eq(term_id))
        .filter(academic_class_subject::Column::IsAdditional.eq(is_additional))
        .all(db)
        .await?
        .iter()
        .map(|row| row.position)
        .max()
        .unwrap_or(0);
    Ok(max + 1)
}

/// POST /class-subjects
///
/// Appends the subject at the end of its ordering group, then fans it out
/// to existing report cards and date sheets of the class+term.
pub async fn create_class_subject(
    db: web::Data<DatabaseConnection>,
    payload: web::Json<CreateClassSubjectRequest>,
) -> Result<impl Responder, ApiError> {
    academic_class::Entity::find_by_id(payload.academic_class_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic class"))?;
    subject::Entity::find_by_id(payload.subject_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Subject"))?;
    academic_term::Entity::find_by_id(payload.academic_term_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic term"))?;

    let position = next_position(
        db.as_ref(),
        payload.academic_class_id,
        payload.academic_term_id,
        payload.is_additional,
    )
    .await?;

    let class_subject = academic_class_subject::ActiveModel {
        id: Set(Uuid::new_v4()),
        academic_class_id: Set(payload.academic_class_id),
        subject_id: Set(payload.subject_id),
        academic_term_id: Set(payload.academic_term_id),
        is_additional: Set(payload.is_additional),
        position: Set(position),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let class_subject = academic_class_subject::Entity::insert(class_subject)
        .exec_with_returning(db.as_ref())
        .await
        .map_err(|e| conflict_on_unique(e, "Subject already assigned to this class and term"))?;

    sync_new_class_subject(db.as_ref(), &class_subject).await?;
    Ok(HttpResponse::Ok().json(class_subject))
}

/// GET /class-subjects
pub async fn list_class_subjects(
    db: web::Data<DatabaseConnection>,
    query: web::Query<ListClassSubjectsQuery>,
) -> Result<impl Responder, ApiError> {
    let mut find = academic_class_subject::Entity::find();
    if let Some(class_id) = query.academic_class_id {
        find = find.filter(academic_class_subject::Column::AcademicClassId.eq(class_id));
    }
    if let Some(subject_id) = query.subject_id {
        find = find.filter(academic_class_subject::Column::SubjectId.eq(subject_id));
    }
    if let Some(term_id) = query.academic_term_id {
        find = find.filter(academic_class_subject::Column::AcademicTermId.eq(term_id));
    }
    if let Some(is_additional) = query.is_additional {
        find = find.filter(academic_class_subject::Column::IsAdditional.eq(is_additional));
    }
    let rows = find
        .find_also_related(subject::Entity)
        .order_by_asc(academic_class_subject::Column::IsAdditional)
        .order_by_asc(academic_class_subject::Column::Position)
        .all(db.as_ref())
        .await?;

    let total = rows.len() as u64;
    let items: Vec<ClassSubjectWithSubject> = rows
        .into_iter()
        .map(|(class_subject, subject)| ClassSubjectWithSubject {
            class_subject,
            subject,
        })
        .collect();
    Ok(HttpResponse::Ok().json(ListResponse { total, items }))
}

/// GET /class-subjects/{id}
pub async fn get_class_subject(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let (class_subject, subject) = academic_class_subject::Entity::find_by_id(path.into_inner())
        .find_also_related(subject::Entity)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic class subject"))?;
    Ok(HttpResponse::Ok().json(ClassSubjectWithSubject {
        class_subject,
        subject,
    }))
}

/// PATCH /class-subjects/{id}
///
/// Only `is_additional` is mutable. Moving between groups re-appends the
/// row at the end of the target group.
pub async fn update_class_subject(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateClassSubjectRequest>,
) -> Result<impl Responder, ApiError> {
    let class_subject = academic_class_subject::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic class subject"))?;

    let mut active: academic_class_subject::ActiveModel = class_subject.clone().into();
    if let Some(is_additional) = payload.is_additional {
        if is_additional != class_subject.is_additional {
            let position = next_position(
                db.as_ref(),
                class_subject.academic_class_id,
                class_subject.academic_term_id,
                is_additional,
            )
            .await?;
            active.is_additional = Set(is_additional);
            active.position = Set(position);
        }
    }
    let class_subject = active.update(db.as_ref()).await?;
    Ok(HttpResponse::Ok().json(class_subject))
}

/// PUT /class-subjects/reorder
pub async fn reorder(
    db: web::Data<DatabaseConnection>,
    payload: web::Json<ReorderRequest>,
) -> Result<impl Responder, ApiError> {
    let items: Vec<ReorderItem> = payload
        .items
        .iter()
        .map(|entry| ReorderItem {
            id: entry.id,
            position: entry.position,
        })
        .collect();
    let rows = reorder_class_subjects(db.as_ref(), &items).await?;
    let total = rows.len() as u64;
    Ok(HttpResponse::Ok().json(ListResponse { total, items: rows }))
}

/// DELETE /class-subjects/{id}
pub async fn delete_class_subject(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    delete_class_subject_rows(db.as_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "Academic class subject and its dependent rows deleted",
    )))
}
