use actix_web::{web, HttpResponse, Responder};
use sea_orm::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::{LargePagination, ListResponse, MessageResponse};
use crate::models::academic_term::AcademicTermType;
use crate::models::{academic_session, academic_term};
use crate::utils::errors::{conflict_on_unique, ApiError};
use crate::utils::order::term_rank_expr;

#[derive(Debug, Deserialize)]
pub struct CreateTermRequest {
    pub academic_session_id: Uuid,
    pub term_type: AcademicTermType,
    pub working_days: Option<i32>,
    pub exam_result_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTermRequest {
    pub working_days: Option<i32>,
    pub exam_result_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ListTermsQuery {
    pub academic_session_id: Option<Uuid>,
}

/// POST /academic-terms
pub async fn create_term(
    db: web::Data<DatabaseConnection>,
    payload: web::Json<CreateTermRequest>,
) -> Result<impl Responder, ApiError> {
    academic_session::Entity::find_by_id(payload.academic_session_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic session"))?;

    let term = academic_term::ActiveModel {
        id: Set(Uuid::new_v4()),
        academic_session_id: Set(payload.academic_session_id),
        term_type: Set(payload.term_type),
        working_days: Set(payload.working_days),
        exam_result_date: Set(payload.exam_result_date),
        created_at: Set(chrono::Utc::now()),
    };
    let term = academic_term::Entity::insert(term)
        .exec_with_returning(db.as_ref())
        .await
        .map_err(|e| conflict_on_unique(e, "Term already exists for this session"))?;
    Ok(HttpResponse::Ok().json(term))
}

/// GET /academic-terms
pub async fn list_terms(
    db: web::Data<DatabaseConnection>,
    query: web::Query<ListTermsQuery>,
    pagination: web::Query<LargePagination>,
) -> Result<impl Responder, ApiError> {
    let mut find = academic_term::Entity::find();
    if let Some(session_id) = query.academic_session_id {
        find = find.filter(academic_term::Column::AcademicSessionId.eq(session_id));
    }
    let total = find.clone().count(db.as_ref()).await?;
    let (offset, limit) = pagination.page();
    let items = find
        .join(
            JoinType::InnerJoin,
            academic_term::Relation::AcademicSession.def(),
        )
        .order_by_asc(academic_session::Column::Year)
        .order_by(term_rank_expr(), Order::Asc)
        .order_by_desc(academic_term::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(db.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(ListResponse { total, items }))
}

/// GET /academic-terms/{id}
pub async fn get_term(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let term = academic_term::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic term"))?;
    Ok(HttpResponse::Ok().json(term))
}

/// PATCH /academic-terms/{id}
pub async fn update_term(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateTermRequest>,
) -> Result<impl Responder, ApiError> {
    let term = academic_term::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic term"))?;

    let mut term: academic_term::ActiveModel = term.into();
    if let Some(working_days) = payload.working_days {
        term.working_days = Set(Some(working_days));
    }
    if let Some(exam_result_date) = payload.exam_result_date {
        term.exam_result_date = Set(Some(exam_result_date));
    }
    let term = term.update(db.as_ref()).await?;
    Ok(HttpResponse::Ok().json(term))
}

/// DELETE /academic-terms/{id}
pub async fn delete_term(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let term = academic_term::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic term"))?;
    academic_term::Entity::delete_by_id(term.id)
        .exec(db.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Academic term deleted")))
}
