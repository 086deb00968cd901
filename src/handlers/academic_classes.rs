use actix_web::{web, HttpResponse, Responder};
use sea_orm::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::{LargePagination, ListResponse, MessageResponse};
use crate::models::{academic_class, academic_session};
use crate::utils::errors::{conflict_on_unique, ApiError};
use crate::utils::order::grade_rank_expr;

#[derive(Debug, Deserialize)]
pub struct CreateClassRequest {
    pub academic_session_id: Uuid,
    pub grade: String,
    pub section: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClassRequest {
    pub grade: Option<String>,
    pub section: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListClassesQuery {
    pub academic_session_id: Option<Uuid>,
    pub grade: Option<String>,
}

/// POST /academic-classes
pub async fn create_class(
    db: web::Data<DatabaseConnection>,
    payload: web::Json<CreateClassRequest>,
) -> Result<impl Responder, ApiError> {
    academic_session::Entity::find_by_id(payload.academic_session_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic session"))?;

    let class = academic_class::ActiveModel {
        id: Set(Uuid::new_v4()),
        academic_session_id: Set(payload.academic_session_id),
        grade: Set(payload.grade.clone()),
        section: Set(payload.section.clone()),
        created_at: Set(chrono::Utc::now()),
    };
    let class = academic_class::Entity::insert(class)
        .exec_with_returning(db.as_ref())
        .await
        .map_err(|e| conflict_on_unique(e, "Class and section already exist for this session"))?;
    Ok(HttpResponse::Ok().json(class))
}

/// GET /academic-classes
pub async fn list_classes(
    db: web::Data<DatabaseConnection>,
    query: web::Query<ListClassesQuery>,
    pagination: web::Query<LargePagination>,
) -> Result<impl Responder, ApiError> {
    let mut find = academic_class::Entity::find();
    if let Some(session_id) = query.academic_session_id {
        find = find.filter(academic_class::Column::AcademicSessionId.eq(session_id));
    }
    if let Some(grade) = &query.grade {
        find = find.filter(academic_class::Column::Grade.eq(grade));
    }
    let total = find.clone().count(db.as_ref()).await?;
    let (offset, limit) = pagination.page();
    let items = find
        .join(
            JoinType::InnerJoin,
            academic_class::Relation::AcademicSession.def(),
        )
        .order_by_asc(academic_session::Column::Year)
        .order_by(grade_rank_expr(), Order::Asc)
        .order_by_asc(academic_class::Column::Section)
        .offset(offset)
        .limit(limit)
        .all(db.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(ListResponse { total, items }))
}

/// GET /academic-classes/{id}
pub async fn get_class(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let class = academic_class::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic class"))?;
    Ok(HttpResponse::Ok().json(class))
}

/// PATCH /academic-classes/{id}
pub async fn update_class(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateClassRequest>,
) -> Result<impl Responder, ApiError> {
    let class = academic_class::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic class"))?;

    let mut class: academic_class::ActiveModel = class.into();
    if let Some(grade) = &payload.grade {
        class.grade = Set(grade.clone());
    }
    if let Some(section) = &payload.section {
        class.section = Set(section.clone());
    }
    let class = class
        .update(db.as_ref())
        .await
        .map_err(|e| conflict_on_unique(e, "Class and section already exist for this session"))?;
    Ok(HttpResponse::Ok().json(class))
}

/// DELETE /academic-classes/{id}
pub async fn delete_class(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let class = academic_class::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic class"))?;
    academic_class::Entity::delete_by_id(class.id)
        .exec(db.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Academic class deleted")))
}
