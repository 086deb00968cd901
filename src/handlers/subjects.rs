use actix_web::{web, HttpResponse, Responder};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::{LargePagination, ListResponse, MessageResponse};
use crate::models::subject;
use crate::utils::errors::{conflict_on_unique, ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateSubjectRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubjectRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListSubjectsQuery {
    pub search: Option<String>,
}

/// POST /subjects
pub async fn create_subject(
    db: web::Data<DatabaseConnection>,
    payload: web::Json<CreateSubjectRequest>,
) -> Result<impl Responder, ApiError> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation("Subject name cannot be empty".into()));
    }
    let subject = subject::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        created_at: Set(chrono::Utc::now()),
    };
    let subject = subject::Entity::insert(subject)
        .exec_with_returning(db.as_ref())
        .await
        .map_err(|e| conflict_on_unique(e, "Subject already exists"))?;
    Ok(HttpResponse::Ok().json(subject))
}

/// GET /subjects
pub async fn list_subjects(
    db: web::Data<DatabaseConnection>,
    query: web::Query<ListSubjectsQuery>,
    pagination: web::Query<LargePagination>,
) -> Result<impl Responder, ApiError> {
    let mut find = subject::Entity::find();
    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search.trim());
        find = find.filter(Expr::col(subject::Column::Name).ilike(pattern));
    }
    let total = find.clone().count(db.as_ref()).await?;
    let (offset, limit) = pagination.page();
    let items = find
        .order_by_asc(subject::Column::Name)
        .offset(offset)
        .limit(limit)
        .all(db.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(ListResponse { total, items }))
}

/// GET /subjects/{id}
pub async fn get_subject(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let subject = subject::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Subject"))?;
    Ok(HttpResponse::Ok().json(subject))
}

/// PATCH /subjects/{id}
pub async fn update_subject(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateSubjectRequest>,
) -> Result<impl Responder, ApiError> {
    let subject = subject::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Subject"))?;

    let mut subject: subject::ActiveModel = subject.into();
    if let Some(name) = &payload.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("Subject name cannot be empty".into()));
        }
        subject.name = Set(name.to_string());
    }
    let subject = subject
        .update(db.as_ref())
        .await
        .map_err(|e| conflict_on_unique(e, "Subject already exists"))?;
    Ok(HttpResponse::Ok().json(subject))
}

/// DELETE /subjects/{id}
pub async fn delete_subject(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let subject = subject::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Subject"))?;
    subject::Entity::delete_by_id(subject.id)
        .exec(db.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Subject deleted")))
}
