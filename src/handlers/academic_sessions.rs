use actix_web::{web, HttpResponse, Responder};
use sea_orm::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::{BulkCreateResponse, ListResponse, MessageResponse, Pagination};
use crate::models::academic_term::AcademicTermType;
use crate::models::{academic_class, academic_session, academic_term};
use crate::utils::errors::{conflict_on_unique, ApiError};
use crate::utils::order::GRADE_LADDER;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub year: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    pub year: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    pub year: Option<String>,
}

/// POST /academic-sessions
pub async fn create_session(
    db: web::Data<DatabaseConnection>,
    payload: web::Json<CreateSessionRequest>,
) -> Result<impl Responder, ApiError> {
    let session = academic_session::ActiveModel {
        id: Set(Uuid::new_v4()),
        year: Set(payload.year.clone()),
        created_at: Set(chrono::Utc::now()),
    };
    let session = academic_session::Entity::insert(session)
        .exec_with_returning(db.as_ref())
        .await
        .map_err(|e| conflict_on_unique(e, "Academic session already exists for this year"))?;
    Ok(HttpResponse::Ok().json(session))
}

/// GET /academic-sessions
pub async fn list_sessions(
    db: web::Data<DatabaseConnection>,
    query: web::Query<ListSessionsQuery>,
    pagination: web::Query<Pagination>,
) -> Result<impl Responder, ApiError> {
    let mut find = academic_session::Entity::find();
    if let Some(year) = &query.year {
        find = find.filter(academic_session::Column::Year.eq(year));
    }
    let total = find.clone().count(db.as_ref()).await?;
    let (offset, limit) = pagination.page();
    let items = find
        .order_by_asc(academic_session::Column::Year)
        .order_by_desc(academic_session::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(db.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(ListResponse { total, items }))
}

/// GET /academic-sessions/{id}
pub async fn get_session(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let session = academic_session::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic session"))?;
    Ok(HttpResponse::Ok().json(session))
}

/// PATCH /academic-sessions/{id}
pub async fn update_session(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateSessionRequest>,
) -> Result<impl Responder, ApiError> {
    let session = academic_session::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic session"))?;

    let mut session: academic_session::ActiveModel = session.into();
    if let Some(year) = &payload.year {
        session.year = Set(year.clone());
    }
    let session = session
        .update(db.as_ref())
        .await
        .map_err(|e| conflict_on_unique(e, "Academic session already exists for this year"))?;
    Ok(HttpResponse::Ok().json(session))
}

/// DELETE /academic-sessions/{id}
pub async fn delete_session(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let session = academic_session::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic session"))?;
    academic_session::Entity::delete_by_id(session.id)
        .exec(db.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Academic session deleted")))
}

/// POST /academic-sessions/{id}/create-academic-terms
///
/// Creates the fixed three-term set for a session, skipping terms that
/// already exist.
pub async fn create_terms_for_session(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let session_id = path.into_inner();
    academic_session::Entity::find_by_id(session_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic session"))?;

    let desired = [
        AcademicTermType::Quarterly,
        AcademicTermType::HalfYearly,
        AcademicTermType::Annual,
    ];
    let existing_types: Vec<AcademicTermType> = academic_term::Entity::find()
        .filter(academic_term::Column::AcademicSessionId.eq(session_id))
        .all(db.as_ref())
        .await?
        .iter()
        .map(|term| term.term_type)
        .collect();

    let mut created = Vec::new();
    let mut existing = Vec::new();
    for term_type in desired {
        if existing_types.contains(&term_type) {
            existing.push(term_type.as_str().to_string());
            continue;
        }
        let term = academic_term::ActiveModel {
            id: Set(Uuid::new_v4()),
            academic_session_id: Set(session_id),
            term_type: Set(term_type),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };
        academic_term::Entity::insert(term).exec(db.as_ref()).await?;
        created.push(term_type.as_str().to_string());
    }

    let total = created.len() + existing.len();
    Ok(HttpResponse::Ok().json(BulkCreateResponse {
        created,
        existing,
        total,
    }))
}

/// POST /academic-sessions/{id}/create-academic-classes
///
/// Creates a section-A class for every grade of the standard ladder up to
/// VIII, skipping grades that already exist.
pub async fn create_classes_for_session(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let session_id = path.into_inner();
    academic_session::Entity::find_by_id(session_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic session"))?;

    let existing_grades: Vec<String> = academic_class::Entity::find()
        .filter(academic_class::Column::AcademicSessionId.eq(session_id))
        .filter(academic_class::Column::Section.eq("A"))
        .all(db.as_ref())
        .await?
        .into_iter()
        .map(|class| class.grade)
        .collect();

    let mut created = Vec::new();
    let mut existing = Vec::new();
    // The school runs PRE-NURSERY through VIII.
    for grade in &GRADE_LADDER[..12] {
        if existing_grades.iter().any(|g| g == grade) {
            existing.push(ToString::to_string(grade));
            continue;
        }
        let class = academic_class::ActiveModel {
            id: Set(Uuid::new_v4()),
            academic_session_id: Set(session_id),
            grade: Set(ToString::to_string(grade)),
            section: Set("A".to_string()),
            created_at: Set(chrono::Utc::now()),
        };
        academic_class::Entity::insert(class)
            .exec(db.as_ref())
            .await?;
        created.push(ToString::to_string(grade));
    }

    let total = created.len() + existing.len();
    Ok(HttpResponse::Ok().json(BulkCreateResponse {
        created,
        existing,
        total,
    }))
}
