use actix_web::{web, HttpResponse, Responder};
use sea_orm::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::{ListResponse, MessageResponse, Pagination};
use crate::middleware::auth::Claims;
use crate::models::user::{self, UserRole};
use crate::models::{academic_class, academic_term};
use crate::utils::errors::{conflict_on_unique, ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub role: UserRole,
    pub default_academic_session_id: Option<Uuid>,
    pub default_academic_term_id: Option<Uuid>,
    pub default_academic_class_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<UserRole>,
    #[serde(default, with = "crate::handlers::double_option")]
    pub default_academic_session_id: Option<Option<Uuid>>,
    #[serde(default, with = "crate::handlers::double_option")]
    pub default_academic_term_id: Option<Option<Uuid>>,
    #[serde(default, with = "crate::handlers::double_option")]
    pub default_academic_class_id: Option<Option<Uuid>>,
}

/// Check the default term and class, if set, belong to the default session.
async fn validate_defaults(
    db: &DatabaseConnection,
    session_id: Option<Uuid>,
    term_id: Option<Uuid>,
    class_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if (term_id.is_some() || class_id.is_some()) && session_id.is_none() {
        return Err(ApiError::Validation(
            "A default term or class requires a default session".into(),
        ));
    }
    let Some(session_id) = session_id else {
        return Ok(());
    };
    if let Some(term_id) = term_id {
        let term = academic_term::Entity::find_by_id(term_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Academic term"))?;
        if term.academic_session_id != session_id {
            return Err(ApiError::Validation(
                "Default term does not belong to the default session".into(),
            ));
        }
    }
    if let Some(class_id) = class_id {
        let class = academic_class::Entity::find_by_id(class_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Academic class"))?;
        if class.academic_session_id != session_id {
            return Err(ApiError::Validation(
                "Default class does not belong to the default session".into(),
            ));
        }
    }
    Ok(())
}

/// POST /users
pub async fn create_user(
    db: web::Data<DatabaseConnection>,
    payload: web::Json<CreateUserRequest>,
) -> Result<impl Responder, ApiError> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::Validation("A valid email is required".into()));
    }
    validate_defaults(
        db.as_ref(),
        payload.default_academic_session_id,
        payload.default_academic_term_id,
        payload.default_academic_class_id,
    )
    .await?;

    let user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        role: Set(payload.role),
        default_academic_session_id: Set(payload.default_academic_session_id),
        default_academic_term_id: Set(payload.default_academic_term_id),
        default_academic_class_id: Set(payload.default_academic_class_id),
        created_at: Set(chrono::Utc::now()),
    };
    let user = user::Entity::insert(user)
        .exec_with_returning(db.as_ref())
        .await
        .map_err(|e| conflict_on_unique(e, "User already exists with this email"))?;
    Ok(HttpResponse::Ok().json(user))
}

/// GET /users
pub async fn list_users(
    db: web::Data<DatabaseConnection>,
    pagination: web::Query<Pagination>,
) -> Result<impl Responder, ApiError> {
    let find = user::Entity::find();
    let total = find.clone().count(db.as_ref()).await?;
    let (offset, limit) = pagination.page();
    let items = find
        .order_by_asc(user::Column::Email)
        .offset(offset)
        .limit(limit)
        .all(db.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(ListResponse { total, items }))
}

/// GET /users/me
///
/// Resolves the caller from the bearer token's subject email.
pub async fn get_me(
    db: web::Data<DatabaseConnection>,
    claims: web::ReqData<Claims>,
) -> Result<impl Responder, ApiError> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(claims.sub.to_lowercase()))
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(HttpResponse::Ok().json(user))
}

/// GET /users/{id}
pub async fn get_user(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let user = user::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(HttpResponse::Ok().json(user))
}

/// PATCH /users/{id}
pub async fn update_user(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateUserRequest>,
) -> Result<impl Responder, ApiError> {
    let user = user::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    // Validate the defaults as they will stand after the patch.
    let session_id = payload
        .default_academic_session_id
        .unwrap_or(user.default_academic_session_id);
    let term_id = payload
        .default_academic_term_id
        .unwrap_or(user.default_academic_term_id);
    let class_id = payload
        .default_academic_class_id
        .unwrap_or(user.default_academic_class_id);
    validate_defaults(db.as_ref(), session_id, term_id, class_id).await?;

    let mut user: user::ActiveModel = user.into();
    if let Some(role) = payload.role {
        user.role = Set(role);
    }
    if let Some(value) = payload.default_academic_session_id {
        user.default_academic_session_id = Set(value);
    }
    if let Some(value) = payload.default_academic_term_id {
        user.default_academic_term_id = Set(value);
    }
    if let Some(value) = payload.default_academic_class_id {
        user.default_academic_class_id = Set(value);
    }
    let user = user.update(db.as_ref()).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// DELETE /users/{id}
pub async fn delete_user(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let user = user::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    user::Entity::delete_by_id(user.id)
        .exec(db.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("User deleted")))
}
