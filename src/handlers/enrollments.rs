use actix_web::{web, HttpResponse, Responder};
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::{ListResponse, MessageResponse, Pagination};
use crate::models::{academic_class, academic_session, enrollment, student};
use crate::utils::errors::{conflict_on_unique, ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateEnrollmentRequest {
    pub student_id: Uuid,
    pub academic_session_id: Uuid,
    pub academic_class_id: Uuid,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEnrollmentRequest {
    pub academic_class_id: Option<Uuid>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListEnrollmentsQuery {
    pub student_id: Option<Uuid>,
    pub academic_session_id: Option<Uuid>,
    pub academic_class_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct EnrollmentWithStudent {
    #[serde(flatten)]
    pub enrollment: enrollment::Model,
    pub student: Option<student::Model>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

/// Resolve the class and check it belongs to the given session.
async fn class_in_session(
    db: &DatabaseConnection,
    class_id: Uuid,
    session_id: Uuid,
) -> Result<academic_class::Model, ApiError> {
    let class = academic_class::Entity::find_by_id(class_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Academic class"))?;
    if class.academic_session_id != session_id {
        return Err(ApiError::Validation(
            "Class does not belong to the given academic session".into(),
        ));
    }
    Ok(class)
}

/// POST /enrollments
pub async fn create_enrollment(
    db: web::Data<DatabaseConnection>,
    payload: web::Json<CreateEnrollmentRequest>,
) -> Result<impl Responder, ApiError> {
    student::Entity::find_by_id(payload.student_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Student"))?;
    academic_session::Entity::find_by_id(payload.academic_session_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic session"))?;
    class_in_session(
        db.as_ref(),
        payload.academic_class_id,
        payload.academic_session_id,
    )
    .await?;

    let enrollment = enrollment::ActiveModel {
        id: Set(Uuid::new_v4()),
        student_id: Set(payload.student_id),
        academic_session_id: Set(payload.academic_session_id),
        academic_class_id: Set(payload.academic_class_id),
        image: Set(payload.image.clone()),
        created_at: Set(chrono::Utc::now()),
    };
    let enrollment = enrollment::Entity::insert(enrollment)
        .exec_with_returning(db.as_ref())
        .await
        .map_err(|e| conflict_on_unique(e, "Student is already enrolled in this session"))?;
    Ok(HttpResponse::Ok().json(enrollment))
}

/// GET /enrollments
pub async fn list_enrollments(
    db: web::Data<DatabaseConnection>,
    query: web::Query<ListEnrollmentsQuery>,
    pagination: web::Query<Pagination>,
) -> Result<impl Responder, ApiError> {
    let mut find = enrollment::Entity::find();
    if let Some(student_id) = query.student_id {
        find = find.filter(enrollment::Column::StudentId.eq(student_id));
    }
    if let Some(session_id) = query.academic_session_id {
        find = find.filter(enrollment::Column::AcademicSessionId.eq(session_id));
    }
    if let Some(class_id) = query.academic_class_id {
        find = find.filter(enrollment::Column::AcademicClassId.eq(class_id));
    }
    let total = find.clone().count(db.as_ref()).await?;
    let (offset, limit) = pagination.page();
    let rows = find
        .find_also_related(student::Entity)
        .order_by_asc(student::Column::Name)
        .offset(offset)
        .limit(limit)
        .all(db.as_ref())
        .await?;
    let items: Vec<EnrollmentWithStudent> = rows
        .into_iter()
        .map(|(enrollment, student)| EnrollmentWithStudent {
            enrollment,
            student,
        })
        .collect();
    Ok(HttpResponse::Ok().json(ListResponse { total, items }))
}

/// GET /enrollments/count
pub async fn count_enrollments(
    db: web::Data<DatabaseConnection>,
    query: web::Query<ListEnrollmentsQuery>,
) -> Result<impl Responder, ApiError> {
    let mut find = enrollment::Entity::find();
    if let Some(student_id) = query.student_id {
        find = find.filter(enrollment::Column::StudentId.eq(student_id));
    }
    if let Some(session_id) = query.academic_session_id {
        find = find.filter(enrollment::Column::AcademicSessionId.eq(session_id));
    }
    if let Some(class_id) = query.academic_class_id {
        find = find.filter(enrollment::Column::AcademicClassId.eq(class_id));
    }
    let count = find.count(db.as_ref()).await?;
    Ok(HttpResponse::Ok().json(CountResponse { count }))
}

/// GET /enrollments/{id}
pub async fn get_enrollment(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let (enrollment, student) = enrollment::Entity::find_by_id(path.into_inner())
        .find_also_related(student::Entity)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Enrollment"))?;
    Ok(HttpResponse::Ok().json(EnrollmentWithStudent {
        enrollment,
        student,
    }))
}

/// PATCH /enrollments/{id}
pub async fn update_enrollment(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateEnrollmentRequest>,
) -> Result<impl Responder, ApiError> {
    let enrollment = enrollment::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Enrollment"))?;

    let session_id = enrollment.academic_session_id;
    let mut enrollment: enrollment::ActiveModel = enrollment.into();
    if let Some(class_id) = payload.academic_class_id {
        class_in_session(db.as_ref(), class_id, session_id).await?;
        enrollment.academic_class_id = Set(class_id);
    }
    if let Some(image) = &payload.image {
        enrollment.image = Set(Some(image.clone()));
    }
    let enrollment = enrollment.update(db.as_ref()).await?;
    Ok(HttpResponse::Ok().json(enrollment))
}

/// DELETE /enrollments/{id}
pub async fn delete_enrollment(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let enrollment = enrollment::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Enrollment"))?;
    enrollment::Entity::delete_by_id(enrollment.id)
        .exec(db.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Enrollment deleted")))
}
