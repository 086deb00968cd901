use actix_web::{web, HttpResponse, Responder};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::{ListResponse, MessageResponse, Pagination};
use crate::models::student;
use crate::utils::errors::{conflict_on_unique, ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    pub registration_no: String,
    pub name: String,
    pub dob: chrono::NaiveDate,
    pub father_name: String,
    pub mother_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStudentRequest {
    pub registration_no: Option<String>,
    pub name: Option<String>,
    pub dob: Option<chrono::NaiveDate>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListStudentsQuery {
    /// Case-insensitive substring match on name or registration number.
    pub search: Option<String>,
}

/// POST /students
pub async fn create_student(
    db: web::Data<DatabaseConnection>,
    payload: web::Json<CreateStudentRequest>,
) -> Result<impl Responder, ApiError> {
    let registration_no = payload.registration_no.trim().to_string();
    if registration_no.is_empty() {
        return Err(ApiError::Validation(
            "Registration number cannot be empty".into(),
        ));
    }
    let student = student::ActiveModel {
        id: Set(Uuid::new_v4()),
        registration_no: Set(registration_no),
        name: Set(payload.name.clone()),
        dob: Set(payload.dob),
        father_name: Set(payload.father_name.clone()),
        mother_name: Set(payload.mother_name.clone()),
        created_at: Set(chrono::Utc::now()),
    };
    let student = student::Entity::insert(student)
        .exec_with_returning(db.as_ref())
        .await
        .map_err(|e| conflict_on_unique(e, "Registration number already in use"))?;
    Ok(HttpResponse::Ok().json(student))
}

/// GET /students
pub async fn list_students(
    db: web::Data<DatabaseConnection>,
    query: web::Query<ListStudentsQuery>,
    pagination: web::Query<Pagination>,
) -> Result<impl Responder, ApiError> {
    let mut find = student::Entity::find();
    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search.trim());
        find = find.filter(
            Condition::any()
                .add(Expr::col(student::Column::Name).ilike(pattern.clone()))
                .add(Expr::col(student::Column::RegistrationNo).ilike(pattern)),
        );
    }
    let total = find.clone().count(db.as_ref()).await?;
    let (offset, limit) = pagination.page();
    let items = find
        .order_by_asc(student::Column::Name)
        .offset(offset)
        .limit(limit)
        .all(db.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(ListResponse { total, items }))
}

/// GET /students/{id}
pub async fn get_student(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let student = student::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Student"))?;
    Ok(HttpResponse::Ok().json(student))
}

/// PATCH /students/{id}
pub async fn update_student(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateStudentRequest>,
) -> Result<impl Responder, ApiError> {
    let student = student::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Student"))?;

    let mut student: student::ActiveModel = student.into();
    if let Some(registration_no) = &payload.registration_no {
        let registration_no = registration_no.trim();
        if registration_no.is_empty() {
            return Err(ApiError::Validation(
                "Registration number cannot be empty".into(),
            ));
        }
        student.registration_no = Set(registration_no.to_string());
    }
    if let Some(name) = &payload.name {
        student.name = Set(name.clone());
    }
    if let Some(dob) = payload.dob {
        student.dob = Set(dob);
    }
    if let Some(father_name) = &payload.father_name {
        student.father_name = Set(father_name.clone());
    }
    if let Some(mother_name) = &payload.mother_name {
        student.mother_name = Set(mother_name.clone());
    }
    let student = student
        .update(db.as_ref())
        .await
        .map_err(|e| conflict_on_unique(e, "Registration number already in use"))?;
    Ok(HttpResponse::Ok().json(student))
}

/// DELETE /students/{id}
pub async fn delete_student(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let student = student::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Student"))?;
    student::Entity::delete_by_id(student.id)
        .exec(db.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Student deleted")))
}
