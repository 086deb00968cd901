use actix_web::{web, HttpResponse, Responder};
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::{BulkCreateResponse, ListResponse, MessageResponse, Pagination};
use crate::models::report_card::{ReportCardGrade, ReportCardResult};
use crate::models::{
    academic_term, enrollment, report_card, report_card_subject, student,
};
use crate::services::catalog_sync::backfill_report_card_subjects;
use crate::services::report_totals::populate_rank_and_percentage;
use crate::utils::errors::{conflict_on_unique, is_unique_violation, ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateReportCardRequest {
    pub enrollment_id: Uuid,
    pub academic_term_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct GenerateReportCardsRequest {
    pub academic_class_id: Uuid,
    pub academic_term_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReportCardRequest {
    pub behaviour_grade: Option<ReportCardGrade>,
    pub work_education_grade: Option<ReportCardGrade>,
    pub art_education_grade: Option<ReportCardGrade>,
    pub physical_education_grade: Option<ReportCardGrade>,
    pub attendance_present: Option<i32>,
    pub result: Option<ReportCardResult>,
}

#[derive(Debug, Deserialize)]
pub struct ListReportCardsQuery {
    pub academic_term_id: Option<Uuid>,
    pub academic_class_id: Option<Uuid>,
    pub enrollment_id: Option<Uuid>,
}

/// A report card with its read-time derived fields attached.
#[derive(Debug, Serialize)]
pub struct ReportCardDetail {
    #[serde(flatten)]
    pub report_card: report_card::Model,
    pub overall_percentage: Option<i32>,
    pub rank: Option<i32>,
}

/// Resolve an enrollment and check the term belongs to its session.
async fn enrollment_and_term(
    db: &DatabaseConnection,
    enrollment_id: Uuid,
    term_id: Uuid,
) -> Result<(enrollment::Model, academic_term::Model), ApiError> {
    let enrollment = enrollment::Entity::find_by_id(enrollment_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Enrollment"))?;
    let term = academic_term::Entity::find_by_id(term_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Academic term"))?;
    if term.academic_session_id != enrollment.academic_session_id {
        return Err(ApiError::Validation(
            "Term does not belong to the enrollment's academic session".into(),
        ));
    }
    Ok((enrollment, term))
}

/// POST /report-cards
///
/// The new card is seeded with one blank subject row per class-subject of
/// the enrollment's class and the given term, all in one transaction.
pub async fn create_report_card(
    db: web::Data<DatabaseConnection>,
    payload: web::Json<CreateReportCardRequest>,
) -> Result<impl Responder, ApiError> {
    let (enrollment, term) =
        enrollment_and_term(db.as_ref(), payload.enrollment_id, payload.academic_term_id).await?;

    let txn = db.begin().await?;
    let card = report_card::ActiveModel {
        id: Set(Uuid::new_v4()),
        enrollment_id: Set(enrollment.id),
        academic_term_id: Set(term.id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let card = report_card::Entity::insert(card)
        .exec_with_returning(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, "Report card already exists for this enrollment and term"))?;
    backfill_report_card_subjects(&txn, card.id, enrollment.academic_class_id, term.id).await?;
    txn.commit().await?;

    Ok(HttpResponse::Ok().json(card))
}

/// POST /report-cards/generate
///
/// Creates a report card for every enrollment of a class that has none for
/// the term yet. Safe to call repeatedly.
pub async fn generate_report_cards(
    db: web::Data<DatabaseConnection>,
    payload: web::Json<GenerateReportCardsRequest>,
) -> Result<impl Responder, ApiError> {
    let term = academic_term::Entity::find_by_id(payload.academic_term_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic term"))?;

    let enrollments = enrollment::Entity::find()
        .filter(enrollment::Column::AcademicClassId.eq(payload.academic_class_id))
        .filter(enrollment::Column::AcademicSessionId.eq(term.academic_session_id))
        .find_also_related(student::Entity)
        .all(db.as_ref())
        .await?;

    let mut created = Vec::new();
    let mut existing = Vec::new();
    for (enrollment, student) in enrollments {
        let label = student
            .map(|s| s.registration_no)
            .unwrap_or_else(|| enrollment.id.to_string());
        let already = report_card::Entity::find()
            .filter(report_card::Column::EnrollmentId.eq(enrollment.id))
            .filter(report_card::Column::AcademicTermId.eq(term.id))
            .one(db.as_ref())
            .await?
            .is_some();
        if already {
            existing.push(label);
            continue;
        }

        let txn = db.begin().await?;
        let card = report_card::ActiveModel {
            id: Set(Uuid::new_v4()),
            enrollment_id: Set(enrollment.id),
            academic_term_id: Set(term.id),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };
        match report_card::Entity::insert(card).exec_with_returning(&txn).await {
            Ok(card) => {
                backfill_report_card_subjects(&txn, card.id, enrollment.academic_class_id, term.id)
                    .await?;
                txn.commit().await?;
                created.push(label);
            }
            Err(err) if is_unique_violation(&err) => {
                txn.rollback().await?;
                existing.push(label);
            }
            Err(err) => return Err(err.into()),
        }
    }

    let total = created.len() + existing.len();
    Ok(HttpResponse::Ok().json(BulkCreateResponse {
        created,
        existing,
        total,
    }))
}

/// GET /report-cards
///
/// List rows carry no derived percentage or rank; fetching a single card
/// computes them.
pub async fn list_report_cards(
    db: web::Data<DatabaseConnection>,
    query: web::Query<ListReportCardsQuery>,
    pagination: web::Query<Pagination>,
) -> Result<impl Responder, ApiError> {
    let mut find = report_card::Entity::find();
    if let Some(term_id) = query.academic_term_id {
        find = find.filter(report_card::Column::AcademicTermId.eq(term_id));
    }
    if let Some(enrollment_id) = query.enrollment_id {
        find = find.filter(report_card::Column::EnrollmentId.eq(enrollment_id));
    }
    if let Some(class_id) = query.academic_class_id {
        find = find
            .join(JoinType::InnerJoin, report_card::Relation::Enrollment.def())
            .filter(enrollment::Column::AcademicClassId.eq(class_id));
    }
    let total = find.clone().count(db.as_ref()).await?;
    let (offset, limit) = pagination.page();
    let items: Vec<ReportCardDetail> = find
        .order_by_desc(report_card::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(db.as_ref())
        .await?
        .into_iter()
        .map(|card| ReportCardDetail {
            report_card: card,
            overall_percentage: None,
            rank: None,
        })
        .collect();
    Ok(HttpResponse::Ok().json(ListResponse { total, items }))
}

/// GET /report-cards/{id}
pub async fn get_report_card(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let card = report_card::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Report card"))?;
    let (overall_percentage, rank) = populate_rank_and_percentage(db.as_ref(), &card).await?;
    Ok(HttpResponse::Ok().json(ReportCardDetail {
        report_card: card,
        overall_percentage,
        rank,
    }))
}

/// PATCH /report-cards/{id}
pub async fn update_report_card(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateReportCardRequest>,
) -> Result<impl Responder, ApiError> {
    let card = report_card::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Report card"))?;

    if let Some(attendance) = payload.attendance_present {
        if attendance < 0 {
            return Err(ApiError::Validation(
                "Attendance cannot be negative".into(),
            ));
        }
    }

    let mut card: report_card::ActiveModel = card.into();
    if let Some(grade) = payload.behaviour_grade {
        card.behaviour_grade = Set(Some(grade));
    }
    if let Some(grade) = payload.work_education_grade {
        card.work_education_grade = Set(Some(grade));
    }
    if let Some(grade) = payload.art_education_grade {
        card.art_education_grade = Set(Some(grade));
    }
    if let Some(grade) = payload.physical_education_grade {
        card.physical_education_grade = Set(Some(grade));
    }
    if let Some(attendance) = payload.attendance_present {
        card.attendance_present = Set(Some(attendance));
    }
    if let Some(result) = payload.result {
        card.result = Set(Some(result));
    }
    let card = card.update(db.as_ref()).await?;
    Ok(HttpResponse::Ok().json(card))
}

/// DELETE /report-cards/{id}
pub async fn delete_report_card(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let card = report_card::Entity::find_by_id(path.into_inner())
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Report card"))?;

    let txn = db.begin().await?;
    report_card_subject::Entity::delete_many()
        .filter(report_card_subject::Column::ReportCardId.eq(card.id))
        .exec(&txn)
        .await?;
    report_card::Entity::delete_by_id(card.id).exec(&txn).await?;
    txn.commit().await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "Report card and its subject rows deleted",
    )))
}
