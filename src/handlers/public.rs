use actix_web::{web, HttpResponse, Responder};
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::app_settings::get_or_create_settings;
use crate::handlers::date_sheet_subjects::{ordered_sheet_subjects, DateSheetSubjectDetail};
use crate::handlers::report_card_subjects::{ordered_card_subjects, ReportCardSubjectDetail};
use crate::handlers::ListResponse;
use crate::models::academic_term::AcademicTermType;
use crate::models::{
    academic_class, academic_session, academic_term, date_sheet, enrollment, report_card, student,
};
use crate::services::report_totals::compute_percentages_and_ranks_for_term;
use crate::utils::errors::ApiError;
use crate::utils::order::{grade_rank_expr, term_rank_expr};

#[derive(Debug, Deserialize)]
pub struct StudentTermQuery {
    pub student_registration_no: String,
    pub academic_term_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct StudentSessionQuery {
    pub student_registration_no: String,
    pub academic_session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ClassTermQuery {
    pub academic_class_id: Uuid,
    pub academic_term_id: Uuid,
}

/// One term's report card as published: the card, its ordered subject rows
/// and the derived class standing.
#[derive(Debug, Serialize)]
pub struct PublishedCard {
    pub report_card: report_card::Model,
    pub subjects: Vec<ReportCardSubjectDetail>,
    pub overall_percentage: Option<i32>,
    pub rank: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ReportCardData {
    pub student: student::Model,
    pub enrollment: enrollment::Model,
    pub academic_class: academic_class::Model,
    pub academic_term: academic_term::Model,
    pub card: PublishedCard,
    /// Present for annual terms with a half-yearly card on file.
    pub half_yearly_card: Option<PublishedCard>,
}

#[derive(Debug, Serialize)]
pub struct AdmitCardData {
    pub student: student::Model,
    pub enrollment: enrollment::Model,
    pub academic_class: academic_class::Model,
    pub academic_term: academic_term::Model,
    pub date_sheet: date_sheet::Model,
    pub subjects: Vec<DateSheetSubjectDetail>,
}

#[derive(Debug, Serialize)]
pub struct IdCardData {
    pub student: student::Model,
    pub enrollment: enrollment::Model,
    pub academic_class: academic_class::Model,
    pub academic_session: academic_session::Model,
}

#[derive(Debug, Serialize)]
pub struct DateSheetData {
    pub date_sheet: date_sheet::Model,
    pub subjects: Vec<DateSheetSubjectDetail>,
}

#[derive(Debug, Serialize)]
pub struct SettingsData {
    pub result_publication_active: bool,
    pub admit_card_active: bool,
}

/// Resolve a student by registration number together with their enrollment
/// and class in the given session.
async fn resolve_enrollment(
    db: &DatabaseConnection,
    registration_no: &str,
    session_id: Uuid,
) -> Result<(student::Model, enrollment::Model, academic_class::Model), ApiError> {
    let student = student::Entity::find()
        .filter(student::Column::RegistrationNo.eq(registration_no.trim()))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Student"))?;
    let enrollment = enrollment::Entity::find()
        .filter(enrollment::Column::StudentId.eq(student.id))
        .filter(enrollment::Column::AcademicSessionId.eq(session_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Enrollment"))?;
    let class = academic_class::Entity::find_by_id(enrollment.academic_class_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Academic class"))?;
    Ok((student, enrollment, class))
}

async fn published_card(
    db: &DatabaseConnection,
    term: &academic_term::Model,
    enrollment: &enrollment::Model,
) -> Result<Option<PublishedCard>, ApiError> {
    let Some(card) = report_card::Entity::find()
        .filter(report_card::Column::EnrollmentId.eq(enrollment.id))
        .filter(report_card::Column::AcademicTermId.eq(term.id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let subjects = ordered_card_subjects(db, &card, enrollment.academic_class_id).await?;
    let (percentages, ranks) =
        compute_percentages_and_ranks_for_term(db, term, enrollment.academic_class_id).await?;
    Ok(Some(PublishedCard {
        overall_percentage: percentages.get(&card.id).copied(),
        rank: ranks.get(&card.id).copied(),
        report_card: card,
        subjects,
    }))
}

/// GET /public/report-card-data
pub async fn report_card_data(
    db: web::Data<DatabaseConnection>,
    query: web::Query<StudentTermQuery>,
) -> Result<impl Responder, ApiError> {
    let settings = get_or_create_settings(db.as_ref()).await?;
    if !settings.result_publication_active {
        return Err(ApiError::Forbidden(
            "Result publication is not active".into(),
        ));
    }

    let term = academic_term::Entity::find_by_id(query.academic_term_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic term"))?;
    let (student, enrollment, class) = resolve_enrollment(
        db.as_ref(),
        &query.student_registration_no,
        term.academic_session_id,
    )
    .await?;

    let card = published_card(db.as_ref(), &term, &enrollment)
        .await?
        .ok_or_else(|| ApiError::not_found("Report card"))?;

    let half_yearly_card = if term.term_type == AcademicTermType::Annual {
        let half_yearly = academic_term::Entity::find()
            .filter(academic_term::Column::AcademicSessionId.eq(term.academic_session_id))
            .filter(academic_term::Column::TermType.eq(AcademicTermType::HalfYearly))
            .one(db.as_ref())
            .await?;
        match half_yearly {
            Some(half_yearly) => published_card(db.as_ref(), &half_yearly, &enrollment).await?,
            None => None,
        }
    } else {
        None
    };

    Ok(HttpResponse::Ok().json(ReportCardData {
        student,
        enrollment,
        academic_class: class,
        academic_term: term,
        card,
        half_yearly_card,
    }))
}

/// GET /public/admit-card-data
pub async fn admit_card_data(
    db: web::Data<DatabaseConnection>,
    query: web::Query<StudentTermQuery>,
) -> Result<impl Responder, ApiError> {
    let settings = get_or_create_settings(db.as_ref()).await?;
    if !settings.admit_card_active {
        return Err(ApiError::Forbidden(
            "Admit card download is not active".into(),
        ));
    }

    let term = academic_term::Entity::find_by_id(query.academic_term_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic term"))?;
    let (student, enrollment, class) = resolve_enrollment(
        db.as_ref(),
        &query.student_registration_no,
        term.academic_session_id,
    )
    .await?;

    let sheet = date_sheet::Entity::find()
        .filter(date_sheet::Column::AcademicClassId.eq(class.id))
        .filter(date_sheet::Column::AcademicTermId.eq(term.id))
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Date sheet"))?;
    let subjects = ordered_sheet_subjects(db.as_ref(), &sheet).await?;

    Ok(HttpResponse::Ok().json(AdmitCardData {
        student,
        enrollment,
        academic_class: class,
        academic_term: term,
        date_sheet: sheet,
        subjects,
    }))
}

/// GET /public/id-card-data
pub async fn id_card_data(
    db: web::Data<DatabaseConnection>,
    query: web::Query<StudentSessionQuery>,
) -> Result<impl Responder, ApiError> {
    let session = academic_session::Entity::find_by_id(query.academic_session_id)
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Academic session"))?;
    let (student, enrollment, class) =
        resolve_enrollment(db.as_ref(), &query.student_registration_no, session.id).await?;

    Ok(HttpResponse::Ok().json(IdCardData {
        student,
        enrollment,
        academic_class: class,
        academic_session: session,
    }))
}

/// GET /public/date-sheet-data
pub async fn date_sheet_data(
    db: web::Data<DatabaseConnection>,
    query: web::Query<ClassTermQuery>,
) -> Result<impl Responder, ApiError> {
    let sheet = date_sheet::Entity::find()
        .filter(date_sheet::Column::AcademicClassId.eq(query.academic_class_id))
        .filter(date_sheet::Column::AcademicTermId.eq(query.academic_term_id))
        .one(db.as_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Date sheet"))?;
    let subjects = ordered_sheet_subjects(db.as_ref(), &sheet).await?;
    Ok(HttpResponse::Ok().json(DateSheetData {
        date_sheet: sheet,
        subjects,
    }))
}

/// GET /public/settings-data
pub async fn settings_data(db: web::Data<DatabaseConnection>) -> Result<impl Responder, ApiError> {
    let settings = get_or_create_settings(db.as_ref()).await?;
    Ok(HttpResponse::Ok().json(SettingsData {
        result_publication_active: settings.result_publication_active,
        admit_card_active: settings.admit_card_active,
    }))
}

/// GET /public/academic-sessions
pub async fn list_sessions(db: web::Data<DatabaseConnection>) -> Result<impl Responder, ApiError> {
    let items = academic_session::Entity::find()
        .order_by_asc(academic_session::Column::Year)
        .all(db.as_ref())
        .await?;
    let total = items.len() as u64;
    Ok(HttpResponse::Ok().json(ListResponse { total, items }))
}

/// GET /public/academic-terms
pub async fn list_terms(
    db: web::Data<DatabaseConnection>,
    query: web::Query<SessionFilterQuery>,
) -> Result<impl Responder, ApiError> {
    let mut find = academic_term::Entity::find();
    if let Some(session_id) = query.academic_session_id {
        find = find.filter(academic_term::Column::AcademicSessionId.eq(session_id));
    }
    let items = find
        .order_by(term_rank_expr(), Order::Asc)
        .all(db.as_ref())
        .await?;
    let total = items.len() as u64;
    Ok(HttpResponse::Ok().json(ListResponse { total, items }))
}

#[derive(Debug, Deserialize)]
pub struct SessionFilterQuery {
    pub academic_session_id: Option<Uuid>,
}

/// GET /public/academic-classes
pub async fn list_classes(
    db: web::Data<DatabaseConnection>,
    query: web::Query<SessionFilterQuery>,
) -> Result<impl Responder, ApiError> {
    let mut find = academic_class::Entity::find();
    if let Some(session_id) = query.academic_session_id {
        find = find.filter(academic_class::Column::AcademicSessionId.eq(session_id));
    }
    let items = find
        .order_by(grade_rank_expr(), Order::Asc)
        .order_by_asc(academic_class::Column::Section)
        .all(db.as_ref())
        .await?;
    let total = items.len() as u64;
    Ok(HttpResponse::Ok().json(ListResponse { total, items }))
}
