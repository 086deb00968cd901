use actix_web::{web, HttpResponse, Responder};
use sea_orm::*;
use serde::Deserialize;

use crate::models::app_setting::{self, SINGLETON_APP_SETTING_ID};
use crate::utils::errors::{is_unique_violation, ApiError};

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub result_publication_active: Option<bool>,
    pub admit_card_active: Option<bool>,
}

/// Fetch the settings row, creating it with both toggles off on first use.
pub async fn get_or_create_settings(
    db: &DatabaseConnection,
) -> Result<app_setting::Model, ApiError> {
    if let Some(settings) = app_setting::Entity::find_by_id(SINGLETON_APP_SETTING_ID)
        .one(db)
        .await?
    {
        return Ok(settings);
    }

    let now = chrono::Utc::now();
    let settings = app_setting::ActiveModel {
        id: Set(SINGLETON_APP_SETTING_ID),
        result_publication_active: Set(false),
        admit_card_active: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    };
    match app_setting::Entity::insert(settings).exec_with_returning(db).await {
        Ok(settings) => Ok(settings),
        // Raced another first read; the row exists now.
        Err(err) if is_unique_violation(&err) => {
            app_setting::Entity::find_by_id(SINGLETON_APP_SETTING_ID)
                .one(db)
                .await?
                .ok_or_else(|| ApiError::not_found("App settings"))
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /app-settings
pub async fn get_settings(
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, ApiError> {
    let settings = get_or_create_settings(db.as_ref()).await?;
    Ok(HttpResponse::Ok().json(settings))
}

/// PATCH /app-settings
pub async fn update_settings(
    db: web::Data<DatabaseConnection>,
    payload: web::Json<UpdateSettingsRequest>,
) -> Result<impl Responder, ApiError> {
    let settings = get_or_create_settings(db.as_ref()).await?;

    let mut settings: app_setting::ActiveModel = settings.into();
    if let Some(active) = payload.result_publication_active {
        settings.result_publication_active = Set(active);
    }
    if let Some(active) = payload.admit_card_active {
        settings.admit_card_active = Set(active);
    }
    settings.updated_at = Set(chrono::Utc::now());
    let settings = settings.update(db.as_ref()).await?;
    Ok(HttpResponse::Ok().json(settings))
}
