use std::collections::HashSet;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::models::{
    academic_class_subject, date_sheet, date_sheet_subject, enrollment, report_card,
    report_card_subject,
};
use crate::utils::errors::{conflict_on_unique, is_unique_violation, ApiError};

/// Ids in `required` that have no row yet.
pub fn missing_targets(required: &[Uuid], existing: &HashSet<Uuid>) -> Vec<Uuid> {
    required
        .iter()
        .filter(|id| !existing.contains(id))
        .copied()
        .collect()
}

/// Temporary position used during the first phase of a reorder. Staged
/// values sit above every live position in the group so the intermediate
/// commit cannot collide with the unique constraint.
pub fn staging_position(max_position: i32, index: usize) -> i32 {
    max_position + 1000 + index as i32
}

/// One entry of a reorder request.
#[derive(Debug, Clone)]
pub struct ReorderItem {
    pub id: Uuid,
    pub position: i32,
}

/// The (class, term, is_additional) key a reorder batch must not cross.
pub type GroupKey = (Uuid, Uuid, bool);

/// Check a reorder batch against the rows it addresses: every id resolved,
/// positions valid and pairwise distinct, all rows in one ordering group.
pub fn validate_reorder(
    items: &[ReorderItem],
    rows: &[academic_class_subject::Model],
) -> Result<GroupKey, ApiError> {
    if items.is_empty() {
        return Err(ApiError::Validation("Reorder request is empty".to_string()));
    }

    let mut seen_ids = HashSet::new();
    let mut seen_positions = HashSet::new();
    for item in items {
        if item.position < 1 {
            return Err(ApiError::Validation(
                "Positions must be 1 or greater".to_string(),
            ));
        }
        if !seen_ids.insert(item.id) {
            return Err(ApiError::Validation(
                "Duplicate subject in reorder request".to_string(),
            ));
        }
        if !seen_positions.insert(item.position) {
            return Err(ApiError::Validation(
                "Positions must be distinct".to_string(),
            ));
        }
    }

    if rows.len() != items.len() {
        return Err(ApiError::not_found("Academic class subject"));
    }

    let first = &rows[0];
    let key = (
        first.academic_class_id,
        first.academic_term_id,
        first.is_additional,
    );
    for row in rows {
        if (row.academic_class_id, row.academic_term_id, row.is_additional) != key {
            return Err(ApiError::Validation(
                "All subjects must belong to the same class, term and group".to_string(),
            ));
        }
    }
    Ok(key)
}

/// Back-fill one blank report-card-subject row per class-subject of the
/// given class+term that the report card does not have yet. Returns the
/// number of rows inserted; a duplicate-key race drops the whole batch.
pub async fn backfill_report_card_subjects<C: ConnectionTrait>(
    db: &C,
    report_card_id: Uuid,
    academic_class_id: Uuid,
    academic_term_id: Uuid,
) -> Result<usize, DbErr> {
    let class_subject_ids: Vec<Uuid> = academic_class_subject::Entity::find()
        .filter(academic_class_subject::Column::AcademicClassId.eq(academic_class_id))
        .filter(academic_class_subject::Column::AcademicTermId.eq(academic_term_id))
        .all(db)
        .await?
        .iter()
        .map(|cs| cs.id)
        .collect();

    let existing: HashSet<Uuid> = report_card_subject::Entity::find()
        .filter(report_card_subject::Column::ReportCardId.eq(report_card_id))
        .all(db)
        .await?
        .iter()
        .map(|row| row.academic_class_subject_id)
        .collect();

    let missing = missing_targets(&class_subject_ids, &existing);
    if missing.is_empty() {
        return Ok(0);
    }

    let rows = missing.iter().map(|class_subject_id| {
        report_card_subject::ActiveModel {
            id: Set(Uuid::new_v4()),
            report_card_id: Set(report_card_id),
            academic_class_subject_id: Set(*class_subject_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
    });
    let inserted = missing.len();
    match report_card_subject::Entity::insert_many(rows).exec(db).await {
        Ok(_) => Ok(inserted),
        Err(err) if is_unique_violation(&err) => {
            // Raced a concurrent backfill; the rows are assumed present.
            log::warn!(
                "Report card subject backfill for {} hit a duplicate; skipping batch",
                report_card_id
            );
            Ok(0)
        }
        Err(err) => Err(err),
    }
}

/// Date-sheet counterpart of [`backfill_report_card_subjects`].
pub async fn backfill_date_sheet_subjects<C: ConnectionTrait>(
    db: &C,
    date_sheet_id: Uuid,
    academic_class_id: Uuid,
    academic_term_id: Uuid,
) -> Result<usize, DbErr> {
    let class_subject_ids: Vec<Uuid> = academic_class_subject::Entity::find()
        .filter(academic_class_subject::Column::AcademicClassId.eq(academic_class_id))
        .filter(academic_class_subject::Column::AcademicTermId.eq(academic_term_id))
        .all(db)
        .await?
        .iter()
        .map(|cs| cs.id)
        .collect();

    let existing: HashSet<Uuid> = date_sheet_subject::Entity::find()
        .filter(date_sheet_subject::Column::DateSheetId.eq(date_sheet_id))
        .all(db)
        .await?
        .iter()
        .map(|row| row.academic_class_subject_id)
        .collect();

    let missing = missing_targets(&class_subject_ids, &existing);
    if missing.is_empty() {
        return Ok(0);
    }

    let rows = missing.iter().map(|class_subject_id| {
        date_sheet_subject::ActiveModel {
            id: Set(Uuid::new_v4()),
            date_sheet_id: Set(date_sheet_id),
            academic_class_subject_id: Set(*class_subject_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
    });
    let inserted = missing.len();
    match date_sheet_subject::Entity::insert_many(rows).exec(db).await {
        Ok(_) => Ok(inserted),
        Err(err) if is_unique_violation(&err) => {
            log::warn!(
                "Date sheet subject backfill for {} hit a duplicate; skipping batch",
                date_sheet_id
            );
            Ok(0)
        }
        Err(err) => Err(err),
    }
}

/// Fan a freshly created class-subject out to every report card and date
/// sheet of its class+term so each gains a blank row for the new subject.
pub async fn sync_new_class_subject(
    db: &DatabaseConnection,
    class_subject: &academic_class_subject::Model,
) -> Result<(), ApiError> {
    let report_cards = report_card::Entity::find()
        .filter(report_card::Column::AcademicTermId.eq(class_subject.academic_term_id))
        .join(JoinType::InnerJoin, report_card::Relation::Enrollment.def())
        .filter(enrollment::Column::AcademicClassId.eq(class_subject.academic_class_id))
        .all(db)
        .await?;

    if !report_cards.is_empty() {
        let report_card_ids: Vec<Uuid> = report_cards.iter().map(|rc| rc.id).collect();
        let existing: HashSet<Uuid> = report_card_subject::Entity::find()
            .filter(report_card_subject::Column::AcademicClassSubjectId.eq(class_subject.id))
            .filter(report_card_subject::Column::ReportCardId.is_in(report_card_ids.clone()))
            .all(db)
            .await?
            .iter()
            .map(|row| row.report_card_id)
            .collect();
        let missing = missing_targets(&report_card_ids, &existing);
        if !missing.is_empty() {
            let rows = missing.iter().map(|report_card_id| {
                report_card_subject::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    report_card_id: Set(*report_card_id),
                    academic_class_subject_id: Set(class_subject.id),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
            });
            match report_card_subject::Entity::insert_many(rows).exec(db).await {
                Ok(_) => {}
                Err(err) if is_unique_violation(&err) => {
                    log::warn!(
                        "Report card sync for class subject {} raced a concurrent insert; skipping",
                        class_subject.id
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    let date_sheets = date_sheet::Entity::find()
        .filter(date_sheet::Column::AcademicClassId.eq(class_subject.academic_class_id))
        .filter(date_sheet::Column::AcademicTermId.eq(class_subject.academic_term_id))
        .all(db)
        .await?;
    for sheet in date_sheets {
        let already_present = date_sheet_subject::Entity::find()
            .filter(date_sheet_subject::Column::DateSheetId.eq(sheet.id))
            .filter(date_sheet_subject::Column::AcademicClassSubjectId.eq(class_subject.id))
            .one(db)
            .await?
            .is_some();
        if already_present {
            continue;
        }
        let row = date_sheet_subject::ActiveModel {
            id: Set(Uuid::new_v4()),
            date_sheet_id: Set(sheet.id),
            academic_class_subject_id: Set(class_subject.id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        match date_sheet_subject::Entity::insert(row).exec(db).await {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                log::warn!(
                    "Date sheet sync for class subject {} raced a concurrent insert; skipping",
                    class_subject.id
                );
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

/// Reassign positions within one ordering group.
///
/// Positions are unique per group, so a straight permutation update would
/// trip the constraint mid-flight. The batch is staged into a high
/// non-colliding range and committed, then final positions are committed in
/// a second transaction. Concurrent reorders of the same group are not
/// serialized against each other.
pub async fn reorder_class_subjects(
    db: &DatabaseConnection,
    items: &[ReorderItem],
) -> Result<Vec<academic_class_subject::Model>, ApiError> {
    let ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();
    let rows = academic_class_subject::Entity::find()
        .filter(academic_class_subject::Column::Id.is_in(ids))
        .all(db)
        .await?;
    let (class_id, term_id, is_additional) = validate_reorder(items, &rows)?;

    let group_rows = academic_class_subject::Entity::find()
        .filter(academic_class_subject::Column::AcademicClassId.eq(class_id))
        .filter(academic_class_subject::Column::AcademicTermId.eq(term_id))
        .filter(academic_class_subject::Column::IsAdditional.eq(is_additional))
        .all(db)
        .await?;
    let max_position = group_rows.iter().map(|row| row.position).max().unwrap_or(0);

    let txn = db.begin().await?;
    for (index, item) in items.iter().enumerate() {
        academic_class_subject::Entity::update_many()
            .col_expr(
                academic_class_subject::Column::Position,
                Expr::value(staging_position(max_position, index)),
            )
            .filter(academic_class_subject::Column::Id.eq(item.id))
            .exec(&txn)
            .await?;
    }
    txn.commit().await?;

    let txn = db.begin().await?;
    for item in items {
        academic_class_subject::Entity::update_many()
            .col_expr(
                academic_class_subject::Column::Position,
                Expr::value(item.position),
            )
            .filter(academic_class_subject::Column::Id.eq(item.id))
            .exec(&txn)
            .await
            .map_err(|err| conflict_on_unique(err, "Position already in use"))?;
    }
    txn.commit().await?;

    let result = academic_class_subject::Entity::find()
        .filter(academic_class_subject::Column::AcademicClassId.eq(class_id))
        .filter(academic_class_subject::Column::AcademicTermId.eq(term_id))
        .filter(academic_class_subject::Column::IsAdditional.eq(is_additional))
        .order_by_asc(academic_class_subject::Column::Position)
        .all(db)
        .await?;
    Ok(result)
}

/// Delete a class-subject together with its per-student rows. The cascade
/// is explicit rather than delegated to ON DELETE so it stays visible here.
pub async fn delete_class_subject(db: &DatabaseConnection, id: Uuid) -> Result<(), ApiError> {
    let class_subject = academic_class_subject::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Academic class subject"))?;

    let txn = db.begin().await?;
    report_card_subject::Entity::delete_many()
        .filter(report_card_subject::Column::AcademicClassSubjectId.eq(class_subject.id))
        .exec(&txn)
        .await?;
    date_sheet_subject::Entity::delete_many()
        .filter(date_sheet_subject::Column::AcademicClassSubjectId.eq(class_subject.id))
        .exec(&txn)
        .await?;
    academic_class_subject::Entity::delete_by_id(class_subject.id)
        .exec(&txn)
        .await?;
    txn.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn class_subject_row(
        class_id: Uuid,
        term_id: Uuid,
        is_additional: bool,
        position: i32,
    ) -> academic_class_subject::Model {
        academic_class_subject::Model {
            id: Uuid::new_v4(),
            academic_class_id: class_id,
            subject_id: Uuid::new_v4(),
            academic_term_id: term_id,
            is_additional,
            position,
            highest_marks: None,
            average_marks: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_targets_skips_existing() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let existing = HashSet::from([b]);
        assert_eq!(missing_targets(&[a, b, c], &existing), vec![a, c]);
        // A second pass with everything present inserts nothing.
        let all = HashSet::from([a, b, c]);
        assert!(missing_targets(&[a, b, c], &all).is_empty());
    }

    #[test]
    fn test_staging_positions_clear_live_range() {
        assert_eq!(staging_position(3, 0), 1003);
        assert_eq!(staging_position(3, 2), 1005);
        // Staged values never overlap final positions within one batch
        for index in 0..50 {
            assert!(staging_position(7, index) > 7 + 50);
        }
    }

    #[test]
    fn test_validate_reorder_accepts_permutation() {
        let class_id = Uuid::new_v4();
        let term_id = Uuid::new_v4();
        let rows = vec![
            class_subject_row(class_id, term_id, false, 1),
            class_subject_row(class_id, term_id, false, 2),
            class_subject_row(class_id, term_id, false, 3),
        ];
        let items = vec![
            ReorderItem { id: rows[0].id, position: 3 },
            ReorderItem { id: rows[1].id, position: 1 },
            ReorderItem { id: rows[2].id, position: 2 },
        ];
        let key = validate_reorder(&items, &rows).unwrap();
        assert_eq!(key, (class_id, term_id, false));
    }

    #[test]
    fn test_validate_reorder_rejects_duplicate_positions() {
        let class_id = Uuid::new_v4();
        let term_id = Uuid::new_v4();
        let rows = vec![
            class_subject_row(class_id, term_id, false, 1),
            class_subject_row(class_id, term_id, false, 2),
        ];
        let items = vec![
            ReorderItem { id: rows[0].id, position: 1 },
            ReorderItem { id: rows[1].id, position: 1 },
        ];
        assert!(matches!(
            validate_reorder(&items, &rows),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_reorder_rejects_mixed_groups() {
        let class_id = Uuid::new_v4();
        let term_id = Uuid::new_v4();
        let rows = vec![
            class_subject_row(class_id, term_id, false, 1),
            class_subject_row(class_id, term_id, true, 1),
        ];
        let items = vec![
            ReorderItem { id: rows[0].id, position: 2 },
            ReorderItem { id: rows[1].id, position: 1 },
        ];
        assert!(matches!(
            validate_reorder(&items, &rows),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_reorder_rejects_unknown_id() {
        let class_id = Uuid::new_v4();
        let term_id = Uuid::new_v4();
        let rows = vec![class_subject_row(class_id, term_id, false, 1)];
        let items = vec![
            ReorderItem { id: rows[0].id, position: 2 },
            ReorderItem { id: Uuid::new_v4(), position: 1 },
        ];
        assert!(matches!(
            validate_reorder(&items, &rows),
            Err(ApiError::NotFound(_))
        ));
    }
}
