use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use crate::models::academic_term::{self, AcademicTermType};
use crate::models::{academic_class_subject, enrollment, report_card, report_card_subject};
use crate::utils::errors::ApiError;

/// Mark fields of one report-card subject row, nulls included.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubjectMarks {
    pub mid_term: Option<i32>,
    pub notebook: Option<i32>,
    pub assignment: Option<i32>,
    pub class_test: Option<i32>,
    pub final_term: Option<i32>,
    pub final_marks: Option<i32>,
}

impl From<&report_card_subject::Model> for SubjectMarks {
    fn from(row: &report_card_subject::Model) -> Self {
        SubjectMarks {
            mid_term: row.mid_term,
            notebook: row.notebook,
            assignment: row.assignment,
            class_test: row.class_test,
            final_term: row.final_term,
            final_marks: row.final_marks,
        }
    }
}

/// Marks one subject contributes to a report card's total.
///
/// Quarterly terms grade on final marks alone, as do additional
/// (co-curricular) subjects in any term. Everything else sums the five
/// component fields. Unfilled fields count as zero.
pub fn contribution(term_type: AcademicTermType, is_additional: bool, marks: &SubjectMarks) -> i32 {
    if term_type == AcademicTermType::Quarterly || is_additional {
        marks.final_marks.unwrap_or(0)
    } else {
        marks.mid_term.unwrap_or(0)
            + marks.notebook.unwrap_or(0)
            + marks.assignment.unwrap_or(0)
            + marks.class_test.unwrap_or(0)
            + marks.final_term.unwrap_or(0)
    }
}

/// Overall percentage: total marks averaged over the number of graded
/// subjects, rounded up. This is average-per-subject, not marks out of a
/// maximum; the report-card format has always defined it this way.
pub fn percentage(total: i64, subject_count: i64) -> Option<i32> {
    if subject_count <= 0 {
        return None;
    }
    Some(((total + subject_count - 1) / subject_count) as i32)
}

/// Competition ranking: ties share a rank, the next distinct percentage
/// takes its 1-based position (90, 90, 80 ranks as 1, 1, 3).
pub fn assign_ranks(percentages: &HashMap<Uuid, i32>) -> HashMap<Uuid, i32> {
    let mut sorted: Vec<(Uuid, i32)> = percentages.iter().map(|(id, p)| (*id, *p)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    let mut ranks = HashMap::with_capacity(sorted.len());
    let mut current_rank = 0;
    let mut previous: Option<i32> = None;
    for (index, (id, pct)) in sorted.iter().enumerate() {
        if previous != Some(*pct) {
            current_rank = index as i32 + 1;
            previous = Some(*pct);
        }
        ranks.insert(*id, current_rank);
    }
    ranks
}

/// Per-report-card sums over non-additional subject rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubjectTotals {
    pub total: i64,
    pub subject_count: i64,
}

impl SubjectTotals {
    pub fn combine(self, other: SubjectTotals) -> SubjectTotals {
        SubjectTotals {
            total: self.total + other.total,
            subject_count: self.subject_count + other.subject_count,
        }
    }
}

/// Totals for every report card of one class+term, keyed by report card id
/// and carrying the enrollment id for cross-term matching.
async fn totals_for_class_term(
    db: &DatabaseConnection,
    term: &academic_term::Model,
    academic_class_id: Uuid,
) -> Result<HashMap<Uuid, (Uuid, SubjectTotals)>, ApiError> {
    let report_cards = report_card::Entity::find()
        .filter(report_card::Column::AcademicTermId.eq(term.id))
        .join(JoinType::InnerJoin, report_card::Relation::Enrollment.def())
        .filter(enrollment::Column::AcademicClassId.eq(academic_class_id))
        .all(db)
        .await?;
    if report_cards.is_empty() {
        return Ok(HashMap::new());
    }

    let mut totals: HashMap<Uuid, (Uuid, SubjectTotals)> = report_cards
        .iter()
        .map(|rc| (rc.id, (rc.enrollment_id, SubjectTotals::default())))
        .collect();

    let report_card_ids: Vec<Uuid> = report_cards.iter().map(|rc| rc.id).collect();
    let rows = report_card_subject::Entity::find()
        .filter(report_card_subject::Column::ReportCardId.is_in(report_card_ids))
        .find_also_related(academic_class_subject::Entity)
        .all(db)
        .await?;

    for (row, class_subject) in rows {
        let Some(class_subject) = class_subject else {
            continue;
        };
        // Additional subjects never count toward the percentage.
        if class_subject.is_additional {
            continue;
        }
        let marks = SubjectMarks::from(&row);
        if let Some(entry) = totals.get_mut(&row.report_card_id) {
            entry.1.total += contribution(term.term_type, false, &marks) as i64;
            entry.1.subject_count += 1;
        }
    }

    Ok(totals)
}

/// Percentages and ranks for the cohort of one class+term.
///
/// For ANNUAL terms each card's totals are combined with the same
/// enrollment's half-yearly totals (marks and subject counts both summed)
/// before averaging; a card with no half-yearly counterpart stands alone.
pub async fn compute_percentages_and_ranks_for_term(
    db: &DatabaseConnection,
    term: &academic_term::Model,
    academic_class_id: Uuid,
) -> Result<(HashMap<Uuid, i32>, HashMap<Uuid, i32>), ApiError> {
    let mut totals = totals_for_class_term(db, term, academic_class_id).await?;

    if term.term_type == AcademicTermType::Annual {
        let half_yearly_term = academic_term::Entity::find()
            .filter(academic_term::Column::AcademicSessionId.eq(term.academic_session_id))
            .filter(academic_term::Column::TermType.eq(AcademicTermType::HalfYearly))
            .one(db)
            .await?;
        if let Some(half_yearly_term) = half_yearly_term {
            let half_yearly_totals =
                totals_for_class_term(db, &half_yearly_term, academic_class_id).await?;
            let by_enrollment: HashMap<Uuid, SubjectTotals> =
                half_yearly_totals.into_values().collect();
            for (enrollment_id, subject_totals) in totals.values_mut() {
                if let Some(half_yearly) = by_enrollment.get(enrollment_id) {
                    *subject_totals = subject_totals.combine(*half_yearly);
                }
            }
        }
    }

    let percentages: HashMap<Uuid, i32> = totals
        .iter()
        .filter_map(|(id, (_, subject_totals))| {
            percentage(subject_totals.total, subject_totals.subject_count).map(|p| (*id, p))
        })
        .collect();
    let ranks = assign_ranks(&percentages);
    Ok((percentages, ranks))
}

/// Derived fields for a single report card: (overall_percentage, rank).
pub async fn populate_rank_and_percentage(
    db: &DatabaseConnection,
    card: &report_card::Model,
) -> Result<(Option<i32>, Option<i32>), ApiError> {
    let term = academic_term::Entity::find_by_id(card.academic_term_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Academic term"))?;
    let enrollment = enrollment::Entity::find_by_id(card.enrollment_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Enrollment"))?;

    let (percentages, ranks) =
        compute_percentages_and_ranks_for_term(db, &term, enrollment.academic_class_id).await?;
    Ok((
        percentages.get(&card.id).copied(),
        ranks.get(&card.id).copied(),
    ))
}

/// Recompute highest and rounded-average marks for one class-subject across
/// all its report-card rows. Called after any report-card-subject write.
pub async fn refresh_class_subject_stats(
    db: &DatabaseConnection,
    class_subject_id: Uuid,
) -> Result<(), ApiError> {
    let Some(class_subject) = academic_class_subject::Entity::find_by_id(class_subject_id)
        .one(db)
        .await?
    else {
        return Ok(());
    };
    let Some(term) = academic_term::Entity::find_by_id(class_subject.academic_term_id)
        .one(db)
        .await?
    else {
        return Ok(());
    };

    let rows = report_card_subject::Entity::find()
        .filter(report_card_subject::Column::AcademicClassSubjectId.eq(class_subject.id))
        .all(db)
        .await?;

    let contributions: Vec<i64> = rows
        .iter()
        .map(|row| {
            contribution(
                term.term_type,
                class_subject.is_additional,
                &SubjectMarks::from(row),
            ) as i64
        })
        .collect();

    let (highest, average) = if contributions.is_empty() {
        (None, None)
    } else {
        let sum: i64 = contributions.iter().sum();
        let count = contributions.len() as i64;
        let highest = contributions.iter().max().copied().unwrap_or(0);
        // Half-up rounding of the mean.
        let average = (sum + count / 2) / count;
        (Some(highest as i32), Some(average as i32))
    };

    let mut active: academic_class_subject::ActiveModel = class_subject.into();
    active.highest_marks = Set(highest);
    active.average_marks = Set(average);
    active.update(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marks(components: [i32; 5], final_marks: Option<i32>) -> SubjectMarks {
        SubjectMarks {
            mid_term: Some(components[0]),
            notebook: Some(components[1]),
            assignment: Some(components[2]),
            class_test: Some(components[3]),
            final_term: Some(components[4]),
            final_marks,
        }
    }

    #[test]
    fn test_component_sum_for_half_yearly() {
        let m = marks([10, 5, 5, 10, 40], Some(99));
        assert_eq!(contribution(AcademicTermType::HalfYearly, false, &m), 70);
        assert_eq!(contribution(AcademicTermType::Annual, false, &m), 70);
    }

    #[test]
    fn test_quarterly_uses_final_marks_only() {
        // Components are set too, but quarterly grading ignores them.
        let m = marks([10, 10, 10, 10, 10], Some(45));
        assert_eq!(contribution(AcademicTermType::Quarterly, false, &m), 45);
    }

    #[test]
    fn test_additional_subject_uses_final_marks() {
        let m = marks([20, 20, 20, 20, 20], Some(88));
        assert_eq!(contribution(AcademicTermType::HalfYearly, true, &m), 88);
    }

    #[test]
    fn test_null_marks_count_as_zero() {
        let m = SubjectMarks {
            mid_term: Some(12),
            ..Default::default()
        };
        assert_eq!(contribution(AcademicTermType::HalfYearly, false, &m), 12);
        assert_eq!(contribution(AcademicTermType::Quarterly, false, &m), 0);
    }

    #[test]
    fn test_percentage_is_ceil_average() {
        assert_eq!(percentage(70 + 80 + 90, 3), Some(80));
        assert_eq!(percentage(100, 3), Some(34));
        assert_eq!(percentage(0, 3), Some(0));
        assert_eq!(percentage(0, 0), None);
    }

    #[test]
    fn test_quarterly_scenario_excludes_additional() {
        // Math 80 + English 60 over two core subjects; Art (additional,
        // marks 100) is filtered out before totalling.
        assert_eq!(percentage(80 + 60, 2), Some(70));
    }

    #[test]
    fn test_annual_combines_half_yearly_totals() {
        let annual = SubjectTotals {
            total: 160,
            subject_count: 3,
        };
        let half_yearly = SubjectTotals {
            total: 150,
            subject_count: 3,
        };
        let combined = annual.combine(half_yearly);
        assert_eq!(combined.total, 310);
        assert_eq!(combined.subject_count, 6);
        assert_eq!(percentage(combined.total, combined.subject_count), Some(52));
    }

    #[test]
    fn test_rank_ties_use_competition_ranking() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let percentages = HashMap::from([(a, 90), (b, 90), (c, 80)]);
        let ranks = assign_ranks(&percentages);
        assert_eq!(ranks[&a], 1);
        assert_eq!(ranks[&b], 1);
        assert_eq!(ranks[&c], 3);
    }

    #[test]
    fn test_rank_empty_cohort() {
        assert!(assign_ranks(&HashMap::new()).is_empty());
    }
}
