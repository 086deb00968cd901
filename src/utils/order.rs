use sea_orm::sea_query::{CaseStatement, Expr, SimpleExpr};

use crate::models::academic_class;
use crate::models::academic_term::{self, AcademicTermType};

/// School grade ladder, youngest first. Unknown grades sort after the ladder.
pub const GRADE_LADDER: [&str; 16] = [
    "PRE-NURSERY",
    "NURSERY",
    "LKG",
    "UKG",
    "I",
    "II",
    "III",
    "IV",
    "V",
    "VI",
    "VII",
    "VIII",
    "IX",
    "X",
    "XI",
    "XII",
];

pub fn grade_ladder_index(grade: &str) -> i32 {
    GRADE_LADDER
        .iter()
        .position(|g| *g == grade)
        .map(|i| i as i32)
        .unwrap_or(GRADE_LADDER.len() as i32)
}

/// SQL CASE expression ranking classes by the grade ladder.
pub fn grade_rank_expr() -> SimpleExpr {
    let mut case = CaseStatement::new();
    for (index, grade) in GRADE_LADDER.iter().enumerate() {
        case = case.case(
            Expr::col((academic_class::Entity, academic_class::Column::Grade)).eq(*grade),
            Expr::val(index as i32),
        );
    }
    case.finally(Expr::val(GRADE_LADDER.len() as i32)).into()
}

/// SQL CASE expression ranking terms quarterly < half-yearly < annual.
pub fn term_rank_expr() -> SimpleExpr {
    CaseStatement::new()
        .case(
            Expr::col((academic_term::Entity, academic_term::Column::TermType))
                .eq(AcademicTermType::Quarterly),
            Expr::val(0),
        )
        .case(
            Expr::col((academic_term::Entity, academic_term::Column::TermType))
                .eq(AcademicTermType::HalfYearly),
            Expr::val(1),
        )
        .case(
            Expr::col((academic_term::Entity, academic_term::Column::TermType))
                .eq(AcademicTermType::Annual),
            Expr::val(2),
        )
        .finally(Expr::val(3))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_ladder_index() {
        assert_eq!(grade_ladder_index("PRE-NURSERY"), 0);
        assert_eq!(grade_ladder_index("I"), 4);
        assert_eq!(grade_ladder_index("XII"), 15);
        // Unknown grades sort last
        assert_eq!(grade_ladder_index("XIII"), 16);
    }

    #[test]
    fn test_term_rank_order() {
        assert!(AcademicTermType::Quarterly.rank() < AcademicTermType::HalfYearly.rank());
        assert!(AcademicTermType::HalfYearly.rank() < AcademicTermType::Annual.rank());
    }
}
