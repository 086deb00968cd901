pub mod academic_session;
pub mod academic_term;
pub mod academic_class;
pub mod subject;
pub mod academic_class_subject;
pub mod student;
pub mod enrollment;
pub mod report_card;
pub mod report_card_subject;
pub mod date_sheet;
pub mod date_sheet_subject;
pub mod user;
pub mod app_setting;
