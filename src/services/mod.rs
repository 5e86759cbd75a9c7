//! Report pipeline: periods -> request -> pivot -> comparison -> export

pub mod comparison;
pub mod export;
pub mod periods;
pub mod pivot;
pub mod report;
pub mod request;

pub use comparison::{build_table, change_rate, YearOverYear};
pub use export::{artifact_name, workbook_bytes, WorkbookExporter, XLSX_MIME};
pub use pivot::Pivot;
pub use report::ReportService;
pub use request::{validate_institution_id, ReportRequest};
