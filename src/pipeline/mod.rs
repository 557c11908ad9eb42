// Pipeline outputs
// Run reports and curve export for a finished bake

pub mod export;
pub mod report;

pub use export::{export_curves, write_curves, CurveExport, ExportError, ExportedCurve};
pub use report::{
    read_report_file, report_entries, InstrumentStatus, ReportEntry, ReportError, ReportWriter,
};
