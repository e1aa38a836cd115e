//! Admin-side transforms over an in-memory booking snapshot, plus the
//! console state machine for reversible deletes and inline edits.

pub mod view;
pub mod export;
pub mod summary;
pub mod console;

pub use console::{AdminConsole, ConsoleError};
pub use export::{export, ExportDocument, ExportError, ExportFormat};
pub use summary::DashboardSummary;
pub use view::{FilterMode, SortDirection, SortKey, SortSpec, ViewState, PAGE_SIZE};
