pub mod access;
pub mod analysis;
pub mod config;
pub mod domain;
pub mod errors;
pub mod pipeline;
pub mod recommend;
pub mod transfers;

pub use access::{AccessContext, AccessResolver, AccessScope, FallbackPolicy};
pub use analysis::aggregate::{aggregate, ClientPeriodTotals};
pub use analysis::detectors::{
    detect_all, detect_avg_check_drops, detect_frequency_drops, detect_missed_forecasts,
    detect_revenue_drops,
};
pub use analysis::signal::{Signal, SignalKind};
pub use analysis::window::AnalysisWindow;
pub use domain::action::{ClientAction, ClientActionRecord, ClientStatus};
pub use domain::directory::{DirectoryEntry, DirectoryLookup, ManagerDirectory};
pub use domain::employee::{DepartmentId, Employee, EmployeeDirectory, EmployeeId, EmployeeRole};
pub use domain::filter::FilterContext;
pub use domain::sale::{parse_revenue, ClientCode, Sale, SaleRecord};
pub use errors::{ApplicationError, DomainError};
pub use pipeline::{run_analysis, AnalysisInputs, AnalysisReport, AnalysisRequest};
pub use recommend::{Priority, Recommendation, RecommendedAction};
pub use transfers::{
    segment_tenures, summarize, TenurePeriod, TransferDetector, TransferEvent, TransferSource,
    TransferStatistics,
};
