pub mod detector;
pub mod segmentation;
pub mod stats;

pub use self::detector::{TransferDetector, TransferEvent, TransferSource};
pub use self::segmentation::{segment_tenures, TenurePeriod};
pub use self::stats::{
    summarize, DepartmentTransferSummary, ManagerTransferSummary, PeriodBucket,
    TransferStatistics,
};
