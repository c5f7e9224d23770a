pub mod cache;
pub mod clock;
pub mod provider;
pub mod sources;
pub mod tokens;

pub use cache::TtlCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use provider::{CachedDataProvider, DataProviderConfig};
pub use sources::{
    ActionRecordSource, DirectorySource, EmployeeSource, InMemoryActionRecordSource,
    InMemoryDirectorySource, InMemoryEmployeeSource, InMemorySalesSource, SalesSource,
    ScriptedSalesSource, SourceError,
};
pub use tokens::TokenGate;
