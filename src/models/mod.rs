mod finding;
mod inventory;
mod report;

pub use finding::{Finding, FindingCategory, Severity};
pub use inventory::{
    AuthMode, DeviceUpdate, Network, NetworkUpdate, Organization, SsidUpdate,
};
pub use report::{DiagnosisReport, HealthReport, HealthSummary, NetworkHealth};
