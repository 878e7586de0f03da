pub mod check;
pub mod command;
pub mod result;
pub mod rule;
pub mod sample;

pub use check::{CheckDefinition, CheckPlan, Probe, Remediation, Step, Surface};
pub use command::{CommandSpec, ProbeOutput};
pub use result::{ActionTaken, CheckResult, Finding};
pub use rule::{Limit, ThresholdRule};
pub use sample::{Sample, Value};
