mod open;
mod insert;
mod targets;

pub use open::ReportWriter;
pub use targets::*;
