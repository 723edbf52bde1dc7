//! CSV observation loading and split-scan artifact writing for cartsplit.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{ExperimentName, ObservationSet};
pub use error::IoError;
pub use reader::ObservationReader;
pub use writer::ResultWriter;
