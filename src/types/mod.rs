//! Data types for clinical-trial extraction.

pub mod classification;
pub mod config;
pub mod report;
pub mod trial;

pub use classification::{Confidence, StudyClassification};
pub use config::PipelineConfig;
pub use report::ExtractionReport;
pub use trial::{
    ArmAllocation, ClinicalTrial, ConfidenceInterval, DesignInfo, Dosing, EventCount,
    MeasureType, Outcome, OutcomeBuckets, Population, Safety, SafetyEvent, TrialDesign,
    TrialInfo,
};
