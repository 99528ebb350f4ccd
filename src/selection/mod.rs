//! 选区层：单一当前选区的跟踪、多策略提取与氨基酸元数据

pub mod amino_acids;
pub mod extract;
pub mod info;
pub mod tracker;

pub use amino_acids::{lookup as lookup_amino_acid, AminoAcid, SideChainClass};
pub use extract::{
    extract_selection, Extraction, ExtractionFailure, ExtractionOutcome, ExtractionStrategy,
    FailureReason, StrategyFailure,
};
pub use info::{Coordinates, SelectionInfo};
pub use tracker::{SelectionState, SelectionTracker, TrackerConfig, TrackerUpdate, Trigger};
