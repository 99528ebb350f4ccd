//! 查看器层：能力接口、底层引擎抽象、控制器与无界面内存引擎

pub mod capability;
pub mod controller;
pub mod engine;
pub mod headless;
pub mod pdb;
pub mod types;

pub use capability::ViewerCapability;
pub use controller::ViewerController;
pub use engine::{SelectionSource, StructureEngine};
pub use headless::{HeadlessEngine, HeadlessSnapshot};
pub use types::{
    ChainSummary, Component, ElementProperties, ElementRef, Representation, RepresentationId,
    SelectionEntry, StructureFormat, StructureSummary, ViewerError, ViewerEvent,
};
