//! 底层引擎抽象
//!
//! StructureEngine：会修改引擎状态的原语（加载、相机、表示对象、组件可见性、链高亮），只由控制器调用。
//! SelectionSource：只读的选区/交互状态与事件订阅，供 SelectionTracker 使用。

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::viewer::{
    Component, ElementProperties, ElementRef, Representation, RepresentationId, SelectionEntry,
    StructureFormat, StructureSummary, ViewerError, ViewerEvent,
};

/// 可变引擎原语
#[async_trait]
pub trait StructureEngine: Send + Sync {
    /// 清空当前场景（加载新结构前调用）
    async fn clear(&self) -> Result<(), ViewerError>;

    async fn load(
        &self,
        source: &str,
        format: StructureFormat,
    ) -> Result<StructureSummary, ViewerError>;

    async fn reset_camera(&self) -> Result<(), ViewerError>;

    /// factor < 1 拉近，> 1 拉远
    async fn scale_camera(&self, factor: f32) -> Result<(), ViewerError>;

    async fn add_representation(
        &self,
        component: Component,
        kind: Representation,
    ) -> Result<RepresentationId, ViewerError>;

    async fn remove_representation(&self, id: RepresentationId) -> Result<(), ViewerError>;

    async fn set_component_visible(
        &self,
        component: Component,
        visible: bool,
    ) -> Result<(), ViewerError>;

    async fn focus_chain(&self, chain_id: &str) -> Result<(), ViewerError>;

    async fn overpaint_chain(&self, chain_id: &str) -> Result<(), ViewerError>;

    async fn clear_overpaint(&self) -> Result<(), ViewerError>;

    /// 当前结构摘要（同步读取）
    fn structure(&self) -> Option<StructureSummary>;
}

/// 只读选区来源
pub trait SelectionSource: Send + Sync {
    fn has_structure(&self) -> bool;

    /// 选区管理器当前记录
    fn selection_entries(&self) -> Vec<SelectionEntry>;

    /// 最近一次悬停/点击高亮记录
    fn interaction_highlight(&self) -> Option<SelectionEntry>;

    fn element_properties(&self, element: ElementRef) -> Option<ElementProperties>;

    fn subscribe(&self) -> broadcast::Receiver<ViewerEvent>;
}
