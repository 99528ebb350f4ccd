//! 查看器能力接口
//!
//! 命令执行器只通过 ViewerCapability 控制/查询查看器；所有方法异步，失败以 Err(ViewerError) 表示。

use async_trait::async_trait;

use crate::selection::SelectionInfo;
use crate::viewer::{Representation, StructureFormat, ViewerError};

/// 查看器能力：加载、相机、表示方式、组件可见性、高亮、选区与结构信息
#[async_trait]
pub trait ViewerCapability: Send + Sync {
    /// 加载结构；format 为 None 时按来源扩展名推断
    async fn load_structure(
        &self,
        source: &str,
        format: Option<StructureFormat>,
    ) -> Result<(), ViewerError>;

    async fn reset_view(&self) -> Result<(), ViewerError>;

    async fn zoom_in(&self) -> Result<(), ViewerError>;

    async fn zoom_out(&self) -> Result<(), ViewerError>;

    async fn set_representation(&self, kind: Representation) -> Result<(), ViewerError>;

    async fn show_water_molecules(&self) -> Result<(), ViewerError>;

    async fn hide_water_molecules(&self) -> Result<(), ViewerError>;

    async fn hide_ligands(&self) -> Result<(), ViewerError>;

    async fn focus_on_chain(&self, chain_id: &str) -> Result<(), ViewerError>;

    async fn highlight_chain(&self, chain_id: &str) -> Result<(), ViewerError>;

    async fn clear_highlights(&self) -> Result<(), ViewerError>;

    /// 当前选区的详细文本
    async fn selection_info(&self) -> Result<String, ViewerError>;

    /// 当前选区（单选区模型，无选区时为 None）
    async fn current_selection(&self) -> Result<Option<SelectionInfo>, ViewerError>;

    /// 已加载结构的摘要文本
    async fn structure_info(&self) -> Result<String, ViewerError>;
}
