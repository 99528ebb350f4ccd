//! 查看器控制器：在 StructureEngine 之上实现 ViewerCapability
//!
//! 维护表示对象簿记（聚合物 / 水 / 配体表示的句柄）与当前表示方式，并持有 SelectionTracker。
//! 加载新结构时先同步清空选区与水表示簿记，再开始任何异步加载，避免引用过期对象。

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::assistant::{AssistantContext, ContextSource};
use crate::selection::{SelectionInfo, SelectionTracker, TrackerConfig};
use crate::viewer::{
    Component, Representation, RepresentationId, SelectionSource, StructureEngine,
    StructureFormat, StructureSummary, ViewerCapability, ViewerError,
};

const ZOOM_IN_FACTOR: f32 = 0.8;
const ZOOM_OUT_FACTOR: f32 = 1.25;

#[derive(Debug, Default)]
struct Bookkeeping {
    polymer: Option<RepresentationId>,
    water: Option<RepresentationId>,
    representation: Representation,
    structure_name: Option<String>,
}

pub struct ViewerController {
    engine: Arc<dyn StructureEngine>,
    tracker: Arc<SelectionTracker>,
    books: Mutex<Bookkeeping>,
}

impl ViewerController {
    pub fn new<E>(engine: Arc<E>, tracker_config: TrackerConfig) -> Self
    where
        E: StructureEngine + SelectionSource + 'static,
    {
        let source: Arc<dyn SelectionSource> = engine.clone();
        Self {
            engine,
            tracker: Arc::new(SelectionTracker::new(source, tracker_config)),
            books: Mutex::new(Bookkeeping::default()),
        }
    }

    pub fn tracker(&self) -> &Arc<SelectionTracker> {
        &self.tracker
    }

    pub fn representation(&self) -> Representation {
        self.books().representation
    }

    /// 供 AI 提示词使用的当前上下文
    pub fn context(&self) -> AssistantContext {
        let books = self.books();
        AssistantContext {
            structure_name: books.structure_name.clone(),
            representation: books.representation,
            has_structure_loaded: self.engine.structure().is_some(),
        }
    }

    /// 释放选区订阅（会话结束时调用）
    pub fn shutdown(&self) {
        self.tracker.shutdown();
    }

    fn books(&self) -> MutexGuard<'_, Bookkeeping> {
        self.books.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn require_structure(&self) -> Result<StructureSummary, ViewerError> {
        self.engine.structure().ok_or(ViewerError::NoStructure)
    }
}

impl ContextSource for ViewerController {
    fn assistant_context(&self) -> AssistantContext {
        self.context()
    }
}

fn format_structure_info(summary: &StructureSummary, representation: Representation) -> String {
    let chains = summary
        .chains
        .iter()
        .map(|c| format!("{} ({} residues)", c.id, c.residue_count))
        .collect::<Vec<_>>()
        .join(", ");
    let ligands = if summary.ligand_names.is_empty() {
        "none".to_string()
    } else {
        summary.ligand_names.join(", ")
    };
    format!(
        "Structure: {} ({})\nChains: {}\nResidues: {}\nAtoms: {}\nWater molecules: {}\nLigands: {}\nRepresentation: {}",
        summary.name,
        summary.format.label(),
        if chains.is_empty() { "none".to_string() } else { chains },
        summary.residue_count(),
        summary.atom_count,
        summary.water_count,
        ligands,
        representation,
    )
}

#[async_trait]
impl ViewerCapability for ViewerController {
    async fn load_structure(
        &self,
        source: &str,
        format: Option<StructureFormat>,
    ) -> Result<(), ViewerError> {
        // 同步清理：必须在第一个 await 之前完成
        self.tracker.reset();
        {
            let mut books = self.books();
            *books = Bookkeeping::default();
        }

        let format = format.unwrap_or_else(|| StructureFormat::infer(source));
        tracing::info!(source, ?format, "loading structure");
        self.engine.clear().await?;
        let summary = self.engine.load(source, format).await?;

        let polymer = self
            .engine
            .add_representation(Component::Polymer, Representation::Cartoon)
            .await?;
        if !summary.ligand_names.is_empty() {
            self.engine
                .add_representation(Component::Ligand, Representation::BallAndStick)
                .await?;
        }

        {
            let mut books = self.books();
            books.polymer = Some(polymer);
            books.structure_name = Some(summary.name.clone());
        }
        self.tracker.start();
        tracing::info!(name = %summary.name, atoms = summary.atom_count, "structure loaded");
        Ok(())
    }

    async fn reset_view(&self) -> Result<(), ViewerError> {
        self.engine.reset_camera().await
    }

    async fn zoom_in(&self) -> Result<(), ViewerError> {
        self.engine.scale_camera(ZOOM_IN_FACTOR).await
    }

    async fn zoom_out(&self) -> Result<(), ViewerError> {
        self.engine.scale_camera(ZOOM_OUT_FACTOR).await
    }

    async fn set_representation(&self, kind: Representation) -> Result<(), ViewerError> {
        self.require_structure()?;
        // 旧句柄只在引擎确认移除后才清掉
        let previous = self.books().polymer;
        if let Some(id) = previous {
            self.engine.remove_representation(id).await?;
            self.books().polymer = None;
        }
        let id = self
            .engine
            .add_representation(Component::Polymer, kind)
            .await?;
        let mut books = self.books();
        books.polymer = Some(id);
        books.representation = kind;
        Ok(())
    }

    async fn show_water_molecules(&self) -> Result<(), ViewerError> {
        self.require_structure()?;
        if self.books().water.is_some() {
            return self
                .engine
                .set_component_visible(Component::Water, true)
                .await;
        }
        let id = self
            .engine
            .add_representation(Component::Water, Representation::BallAndStick)
            .await?;
        self.books().water = Some(id);
        Ok(())
    }

    async fn hide_water_molecules(&self) -> Result<(), ViewerError> {
        self.require_structure()?;
        let water = self.books().water.take();
        match water {
            Some(id) => self.engine.remove_representation(id).await,
            None => Ok(()),
        }
    }

    async fn hide_ligands(&self) -> Result<(), ViewerError> {
        self.engine
            .set_component_visible(Component::Ligand, false)
            .await
    }

    async fn focus_on_chain(&self, chain_id: &str) -> Result<(), ViewerError> {
        self.engine.focus_chain(chain_id).await
    }

    async fn highlight_chain(&self, chain_id: &str) -> Result<(), ViewerError> {
        self.engine.overpaint_chain(chain_id).await
    }

    async fn clear_highlights(&self) -> Result<(), ViewerError> {
        self.engine.clear_overpaint().await
    }

    async fn selection_info(&self) -> Result<String, ViewerError> {
        Ok(match self.tracker.current() {
            Some(info) => info.details(),
            None => "No atom or residue is currently selected. Click on the structure to select one."
                .to_string(),
        })
    }

    async fn current_selection(&self) -> Result<Option<SelectionInfo>, ViewerError> {
        Ok(self.tracker.current())
    }

    async fn structure_info(&self) -> Result<String, ViewerError> {
        let summary = self.require_structure()?;
        Ok(format_structure_info(&summary, self.representation()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use tokio::sync::broadcast;

    use super::*;
    use crate::selection::Trigger;
    use crate::viewer::pdb::tests::SAMPLE_PDB;
    use crate::viewer::{
        ElementProperties, ElementRef, HeadlessEngine, SelectionEntry, ViewerEvent,
    };

    async fn loaded() -> (Arc<HeadlessEngine>, ViewerController) {
        let engine = Arc::new(HeadlessEngine::new().with_source("sample.pdb", SAMPLE_PDB));
        let controller = ViewerController::new(engine.clone(), TrackerConfig::default());
        controller.load_structure("sample.pdb", None).await.unwrap();
        (engine, controller)
    }

    #[tokio::test]
    async fn test_load_sets_default_representations() {
        let (engine, controller) = loaded().await;
        let snap = engine.snapshot();
        assert_eq!(snap.polymer_representation(), Some(Representation::Cartoon));
        assert!(snap.component_visible(Component::Ligand));
        assert!(!snap.component_visible(Component::Water));
        assert!(controller.tracker().is_monitoring());

        let ctx = controller.context();
        assert_eq!(ctx.structure_name.as_deref(), Some("sample"));
        assert!(ctx.has_structure_loaded);
    }

    #[tokio::test]
    async fn test_representation_switch_replaces_polymer() {
        let (engine, controller) = loaded().await;
        controller.set_representation(Representation::Surface).await.unwrap();
        let snap = engine.snapshot();
        let polymers: Vec<_> = snap
            .representations
            .iter()
            .filter(|(c, _)| *c == Component::Polymer)
            .collect();
        assert_eq!(polymers.len(), 1);
        assert_eq!(snap.polymer_representation(), Some(Representation::Surface));
        assert_eq!(controller.representation(), Representation::Surface);
    }

    /// 第一次 remove_representation 失败，其余委托给 HeadlessEngine
    struct FlakyRemoveEngine {
        inner: HeadlessEngine,
        fail_next_remove: AtomicBool,
    }

    #[async_trait]
    impl StructureEngine for FlakyRemoveEngine {
        async fn clear(&self) -> Result<(), ViewerError> {
            self.inner.clear().await
        }

        async fn load(
            &self,
            source: &str,
            format: StructureFormat,
        ) -> Result<StructureSummary, ViewerError> {
            self.inner.load(source, format).await
        }

        async fn reset_camera(&self) -> Result<(), ViewerError> {
            self.inner.reset_camera().await
        }

        async fn scale_camera(&self, factor: f32) -> Result<(), ViewerError> {
            self.inner.scale_camera(factor).await
        }

        async fn add_representation(
            &self,
            component: Component,
            kind: Representation,
        ) -> Result<RepresentationId, ViewerError> {
            self.inner.add_representation(component, kind).await
        }

        async fn remove_representation(&self, id: RepresentationId) -> Result<(), ViewerError> {
            if self.fail_next_remove.swap(false, Ordering::SeqCst) {
                return Err(ViewerError::Engine("transient".into()));
            }
            self.inner.remove_representation(id).await
        }

        async fn set_component_visible(
            &self,
            component: Component,
            visible: bool,
        ) -> Result<(), ViewerError> {
            self.inner.set_component_visible(component, visible).await
        }

        async fn focus_chain(&self, chain_id: &str) -> Result<(), ViewerError> {
            self.inner.focus_chain(chain_id).await
        }

        async fn overpaint_chain(&self, chain_id: &str) -> Result<(), ViewerError> {
            self.inner.overpaint_chain(chain_id).await
        }

        async fn clear_overpaint(&self) -> Result<(), ViewerError> {
            self.inner.clear_overpaint().await
        }

        fn structure(&self) -> Option<StructureSummary> {
            StructureEngine::structure(&self.inner)
        }
    }

    impl SelectionSource for FlakyRemoveEngine {
        fn has_structure(&self) -> bool {
            self.inner.has_structure()
        }

        fn selection_entries(&self) -> Vec<SelectionEntry> {
            self.inner.selection_entries()
        }

        fn interaction_highlight(&self) -> Option<SelectionEntry> {
            self.inner.interaction_highlight()
        }

        fn element_properties(&self, element: ElementRef) -> Option<ElementProperties> {
            self.inner.element_properties(element)
        }

        fn subscribe(&self) -> broadcast::Receiver<ViewerEvent> {
            self.inner.subscribe()
        }
    }

    #[tokio::test]
    async fn test_failed_remove_keeps_polymer_handle() {
        let engine = Arc::new(FlakyRemoveEngine {
            inner: HeadlessEngine::new().with_source("sample.pdb", SAMPLE_PDB),
            fail_next_remove: AtomicBool::new(false),
        });
        let controller = ViewerController::new(engine.clone(), TrackerConfig::default());
        controller.load_structure("sample.pdb", None).await.unwrap();

        engine.fail_next_remove.store(true, Ordering::SeqCst);
        let err = controller.set_representation(Representation::Surface).await;
        assert_eq!(err, Err(ViewerError::Engine("transient".into())));
        assert_eq!(controller.representation(), Representation::Cartoon);

        controller.set_representation(Representation::Spacefill).await.unwrap();
        let snap = engine.inner.snapshot();
        let polymers: Vec<_> = snap
            .representations
            .iter()
            .filter(|(c, _)| *c == Component::Polymer)
            .collect();
        assert_eq!(polymers, vec![&(Component::Polymer, Representation::Spacefill)]);
        assert_eq!(controller.representation(), Representation::Spacefill);
    }

    #[tokio::test]
    async fn test_water_toggle() {
        let (engine, controller) = loaded().await;
        controller.show_water_molecules().await.unwrap();
        controller.show_water_molecules().await.unwrap();
        assert!(engine.snapshot().component_visible(Component::Water));
        controller.hide_water_molecules().await.unwrap();
        assert!(!engine.snapshot().component_visible(Component::Water));
        controller.hide_water_molecules().await.unwrap();
    }

    #[tokio::test]
    async fn test_reload_clears_selection_before_loading() {
        let (engine, controller) = loaded().await;
        engine.select_residue("B", 7);
        controller.tracker().refresh(Trigger::Manual);
        assert!(controller.current_selection().await.unwrap().is_some());

        // 加载失败也必须已经清空选区
        let result = controller.load_structure("missing.pdb", None).await;
        assert!(result.is_err());
        assert!(controller.current_selection().await.unwrap().is_none());
        assert!(!controller.context().has_structure_loaded);
    }

    #[tokio::test]
    async fn test_structure_info() {
        let (_engine, controller) = loaded().await;
        let info = controller.structure_info().await.unwrap();
        assert!(info.contains("Structure: sample (PDB)"));
        assert!(info.contains("A (2 residues), B (1 residues)"));
        assert!(info.contains("Ligands: HEM"));

        let empty = ViewerController::new(Arc::new(HeadlessEngine::new()), TrackerConfig::default());
        assert_eq!(empty.structure_info().await, Err(ViewerError::NoStructure));
        assert!(empty
            .selection_info()
            .await
            .unwrap()
            .starts_with("No atom or residue"));
    }
}
