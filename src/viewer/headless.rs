//! 无界面内存引擎
//!
//! 解析 PDB 坐标，维护表示对象 / 组件可见性 / 相机 / 高亮状态，并可模拟选择、点击、悬停交互（广播 ViewerEvent）。
//! 供命令行会话与测试使用；真实渲染引擎实现同样的 StructureEngine + SelectionSource 即可替换。

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::viewer::pdb::{parse_pdb, AtomRecord};
use crate::viewer::{
    ChainSummary, Component, ElementProperties, ElementRef, Representation, RepresentationId,
    SelectionEntry, SelectionSource, StructureEngine, StructureFormat, StructureSummary,
    ViewerError, ViewerEvent,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// 渲染状态快照（测试与 /status 使用）
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessSnapshot {
    pub structure: Option<String>,
    pub representations: Vec<(Component, Representation)>,
    pub hidden: Vec<Component>,
    pub highlighted_chains: Vec<String>,
    pub focused_chain: Option<String>,
    pub zoom: f32,
}

impl HeadlessSnapshot {
    pub fn component_visible(&self, component: Component) -> bool {
        !self.hidden.contains(&component)
            && self.representations.iter().any(|(c, _)| *c == component)
    }

    pub fn polymer_representation(&self) -> Option<Representation> {
        self.representations
            .iter()
            .find(|(c, _)| *c == Component::Polymer)
            .map(|(_, r)| *r)
    }
}

struct LoadedStructure {
    summary: StructureSummary,
    atoms: Vec<AtomRecord>,
    representations: BTreeMap<u64, (Component, Representation)>,
    hidden: HashSet<Component>,
    highlighted: BTreeSet<String>,
    focused_chain: Option<String>,
    zoom: f32,
}

#[derive(Default)]
struct EngineState {
    structure: Option<LoadedStructure>,
    selection: Vec<SelectionEntry>,
    highlight: Option<SelectionEntry>,
    next_representation: u64,
}

/// 内存引擎
pub struct HeadlessEngine {
    state: Mutex<EngineState>,
    /// 预置的来源（名称 -> PDB 文本），优先于文件系统
    sources: Mutex<HashMap<String, String>>,
    events: broadcast::Sender<ViewerEvent>,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(EngineState::default()),
            sources: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// 预置一个内存来源，load 时按名称命中
    pub fn with_source(self, name: impl Into<String>, pdb_text: impl Into<String>) -> Self {
        self.add_source(name, pdb_text);
        self
    }

    pub fn add_source(&self, name: impl Into<String>, pdb_text: impl Into<String>) {
        lock(&self.sources).insert(name.into(), pdb_text.into());
    }

    pub fn snapshot(&self) -> HeadlessSnapshot {
        let state = lock(&self.state);
        match &state.structure {
            Some(s) => HeadlessSnapshot {
                structure: Some(s.summary.name.clone()),
                representations: s.representations.values().copied().collect(),
                hidden: s.hidden.iter().copied().collect(),
                highlighted_chains: s.highlighted.iter().cloned().collect(),
                focused_chain: s.focused_chain.clone(),
                zoom: s.zoom,
            },
            None => HeadlessSnapshot {
                structure: None,
                representations: Vec::new(),
                hidden: Vec::new(),
                highlighted_chains: Vec::new(),
                focused_chain: None,
                zoom: 1.0,
            },
        }
    }

    /// 模拟选区提交：写入选区管理器并广播 SelectionChanged。越界的原子下标会被丢弃
    pub fn select_atoms(&self, indices: &[usize]) {
        {
            let mut state = lock(&self.state);
            let count = state.structure.as_ref().map(|s| s.atoms.len()).unwrap_or(0);
            let elements: Vec<ElementRef> = indices
                .iter()
                .copied()
                .filter(|i| *i < count)
                .map(ElementRef)
                .collect();
            state.selection = vec![SelectionEntry::new(elements)];
        }
        self.emit(ViewerEvent::SelectionChanged);
    }

    /// 按残基选择（链 + 残基号下的全部原子）
    pub fn select_residue(&self, chain_id: &str, residue_number: i32) {
        let indices: Vec<usize> = {
            let state = lock(&self.state);
            state
                .structure
                .as_ref()
                .map(|s| {
                    s.atoms
                        .iter()
                        .enumerate()
                        .filter(|(_, a)| a.chain_id == chain_id && a.residue_number == residue_number)
                        .map(|(i, _)| i)
                        .collect()
                })
                .unwrap_or_default()
        };
        self.select_atoms(&indices);
    }

    pub fn clear_selection(&self) {
        lock(&self.state).selection.clear();
        self.emit(ViewerEvent::SelectionChanged);
    }

    /// 模拟点击：只更新交互高亮记录（选区管理器不变），element 为 None 表示点在空白处
    pub fn click(&self, atom: Option<usize>) {
        let element = self.set_highlight(atom);
        self.emit(ViewerEvent::Click { element });
    }

    pub fn hover(&self, atom: Option<usize>) {
        let element = self.set_highlight(atom);
        self.emit(ViewerEvent::Hover { element });
    }

    fn set_highlight(&self, atom: Option<usize>) -> Option<ElementRef> {
        let mut state = lock(&self.state);
        let count = state.structure.as_ref().map(|s| s.atoms.len()).unwrap_or(0);
        let element = atom.filter(|i| *i < count).map(ElementRef);
        state.highlight = element.map(|e| SelectionEntry::new(vec![e]));
        element
    }

    fn emit(&self, event: ViewerEvent) {
        // 无订阅者时 send 返回 Err，属正常情况
        let _ = self.events.send(event);
    }

    async fn read_source(&self, source: &str) -> Result<String, ViewerError> {
        if let Some(text) = lock(&self.sources).get(source).cloned() {
            return Ok(text);
        }
        if source.starts_with("http://") || source.starts_with("https://") {
            return Err(ViewerError::Unsupported(format!(
                "remote source {source} (headless engine reads local files only)"
            )));
        }
        tokio::fs::read_to_string(source)
            .await
            .map_err(|e| ViewerError::LoadFailed(format!("{source}: {e}")))
    }

    fn with_structure<T>(
        &self,
        f: impl FnOnce(&mut LoadedStructure) -> Result<T, ViewerError>,
    ) -> Result<T, ViewerError> {
        let mut state = lock(&self.state);
        let structure = state.structure.as_mut().ok_or(ViewerError::NoStructure)?;
        f(structure)
    }
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn summarize(name: &str, format: StructureFormat, atoms: &[AtomRecord]) -> StructureSummary {
    let mut residues: BTreeMap<String, BTreeSet<i32>> = BTreeMap::new();
    let mut waters = BTreeSet::new();
    let mut ligands = BTreeSet::new();
    for atom in atoms {
        if atom.is_water() {
            waters.insert((atom.chain_id.clone(), atom.residue_number));
        } else if atom.is_ligand() {
            ligands.insert(atom.residue_name.clone());
        } else {
            residues
                .entry(atom.chain_id.clone())
                .or_default()
                .insert(atom.residue_number);
        }
    }
    StructureSummary {
        name: name.to_string(),
        format,
        atom_count: atoms.len(),
        chains: residues
            .into_iter()
            .map(|(id, set)| ChainSummary {
                id,
                residue_count: set.len(),
            })
            .collect(),
        water_count: waters.len(),
        ligand_names: ligands.into_iter().collect(),
    }
}

/// 来源路径的文件名部分（去掉扩展名）作为结构名
fn structure_name(source: &str) -> String {
    let file = source.rsplit(['/', '\\']).next().unwrap_or(source);
    file.split('.').next().filter(|s| !s.is_empty()).unwrap_or(file).to_string()
}

#[async_trait]
impl StructureEngine for HeadlessEngine {
    async fn clear(&self) -> Result<(), ViewerError> {
        let mut state = lock(&self.state);
        state.structure = None;
        state.selection.clear();
        state.highlight = None;
        Ok(())
    }

    async fn load(
        &self,
        source: &str,
        format: StructureFormat,
    ) -> Result<StructureSummary, ViewerError> {
        if format == StructureFormat::Mmcif {
            return Err(ViewerError::Unsupported(
                "mmCIF parsing in the headless engine".to_string(),
            ));
        }
        let text = self.read_source(source).await?;
        let atoms = parse_pdb(&text).map_err(|e| ViewerError::LoadFailed(e.to_string()))?;
        let summary = summarize(&structure_name(source), format, &atoms);

        {
            let mut state = lock(&self.state);
            state.structure = Some(LoadedStructure {
                summary: summary.clone(),
                atoms,
                representations: BTreeMap::new(),
                hidden: HashSet::new(),
                highlighted: BTreeSet::new(),
                focused_chain: None,
                zoom: 1.0,
            });
            state.selection.clear();
            state.highlight = None;
        }
        tracing::debug!(name = %summary.name, atoms = summary.atom_count, "headless structure loaded");
        self.emit(ViewerEvent::StructureLoaded {
            name: summary.name.clone(),
        });
        Ok(summary)
    }

    async fn reset_camera(&self) -> Result<(), ViewerError> {
        self.with_structure(|s| {
            s.zoom = 1.0;
            s.focused_chain = None;
            Ok(())
        })
    }

    async fn scale_camera(&self, factor: f32) -> Result<(), ViewerError> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(ViewerError::Engine(format!("invalid zoom factor {factor}")));
        }
        self.with_structure(|s| {
            s.zoom *= factor;
            Ok(())
        })
    }

    async fn add_representation(
        &self,
        component: Component,
        kind: Representation,
    ) -> Result<RepresentationId, ViewerError> {
        let mut state = lock(&self.state);
        state.next_representation += 1;
        let id = state.next_representation;
        let structure = state.structure.as_mut().ok_or(ViewerError::NoStructure)?;
        structure.representations.insert(id, (component, kind));
        structure.hidden.remove(&component);
        Ok(RepresentationId(id))
    }

    async fn remove_representation(&self, id: RepresentationId) -> Result<(), ViewerError> {
        self.with_structure(|s| {
            s.representations
                .remove(&id.0)
                .map(|_| ())
                .ok_or_else(|| ViewerError::Engine(format!("unknown representation {}", id.0)))
        })
    }

    async fn set_component_visible(
        &self,
        component: Component,
        visible: bool,
    ) -> Result<(), ViewerError> {
        self.with_structure(|s| {
            if visible {
                s.hidden.remove(&component);
            } else {
                s.hidden.insert(component);
            }
            Ok(())
        })
    }

    async fn focus_chain(&self, chain_id: &str) -> Result<(), ViewerError> {
        self.with_structure(|s| {
            if !s.summary.has_chain(chain_id) {
                return Err(ViewerError::ChainNotFound(chain_id.to_string()));
            }
            s.focused_chain = Some(chain_id.to_string());
            Ok(())
        })
    }

    async fn overpaint_chain(&self, chain_id: &str) -> Result<(), ViewerError> {
        self.with_structure(|s| {
            if !s.summary.has_chain(chain_id) {
                return Err(ViewerError::ChainNotFound(chain_id.to_string()));
            }
            s.highlighted.insert(chain_id.to_string());
            Ok(())
        })
    }

    async fn clear_overpaint(&self) -> Result<(), ViewerError> {
        self.with_structure(|s| {
            s.highlighted.clear();
            Ok(())
        })
    }

    fn structure(&self) -> Option<StructureSummary> {
        lock(&self.state).structure.as_ref().map(|s| s.summary.clone())
    }
}

impl SelectionSource for HeadlessEngine {
    fn has_structure(&self) -> bool {
        lock(&self.state).structure.is_some()
    }

    fn selection_entries(&self) -> Vec<SelectionEntry> {
        lock(&self.state).selection.clone()
    }

    fn interaction_highlight(&self) -> Option<SelectionEntry> {
        lock(&self.state).highlight.clone()
    }

    fn element_properties(&self, element: ElementRef) -> Option<ElementProperties> {
        let state = lock(&self.state);
        let atom = state.structure.as_ref()?.atoms.get(element.0)?;
        Some(ElementProperties {
            residue_name: Some(atom.residue_name.clone()),
            residue_number: Some(atom.residue_number),
            chain_id: Some(atom.chain_id.clone()),
            atom_name: Some(atom.name.clone()),
            element_symbol: Some(atom.element.clone()),
            position: Some(atom.position),
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<ViewerEvent> {
        self.events.subscribe()
    }
}
