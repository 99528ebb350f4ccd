//! 查看器共享类型：表示方式、结构组件、事件与错误
//!
//! ViewerCapability（控制面）与 StructureEngine / SelectionSource（引擎面）共用这些类型。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 引擎调用失败（以 Err 返回，不使用哨兵值）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewerError {
    #[error("No structure loaded")]
    NoStructure,

    #[error("Chain not found: {0}")]
    ChainNotFound(String),

    #[error("Failed to load structure: {0}")]
    LoadFailed(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Engine error: {0}")]
    Engine(String),
}

/// 聚合物表示方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    #[default]
    Cartoon,
    Surface,
    BallAndStick,
    Spacefill,
}

impl Representation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Representation::Cartoon => "cartoon",
            Representation::Surface => "surface",
            Representation::BallAndStick => "ball-and-stick",
            Representation::Spacefill => "spacefill",
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 结构文件格式；未指定时按扩展名推断
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureFormat {
    Pdb,
    Mmcif,
}

impl StructureFormat {
    pub fn label(&self) -> &'static str {
        match self {
            StructureFormat::Pdb => "PDB",
            StructureFormat::Mmcif => "mmCIF",
        }
    }

    /// 根据来源路径/URL 的扩展名推断格式，无法识别时回落到 PDB
    pub fn infer(source: &str) -> Self {
        let lower = source.to_lowercase();
        let lower = lower.split(['?', '#']).next().unwrap_or_default();
        if lower.ends_with(".cif") || lower.ends_with(".mmcif") || lower.ends_with(".bcif") {
            StructureFormat::Mmcif
        } else {
            StructureFormat::Pdb
        }
    }
}

impl FromStr for StructureFormat {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdb" | "ent" => Ok(StructureFormat::Pdb),
            "cif" | "mmcif" => Ok(StructureFormat::Mmcif),
            other => Err(ViewerError::Unsupported(format!("structure format '{other}'"))),
        }
    }
}

/// 结构中的可独立显示/隐藏的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Polymer,
    Water,
    Ligand,
}

/// 引擎内表示对象的句柄（add_representation 返回，remove 时使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RepresentationId(pub u64);

/// 可寻址的结构元素（原子）引用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef(pub usize);

/// 选区管理器中的一条记录；elements 为空时该记录不可用
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionEntry {
    pub elements: Vec<ElementRef>,
}

impl SelectionEntry {
    pub fn new(elements: Vec<ElementRef>) -> Self {
        Self { elements }
    }

    pub fn is_addressable(&self) -> bool {
        !self.elements.is_empty()
    }
}

/// 从单个元素读出的结构属性
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementProperties {
    pub residue_name: Option<String>,
    pub residue_number: Option<i32>,
    pub chain_id: Option<String>,
    pub atom_name: Option<String>,
    pub element_symbol: Option<String>,
    pub position: Option<[f64; 3]>,
}

/// 链摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainSummary {
    pub id: String,
    pub residue_count: usize,
}

/// 已加载结构的摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureSummary {
    pub name: String,
    pub format: StructureFormat,
    pub atom_count: usize,
    pub chains: Vec<ChainSummary>,
    pub water_count: usize,
    pub ligand_names: Vec<String>,
}

impl StructureSummary {
    pub fn has_chain(&self, chain_id: &str) -> bool {
        self.chains.iter().any(|c| c.id == chain_id)
    }

    pub fn residue_count(&self) -> usize {
        self.chains.iter().map(|c| c.residue_count).sum()
    }
}

/// 引擎上报的交互事件（broadcast 给订阅者）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    /// 选区管理器状态已变化
    SelectionChanged,
    /// 点击（element 为 None 表示点在空白处）
    Click { element: Option<ElementRef> },
    /// 悬停
    Hover { element: Option<ElementRef> },
    /// 新结构已加载
    StructureLoaded { name: String },
}
