//! 选区信息：由 SelectionTracker 独占持有，对外只提供克隆

use std::fmt;

use serde::Serialize;

use crate::viewer::ElementProperties;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// 当前选区（单个代表元素 + 所在记录的原子数）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionInfo {
    pub residue_name: Option<String>,
    pub residue_number: Option<i32>,
    pub chain_id: Option<String>,
    pub atom_name: Option<String>,
    pub element_type: Option<String>,
    pub atom_count: Option<usize>,
    pub coordinates: Option<Coordinates>,
    pub description: String,
}

impl SelectionInfo {
    /// 由代表元素属性构造；description 固定模板：`<残基名> <残基号> (Chain <链>) - <原子名> atom`
    pub fn from_properties(props: ElementProperties, atom_count: usize) -> Self {
        let description = format!(
            "{} {} (Chain {}) - {} atom",
            props.residue_name.as_deref().unwrap_or("Unknown"),
            props
                .residue_number
                .map(|n| n.to_string())
                .unwrap_or_else(|| "?".to_string()),
            props.chain_id.as_deref().unwrap_or("?"),
            props.atom_name.as_deref().unwrap_or("unknown"),
        );
        Self {
            residue_name: props.residue_name,
            residue_number: props.residue_number,
            chain_id: props.chain_id,
            atom_name: props.atom_name,
            element_type: props.element_symbol,
            atom_count: Some(atom_count),
            coordinates: props.position.map(|[x, y, z]| Coordinates { x, y, z }),
            description,
        }
    }

    /// 多行详情（show_selection_info 使用）
    pub fn details(&self) -> String {
        let mut lines = vec![format!("Selected: {}", self.description)];
        if let Some(name) = &self.residue_name {
            lines.push(format!("Residue: {name}"));
        }
        if let Some(number) = self.residue_number {
            lines.push(format!("Residue number: {number}"));
        }
        if let Some(chain) = &self.chain_id {
            lines.push(format!("Chain: {chain}"));
        }
        if let Some(atom) = &self.atom_name {
            lines.push(format!("Atom: {atom}"));
        }
        if let Some(element) = &self.element_type {
            lines.push(format!("Element: {element}"));
        }
        if let Some(count) = self.atom_count {
            lines.push(format!("Atoms in selection: {count}"));
        }
        if let Some(coords) = &self.coordinates {
            lines.push(format!("Coordinates: {coords}"));
        }
        lines.join("\n")
    }
}
