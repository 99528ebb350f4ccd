//! 内置命令：固定词表，按注册顺序构建注册表
//!
//! 每条命令是一个 BuiltinCommand（名称 + 描述 + 失败提示 + 动作），执行时只通过 ViewerCapability 操作查看器。

use async_trait::async_trait;

use crate::commands::{CommandParams, CommandRegistry, ParamKind, ViewerCommand};
use crate::selection::{lookup_amino_acid, SelectionInfo};
use crate::viewer::{Representation, ViewerCapability, ViewerError};

/// 无选区时的引导文本
pub const NO_SELECTION_GUIDANCE: &str =
    "Nothing is selected yet. Click on an atom or residue in the viewer to select it, then try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    ShowWater,
    HideWater,
    HideLigands,
    ZoomChain,
    ShowSelectionInfo,
    ShowOnlySelected,
    Represent(Representation),
    ResetView,
    HighlightChain,
    ClearHighlights,
    ShowStructureInfo,
    WhatIsSelected,
    AnalyzeSelection,
}

pub struct BuiltinCommand {
    name: &'static str,
    description: &'static str,
    failure: &'static str,
    action: Action,
}

impl BuiltinCommand {
    const fn new(
        name: &'static str,
        description: &'static str,
        failure: &'static str,
        action: Action,
    ) -> Self {
        Self {
            name,
            description,
            failure,
            action,
        }
    }
}

#[async_trait]
impl ViewerCommand for BuiltinCommand {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn param_kind(&self) -> ParamKind {
        match self.action {
            Action::ZoomChain | Action::HighlightChain => ParamKind::Chain,
            _ => ParamKind::None,
        }
    }

    fn failure_message(&self, params: &CommandParams) -> String {
        match self.param_kind() {
            ParamKind::Chain => self.failure.replace("{chain}", params.chain_or_default()),
            ParamKind::None => self.failure.to_string(),
        }
    }

    async fn execute(
        &self,
        viewer: &dyn ViewerCapability,
        params: &CommandParams,
    ) -> Result<String, ViewerError> {
        match self.action {
            Action::ShowWater => {
                viewer.show_water_molecules().await?;
                Ok("Water molecules are now visible.".to_string())
            }
            Action::HideWater => {
                viewer.hide_water_molecules().await?;
                Ok("Water molecules are now hidden.".to_string())
            }
            Action::HideLigands => {
                viewer.hide_ligands().await?;
                Ok("Ligands are now hidden.".to_string())
            }
            Action::ZoomChain => {
                let chain = params.chain_or_default();
                viewer.focus_on_chain(chain).await?;
                Ok(format!("Zoomed to chain {chain}."))
            }
            Action::ShowSelectionInfo => viewer.selection_info().await,
            Action::ShowOnlySelected => {
                let Some(info) = viewer.current_selection().await? else {
                    return Ok(NO_SELECTION_GUIDANCE.to_string());
                };
                viewer.hide_water_molecules().await?;
                viewer.hide_ligands().await?;
                match info.chain_id.as_deref() {
                    Some(chain) => {
                        viewer.focus_on_chain(chain).await?;
                        Ok(format!(
                            "Showing chain {chain} around {}. Water and ligands are hidden.",
                            info.description
                        ))
                    }
                    None => Ok(format!(
                        "Focused on {}. Water and ligands are hidden.",
                        info.description
                    )),
                }
            }
            Action::Represent(kind) => {
                viewer.set_representation(kind).await?;
                Ok(format!("Switched to {} representation.", kind.as_str()))
            }
            Action::ResetView => {
                viewer.reset_view().await?;
                Ok("View reset.".to_string())
            }
            Action::HighlightChain => {
                let chain = params.chain_or_default();
                viewer.highlight_chain(chain).await?;
                Ok(format!("Highlighted chain {chain}."))
            }
            Action::ClearHighlights => {
                viewer.clear_highlights().await?;
                Ok("Cleared all highlights.".to_string())
            }
            Action::ShowStructureInfo => viewer.structure_info().await,
            Action::WhatIsSelected => Ok(match viewer.current_selection().await? {
                Some(info) => format!("Currently selected: {}", info.description),
                None => NO_SELECTION_GUIDANCE.to_string(),
            }),
            Action::AnalyzeSelection => Ok(match viewer.current_selection().await? {
                Some(info) => analyze(&info),
                None => NO_SELECTION_GUIDANCE.to_string(),
            }),
        }
    }
}

/// 选区分析：描述 + 氨基酸表信息 + 原子与坐标
pub fn analyze(info: &SelectionInfo) -> String {
    let mut lines = vec![format!("Analysis of {}:", info.description)];

    match info.residue_name.as_deref() {
        Some(code) => match lookup_amino_acid(code) {
            Some(aa) => lines.push(format!(
                "- Residue: {} ({}, {}), {} side chain",
                aa.name, aa.code, aa.letter, aa.class
            )),
            None => lines.push(format!(
                "- Residue: {code} is not a standard amino acid (ligand, water or modified residue)"
            )),
        },
        None => lines.push("- Residue: unknown".to_string()),
    }

    if let (Some(number), Some(chain)) = (info.residue_number, info.chain_id.as_deref()) {
        lines.push(format!("- Position: residue {number} on chain {chain}"));
    }

    if let Some(atom) = &info.atom_name {
        let element = info.element_type.as_deref().unwrap_or("?");
        match &info.coordinates {
            Some(coords) => lines.push(format!("- Atom: {atom} (element {element}) at {coords}")),
            None => lines.push(format!("- Atom: {atom} (element {element})")),
        }
    }

    if let Some(count) = info.atom_count {
        lines.push(format!("- Selection size: {count} atom(s)"));
    }

    lines.join("\n")
}

/// 全部内置命令（注册顺序即帮助文本顺序）
pub fn builtin_commands() -> Vec<BuiltinCommand> {
    vec![
        BuiltinCommand::new(
            "enable_water",
            "Show water molecules",
            "Failed to show water molecules. Make sure a structure is loaded.",
            Action::ShowWater,
        ),
        BuiltinCommand::new(
            "hide_water",
            "Hide water molecules",
            "Failed to hide water molecules. Make sure a structure is loaded.",
            Action::HideWater,
        ),
        BuiltinCommand::new(
            "hide_ligands",
            "Hide ligands and other hetero groups",
            "Failed to hide ligands. Make sure a structure is loaded.",
            Action::HideLigands,
        ),
        BuiltinCommand::new(
            "zoom_chain",
            "Zoom the camera to a chain (default A)",
            "Failed to zoom to chain {chain}. Check that the chain exists in this structure.",
            Action::ZoomChain,
        ),
        BuiltinCommand::new(
            "show_selection_info",
            "Show detailed information about the current selection",
            "Failed to read the current selection.",
            Action::ShowSelectionInfo,
        ),
        BuiltinCommand::new(
            "show_only_selected",
            "Hide water and ligands and focus on the selected chain",
            "Failed to isolate the current selection.",
            Action::ShowOnlySelected,
        ),
        BuiltinCommand::new(
            "switch_to_surface",
            "Show the molecular surface",
            "Failed to switch to surface representation.",
            Action::Represent(Representation::Surface),
        ),
        BuiltinCommand::new(
            "switch_to_cartoon",
            "Show the cartoon (secondary structure) representation",
            "Failed to switch to cartoon representation.",
            Action::Represent(Representation::Cartoon),
        ),
        BuiltinCommand::new(
            "switch_to_ball_stick",
            "Show the ball-and-stick representation",
            "Failed to switch to ball-and-stick representation.",
            Action::Represent(Representation::BallAndStick),
        ),
        BuiltinCommand::new(
            "reset_view",
            "Reset the camera",
            "Failed to reset the view.",
            Action::ResetView,
        ),
        BuiltinCommand::new(
            "highlight_chain",
            "Highlight a chain (default A)",
            "Failed to highlight chain {chain}. Check that the chain exists in this structure.",
            Action::HighlightChain,
        ),
        BuiltinCommand::new(
            "clear_highlights",
            "Remove all highlights",
            "Failed to clear highlights.",
            Action::ClearHighlights,
        ),
        BuiltinCommand::new(
            "show_structure_info",
            "Summarize the loaded structure",
            "Failed to get structure information. Make sure a structure is loaded.",
            Action::ShowStructureInfo,
        ),
        BuiltinCommand::new(
            "what_is_selected",
            "Describe the current selection in one line",
            "Failed to read the current selection.",
            Action::WhatIsSelected,
        ),
        BuiltinCommand::new(
            "analyze_selection",
            "Analyze the selected residue",
            "Failed to analyze the current selection.",
            Action::AnalyzeSelection,
        ),
    ]
}

/// 内置命令注册表
pub fn builtin_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for command in builtin_commands() {
        registry.register(command);
    }
    registry
}
