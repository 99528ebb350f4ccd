//! 选区提取：多策略级联，首个成功者胜出
//!
//! 1. SelectionManager：选区管理器当前状态（需至少一条含可寻址元素的记录）
//! 2. InteractionHighlight：最近一次悬停/点击高亮记录（引擎先报告交互、后提交选区时的兜底）
//!
//! 结果为结构化的 ExtractionOutcome，记录是哪条策略成功或各策略失败原因。

use serde::Serialize;

use crate::selection::SelectionInfo;
use crate::viewer::{SelectionEntry, SelectionSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    SelectionManager,
    InteractionHighlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// 没有任何记录
    NoEntries,
    /// 有记录但都没有可寻址元素
    NoAddressableElement,
    /// 代表元素的属性读取失败
    PropertiesUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyFailure {
    pub strategy: ExtractionStrategy,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExtractionFailure {
    pub attempts: Vec<StrategyFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub strategy: ExtractionStrategy,
    pub info: SelectionInfo,
}

pub type ExtractionOutcome = Result<Extraction, ExtractionFailure>;

/// 按顺序尝试所有策略
pub fn extract_selection(source: &dyn SelectionSource) -> ExtractionOutcome {
    let mut failure = ExtractionFailure::default();

    let entries = source.selection_entries();
    match resolve(source, &entries) {
        Ok(info) => {
            return Ok(Extraction {
                strategy: ExtractionStrategy::SelectionManager,
                info,
            })
        }
        Err(reason) => failure.attempts.push(StrategyFailure {
            strategy: ExtractionStrategy::SelectionManager,
            reason,
        }),
    }

    let highlight: Vec<SelectionEntry> = source.interaction_highlight().into_iter().collect();
    match resolve(source, &highlight) {
        Ok(info) => Ok(Extraction {
            strategy: ExtractionStrategy::InteractionHighlight,
            info,
        }),
        Err(reason) => {
            failure.attempts.push(StrategyFailure {
                strategy: ExtractionStrategy::InteractionHighlight,
                reason,
            });
            Err(failure)
        }
    }
}

/// 取第一条含元素记录的第一个元素作为代表，读取其结构属性
fn resolve(
    source: &dyn SelectionSource,
    entries: &[SelectionEntry],
) -> Result<SelectionInfo, FailureReason> {
    if entries.is_empty() {
        return Err(FailureReason::NoEntries);
    }
    let entry = entries
        .iter()
        .find(|e| e.is_addressable())
        .ok_or(FailureReason::NoAddressableElement)?;
    let props = source
        .element_properties(entry.elements[0])
        .ok_or(FailureReason::PropertiesUnavailable)?;
    Ok(SelectionInfo::from_properties(props, entry.elements.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::{ElementProperties, ElementRef, ViewerEvent};
    use tokio::sync::broadcast;

    /// 可任意设定两类状态的只读来源
    struct StubSource {
        entries: Vec<SelectionEntry>,
        highlight: Option<SelectionEntry>,
        known: Vec<usize>,
    }

    impl SelectionSource for StubSource {
        fn has_structure(&self) -> bool {
            true
        }

        fn selection_entries(&self) -> Vec<SelectionEntry> {
            self.entries.clone()
        }

        fn interaction_highlight(&self) -> Option<SelectionEntry> {
            self.highlight.clone()
        }

        fn element_properties(&self, element: ElementRef) -> Option<ElementProperties> {
            self.known.contains(&element.0).then(|| ElementProperties {
                residue_name: Some("TRP".into()),
                residue_number: Some(element.0 as i32),
                chain_id: Some("C".into()),
                atom_name: Some("NE1".into()),
                element_symbol: Some("N".into()),
                position: None,
            })
        }

        fn subscribe(&self) -> broadcast::Receiver<ViewerEvent> {
            broadcast::channel(1).1
        }
    }

    fn entry(ids: &[usize]) -> SelectionEntry {
        SelectionEntry::new(ids.iter().copied().map(ElementRef).collect())
    }

    #[test]
    fn test_selection_manager_wins() {
        let source = StubSource {
            entries: vec![entry(&[]), entry(&[7, 8, 9])],
            highlight: Some(entry(&[1])),
            known: vec![1, 7],
        };
        let ex = extract_selection(&source).unwrap();
        assert_eq!(ex.strategy, ExtractionStrategy::SelectionManager);
        assert_eq!(ex.info.description, "TRP 7 (Chain C) - NE1 atom");
        assert_eq!(ex.info.atom_count, Some(3));
    }

    #[test]
    fn test_falls_back_to_highlight() {
        let source = StubSource {
            entries: vec![entry(&[])],
            highlight: Some(entry(&[1])),
            known: vec![1],
        };
        let ex = extract_selection(&source).unwrap();
        assert_eq!(ex.strategy, ExtractionStrategy::InteractionHighlight);
        assert_eq!(ex.info.residue_number, Some(1));
    }

    #[test]
    fn test_all_strategies_fail() {
        let source = StubSource {
            entries: vec![],
            highlight: Some(entry(&[4])),
            known: vec![],
        };
        let failure = extract_selection(&source).unwrap_err();
        assert_eq!(
            failure.attempts,
            vec![
                StrategyFailure {
                    strategy: ExtractionStrategy::SelectionManager,
                    reason: FailureReason::NoEntries,
                },
                StrategyFailure {
                    strategy: ExtractionStrategy::InteractionHighlight,
                    reason: FailureReason::PropertiesUnavailable,
                },
            ]
        );
    }
}
