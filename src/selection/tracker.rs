//! 选区跟踪器
//!
//! 状态机：Unselected -> Selected(info)。只有提取成功才转移；提取失败保持原状态（粘性，点到空白处不会清掉用户正在讨论的选区）。
//! 只有 reset()（加载新结构）才会无条件回到 Unselected。
//!
//! 监听协议：SelectionChanged 立即提取；Click 等待宽限期后提取（引擎可能在点击事件之后才异步更新选区）；
//! Hover 仅在无选区时做一次不提交的诊断读取。reset / shutdown / Drop 时释放订阅。
//! 每次 reset 递增 generation，晚到的提取结果（generation 不符或结构已不存在）按无操作丢弃。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::config::SelectionSection;
use crate::selection::{extract_selection, ExtractionFailure, ExtractionStrategy, SelectionInfo};
use crate::viewer::{ElementRef, SelectionSource, ViewerEvent};

/// 跟踪器状态
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SelectionState {
    #[default]
    Unselected,
    Selected(SelectionInfo),
}

/// 触发一次提取的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    SelectionChanged,
    Click,
    Manual,
}

/// 一次提取尝试对状态的影响
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerUpdate {
    /// 提取成功并替换当前选区
    Committed(ExtractionStrategy),
    /// 所有策略失败，保留原状态
    Retained(ExtractionFailure),
    /// 结构已重载或已卸载，结果丢弃
    Stale,
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub click_grace: Duration,
    pub hover_diagnostics: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            click_grace: Duration::from_millis(100),
            hover_diagnostics: true,
        }
    }
}

impl From<&SelectionSection> for TrackerConfig {
    fn from(section: &SelectionSection) -> Self {
        Self {
            click_grace: Duration::from_millis(section.click_grace_ms),
            hover_diagnostics: section.hover_diagnostics,
        }
    }
}

struct Tracked {
    generation: u64,
    state: SelectionState,
}

pub struct SelectionTracker {
    source: Arc<dyn SelectionSource>,
    tracked: RwLock<Tracked>,
    /// 与 tracked.generation 同步，供无锁读取
    generation: AtomicU64,
    monitor: Mutex<Option<CancellationToken>>,
    config: TrackerConfig,
}

impl SelectionTracker {
    pub fn new(source: Arc<dyn SelectionSource>, config: TrackerConfig) -> Self {
        Self {
            source,
            tracked: RwLock::new(Tracked {
                generation: 0,
                state: SelectionState::Unselected,
            }),
            generation: AtomicU64::new(0),
            monitor: Mutex::new(None),
            config,
        }
    }

    pub fn state(&self) -> SelectionState {
        self.read().state.clone()
    }

    pub fn current(&self) -> Option<SelectionInfo> {
        match &self.read().state {
            SelectionState::Selected(info) => Some(info.clone()),
            SelectionState::Unselected => None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|t| !t.is_cancelled())
            .unwrap_or(false)
    }

    /// 立即按当前 generation 尝试一次提取
    pub fn refresh(&self, trigger: Trigger) -> TrackerUpdate {
        self.attempt(trigger, self.generation())
    }

    /// 回到 Unselected 并释放订阅；同步完成，调用方在任何加载 await 之前调用
    pub fn reset(&self) {
        self.release_monitor();
        let mut tracked = self.write();
        tracked.generation += 1;
        tracked.state = SelectionState::Unselected;
        self.generation.store(tracked.generation, Ordering::SeqCst);
        tracing::debug!(generation = tracked.generation, "selection tracker reset");
    }

    /// 释放订阅，保留当前状态
    pub fn shutdown(&self) {
        self.release_monitor();
    }

    /// 订阅引擎事件并启动监听任务（已有监听时先释放）
    pub fn start(self: &Arc<Self>) {
        self.release_monitor();
        let token = CancellationToken::new();
        let rx = self.source.subscribe();
        let generation = self.generation();
        *self.monitor.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());
        tokio::spawn(monitor(Arc::downgrade(self), rx, token, generation));
        tracing::debug!(generation, "selection monitoring started");
    }

    fn release_monitor(&self) {
        if let Some(token) = self.monitor.lock().unwrap_or_else(|e| e.into_inner()).take() {
            token.cancel();
        }
    }

    fn attempt(&self, trigger: Trigger, generation: u64) -> TrackerUpdate {
        if generation != self.generation() || !self.source.has_structure() {
            tracing::debug!(?trigger, "selection read dropped: structure changed");
            return TrackerUpdate::Stale;
        }

        match extract_selection(self.source.as_ref()) {
            Ok(extraction) => {
                let mut tracked = self.write();
                if tracked.generation != generation {
                    return TrackerUpdate::Stale;
                }
                tracing::debug!(
                    ?trigger,
                    strategy = ?extraction.strategy,
                    description = %extraction.info.description,
                    "selection updated"
                );
                tracked.state = SelectionState::Selected(extraction.info);
                TrackerUpdate::Committed(extraction.strategy)
            }
            Err(failure) => {
                tracing::debug!(?trigger, attempts = ?failure.attempts, "selection read failed, keeping last known");
                TrackerUpdate::Retained(failure)
            }
        }
    }

    /// 悬停预览：只记录诊断日志，从不提交
    fn observe_hover(&self, element: Option<ElementRef>) {
        if !self.config.hover_diagnostics || self.current().is_some() {
            return;
        }
        let preview = element.and_then(|e| self.source.element_properties(e));
        match preview {
            Some(props) => tracing::debug!(
                residue = ?props.residue_name,
                number = ?props.residue_number,
                chain = ?props.chain_id,
                "hover preview"
            ),
            None => tracing::trace!("hover over empty space"),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tracked> {
        self.tracked.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tracked> {
        self.tracked.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for SelectionTracker {
    fn drop(&mut self) {
        self.release_monitor();
    }
}

async fn monitor(
    tracker: Weak<SelectionTracker>,
    mut rx: broadcast::Receiver<ViewerEvent>,
    token: CancellationToken,
    generation: u64,
) {
    loop {
        let event = tokio::select! {
            _ = token.cancelled() => break,
            event = rx.recv() => event,
        };
        let Some(this) = tracker.upgrade() else { break };

        match event {
            Ok(ViewerEvent::SelectionChanged) => {
                this.attempt(Trigger::SelectionChanged, generation);
            }
            Ok(ViewerEvent::Click { .. }) => {
                let delayed = Arc::downgrade(&this);
                let token = token.clone();
                let grace = this.config.click_grace;
                tokio::spawn(async move {
                    tokio::select! {
                        _ = token.cancelled() => {}
                        _ = tokio::time::sleep(grace) => {
                            if let Some(t) = delayed.upgrade() {
                                t.attempt(Trigger::Click, generation);
                            }
                        }
                    }
                });
            }
            Ok(ViewerEvent::Hover { element }) => this.observe_hover(element),
            Ok(ViewerEvent::StructureLoaded { .. }) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "selection monitor lagged, re-reading selection");
                this.attempt(Trigger::SelectionChanged, generation);
            }
            Err(RecvError::Closed) => break,
        }
    }
    tracing::debug!(generation, "selection monitoring stopped");
}
