//! EngineBuilder - エンジンの構築とワイヤリング
//!
//! # Fail-fast 設計
//! - store と urgency は必須。足りなければ build() が BuildError を返す
//! - clock と id generator は省略可能（SystemClock / UlidGenerator）
//! - 設定は build() 時に検証する

use std::sync::Arc;

use super::config::EngineConfig;
use super::lifecycle::TaskLifecycle;
use crate::ports::{Clock, IdGenerator, SystemClock, TaskStore, UlidGenerator, Urgency};

/// EngineBuilder は TaskLifecycle を構築
///
/// # 使用例
/// ```ignore
/// let engine = EngineBuilder::new()
///     .store(Arc::new(InMemoryTaskStore::new()))
///     .urgency(|due| my_decay(due))
///     .build()?;
/// ```
pub struct EngineBuilder {
    store: Option<Arc<dyn TaskStore>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    urgency: Option<Arc<dyn Urgency>>,
    config: EngineConfig,
}

/// BuildError はエンジン構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing component: {0}. It must be provided before build().")]
    MissingComponent(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            clock: None,
            ids: None,
            urgency: None,
            config: EngineConfig::default(),
        }
    }

    pub fn store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn urgency(mut self, urgency: impl Urgency + 'static) -> Self {
        self.urgency = Some(Arc::new(urgency));
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// EngineBuilder を検証して TaskLifecycle を生成
    pub fn build(self) -> Result<TaskLifecycle, BuildError> {
        self.config.validate()?;
        let store = self.store.ok_or(BuildError::MissingComponent("store"))?;
        let urgency = self
            .urgency
            .ok_or(BuildError::MissingComponent("urgency"))?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock.clone())) as Arc<dyn IdGenerator>);

        tracing::debug!(
            strict_cycles = self.config.strict_cycles,
            carry_rule_forward = self.config.carry_rule_forward,
            "engine built"
        );
        Ok(TaskLifecycle::new(store, clock, ids, urgency, self.config))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProjectId;
    use crate::impls::InMemoryTaskStore;
    use chrono::{DateTime, Utc};
    use ulid::Ulid;

    fn flat(_due: DateTime<Utc>) -> i64 {
        1
    }

    #[test]
    fn test_build_success() {
        let engine = EngineBuilder::new()
            .store(Arc::new(InMemoryTaskStore::new()))
            .urgency(flat)
            .build();
        assert!(engine.is_ok());
    }

    #[test]
    fn test_build_missing_store() {
        let engine = EngineBuilder::new().urgency(flat).build();
        assert!(matches!(engine, Err(BuildError::MissingComponent("store"))));
    }

    #[test]
    fn test_build_missing_urgency() {
        let engine = EngineBuilder::new()
            .store(Arc::new(InMemoryTaskStore::new()))
            .build();
        assert!(matches!(engine, Err(BuildError::MissingComponent("urgency"))));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.default_view.project = Some(ProjectId::from_ulid(Ulid::new()));
        let engine = EngineBuilder::new()
            .store(Arc::new(InMemoryTaskStore::new()))
            .urgency(flat)
            .config(config)
            .build();
        assert!(matches!(engine, Err(BuildError::InvalidConfig(_))));
    }
}
