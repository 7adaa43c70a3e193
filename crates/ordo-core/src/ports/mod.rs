//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait はエンジンの外側の協調者へのインターフェースです。
//!
//! - TaskStore: リレーショナルストア（正本）
//! - Clock: 「今」
//! - IdGenerator: 新しい ID
//! - Urgency: 期限 → 緊急度の不透明な関数

pub mod clock;
pub mod id_generator;
pub mod task_store;
pub mod urgency;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::task_store::{Change, ChangeSet, StoreError, TaskStore};
pub use self::urgency::Urgency;
