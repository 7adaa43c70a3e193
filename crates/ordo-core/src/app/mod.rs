//! App - アプリケーション層
//!
//! ports を組み合わせてタスクのライフサイクルを実装する。
//!
//! # 主要コンポーネント
//! - **EngineBuilder**: エンジンの構築とワイヤリング
//! - **TaskLifecycle**: create / complete / trash / purge などの操作
//! - **PrecedenceGraph**: 先行関係の読み取り（1 段まで）
//! - **EngineConfig**: 設定

pub mod builder;
pub mod config;
pub mod graph;
pub mod lifecycle;

pub use self::builder::{BuildError, EngineBuilder};
pub use self::config::EngineConfig;
pub use self::graph::{LinkedTask, PRECEDENCE_HOPS, PrecedenceGraph};
pub use self::lifecycle::{Completion, TaskLifecycle};
