//! ordo-core
//!
//! Task prioritization and recurrence engine.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, level, score, state, task, edge, recurrence, view, errors）
//! - **ports**: 抽象化レイヤー（TaskStore, Clock, IdGenerator, Urgency）
//! - **app**: アプリケーションロジック（builder, lifecycle, graph, config）
//! - **impls**: 実装（InMemoryTaskStore）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
