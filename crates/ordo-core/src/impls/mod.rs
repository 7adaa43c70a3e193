//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryTaskStore**: 開発用・テスト用の正本
//!
//! 本番用の store（リレーショナル DB）は別クレートに置く想定です。

pub mod inmem_store;

pub use self::inmem_store::InMemoryTaskStore;
