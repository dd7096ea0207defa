//! chronicle 适配器集合（chronicle-drivers）
//!
//! 为 `chronicle-domain` 的各协议提供独立的具体实现：
//! - `queue`：基于 tokio mpsc 的进程内内存队列（测试与本地开发）；
//! - `codec`：JSON 信封编解码（`SerDe` 的参考实现）；
//! - `eventstore`：以 SQLite 为后端的事件存储；
//! - `snapshots`：SQLite 快照存储与按版本间隔的落盘策略。
//!
//! 各适配器彼此独立、不构成继承层次，按需挑选注入即可。
//!
pub mod codec;
pub mod eventstore;
pub mod queue;
pub mod snapshots;
