//! # 依赖注入具体实现
//!
//! 提供解析上下文、依赖代理、注入器和容器的具体实现。
//!
//! ## 解析流程
//!
//! 1. [`Container::get`] 读取顶层值，节点先被物化为具体值
//! 2. 嵌套成员树经 [`Container::unwrap`] 展开，每个节点由 [`Injector::bind`] 绑定
//! 3. [`Injector::assign`] 合并展开结果并锁定目标
//! 4. `after` 钩子可以替换缓存的值
//!
//! 每个名称的解析状态为 `未解析 → 解析中 → 已解析`，
//! 解析中的再次访问直接返回当前值，不会无限递归。

pub mod container;
pub mod context;
pub mod injector;
pub mod proxy;

pub use container::*;
pub use context::*;
pub use injector::*;
pub use proxy::*;
