//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义模块加载、装饰钩子和条目解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`ModuleLoader`] - 模块加载器接口
//! - [`ScanOptions`] - 扫描选项
//! - [`Hooks`] - 装饰钩子
//! - [`ComponentResolver`] - 条目解析器接口

pub mod hooks;
pub mod resolver;
pub mod scanner;

pub use hooks::*;
pub use resolver::*;
pub use scanner::*;
