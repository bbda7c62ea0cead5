//! # Infrastructure Common
//!
//! 这个 crate 提供了目录驱动依赖注入容器的公共类型和工具。
//!
//! ## 核心组件
//!
//! - [`Value`] - 动态值模型
//! - [`DependencyNode`] - 工厂与依赖提供者映射
//! - [`InjectError`] - 注入错误类型
//! - [`NamingConventions`] - 路径到名称的命名约定
//! - [`ResolverConfig`] - 解析器配置
//!
//! ## 设计原则
//!
//! - 工厂类型由注册方显式声明
//! - 锁定标记独立于结构相等
//! - 约定优于配置

pub mod configuration;
pub mod conventions;
pub mod errors;
pub mod injectable;
pub mod metadata;
pub mod value;

pub use configuration::*;
pub use conventions::*;
pub use errors::*;
pub use injectable::*;
pub use metadata::*;
pub use value::*;
