//! # 解析器组合层
//!
//! 把目录扫描、依赖注入容器和类型声明生成组合成一个完整的解析器。
//!
//! ## 主要功能
//!
//! - **目录扫描**: 按 `<Name>/**/index.*` 约定发现顶层条目和嵌套成员
//! - **解析器构建器**: 使用建造者模式收集根目录、钩子和模块加载器
//! - **惰性解析**: 顶层条目在首次访问时注入依赖并锁定
//! - **类型声明**: 根据扫描结果生成声明文本
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{JsonModuleLoader, Resolver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = Resolver::builder()
//!         .directory("./settings")
//!         .loader(JsonModuleLoader::new())
//!         .options(JsonModuleLoader::scan_options())
//!         .build()
//!         .await?;
//!
//!     let database = resolver.get("Database")?;
//!     println!("数据库配置: {:?}", database);
//!
//!     println!("{}", resolver.typedefs());
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod loader;
pub mod resolver;
pub mod scanner;
pub mod typings;

#[cfg(test)]
#[path = "tests/integration_tests.rs"]
mod integration_tests;

// 重新导出主要类型
pub use builder::{LoggingConfig, ResolverBuilder};
pub use loader::JsonModuleLoader;
pub use resolver::Resolver;
pub use scanner::DirectoryScanner;
pub use typings::{Chunk, ReferenceFn, References, TypeOptions, TypingsGenerator};

// 重新导出错误类型
pub use infrastructure_common::InjectError;
