//! 解析器
//!
//! 对外的入口：持有容器和钩子，按名称解析顶层条目。

use crate::builder::ResolverBuilder;
use crate::typings::{Chunk, TypeOptions, TypingsGenerator};
use di_abstractions::{ComponentResolver, Hooks};
use di_impl::Container;
use indexmap::IndexMap;
use infrastructure_common::{InjectResult, TypeEntry, Value};
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use tracing::debug;

/// 目录驱动的解析器
#[derive(Debug)]
pub struct Resolver {
    container: Container,
    hooks: Hooks,
    directories: Vec<PathBuf>,
    typedefs: OnceCell<String>,
}

impl Resolver {
    pub(crate) fn new(container: Container, hooks: Hooks, directories: Vec<PathBuf>) -> Self {
        Self {
            container,
            hooks,
            directories,
            typedefs: OnceCell::new(),
        }
    }

    /// 创建构建器
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::new()
    }

    /// 解析顶层条目，首次访问时注入并锁定
    pub fn get(&self, name: &str) -> InjectResult<Value> {
        self.container.get(name, &self.hooks, false)
    }

    /// 强制重新解析顶层条目
    pub fn refresh(&self, name: &str) -> InjectResult<Value> {
        debug!("强制重新解析: {}", name);
        self.container.get(name, &self.hooks, true)
    }

    /// 是否登记了该名称
    pub fn has(&self, name: &str) -> bool {
        self.container.has(name)
    }

    /// 按发现顺序逐个解析扫描到的顶层条目
    pub fn for_each<F>(&self, mut f: F) -> InjectResult<()>
    where
        F: FnMut(&str, Value) -> InjectResult<()>,
    {
        for name in self.keys() {
            let value = self.get(name)?;
            f(name, value)?;
        }
        Ok(())
    }

    /// 扫描到的顶层名称
    pub fn keys(&self) -> &[String] {
        self.container.context().keys()
    }

    /// 顶层条目的当前快照，未解析的条目保持原样
    pub fn values(&self) -> IndexMap<String, Value> {
        self.container.context().values()
    }

    /// 嵌套成员树
    pub fn registry(&self, name: &str) -> Option<&Value> {
        self.container.context().registry(name)
    }

    /// 每个入口文件的类型信息
    pub fn types(&self) -> &[TypeEntry] {
        self.container.context().types()
    }

    /// 扫描的根目录
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// 注入作用域的根对象
    pub fn root(&self) -> &Value {
        self.container.context().root()
    }

    /// 底层容器
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// 默认选项下的类型声明，首次访问时生成
    pub fn typedefs(&self) -> &str {
        self.typedefs.get_or_init(|| {
            TypingsGenerator::new(self.types(), &TypeOptions::default()).render()
        })
    }

    /// 按指定选项生成类型声明片段
    pub fn types_of(&self, options: &TypeOptions) -> Vec<Chunk> {
        TypingsGenerator::new(self.types(), options).generate()
    }
}

impl ComponentResolver for Resolver {
    fn resolve(&self, name: &str) -> InjectResult<Value> {
        self.get(name)
    }

    fn refresh(&self, name: &str) -> InjectResult<Value> {
        Resolver::refresh(self, name)
    }

    fn has(&self, name: &str) -> bool {
        Resolver::has(self, name)
    }

    fn names(&self) -> Vec<String> {
        self.container.names()
    }
}
