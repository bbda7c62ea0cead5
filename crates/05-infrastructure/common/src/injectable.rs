//! 可注入定义
//!
//! [`DependencyNode`] 把一个工厂和它声明的依赖提供者绑定在一起，
//! 构造后不可变，可以被多次调用，每次调用都会得到新的依赖代理。

use crate::conventions::NamingConventions;
use crate::errors::{InjectError, InjectResult};
use crate::value::{Callable, Value};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// 工厂调用方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactoryKind {
    /// 以依赖代理构造实例
    Constructible {
        /// 构造参数个数
        arity: usize,
    },
    /// 以依赖代理调用
    Invocable,
    /// 原样返回工厂本身
    Verbatim,
}

impl FactoryKind {
    /// 从声明的调用能力得到工厂类型
    pub fn of(callable: &Callable) -> Self {
        match callable {
            Callable::Class { arity, .. } => Self::Constructible { arity: *arity },
            Callable::Injectable(_) => Self::Invocable,
            Callable::Function(_) => Self::Verbatim,
        }
    }

    /// 是否为类
    pub fn is_class(&self) -> bool {
        matches!(self, Self::Constructible { .. })
    }
}

/// 依赖提供者
#[derive(Clone, Debug)]
pub enum Provider {
    /// 每个代理内只求值一次
    Memoized(Value),
    /// 每次访问都重新求值
    Live(Value),
}

impl Provider {
    /// 提供者函数
    pub fn target(&self) -> &Value {
        match self {
            Self::Memoized(target) | Self::Live(target) => target,
        }
    }

    /// 是否为实时提供者
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }
}

/// 依赖提供者映射
///
/// 键可以带 `get` 前缀，解析时使用去掉前缀后的逻辑名称。
#[derive(Clone, Debug, Default)]
pub struct ProviderMap {
    providers: IndexMap<String, Provider>,
}

impl ProviderMap {
    /// 创建空映射
    pub fn new() -> Self {
        Self::default()
    }

    /// 从已加载的提供者模块创建，模块必须是普通对象
    pub fn from_value(value: &Value) -> InjectResult<Self> {
        let object = value
            .as_object()
            .filter(|object| object.is_plain())
            .ok_or_else(|| InjectError::InvalidDependencies {
                given: value.describe(),
            })?;

        let mut map = Self::new();
        for (key, target) in object.entries() {
            map.insert(key, Provider::Memoized(target));
        }
        Ok(map)
    }

    /// 添加缓存型提供者
    pub fn memoized(mut self, key: impl Into<String>, target: Value) -> Self {
        self.insert(key, Provider::Memoized(target));
        self
    }

    /// 添加实时提供者
    pub fn live(mut self, key: impl Into<String>, target: Value) -> Self {
        self.insert(key, Provider::Live(target));
        self
    }

    /// 插入提供者
    pub fn insert(&mut self, key: impl Into<String>, provider: Provider) {
        self.providers.insert(key.into(), provider);
    }

    /// 合并另一份映射，同名键以后者为准
    pub fn merge(&mut self, other: &ProviderMap) {
        for (key, provider) in &other.providers {
            self.providers.insert(key.clone(), provider.clone());
        }
    }

    /// 按原始键读取
    pub fn get(&self, key: &str) -> Option<&Provider> {
        self.providers.get(key)
    }

    /// 按逻辑名称查找，返回原始键和提供者
    pub fn find(&self, logical: &str) -> Option<(&str, &Provider)> {
        self.providers
            .iter()
            .find(|(key, _)| NamingConventions::strip_getter_prefix(key) == logical)
            .map(|(key, provider)| (key.as_str(), provider))
    }

    /// 原始键列表
    pub fn keys(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    /// 逻辑名称列表
    pub fn logical_names(&self) -> Vec<String> {
        self.providers
            .keys()
            .map(|key| NamingConventions::strip_getter_prefix(key).to_string())
            .collect()
    }

    /// 遍历
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Provider)> {
        self.providers.iter()
    }

    /// 提供者数量
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// 依赖节点
#[derive(Debug)]
pub struct DependencyNode {
    factory: Value,
    kind: FactoryKind,
    dependencies: ProviderMap,
    origin: Option<PathBuf>,
}

impl DependencyNode {
    /// 创建依赖节点
    ///
    /// 工厂必须可调用，依赖映射必须存在。
    pub fn new(factory: Value, dependencies: Option<ProviderMap>) -> InjectResult<Self> {
        let kind = factory
            .as_object()
            .and_then(|object| object.callable())
            .map(FactoryKind::of)
            .ok_or_else(|| InjectError::InvalidFactory {
                given: factory.describe(),
            })?;

        let dependencies = dependencies.ok_or_else(|| InjectError::InvalidDependencies {
            given: Value::Empty.describe(),
        })?;

        Ok(Self {
            factory,
            kind,
            dependencies,
            origin: None,
        })
    }

    /// 以动态值形式的依赖映射创建
    pub fn from_values(factory: Value, dependencies: &Value) -> InjectResult<Self> {
        if !factory.is_callable() {
            return Err(InjectError::InvalidFactory {
                given: factory.describe(),
            });
        }
        Self::new(factory, Some(ProviderMap::from_value(dependencies)?))
    }

    /// 记录定义所在的源文件，仅用于诊断
    pub fn with_origin(mut self, origin: impl AsRef<Path>) -> Self {
        self.origin = Some(origin.as_ref().to_path_buf());
        self
    }

    /// 工厂
    pub fn factory(&self) -> &Value {
        &self.factory
    }

    /// 工厂类型
    pub fn kind(&self) -> FactoryKind {
        self.kind
    }

    /// 依赖映射
    pub fn dependencies(&self) -> &ProviderMap {
        &self.dependencies
    }

    /// 源文件
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// 以给定代理调用工厂
    pub fn invoke(&self, proxy: Value) -> InjectResult<Value> {
        match self.kind {
            FactoryKind::Constructible { .. } => self.factory.construct(&[proxy]),
            FactoryKind::Invocable => self.factory.call(&[proxy]),
            FactoryKind::Verbatim => Ok(self.factory.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Value {
        Value::injectable(|_, _| Ok(Value::Empty))
    }

    #[test]
    fn rejects_non_callable_factories() {
        let err = DependencyNode::new(Value::Empty, Some(ProviderMap::new())).unwrap_err();
        assert!(matches!(err, InjectError::InvalidFactory { .. }));
        assert!(err.to_string().contains("undefined"));

        let err = DependencyNode::new(Value::object(), Some(ProviderMap::new())).unwrap_err();
        assert!(matches!(err, InjectError::InvalidFactory { .. }));
    }

    #[test]
    fn rejects_missing_or_malformed_dependencies() {
        let err = DependencyNode::new(noop(), None).unwrap_err();
        assert!(matches!(err, InjectError::InvalidDependencies { .. }));

        let err = DependencyNode::from_values(noop(), &Value::List(Vec::new())).unwrap_err();
        assert!(matches!(err, InjectError::InvalidDependencies { .. }));

        let err = DependencyNode::from_values(noop(), &Value::from("x")).unwrap_err();
        assert!(matches!(err, InjectError::InvalidDependencies { .. }));

        let err = DependencyNode::from_values(noop(), &noop()).unwrap_err();
        assert!(matches!(err, InjectError::InvalidDependencies { .. }));
    }

    #[test]
    fn classifies_factories_by_declared_kind() {
        let class = DependencyNode::new(
            Value::class(1, |_, _| Ok(Value::object())),
            Some(ProviderMap::new()),
        )
        .unwrap();
        assert_eq!(class.kind(), FactoryKind::Constructible { arity: 1 });

        let function = DependencyNode::new(Value::function(|_, _| Ok(Value::Empty)), Some(ProviderMap::new())).unwrap();
        assert_eq!(function.kind(), FactoryKind::Verbatim);
        assert!(function.invoke(Value::Empty).unwrap().same(function.factory()));

        assert_eq!(
            DependencyNode::new(noop(), Some(ProviderMap::new())).unwrap().kind(),
            FactoryKind::Invocable
        );
    }

    #[test]
    fn provider_lookup_strips_getter_prefix() {
        let map = ProviderMap::new()
            .memoized("getToken", noop())
            .live("clock", noop());

        assert_eq!(map.logical_names(), vec!["Token".to_string(), "clock".to_string()]);

        let (key, provider) = map.find("Token").unwrap();
        assert_eq!(key, "getToken");
        assert!(!provider.is_live());
        assert!(map.find("clock").unwrap().1.is_live());
        assert!(map.find("getToken").is_none());
    }

    #[test]
    fn merging_lets_later_maps_win() {
        let mut root = ProviderMap::new().memoized("a", Value::from(1)).memoized("b", Value::from(2));
        root.merge(&ProviderMap::new().live("b", Value::from(3)));

        assert_eq!(root.len(), 2);
        assert!(root.get("b").unwrap().is_live());
        assert_eq!(root.get("b").unwrap().target(), &Value::from(3));
    }
}
