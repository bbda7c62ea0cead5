//! 解析上下文
//!
//! [`ResolutionContext`] 持有 `values` 与 `registry` 两张表以及每个名称的解析状态，
//! 容器与注入器都只通过它互相回调。

use indexmap::IndexMap;
use infrastructure_common::{TypeEntry, Value};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 单个名称的解析状态，未出现在状态表中即为未解析
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// 正在解析
    Resolving,
    /// 已解析并锁定
    Resolved,
}

/// 扫描结果
#[derive(Debug, Default, Clone)]
pub struct Registration {
    /// 顶层条目
    pub values: IndexMap<String, Value>,
    /// 嵌套成员树
    pub registry: IndexMap<String, Value>,
    /// 扫描到的顶层名称，按发现顺序
    pub keys: Vec<String>,
    /// 每个入口文件的类型信息
    pub types: Vec<TypeEntry>,
    /// 每个顶层名称所在的根目录
    pub directories: IndexMap<String, PathBuf>,
}

impl Registration {
    /// 创建空的扫描结果
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记顶层条目
    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        if !self.keys.contains(&name) {
            self.keys.push(name.clone());
        }
        self.values.insert(name, value);
        self
    }

    /// 登记嵌套成员树
    pub fn with_registry(mut self, name: impl Into<String>, tree: Value) -> Self {
        self.registry.insert(name.into(), tree);
        self
    }

    /// 合并另一个根目录的扫描结果
    ///
    /// 已有的顶层值保持不变（占位符除外），嵌套成员树只补充缺失的键。
    pub fn merge(&mut self, other: Registration) {
        for (name, value) in other.values {
            let occupied = self
                .values
                .get(&name)
                .is_some_and(|existing| !matches!(existing, Value::Placeholder));
            if !occupied {
                self.values.insert(name, value);
            }
        }

        for (name, tree) in other.registry {
            if let Some(existing) = self.registry.get(&name) {
                merge_tree(existing, &tree);
            } else {
                self.registry.insert(name, tree);
            }
        }

        for key in other.keys {
            if !self.keys.contains(&key) {
                self.keys.push(key);
            }
        }

        self.types.extend(other.types);

        for (name, dir) in other.directories {
            self.directories.entry(name).or_insert(dir);
        }
    }
}

fn merge_tree(target: &Value, source: &Value) {
    let (Some(target), Some(source)) = (target.as_object(), source.as_object()) else {
        return;
    };
    if !target.is_plain() || !source.is_plain() {
        return;
    }
    for (key, value) in source.entries() {
        match target.get(&key) {
            Some(existing) => merge_tree(&existing, &value),
            None => target.set(key, value),
        }
    }
}

/// 解析上下文
pub struct ResolutionContext {
    root: Value,
    values: RwLock<IndexMap<String, Value>>,
    registry: IndexMap<String, Value>,
    keys: Vec<String>,
    types: Vec<TypeEntry>,
    directories: IndexMap<String, PathBuf>,
    states: Mutex<HashMap<String, EntryState>>,
}

impl ResolutionContext {
    /// 以扫描结果创建上下文，`root` 作为提供者调用时的 `this`
    pub fn new(root: Value, registration: Registration) -> Arc<Self> {
        Arc::new(Self {
            root,
            values: RwLock::new(registration.values),
            registry: registration.registry,
            keys: registration.keys,
            types: registration.types,
            directories: registration.directories,
            states: Mutex::new(HashMap::new()),
        })
    }

    /// 根值
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// 读取顶层值
    pub fn value(&self, name: &str) -> Option<Value> {
        self.values.read().get(name).cloned()
    }

    /// 写入顶层值
    pub(crate) fn set_value(&self, name: &str, value: Value) {
        self.values.write().insert(name.to_string(), value);
    }

    /// 是否含有顶层值
    pub fn contains(&self, name: &str) -> bool {
        self.values.read().contains_key(name)
    }

    /// 全部顶层名称，包括占位符
    pub fn names(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }

    /// 顶层值快照
    pub fn values(&self) -> IndexMap<String, Value> {
        self.values.read().clone()
    }

    /// 扫描到的顶层名称，按发现顺序
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// 嵌套成员树
    pub fn registry(&self, name: &str) -> Option<&Value> {
        self.registry.get(name)
    }

    /// 类型信息
    pub fn types(&self) -> &[TypeEntry] {
        &self.types
    }

    /// 条目所在的根目录
    pub fn directory(&self, name: &str) -> Option<&Path> {
        self.directories.get(name).map(PathBuf::as_path)
    }

    /// 当前解析状态
    pub fn state(&self, name: &str) -> Option<EntryState> {
        self.states.lock().get(name).copied()
    }

    /// 尝试开始解析，检查与设置在同一次加锁内完成
    ///
    /// 已解析的名称只有在 `force` 时才能再次开始。
    pub(crate) fn begin(&self, name: &str, force: bool) -> bool {
        let mut states = self.states.lock();
        match states.get(name) {
            Some(EntryState::Resolving) => false,
            Some(EntryState::Resolved) if !force => false,
            _ => {
                states.insert(name.to_string(), EntryState::Resolving);
                true
            }
        }
    }

    /// 解析成功
    pub(crate) fn finish(&self, name: &str) {
        self.states
            .lock()
            .insert(name.to_string(), EntryState::Resolved);
    }

    /// 解析失败，清除状态以便重试
    pub(crate) fn abort(&self, name: &str) {
        self.states.lock().remove(name);
    }
}

impl std::fmt::Debug for ResolutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("names", &self.names())
            .field("registry", &self.registry.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_is_exclusive_until_finished_or_aborted() {
        let context = ResolutionContext::new(Value::Empty, Registration::new());

        assert!(context.begin("A", false));
        assert!(!context.begin("A", false));
        assert!(!context.begin("A", true));

        context.abort("A");
        assert_eq!(context.state("A"), None);
        assert!(context.begin("A", false));

        context.finish("A");
        assert_eq!(context.state("A"), Some(EntryState::Resolved));
        assert!(!context.begin("A", false));
        assert!(context.begin("A", true));
    }

    #[test]
    fn merging_keeps_first_values_and_fills_registry_gaps() {
        let mut first = Registration::new()
            .with_value("User", Value::from("first"))
            .with_value("Db", Value::Placeholder)
            .with_registry("User", Value::object_from([("a", Value::from(1))]));

        let second = Registration::new()
            .with_value("User", Value::from("second"))
            .with_value("Db", Value::from("db"))
            .with_value("Token", Value::object())
            .with_registry(
                "User",
                Value::object_from([("a", Value::from(2)), ("b", Value::from(3))]),
            );

        first.merge(second);

        assert_eq!(first.values["User"], Value::from("first"));
        assert_eq!(first.values["Db"], Value::from("db"));
        assert_eq!(first.keys, vec!["User", "Db", "Token"]);

        let tree = &first.registry["User"];
        assert_eq!(tree.get("a").unwrap(), Value::from(1));
        assert_eq!(tree.get("b").unwrap(), Value::from(3));
    }
}
