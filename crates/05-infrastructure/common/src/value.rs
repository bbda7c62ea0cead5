//! 动态值模型
//!
//! 扫描得到的模块可能是普通对象、函数、类或标量数据，统一用 [`Value`] 表示。
//! 对象以 [`ObjectRef`] 共享，属性表和锁定标记都在对象内部，
//! 因此任何持有句柄的一方看到的都是同一个实例。

use crate::errors::{InjectError, InjectResult};
use crate::injectable::DependencyNode;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 原生函数签名，参数依次为 `this` 与实参列表
pub type NativeFn = Arc<dyn Fn(&Value, &[Value]) -> InjectResult<Value> + Send + Sync>;

/// 依赖代理接口
///
/// 工厂在调用时收到的上下文，按逻辑名称惰性解析依赖。
pub trait DependencyProvider: Send + Sync {
    /// 解析指定名称的依赖
    fn resolve(&self, key: &str) -> InjectResult<Value>;

    /// 代理可解析的全部名称
    fn keys(&self) -> Vec<String>;
}

/// 可调用对象的声明方式
///
/// 由注册方显式声明，取代运行时的类检测。
#[derive(Clone)]
pub enum Callable {
    /// 注入时以依赖代理调用，返回值即注入结果
    Injectable(NativeFn),
    /// 作为函数本身导出，注入时原样返回
    Function(NativeFn),
    /// 类，注入时以依赖代理构造实例
    Class {
        /// 构造参数个数
        arity: usize,
        /// 构造函数，`this` 为类对象本身
        construct: NativeFn,
    },
}

impl Callable {
    fn label(&self) -> String {
        match self {
            Self::Injectable(_) => "[Function (injectable)]".to_string(),
            Self::Function(_) => "[Function]".to_string(),
            Self::Class { arity, .. } => format!("[class (arity {arity})]"),
        }
    }
}

/// 对象：属性表，可附带调用能力
pub struct Object {
    callable: Option<Callable>,
    props: RwLock<IndexMap<String, Value>>,
    locked: AtomicBool,
}

/// 对象句柄
pub type ObjectRef = Arc<Object>;

impl Object {
    /// 创建空的普通对象
    pub fn plain() -> Self {
        Self::with_callable(None)
    }

    /// 创建带调用能力的对象
    pub fn with_callable(callable: Option<Callable>) -> Self {
        Self {
            callable,
            props: RwLock::new(IndexMap::new()),
            locked: AtomicBool::new(false),
        }
    }

    /// 调用能力
    pub fn callable(&self) -> Option<&Callable> {
        self.callable.as_ref()
    }

    /// 是否为普通对象（不可调用）
    pub fn is_plain(&self) -> bool {
        self.callable.is_none()
    }

    /// 读取属性
    pub fn get(&self, key: &str) -> Option<Value> {
        self.props.read().get(key).cloned()
    }

    /// 写入属性
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.props.write().insert(key.into(), value);
    }

    /// 是否含有属性
    pub fn contains(&self, key: &str) -> bool {
        self.props.read().contains_key(key)
    }

    /// 属性名列表（按插入顺序）
    pub fn keys(&self) -> Vec<String> {
        self.props.read().keys().cloned().collect()
    }

    /// 属性快照
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.props
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// 属性数量
    pub fn len(&self) -> usize {
        self.props.read().len()
    }

    /// 是否没有属性
    pub fn is_empty(&self) -> bool {
        self.props.read().is_empty()
    }

    /// 合并另一个对象的自有属性
    pub fn extend_from(&self, source: &Object) {
        // 先取快照，source 与 self 为同一对象时也不会死锁
        let entries = source.entries();
        let mut props = self.props.write();
        for (key, value) in entries {
            props.insert(key, value);
        }
    }

    /// 是否已锁定
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// 设置锁定标记，一经设置不可撤销
    pub fn mark_locked(&self) {
        self.locked.store(true, Ordering::Release);
    }
}

/// 动态值
#[derive(Clone)]
pub enum Value {
    /// 未定义 / 空
    Empty,
    /// 标量数据
    Data(serde_json::Value),
    /// 数组
    List(Vec<Value>),
    /// 对象句柄
    Object(ObjectRef),
    /// 尚未调用的依赖节点
    Node(Arc<DependencyNode>),
    /// 依赖代理
    Proxy(Arc<dyn DependencyProvider>),
    /// 根级依赖占位符，解析结果为空
    Placeholder,
}

impl Value {
    /// 创建空的普通对象
    pub fn object() -> Self {
        Self::Object(Arc::new(Object::plain()))
    }

    /// 以键值对创建普通对象
    pub fn object_from<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let object = Object::plain();
        for (key, value) in entries {
            object.set(key, value);
        }
        Self::Object(Arc::new(object))
    }

    /// 创建注入时以代理调用的函数
    pub fn injectable<F>(f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> InjectResult<Value> + Send + Sync + 'static,
    {
        Self::callable(Callable::Injectable(Arc::new(f)))
    }

    /// 创建原样导出的函数
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> InjectResult<Value> + Send + Sync + 'static,
    {
        Self::callable(Callable::Function(Arc::new(f)))
    }

    /// 创建类
    pub fn class<F>(arity: usize, construct: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> InjectResult<Value> + Send + Sync + 'static,
    {
        Self::callable(Callable::Class {
            arity,
            construct: Arc::new(construct),
        })
    }

    /// 以指定调用能力创建对象
    pub fn callable(callable: Callable) -> Self {
        Self::Object(Arc::new(Object::with_callable(Some(callable))))
    }

    /// 创建标量数据
    pub fn data(value: impl Into<serde_json::Value>) -> Self {
        Self::from(value.into())
    }

    /// 真值判断，沿用动态语言的语义
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Empty => false,
            Self::Data(data) => match data {
                serde_json::Value::Null => false,
                serde_json::Value::Bool(b) => *b,
                serde_json::Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
                serde_json::Value::String(s) => !s.is_empty(),
                _ => true,
            },
            _ => true,
        }
    }

    /// 是否为空值
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// 对象句柄
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// 依赖节点
    pub fn as_node(&self) -> Option<&Arc<DependencyNode>> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    /// 标量数据
    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Data(data) => Some(data),
            _ => None,
        }
    }

    /// 字符串数据
    pub fn as_str(&self) -> Option<&str> {
        self.as_data().and_then(serde_json::Value::as_str)
    }

    /// 整数数据
    pub fn as_i64(&self) -> Option<i64> {
        self.as_data().and_then(serde_json::Value::as_i64)
    }

    /// 是否可调用（函数或类）
    pub fn is_callable(&self) -> bool {
        self.as_object().is_some_and(|object| !object.is_plain())
    }

    /// 是否为普通对象
    pub fn is_plain_object(&self) -> bool {
        self.as_object().is_some_and(|object| object.is_plain())
    }

    /// 是否已锁定
    pub fn is_locked(&self) -> bool {
        self.as_object().is_some_and(|object| object.is_locked())
    }

    /// 句柄相等：对象、节点和代理比较指针，其余比较值
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Node(a), Self::Node(b)) => Arc::ptr_eq(a, b),
            (Self::Proxy(a), Self::Proxy(b)) => same_proxy(a, b),
            (Self::List(_), Self::List(_)) => false,
            _ => self == other,
        }
    }

    /// 读取属性：对象读取自有属性，代理解析依赖，其余返回空
    pub fn get(&self, key: &str) -> InjectResult<Value> {
        match self {
            Self::Object(object) => Ok(object.get(key).unwrap_or(Self::Empty)),
            Self::Proxy(proxy) => proxy.resolve(key),
            _ => Ok(Self::Empty),
        }
    }

    /// 以空 `this` 调用函数
    pub fn call(&self, args: &[Value]) -> InjectResult<Value> {
        self.call_with(&Self::Empty, args)
    }

    /// 以指定 `this` 调用函数
    pub fn call_with(&self, this: &Value, args: &[Value]) -> InjectResult<Value> {
        match self.as_object().and_then(|object| object.callable()) {
            Some(Callable::Injectable(f) | Callable::Function(f)) => f(this, args),
            _ => Err(InjectError::NotCallable {
                given: self.describe(),
            }),
        }
    }

    /// 构造类实例
    pub fn construct(&self, args: &[Value]) -> InjectResult<Value> {
        match self.as_object().and_then(|object| object.callable()) {
            Some(Callable::Class { construct, .. }) => construct(self, args),
            _ => Err(InjectError::NotCallable {
                given: self.describe(),
            }),
        }
    }

    /// 类的构造参数个数
    pub fn arity(&self) -> Option<usize> {
        match self.as_object().and_then(|object| object.callable()) {
            Some(Callable::Class { arity, .. }) => Some(*arity),
            _ => None,
        }
    }

    /// 用于错误信息的简短描述
    pub fn describe(&self) -> String {
        match self {
            Self::Empty => "undefined".to_string(),
            Self::Data(serde_json::Value::String(s)) => format!("'{s}'"),
            Self::Data(data) => data.to_string(),
            Self::List(items) => format!("[ {} 项 ]", items.len()),
            Self::Object(object) => match object.callable() {
                Some(callable) => callable.label(),
                None => format!("{{ {} }}", object.keys().join(", ")),
            },
            Self::Node(node) => format!("Injector<{}>", node.dependencies().keys().join(", ")),
            Self::Proxy(proxy) => format!("Injector<{}>", proxy.keys().join(", ")),
            Self::Placeholder => "[Placeholder]".to_string(),
        }
    }

    /// 转换为 JSON 快照，函数以描述字符串表示，循环引用以 `[Circular]` 表示
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_guarded(&mut Vec::new())
    }

    fn to_json_guarded(&self, seen: &mut Vec<*const Object>) -> serde_json::Value {
        match self {
            Self::Empty | Self::Placeholder => serde_json::Value::Null,
            Self::Data(data) => data.clone(),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json_guarded(seen)).collect())
            }
            Self::Object(object) => {
                let ptr = Arc::as_ptr(object);
                if seen.contains(&ptr) {
                    return serde_json::Value::String("[Circular]".to_string());
                }
                if let Some(callable) = object.callable() {
                    if object.is_empty() {
                        return serde_json::Value::String(callable.label());
                    }
                }
                seen.push(ptr);
                let map = object
                    .entries()
                    .into_iter()
                    .map(|(k, v)| (k, v.to_json_guarded(seen)))
                    .collect();
                seen.pop();
                serde_json::Value::Object(map)
            }
            Self::Node(_) | Self::Proxy(_) => serde_json::Value::String(self.describe()),
        }
    }
}

fn same_proxy(a: &Arc<dyn DependencyProvider>, b: &Arc<dyn DependencyProvider>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

impl Default for Value {
    fn default() -> Self {
        Self::Empty
    }
}

impl PartialEq for Value {
    /// 结构相等，忽略锁定标记
    fn eq(&self, other: &Self) -> bool {
        self.eq_guarded(other, &mut Vec::new())
    }
}

impl Value {
    /// 正在比较的对象对视为相等，循环引用不会无限递归
    fn eq_guarded(&self, other: &Self, comparing: &mut Vec<(*const Object, *const Object)>) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) | (Self::Placeholder, Self::Placeholder) => true,
            (Self::Data(a), Self::Data(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_guarded(y, comparing))
            }
            (Self::Object(a), Self::Object(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                if !a.is_plain() || !b.is_plain() {
                    return false;
                }
                let pair = (Arc::as_ptr(a), Arc::as_ptr(b));
                if comparing.contains(&pair) {
                    return true;
                }

                let (left, right) = (a.entries(), b.entries());
                if left.len() != right.len() {
                    return false;
                }
                comparing.push(pair);
                let equal = left
                    .iter()
                    .zip(&right)
                    .all(|((ka, va), (kb, vb))| ka == kb && va.eq_guarded(vb, comparing));
                comparing.pop();
                equal
            }
            (Self::Node(a), Self::Node(b)) => Arc::ptr_eq(a, b),
            (Self::Proxy(a), Self::Proxy(b)) => same_proxy(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::object_from(
                map.into_iter().map(|(k, v)| (k, Self::from(v))),
            ),
            data => Self::Data(data),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Data(serde_json::Value::String(value.to_string()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Data(serde_json::Value::String(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Data(serde_json::Value::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Data(serde_json::Value::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Data(serde_json::Value::Bool(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Self::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cyclic_objects_compare_without_overflow() {
        let a = Value::object_from([("name", Value::from("node"))]);
        let b = Value::object_from([("name", Value::from("node"))]);
        a.as_object().unwrap().set("next", a.clone());
        b.as_object().unwrap().set("next", b.clone());
        assert_eq!(a, b);

        let c = Value::object_from([("name", Value::from("other"))]);
        c.as_object().unwrap().set("next", c.clone());
        assert_ne!(a, c);
    }

    #[test]
    fn truthiness_follows_dynamic_semantics() {
        assert!(!Value::Empty.is_truthy());
        assert!(!Value::data(json!(null)).is_truthy());
        assert!(!Value::data(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from(false).is_truthy());

        assert!(Value::from("x").is_truthy());
        assert!(Value::object().is_truthy());
        assert!(Value::Placeholder.is_truthy());
        assert!(Value::List(Vec::new()).is_truthy());
    }

    #[test]
    fn structural_equality_ignores_lock_marker() {
        let a = Value::object_from([("foo", Value::from("BAR"))]);
        let b = Value::object_from([("foo", Value::from("BAR"))]);

        a.as_object().unwrap().mark_locked();

        assert_eq!(a, b);
        assert!(!a.same(&b));
        assert!(a.is_locked());
        assert!(!b.is_locked());
    }

    #[test]
    fn json_objects_become_object_handles() {
        let value = Value::from(json!({ "a": { "b": [1, 2] }, "c": "d" }));

        let inner = value.get("a").unwrap();
        assert!(inner.is_plain_object());
        assert_eq!(inner.get("b").unwrap(), Value::List(vec![Value::from(1), Value::from(2)]));
        assert_eq!(value.to_json(), json!({ "a": { "b": [1, 2] }, "c": "d" }));
    }

    #[test]
    fn calling_and_constructing_respect_declared_kind() {
        let add = Value::function(|_, args| {
            let sum: i64 = args.iter().filter_map(Value::as_i64).sum();
            Ok(Value::from(sum))
        });
        assert_eq!(add.call(&[Value::from(2), Value::from(40)]).unwrap(), Value::from(42));
        assert!(matches!(add.construct(&[]), Err(InjectError::NotCallable { .. })));

        let point = Value::class(1, |_, args| {
            Ok(Value::object_from([("x", args.first().cloned().unwrap_or_default())]))
        });
        assert_eq!(point.arity(), Some(1));
        assert_eq!(point.construct(&[Value::from(3)]).unwrap().get("x").unwrap(), Value::from(3));
        assert!(matches!(point.call(&[]), Err(InjectError::NotCallable { .. })));
    }

    #[test]
    fn circular_objects_do_not_loop_when_serialized() {
        let value = Value::object();
        let object = value.as_object().unwrap();
        object.set("me", value.clone());

        assert_eq!(value.to_json(), json!({ "me": "[Circular]" }));
    }

    #[test]
    fn describe_matches_error_messages() {
        assert_eq!(Value::Empty.describe(), "undefined");
        assert_eq!(Value::from(42).describe(), "42");
        assert_eq!(Value::from("TEST").describe(), "'TEST'");
        assert_eq!(Value::data(json!(null)).describe(), "null");
    }
}
