//! 装饰钩子
//!
//! `before` 在扫描完成后对每个原始值调用一次，`after` 在每个名称首次解析时调用一次，
//! 返回 `Some` 时可以替换缓存的值。

use infrastructure_common::{InjectResult, Value};
use std::fmt;
use std::sync::Arc;

/// 钩子函数签名，参数为条目名称与当前值
pub type HookFn = Arc<dyn Fn(&str, &Value) -> InjectResult<Option<Value>> + Send + Sync>;

/// 装饰钩子
#[derive(Clone, Default)]
pub struct Hooks {
    before: Option<HookFn>,
    after: Option<HookFn>,
}

impl Hooks {
    /// 创建空钩子
    pub fn new() -> Self {
        Self::default()
    }

    /// 只设置 `after` 钩子
    pub fn after_only<F>(f: F) -> Self
    where
        F: Fn(&str, &Value) -> InjectResult<Option<Value>> + Send + Sync + 'static,
    {
        Self::new().with_after(f)
    }

    /// 设置 `before` 钩子
    pub fn with_before<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &Value) -> InjectResult<Option<Value>> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(f));
        self
    }

    /// 设置 `after` 钩子
    pub fn with_after<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &Value) -> InjectResult<Option<Value>> + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(f));
        self
    }

    /// 是否设置了 `before` 钩子
    pub fn has_before(&self) -> bool {
        self.before.is_some()
    }

    /// 是否设置了 `after` 钩子
    pub fn has_after(&self) -> bool {
        self.after.is_some()
    }

    /// 调用 `before` 钩子，未设置时返回 `None`
    pub fn before(&self, name: &str, value: &Value) -> InjectResult<Option<Value>> {
        match &self.before {
            Some(hook) => hook(name, value),
            None => Ok(None),
        }
    }

    /// 调用 `after` 钩子，未设置时返回 `None`
    pub fn after(&self, name: &str, value: &Value) -> InjectResult<Option<Value>> {
        match &self.after {
            Some(hook) => hook(name, value),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before", &self.has_before())
            .field("after", &self.has_after())
            .finish()
    }
}
