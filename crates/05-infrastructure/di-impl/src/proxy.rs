//! 依赖代理
//!
//! 工厂调用时收到的上下文。每次调用都会新建代理，
//! 缓存型提供者在代理的生命周期内只求值一次。

use crate::container::Container;
use crate::context::ResolutionContext;
use di_abstractions::Hooks;
use indexmap::IndexMap;
use infrastructure_common::{DependencyProvider, InjectError, InjectResult, Provider, Value};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use tracing::debug;

/// 代理模式
#[derive(Debug, Clone)]
pub enum ProxyMode {
    /// 覆盖 `values` 中的全部名称，提供者返回假值时回退到容器解析
    Bind {
        /// 代理可访问的名称
        names: Vec<String>,
        /// 回退解析时使用的钩子
        hooks: Hooks,
    },
    /// 只覆盖声明的依赖，提供者不带参数调用，没有回退
    Use,
}

/// 依赖代理
pub struct DependencyProxy {
    me: Weak<DependencyProxy>,
    context: Weak<ResolutionContext>,
    providers: IndexMap<String, Provider>,
    mode: ProxyMode,
    cache: Mutex<HashMap<String, Value>>,
    in_flight: Mutex<HashSet<String>>,
}

impl DependencyProxy {
    /// 创建绑定模式的代理，`providers` 以逻辑名称为键
    pub fn bind(
        context: &Arc<ResolutionContext>,
        providers: IndexMap<String, Provider>,
        hooks: Hooks,
    ) -> Arc<Self> {
        let names = context.names();
        Self::build(context, providers, ProxyMode::Bind { names, hooks })
    }

    /// 创建轻量模式的代理
    pub fn use_only(context: &Arc<ResolutionContext>, providers: IndexMap<String, Provider>) -> Arc<Self> {
        Self::build(context, providers, ProxyMode::Use)
    }

    fn build(
        context: &Arc<ResolutionContext>,
        providers: IndexMap<String, Provider>,
        mode: ProxyMode,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            context: Arc::downgrade(context),
            providers,
            mode,
            cache: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
        })
    }

    /// 代理模式
    pub fn mode(&self) -> &ProxyMode {
        &self.mode
    }

    /// 以动态值形式引用自身
    pub fn as_value(&self) -> Value {
        match self.me.upgrade() {
            Some(me) => Value::Proxy(me),
            None => Value::Empty,
        }
    }

    fn covers(&self, key: &str) -> bool {
        match &self.mode {
            ProxyMode::Bind { names, .. } => names.iter().any(|name| name == key),
            ProxyMode::Use => self.providers.contains_key(key),
        }
    }

    fn evaluate(&self, key: &str, provider: &Provider) -> InjectResult<Value> {
        let context = self.context.upgrade().ok_or(InjectError::ContextDropped)?;
        let target = provider.target();

        if !is_invocable(target) {
            return Err(InjectError::InvalidProvider {
                key: key.to_string(),
                given: target.describe(),
            });
        }

        match &self.mode {
            ProxyMode::Bind { hooks, .. } => {
                let produced = target.call_with(context.root(), &[self.as_value()])?;
                if produced.is_truthy() {
                    return Ok(produced);
                }
                debug!("提供者 '{}' 未返回值，回退到容器解析", key);
                Container::new(context).get(key, hooks, false)
            }
            ProxyMode::Use => {
                let produced = target.call_with(context.root(), &[])?;
                Ok(if produced.is_truthy() { produced } else { Value::Empty })
            }
        }
    }
}

impl DependencyProvider for DependencyProxy {
    fn resolve(&self, key: &str) -> InjectResult<Value> {
        if !self.covers(key) {
            return Ok(Value::Empty);
        }

        let provider = self
            .providers
            .get(key)
            .ok_or_else(|| InjectError::MissingProvider {
                name: key.to_string(),
            })?;

        if !provider.is_live() {
            if let Some(value) = self.cache.lock().get(key) {
                return Ok(value.clone());
            }
        }

        if !self.in_flight.lock().insert(key.to_string()) {
            return Err(InjectError::CircularProvider {
                name: key.to_string(),
            });
        }

        let result = self.evaluate(key, provider);
        self.in_flight.lock().remove(key);
        let value = result?;

        if !provider.is_live() {
            self.cache.lock().insert(key.to_string(), value.clone());
        }

        Ok(value)
    }

    fn keys(&self) -> Vec<String> {
        match &self.mode {
            ProxyMode::Bind { names, .. } => names.clone(),
            ProxyMode::Use => self.providers.keys().cloned().collect(),
        }
    }
}

/// 提供者必须是函数，类不能直接调用
pub(crate) fn is_invocable(value: &Value) -> bool {
    value.is_callable() && value.arity().is_none()
}
