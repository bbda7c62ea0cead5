//! 注入器
//!
//! 把 [`DependencyNode`] 变成具体的值，并负责唯一的修改入口 [`Injector::assign`]。

use crate::context::ResolutionContext;
use crate::proxy::{is_invocable, DependencyProxy};
use di_abstractions::Hooks;
use indexmap::IndexMap;
use infrastructure_common::{
    DependencyNode, InjectError, InjectResult, NamingConventions, Object, Value,
};
use std::sync::Arc;
use tracing::debug;

/// 注入器
#[derive(Debug)]
pub struct Injector;

impl Injector {
    /// 以绑定模式调用节点
    ///
    /// 先校验每个声明的依赖都存在且有值、提供者可调用，然后才调用工厂。
    pub fn bind(
        context: &Arc<ResolutionContext>,
        node: &DependencyNode,
        hooks: &Hooks,
    ) -> InjectResult<Value> {
        let mut providers = IndexMap::new();

        for (key, provider) in node.dependencies().iter() {
            let name = NamingConventions::strip_getter_prefix(key);

            match context.value(name) {
                None => {
                    return Err(InjectError::MissingDependency {
                        name: name.to_string(),
                    })
                }
                Some(value) if !value.is_truthy() => {
                    return Err(InjectError::UndefinedValue {
                        name: name.to_string(),
                    })
                }
                Some(_) => {}
            }

            if !is_invocable(provider.target()) {
                return Err(InjectError::InvalidProvider {
                    key: key.clone(),
                    given: provider.target().describe(),
                });
            }

            providers.insert(name.to_string(), provider.clone());
        }

        let proxy = DependencyProxy::bind(context, providers, hooks.clone());
        Self::invoke(node, proxy.as_value())
    }

    /// 以轻量模式调用节点，依赖只来自节点自己的提供者
    pub fn use_node(context: &Arc<ResolutionContext>, node: &DependencyNode) -> InjectResult<Value> {
        let providers = node
            .dependencies()
            .iter()
            .map(|(key, provider)| {
                (
                    NamingConventions::strip_getter_prefix(key).to_string(),
                    provider.clone(),
                )
            })
            .collect();

        let proxy = DependencyProxy::use_only(context, providers);
        Self::invoke(node, proxy.as_value())
    }

    fn invoke(node: &DependencyNode, proxy: Value) -> InjectResult<Value> {
        node.invoke(proxy).map_err(|e| {
            match node.origin() {
                Some(origin) => debug!("定义调用失败: {}, 原因: {}", origin.display(), e),
                None => debug!("定义调用失败: {}", e),
            }
            e
        })
    }

    /// 合并扩展属性并锁定目标
    pub fn assign(target: &Value, extensions: &Value) -> InjectResult<Value> {
        let object = Self::target_object(target)?;
        if object.is_locked() {
            return Err(InjectError::AlreadyLocked);
        }
        Self::extend(object, extensions);
        Ok(target.clone())
    }

    /// 强制刷新时使用，跳过锁定检查
    pub fn assign_refresh(target: &Value, extensions: &Value) -> InjectResult<Value> {
        let object = Self::target_object(target)?;
        Self::extend(object, extensions);
        Ok(target.clone())
    }

    fn target_object(target: &Value) -> InjectResult<&Object> {
        target
            .as_object()
            .map(Arc::as_ref)
            .ok_or_else(|| InjectError::TargetNotObject {
                given: target.describe(),
            })
    }

    fn extend(object: &Object, extensions: &Value) {
        if let Some(source) = extensions.as_object() {
            object.extend_from(source);
        }
        object.mark_locked();
    }

    /// 是否为依赖节点
    pub fn supports(value: &Value) -> bool {
        matches!(value, Value::Node(_))
    }

    /// 是否已锁定
    pub fn has_locked(value: &Value) -> bool {
        value.is_locked()
    }
}
