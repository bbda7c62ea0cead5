//! 容器
//!
//! 实现按名称解析的核心算法：首次访问时展开嵌套成员、锁定目标并调用 `after` 钩子，
//! 之后的访问直接返回缓存的值。

use crate::context::ResolutionContext;
use crate::injector::Injector;
use di_abstractions::Hooks;
use infrastructure_common::{DependencyNode, FactoryKind, InjectError, InjectResult, Object, Value};
use std::sync::Arc;
use tracing::{debug, error};

/// 容器
#[derive(Debug, Clone)]
pub struct Container {
    context: Arc<ResolutionContext>,
}

impl Container {
    /// 以解析上下文创建容器
    pub fn new(context: Arc<ResolutionContext>) -> Self {
        Self { context }
    }

    /// 解析上下文
    pub fn context(&self) -> &Arc<ResolutionContext> {
        &self.context
    }

    /// 按名称解析
    pub fn get(&self, name: &str, hooks: &Hooks, force_refresh: bool) -> InjectResult<Value> {
        let target = self.context.value(name).unwrap_or_default();

        if matches!(target, Value::Placeholder) {
            return Ok(Value::Empty);
        }

        if !matches!(target, Value::Object(_) | Value::Node(_)) {
            return Err(InjectError::NotAnObject {
                name: name.to_string(),
                given: target.describe(),
            });
        }

        let target = match target {
            Value::Node(node) => match self.materialize(name, &node, hooks) {
                Ok(Materialized::Target(value)) => value,
                Ok(Materialized::Done(value)) => return Ok(value),
                Err(e) => return Err(self.fail(name, e)),
            },
            other => other,
        };

        if target.is_locked() && !force_refresh {
            return Ok(target);
        }

        if !self.context.begin(name, force_refresh) {
            debug!("'{}' 正在解析或已解析，返回当前值", name);
            return Ok(self.context.value(name).unwrap_or(target));
        }

        match self.decorate(name, &target, hooks, force_refresh) {
            Ok(value) => {
                self.context.finish(name);
                Ok(value)
            }
            Err(e) => {
                self.context.abort(name);
                Err(self.fail(name, e))
            }
        }
    }

    fn materialize(
        &self,
        name: &str,
        node: &Arc<DependencyNode>,
        hooks: &Hooks,
    ) -> InjectResult<Materialized> {
        let value = match node.kind() {
            FactoryKind::Constructible { arity: 1 } => self.inject_class(node, hooks),
            FactoryKind::Constructible { .. } => {
                let class = node.factory().clone();
                if !self.context.begin(name, false) {
                    return Ok(Materialized::Done(class));
                }
                let decorated = match hooks.after(name, &class) {
                    Ok(decorated) => substitute(decorated, &class),
                    Err(e) => {
                        self.context.abort(name);
                        return Err(e);
                    }
                };
                self.context.set_value(name, decorated.clone());
                self.context.finish(name);
                return Ok(Materialized::Done(decorated));
            }
            _ => Injector::use_node(&self.context, node)?,
        };

        self.context.set_value(name, value.clone());
        Ok(Materialized::Target(value))
    }

    /// 把单参数构造的类包装为注入类，每次构造都会新建绑定代理
    fn inject_class(&self, node: &Arc<DependencyNode>, hooks: &Hooks) -> Value {
        let context = Arc::downgrade(&self.context);
        let node = Arc::clone(node);
        let hooks = hooks.clone();

        let raw = node.factory().as_object().map(Arc::clone);
        let wrapper = Value::class(1, move |_, _| {
            let context = context.upgrade().ok_or(InjectError::ContextDropped)?;
            Injector::bind(&context, &node, &hooks)
        });

        // 保留类自身的静态成员
        if let (Some(target), Some(raw)) = (wrapper.as_object(), raw) {
            target.extend_from(&raw);
        }
        wrapper
    }

    fn decorate(
        &self,
        name: &str,
        target: &Value,
        hooks: &Hooks,
        force_refresh: bool,
    ) -> InjectResult<Value> {
        let extensions = match self.context.registry(name) {
            Some(tree) => self.unwrap(tree, hooks)?,
            None => Value::object(),
        };

        let extended = if force_refresh {
            Injector::assign_refresh(target, &extensions)?
        } else {
            Injector::assign(target, &extensions)?
        };

        let decorated = substitute(hooks.after(name, &extended)?, &extended);
        if !decorated.same(&extended) {
            debug!("'{}' 已被 after 钩子替换", name);
            self.context.set_value(name, decorated.clone());
        }
        Ok(decorated)
    }

    fn fail(&self, name: &str, source: InjectError) -> InjectError {
        let directory = self
            .context
            .directory(name)
            .map(|dir| dir.display().to_string());
        error!("'{}' 的定义失败: {}", name, source);
        InjectError::definition_failed(name, directory, source)
    }

    /// 递归展开定义：节点被绑定，数组逐项展开，普通对象展开为新对象
    pub fn unwrap(&self, definition: &Value, hooks: &Hooks) -> InjectResult<Value> {
        match definition {
            Value::Node(node) => Injector::bind(&self.context, node, hooks),
            Value::List(items) => items
                .iter()
                .map(|item| self.unwrap(item, hooks))
                .collect::<InjectResult<Vec<_>>>()
                .map(Value::List),
            Value::Object(object) if object.is_plain() => {
                let target = Object::plain();
                for (key, value) in object.entries() {
                    target.set(key, self.unwrap(&value, hooks)?);
                }
                Ok(Value::Object(Arc::new(target)))
            }
            other => Ok(other.clone()),
        }
    }

    /// 是否含有指定名称
    pub fn has(&self, name: &str) -> bool {
        self.context.contains(name)
    }

    /// 全部顶层名称
    pub fn names(&self) -> Vec<String> {
        self.context.names()
    }

    /// 当前缓存的值，不触发解析
    pub fn value(&self, name: &str) -> Option<Value> {
        self.context.value(name)
    }
}

enum Materialized {
    /// 继续展开与装饰
    Target(Value),
    /// 直接返回
    Done(Value),
}

/// 钩子返回真值且不是同一实例时才替换
fn substitute(decorated: Option<Value>, current: &Value) -> Value {
    match decorated {
        Some(value) if value.is_truthy() && !value.same(current) => value,
        _ => current.clone(),
    }
}
