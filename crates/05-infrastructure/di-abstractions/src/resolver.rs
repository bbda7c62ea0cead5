//! 组件解析器抽象接口

use infrastructure_common::{InjectResult, Value};

/// 组件解析器 trait
///
/// 按名称解析条目，解析结果在首次访问后缓存。
pub trait ComponentResolver: Send + Sync {
    /// 解析指定名称的条目
    fn resolve(&self, name: &str) -> InjectResult<Value>;

    /// 强制重新解析指定名称的条目
    fn refresh(&self, name: &str) -> InjectResult<Value>;

    /// 是否登记了指定名称
    fn has(&self, name: &str) -> bool;

    /// 全部顶层名称，按发现顺序
    fn names(&self) -> Vec<String>;

    /// 解析全部条目，遇到第一个错误即返回
    fn resolve_all(&self) -> InjectResult<Vec<(String, Value)>> {
        self.names()
            .into_iter()
            .map(|name| self.resolve(&name).map(|value| (name, value)))
            .collect()
    }
}
