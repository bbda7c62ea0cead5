//! 元数据定义
//!
//! 扫描时为每个入口文件记录一条类型信息，供声明生成器使用。

use crate::conventions::NamingConventions;
use serde::{Deserialize, Serialize};

/// 入口文件的类型信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeEntry {
    /// 名称路径，首段为顶层条目名称
    pub path: Vec<String>,
    /// 入口文件名，例如 `index.js`
    pub index: String,
    /// 是否带有自己的声明文件
    pub declared: bool,
    /// 是否为可注入定义
    pub injectable: bool,
}

impl TypeEntry {
    /// 创建类型信息
    pub fn new(path: Vec<String>, index: impl Into<String>) -> Self {
        Self {
            path,
            index: index.into(),
            declared: false,
            injectable: false,
        }
    }

    /// 标记是否带有声明文件
    pub fn declared(mut self, declared: bool) -> Self {
        self.declared = declared;
        self
    }

    /// 标记是否可注入
    pub fn injectable(mut self, injectable: bool) -> Self {
        self.injectable = injectable;
        self
    }

    /// 声明标识符
    pub fn identifier(&self) -> String {
        NamingConventions::identifier(&self.path)
    }

    /// 顶层条目名称
    pub fn root(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or_default()
    }

    /// 是否为嵌套成员
    pub fn is_nested(&self) -> bool {
        self.path.len() > 1
    }

    /// 相对入口文件路径，例如 `Name/prop/index.js`
    pub fn module_path(&self) -> String {
        let mut parts = self.path.clone();
        parts.push(self.index.clone());
        parts.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_know_their_identifier_and_module_path() {
        let entry = TypeEntry::new(vec!["Name".into(), "prop".into(), "method".into()], "index.js")
            .injectable(true);

        assert_eq!(entry.identifier(), "NamePropMethod");
        assert_eq!(entry.module_path(), "Name/prop/method/index.js");
        assert_eq!(entry.root(), "Name");
        assert!(entry.is_nested());
        assert!(!entry.declared);
    }
}
