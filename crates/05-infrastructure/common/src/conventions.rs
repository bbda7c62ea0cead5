//! 命名约定规范
//!
//! 目录片段到条目名称的确定性映射：顶层目录得到 PascalCase 名称，
//! 嵌套目录得到 camelCase 名称。

/// 命名约定规范
#[derive(Debug)]
pub struct NamingConventions;

impl NamingConventions {
    /// 将 `-x` 形式的片段转换为驼峰命名
    pub fn camel_case(value: &str) -> String {
        let mut result = String::with_capacity(value.len());
        let mut chars = value.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch == '-' {
                if let Some(&next) = chars.peek() {
                    if next.is_ascii_alphabetic() {
                        result.push(next.to_ascii_uppercase());
                        chars.next();
                        continue;
                    }
                }
            }
            result.push(ch);
        }

        result
    }

    /// 首字母大写
    pub fn uc_first(value: &str) -> String {
        let mut chars = value.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// 顶层条目名称
    pub fn entry_name(segment: &str) -> String {
        Self::uc_first(&Self::camel_case(segment))
    }

    /// 嵌套成员名称
    pub fn member_name(segment: &str) -> String {
        Self::camel_case(segment)
    }

    /// 去掉依赖键的 `get` 前缀
    ///
    /// 仅当前缀后紧跟大写字母时才视为前缀，`getter` 保持不变。
    pub fn strip_getter_prefix(key: &str) -> &str {
        match key.strip_prefix("get") {
            Some(rest) if rest.chars().next().is_some_and(char::is_uppercase) => rest,
            _ => key,
        }
    }

    /// 由路径片段得到声明标识符，例如 `["Test", "sub-item"]` 得到 `TestSubItem`
    pub fn identifier(path: &[String]) -> String {
        Self::camel_case(&path.join("-"))
    }
}
