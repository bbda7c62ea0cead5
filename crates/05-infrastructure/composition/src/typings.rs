//! 类型声明生成
//!
//! 根据扫描得到的 [`TypeEntry`] 列表生成声明片段：每个叶子模块一条导入（或空接口），
//! 每个顶层名称一个 `export interface` 和一个 `export namespace`，嵌套层级与子路径一致。

use indexmap::IndexMap;
use infrastructure_common::{NamingConventions, TypeEntry};
use std::fmt;
use std::sync::Arc;

/// 自定义引用生成函数，参数为声明标识符与类型信息
pub type ReferenceFn = Arc<dyn Fn(&str, &TypeEntry) -> String + Send + Sync>;

/// 非注入模块的引用方式
#[derive(Clone, Default)]
pub enum References {
    /// 声明空接口
    #[default]
    Declare,
    /// 以 `import type` 引用模块
    Import,
    /// 自定义
    Custom(ReferenceFn),
}

impl fmt::Debug for References {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declare => f.write_str("Declare"),
            Self::Import => f.write_str("Import"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// 生成选项
#[derive(Debug, Clone, Default)]
pub struct TypeOptions {
    /// 顶层接口额外继承的类型
    pub extend: Vec<String>,
    /// 是否生成注释
    pub comments: bool,
    /// 每个顶层接口都要声明的属性
    pub properties: Vec<String>,
    /// 非注入模块的引用方式
    pub references: References,
    /// 声明形式，例如 `interface:Module`
    pub declaration: Option<String>,
}

/// 声明片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 所属的顶层名称，只有顶层接口片段才有
    pub kind: Option<String>,
    /// 片段文本
    pub text: String,
}

impl Chunk {
    fn text(text: impl Into<String>) -> Self {
        Self {
            kind: None,
            text: text.into(),
        }
    }
}

#[derive(Debug, Default)]
struct Group {
    props: IndexMap<String, Group>,
}

/// 类型声明生成器
pub struct TypingsGenerator<'a> {
    types: &'a [TypeEntry],
    options: &'a TypeOptions,
    definitions: Vec<String>,
}

impl<'a> TypingsGenerator<'a> {
    /// 创建生成器
    pub fn new(types: &'a [TypeEntry], options: &'a TypeOptions) -> Self {
        Self {
            types,
            options,
            definitions: types.iter().map(TypeEntry::identifier).collect(),
        }
    }

    /// 生成全部片段
    pub fn generate(&self) -> Vec<Chunk> {
        let mut imports = Vec::with_capacity(self.types.len());
        let mut groups = Group::default();

        for entry in self.types {
            imports.push(Chunk::text(self.reference(entry)));

            let mut group = &mut groups;
            for key in &entry.path {
                group = group.props.entry(key.clone()).or_default();
            }
        }

        // 导入按发现顺序倒序排列
        imports.reverse();
        let mut chunks = imports;

        for (key, group) in groups.props.iter_mut() {
            for prop in &self.options.properties {
                group.props.entry(prop.clone()).or_default();
            }
            chunks.extend(self.declare(key, group));
        }

        chunks
    }

    /// 片段文本以换行连接
    pub fn render(&self) -> String {
        self.generate()
            .into_iter()
            .map(|chunk| chunk.text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn is_defined(&self, identifier: &str) -> bool {
        self.definitions.iter().any(|def| def == identifier)
    }

    fn reference(&self, entry: &TypeEntry) -> String {
        let identifier = entry.identifier();

        if entry.injectable && entry.is_nested() {
            if entry.declared {
                let last = entry.path.last().map(String::as_str).unwrap_or_default();
                return format!(
                    "import type {{ {} as {identifier}Module }} from './{}';",
                    NamingConventions::camel_case(last),
                    entry.path.join("/")
                );
            }
            return format!("import {identifier}Module from './{}';", entry.module_path());
        }

        match &self.options.references {
            References::Custom(f) => f(&identifier, entry),
            References::Import => {
                format!("import type {identifier}Module from './{}';", entry.path.join("/"))
            }
            References::Declare => format!("interface {identifier}Module {{}}"),
        }
    }

    fn declare(&self, key: &str, group: &Group) -> Vec<Chunk> {
        let mut exts = Vec::new();
        if self.is_defined(key) {
            exts.push(format!("{key}Module"));
        }
        exts.extend(self.options.extend.iter().cloned());
        let suffix = if exts.is_empty() {
            String::new()
        } else {
            format!(" extends {}", exts.join(", "))
        };

        let (schema, object) = match self.options.declaration.as_deref() {
            Some(declaration) => match declaration.split_once(':') {
                Some((schema, object)) => (schema, Some(object)),
                None => (declaration, None),
            },
            None => ("interface", None),
        };
        let klass = NamingConventions::uc_first(schema);
        let sub = match object {
            Some(object) if !object.is_empty() => NamingConventions::uc_first(object),
            _ => format!("{klass}Module"),
        };

        let mut props = String::new();
        for prop in group.props.keys() {
            let member = NamingConventions::camel_case(prop);
            if self.options.comments {
                props.push_str(&format!("/**\nThe `{key}.{member}` object.\n*/\n"));
            }
            props.push_str(&format!(
                "  {member}: {key}{sub}.{};\n",
                NamingConventions::uc_first(&member)
            ));
        }
        let body = if props.is_empty() {
            String::new()
        } else {
            format!("\n{props}")
        };

        let lower = klass.to_lowercase();
        let mut chunks = Vec::with_capacity(4);
        if self.options.comments {
            chunks.push(Chunk::text(format!(
                "/**\nModule declaration for `{key}` {lower}.\n*/"
            )));
        }
        chunks.push(Chunk {
            kind: Some(key.to_string()),
            text: format!("export interface {key}{klass}{suffix} {{{body}}}"),
        });
        if self.options.comments {
            chunks.push(Chunk::text(format!("/**\nNamespace for `{key}` {lower}.\n*/")));
        }
        chunks.push(Chunk::text(format!(
            "export namespace {key}{sub} {{{}}}",
            self.nest(group, &[key.to_string()], true)
        )));
        chunks
    }

    fn nest(&self, group: &Group, path: &[String], interface: bool) -> String {
        let pre = "  ".repeat(path.len());
        let mut out = String::new();

        for (key, child) in &group.props {
            let mut full = path.to_vec();
            full.push(key.clone());

            let def = NamingConventions::identifier(&full);
            let defined = self.is_defined(&def);
            let has_props = !child.props.is_empty();
            let member = NamingConventions::camel_case(key);
            let type_name = NamingConventions::uc_first(&member);

            if out.is_empty() && path.len() == 1 {
                out.push('\n');
            }

            if self.options.comments {
                out.push_str(&format!("/**\nDeclaration for `{}` object.\n*/\n", full.join(".")));
            }

            if interface && defined && !has_props {
                out.push_str(&format!("{pre}export type {type_name} = typeof {def}Module;\n"));
                continue;
            }

            if interface {
                out.push_str(&format!("{pre}export interface {type_name}"));
            } else {
                out.push_str(&format!("{pre}{member}:"));
            }

            if defined {
                if interface {
                    out.push_str(&format!(" extends {def}Module"));
                } else {
                    out.push_str(&format!(" typeof {def}Module"));
                }
            }

            if has_props {
                if defined && !interface {
                    out.push_str(" &");
                }
                out.push_str(&format!(" {{\n{}{pre}}}", self.nest(child, &full, false)));
                out.push_str(if interface { "\n" } else { ";\n" });
            } else {
                out.push_str(if interface { " {}\n" } else { ";\n" });
            }
        }

        out
    }
}
