//! 目录扫描器
//!
//! 在根目录下查找 `<Name>/**/index.*` 入口文件，按目录层级登记顶层条目和嵌套成员。

use di_abstractions::{Hooks, ModuleLoader, ScanOptions};
use di_impl::{Injector, Registration};
use infrastructure_common::{
    DependencyNode, InjectError, InjectResult, NamingConventions, ProviderMap, TypeEntry, Value,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// 入口文件
#[derive(Debug, Clone)]
struct EntryFile {
    path: PathBuf,
    /// 相对根目录的目录片段
    segments: Vec<String>,
    index: String,
    ext: String,
    /// 带有自己的声明文件
    declared: bool,
    /// 仅作声明，不加载
    shadowed: bool,
}

/// 目录扫描器
pub struct DirectoryScanner {
    loader: Arc<dyn ModuleLoader>,
    options: ScanOptions,
}

impl DirectoryScanner {
    /// 创建扫描器
    pub fn new(loader: Arc<dyn ModuleLoader>, options: ScanOptions) -> Self {
        Self { loader, options }
    }

    /// 扫描选项
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// 依次扫描多个根目录并合并，先登记的根目录优先
    pub async fn scan_all(&self, roots: &[PathBuf], hooks: &Hooks) -> InjectResult<Registration> {
        let mut merged: Option<Registration> = None;

        for root in roots {
            let registration = self.scan(root, hooks).await?;
            match merged.as_mut() {
                Some(existing) => existing.merge(registration),
                None => merged = Some(registration),
            }
        }

        Ok(merged.unwrap_or_default())
    }

    /// 扫描单个根目录
    pub async fn scan(&self, root: &Path, hooks: &Hooks) -> InjectResult<Registration> {
        if !root.is_dir() {
            return Err(InjectError::InvalidDirectory {
                path: root.display().to_string(),
            });
        }

        info!("开始扫描目录: {}", root.display());

        let entries = self.entry_files(root);
        let root_dependencies = self.root_dependencies(root).await?;
        let mut registration = Registration::new();

        for entry in entries.iter().filter(|entry| !entry.shadowed) {
            self.register(root, entry, &root_dependencies, &mut registration)
                .await?;
        }

        if hooks.has_before() {
            for (name, value) in registration.values.iter_mut() {
                if Injector::supports(value) {
                    continue;
                }
                if let Some(decorated) = hooks.before(name, value)? {
                    if decorated.is_truthy() {
                        *value = decorated;
                    }
                }
            }
        }

        for name in root_dependencies.logical_names() {
            if !registration.values.contains_key(&name) {
                debug!("根级依赖 '{}' 没有对应条目，登记为占位符", name);
                registration.values.insert(name, Value::Placeholder);
            }
        }

        info!(
            "目录扫描完成: {}, 顶层条目 {} 个, 入口文件 {} 个",
            root.display(),
            registration.keys.len(),
            registration.types.len()
        );

        Ok(registration)
    }

    fn entry_files(&self, root: &Path) -> Vec<EntryFile> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(|e| e.ok())
        {
            // 根目录自己的入口文件不登记
            if !entry.file_type().is_file() || entry.depth() < 2 {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().to_string();
            let Some(ext) = self.options.entry_extension(&file_name) else {
                continue;
            };

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let segments = relative
                .parent()
                .map(|dir| {
                    dir.components()
                        .map(|c| c.as_os_str().to_string_lossy().to_string())
                        .collect()
                })
                .unwrap_or_default();

            files.push(EntryFile {
                path: entry.path().to_path_buf(),
                segments,
                ext: ext.to_string(),
                index: file_name,
                declared: false,
                shadowed: false,
            });
        }

        files.sort_by_key(|file| file.segments.len());

        let declaration_dirs: Vec<Vec<String>> = files
            .iter()
            .filter(|file| self.options.is_declaration(&file.ext))
            .map(|file| file.segments.clone())
            .collect();
        let loadable_dirs: Vec<Vec<String>> = files
            .iter()
            .filter(|file| !self.options.is_declaration(&file.ext))
            .map(|file| file.segments.clone())
            .collect();

        for file in files.iter_mut() {
            if declaration_dirs.contains(&file.segments) {
                file.declared = true;
                file.shadowed = self.options.is_declaration(&file.ext)
                    && loadable_dirs.contains(&file.segments);
            }
        }

        files
    }

    async fn root_dependencies(&self, root: &Path) -> InjectResult<ProviderMap> {
        match self.options.provider_file(root) {
            Some(file) => {
                debug!("加载根级提供者: {}", file.display());
                self.loader.load_providers(&file).await
            }
            None => Ok(ProviderMap::new()),
        }
    }

    async fn register(
        &self,
        root: &Path,
        entry: &EntryFile,
        root_dependencies: &ProviderMap,
        registration: &mut Registration,
    ) -> InjectResult<()> {
        let Some((first, properties)) = entry.segments.split_first() else {
            return Ok(());
        };
        let name = NamingConventions::entry_name(first);

        debug!("登记入口文件: {} -> {}", entry.path.display(), name);

        let definition = self.loader.load_default(&entry.path).await?;
        let dir = entry.path.parent().unwrap_or(root);
        let provider_file = self.options.provider_file(dir);
        let injectable = definition.is_callable();

        if !injectable {
            if let Some(file) = &provider_file {
                return Err(InjectError::UnexpectedProviderFile {
                    path: file.display().to_string(),
                });
            }
        }

        let leaf = if injectable {
            self.inject(definition, root_dependencies, provider_file.as_deref(), &entry.path)
                .await?
        } else {
            definition
        };

        if !registration.values.contains_key(&name) {
            let value = if properties.is_empty() {
                leaf.clone()
            } else {
                Value::object()
            };
            registration.values.insert(name.clone(), value);
        }

        if !registration.keys.contains(&name) {
            registration.keys.push(name.clone());
        }

        let mut path = vec![name.clone()];
        path.extend(properties.iter().cloned());
        registration.types.push(
            TypeEntry::new(path, entry.index.clone())
                .declared(entry.declared)
                .injectable(injectable),
        );

        let tree = registration
            .registry
            .entry(name.clone())
            .or_insert_with(Value::object)
            .clone();
        attach(&tree, properties, leaf, &entry.path);

        registration
            .directories
            .entry(name)
            .or_insert_with(|| root.to_path_buf());

        Ok(())
    }

    async fn inject(
        &self,
        definition: Value,
        root_dependencies: &ProviderMap,
        provider_file: Option<&Path>,
        origin: &Path,
    ) -> InjectResult<Value> {
        let mut dependencies = root_dependencies.clone();
        if let Some(file) = provider_file {
            debug!("加载提供者: {}", file.display());
            dependencies.merge(&self.loader.load_providers(file).await?);
        }

        let node = DependencyNode::new(definition, Some(dependencies))?.with_origin(origin);
        Ok(Value::Node(Arc::new(node)))
    }
}

impl std::fmt::Debug for DirectoryScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryScanner")
            .field("options", &self.options)
            .finish()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.file_type().is_dir() && (name.starts_with('.') || name == "node_modules")
}

/// 沿成员路径把叶子挂到嵌套成员树上，已存在的成员保持不变
fn attach(tree: &Value, properties: &[String], leaf: Value, origin: &Path) {
    let Some((last, parents)) = properties.split_last() else {
        return;
    };

    let mut target = tree.clone();
    for segment in parents {
        let key = NamingConventions::member_name(segment);
        let Some(object) = target.as_object().cloned() else {
            return;
        };
        target = match object.get(&key) {
            Some(existing) if existing.is_plain_object() => existing,
            Some(_) => {
                warn!("忽略嵌套定义: {}, 上级成员 '{}' 不是普通对象", origin.display(), key);
                return;
            }
            None => {
                let branch = Value::object();
                object.set(key, branch.clone());
                branch
            }
        };
    }

    let key = NamingConventions::member_name(last);
    let Some(object) = target.as_object() else {
        return;
    };
    if object.contains(&key) {
        warn!("忽略重复的嵌套定义: {}", origin.display());
    } else {
        object.set(key, leaf);
    }
}
