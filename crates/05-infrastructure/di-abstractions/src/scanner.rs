//! 模块扫描与加载抽象接口
//!
//! 扫描器只负责发现文件，文件如何变成 [`Value`] 由 [`ModuleLoader`] 决定。

use async_trait::async_trait;
use indexmap::IndexMap;
use infrastructure_common::{InjectError, InjectResult, ProviderMap, ResolverConfig, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 扫描选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// 入口文件名（不含扩展名）
    pub entry_stem: String,
    /// 提供者文件名（不含扩展名）
    pub provider_stem: String,
    /// 可加载的扩展名
    pub extensions: Vec<String>,
    /// 仅作为声明的扩展名
    pub declaration_extensions: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from(&ResolverConfig::default())
    }
}

impl From<&ResolverConfig> for ScanOptions {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            entry_stem: config.entry_stem.clone(),
            provider_stem: config.provider_stem.clone(),
            extensions: config.extensions.clone(),
            declaration_extensions: config.declaration_extensions.clone(),
        }
    }
}

impl ScanOptions {
    /// 文件名是否为入口文件，返回其扩展名
    pub fn entry_extension<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let (stem, ext) = file_name.rsplit_once('.')?;
        (stem == self.entry_stem && self.extensions.iter().any(|e| e == ext)).then_some(ext)
    }

    /// 扩展名是否仅用于声明
    pub fn is_declaration(&self, ext: &str) -> bool {
        self.declaration_extensions.iter().any(|e| e == ext)
    }

    /// 可加载的（非声明）扩展名
    pub fn loadable_extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions
            .iter()
            .map(String::as_str)
            .filter(|ext| !self.is_declaration(ext))
    }

    /// 目录下的提供者文件，按扩展名顺序取第一个存在的
    pub fn provider_file(&self, dir: &Path) -> Option<PathBuf> {
        self.loadable_extensions()
            .map(|ext| dir.join(format!("{}.{ext}", self.provider_stem)))
            .find(|path| path.is_file())
    }
}

/// 模块加载器 trait
///
/// 将模块文件转换为动态值，对应动态导入的默认导出。
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// 加载模块的默认导出
    async fn load_default(&self, path: &Path) -> InjectResult<Value>;

    /// 加载提供者模块
    async fn load_providers(&self, path: &Path) -> InjectResult<ProviderMap> {
        let value = self.load_default(path).await?;
        ProviderMap::from_value(&value)
    }
}

/// 内存模块加载器
///
/// 按相对路径登记模块，查找时先精确匹配，再按路径后缀匹配。
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    modules: IndexMap<PathBuf, Value>,
    providers: IndexMap<PathBuf, ProviderMap>,
}

impl MemoryLoader {
    /// 创建空加载器
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记模块
    pub fn with_module(mut self, path: impl Into<PathBuf>, value: Value) -> Self {
        self.modules.insert(path.into(), value);
        self
    }

    /// 登记提供者映射，可包含实时提供者
    pub fn with_providers(mut self, path: impl Into<PathBuf>, providers: ProviderMap) -> Self {
        self.providers.insert(path.into(), providers);
        self
    }

    /// 已登记的模块数量
    pub fn len(&self) -> usize {
        self.modules.len() + self.providers.len()
    }

    /// 是否没有登记任何模块
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup<'a, T>(entries: &'a IndexMap<PathBuf, T>, path: &Path) -> Option<&'a T> {
        entries.get(path).or_else(|| {
            entries
                .iter()
                .find(|(key, _)| path.ends_with(key))
                .map(|(_, value)| value)
        })
    }
}

#[async_trait]
impl ModuleLoader for MemoryLoader {
    async fn load_default(&self, path: &Path) -> InjectResult<Value> {
        debug!("加载内存模块: {}", path.display());

        Self::lookup(&self.modules, path)
            .cloned()
            .ok_or_else(|| InjectError::load_failed(path.display().to_string(), "模块未登记"))
    }

    async fn load_providers(&self, path: &Path) -> InjectResult<ProviderMap> {
        if let Some(providers) = Self::lookup(&self.providers, path) {
            return Ok(providers.clone());
        }
        let value = self.load_default(path).await?;
        ProviderMap::from_value(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_files_match_stem_and_extension() {
        let options = ScanOptions::default();

        assert_eq!(options.entry_extension("index.js"), Some("js"));
        assert_eq!(options.entry_extension("index.ts"), Some("ts"));
        assert_eq!(options.entry_extension("index.json"), None);
        assert_eq!(options.entry_extension("such-things.js"), None);
        assert_eq!(options.entry_extension("index"), None);

        assert!(options.is_declaration("ts"));
        assert_eq!(options.loadable_extensions().collect::<Vec<_>>(), vec!["js", "cjs", "mjs"]);
    }

    #[tokio::test]
    async fn memory_loader_matches_by_suffix() {
        let loader = MemoryLoader::new()
            .with_module("Token/index.js", Value::from("token"))
            .with_module("deps/provider.js", Value::object());

        let value = loader
            .load_default(Path::new("/tmp/root/Token/index.js"))
            .await
            .unwrap();
        assert_eq!(value, Value::from("token"));

        let providers = loader
            .load_providers(Path::new("/tmp/root/deps/provider.js"))
            .await
            .unwrap();
        assert!(providers.is_empty());

        let err = loader.load_default(Path::new("/tmp/root/Other/index.js")).await.unwrap_err();
        assert!(matches!(err, InjectError::LoadFailed { .. }));
    }

    #[tokio::test]
    async fn registered_provider_maps_take_precedence() {
        let loader = MemoryLoader::new().with_providers(
            "User/provider.js",
            ProviderMap::new().live("getClock", Value::injectable(|_, _| Ok(Value::from(1)))),
        );

        let providers = loader.load_providers(Path::new("/x/User/provider.js")).await.unwrap();
        assert!(providers.get("getClock").unwrap().is_live());
    }
}
