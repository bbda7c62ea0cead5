//! 解析器构建器

use crate::resolver::Resolver;
use crate::scanner::DirectoryScanner;
use di_abstractions::{Hooks, ModuleLoader, ScanOptions};
use di_impl::{Container, ResolutionContext};
use infrastructure_common::{ConfigResult, InjectError, InjectResult, ResolverConfig, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// 解析器构建器
///
/// 使用建造者模式收集根目录、钩子和模块加载器，`build` 时完成扫描
pub struct ResolverBuilder {
    /// 根目录列表，靠前的优先
    directories: Vec<PathBuf>,
    /// 注入作用域的根对象
    root: Value,
    /// 装饰钩子
    hooks: Hooks,
    /// 模块加载器
    loader: Option<Arc<dyn ModuleLoader>>,
    /// 扫描选项
    options: ScanOptions,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl ResolverBuilder {
    /// 创建新的解析器构建器
    pub fn new() -> Self {
        Self {
            directories: Vec::new(),
            root: Value::Empty,
            hooks: Hooks::new(),
            loader: None,
            options: ScanOptions::default(),
            logging_enabled: false, // 默认不启用日志初始化
            logging_config: LoggingConfig::default(),
        }
    }

    /// 按配置创建构建器
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new()
            .directories(config.directories.iter().cloned())
            .options(ScanOptions::from(config))
    }

    /// 读取并校验配置文件后创建构建器
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let config = ResolverConfig::from_file(path)?;
        config.validate()?;
        Ok(Self::from_config(&config))
    }

    /// 添加根目录
    pub fn directory<P: Into<PathBuf>>(mut self, path: P) -> Self {
        let path = path.into();
        debug!("添加根目录: {}", path.display());
        self.directories.push(path);
        self
    }

    /// 添加多个根目录
    pub fn directories<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            self = self.directory(path);
        }
        self
    }

    /// 设置根对象
    pub fn root(mut self, root: Value) -> Self {
        self.root = root;
        self
    }

    /// 设置全部钩子
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// 设置 `before` 钩子
    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &Value) -> InjectResult<Option<Value>> + Send + Sync + 'static,
    {
        self.hooks = std::mem::take(&mut self.hooks).with_before(f);
        self
    }

    /// 设置 `after` 钩子
    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &Value) -> InjectResult<Option<Value>> + Send + Sync + 'static,
    {
        self.hooks = std::mem::take(&mut self.hooks).with_after(f);
        self
    }

    /// 设置模块加载器
    pub fn loader<T: ModuleLoader + 'static>(self, loader: T) -> Self {
        self.shared_loader(Arc::new(loader))
    }

    /// 设置共享的模块加载器
    pub fn shared_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// 设置扫描选项
    pub fn options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true; // 启用日志初始化
        self
    }

    /// 扫描全部根目录并构建解析器
    pub async fn build(self) -> InjectResult<Resolver> {
        // 只有在明确配置了日志时才初始化日志
        // 避免在测试环境中重复初始化
        if self.logging_enabled {
            self.initialize_logging()?;
        }

        info!("开始构建解析器");

        let Some(loader) = self.loader else {
            return Err(InjectError::custom("未设置模块加载器"));
        };
        if self.directories.is_empty() {
            return Err(InjectError::custom("至少需要一个根目录"));
        }

        let scanner = DirectoryScanner::new(loader, self.options);
        let registration = scanner.scan_all(&self.directories, &self.hooks).await?;
        let context = ResolutionContext::new(self.root, registration);

        info!("解析器构建完成，顶层条目 {} 个", context.keys().len());
        Ok(Resolver::new(
            Container::new(context),
            self.hooks,
            self.directories,
        ))
    }

    /// 初始化日志系统
    fn initialize_logging(&self) -> InjectResult<()> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(self.logging_config.level)
            .with_target(self.logging_config.show_target)
            .with_thread_ids(self.logging_config.show_thread_ids)
            .with_file(self.logging_config.show_file)
            .with_line_number(self.logging_config.show_line_number);

        if self.logging_config.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| InjectError::custom(format!("日志初始化失败: {}", e)))?;

        info!("日志系统初始化完成");
        Ok(())
    }
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_abstractions::MemoryLoader;
    use tempfile::TempDir;

    #[tokio::test]
    async fn build_requires_a_loader() {
        let dir = TempDir::new().unwrap();
        let err = ResolverBuilder::new()
            .directory(dir.path())
            .build()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("模块加载器"));
    }

    #[tokio::test]
    async fn build_requires_a_directory() {
        let err = ResolverBuilder::new()
            .loader(MemoryLoader::new())
            .build()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("根目录"));
    }

    #[tokio::test]
    async fn missing_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let err = ResolverBuilder::new()
            .directory(&missing)
            .loader(MemoryLoader::new())
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, InjectError::InvalidDirectory { .. }));
    }

    #[test]
    fn config_supplies_directories_and_options() {
        let config = ResolverConfig::from_toml_str(
            r#"
directories = ["models", "services"]
extensions = ["js"]
"#,
        )
        .unwrap();
        let builder = ResolverBuilder::from_config(&config);

        assert_eq!(builder.directories, vec![PathBuf::from("models"), PathBuf::from("services")]);
        assert_eq!(builder.options.extensions, vec!["js".to_string()]);
        assert_eq!(builder.options.entry_stem, "index");
    }

    #[test]
    fn hook_setters_accumulate() {
        let builder = ResolverBuilder::new()
            .before(|_, _| Ok(None))
            .after(|_, _| Ok(None));
        assert!(builder.hooks.has_before());
        assert!(builder.hooks.has_after());
    }

    #[test]
    fn logging_presets() {
        assert_eq!(LoggingConfig::development().level, tracing::Level::DEBUG);
        assert!(LoggingConfig::production().json_format);
        assert!(!LoggingConfig::default().json_format);
    }
}
