//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("不支持的配置文件格式: {path}")]
    UnsupportedFormat { path: String },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 依赖注入错误类型
///
/// 所有错误都是同步返回的，不会自动重试。
#[derive(Error, Debug)]
pub enum InjectError {
    #[error("无法注入不可调用的值, 给定 {given}")]
    InvalidFactory { given: String },

    #[error("无效的依赖映射, 给定 {given}")]
    InvalidDependencies { given: String },

    #[error("缺少依赖 '{name}'")]
    MissingDependency { name: String },

    #[error("值 '{name}' 未定义")]
    UndefinedValue { name: String },

    #[error("无效的提供者 '{key}', 给定 {given}")]
    InvalidProvider { key: String, given: String },

    #[error("缺少 '{name}' 的提供者")]
    MissingProvider { name: String },

    #[error("提供者 '{name}' 在求值过程中被再次访问")]
    CircularProvider { name: String },

    #[error("目标 '{name}' 不是对象, 给定 {given}")]
    NotAnObject { name: String, given: String },

    #[error("目标不是对象, 给定 {given}")]
    TargetNotObject { given: String },

    #[error("无法向已锁定的值赋值")]
    AlreadyLocked,

    #[error("值不可调用, 给定 {given}")]
    NotCallable { given: String },

    #[error("'{name}' 的定义失败{}: {source}", at_directory(.directory))]
    DefinitionFailed {
        name: String,
        directory: Option<String>,
        #[source]
        source: Box<InjectError>,
    },

    #[error("无效的目录, 给定 '{path}'")]
    InvalidDirectory { path: String },

    #[error("意外的提供者文件, 给定 {path}")]
    UnexpectedProviderFile { path: String },

    #[error("模块加载失败: {path}, 原因: {source}")]
    LoadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("解析上下文已释放")]
    ContextDropped,

    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}

fn at_directory(directory: &Option<String>) -> String {
    directory
        .as_ref()
        .map(|dir| format!(" (目录 {dir})"))
        .unwrap_or_default()
}

impl InjectError {
    /// 包装定义失败错误
    pub fn definition_failed(
        name: impl Into<String>,
        directory: Option<String>,
        source: InjectError,
    ) -> Self {
        Self::DefinitionFailed {
            name: name.into(),
            directory,
            source: Box::new(source),
        }
    }

    /// 创建用户自定义错误
    pub fn custom(message: impl std::fmt::Display) -> Self {
        Self::Custom(anyhow::anyhow!("{message}"))
    }

    /// 创建模块加载错误
    pub fn load_failed(
        path: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::LoadFailed {
            path: path.into(),
            source: source.into(),
        }
    }

    /// 沿 `DefinitionFailed` 链找到最初的错误
    pub fn root_cause(&self) -> &InjectError {
        let mut current = self;
        while let Self::DefinitionFailed { source, .. } = current {
            current = source;
        }
        current
    }
}

/// 配置操作结果
pub type ConfigResult<T> = Result<T, ConfigError>;
/// 注入操作结果
pub type InjectResult<T> = Result<T, InjectError>;
