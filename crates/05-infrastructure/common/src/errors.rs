//! 错误类型定义

use crate::key::TypeKey;
use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("TOML 配置解析失败: {source}")]
    TomlParseError {
        #[from]
        source: toml::de::Error,
    },

    #[error("JSON 配置解析失败: {source}")]
    JsonParseError {
        #[from]
        source: serde_json::Error,
    },

    #[error("不支持的配置文件格式: {path}")]
    UnsupportedFormat { path: String },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 依赖解析错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("绑定未注册: {key}")]
    UnregisteredBinding { key: TypeKey },

    #[error("别名链存在循环或超过 {max_hops} 跳: {chain}")]
    AliasCycle { chain: String, max_hops: usize },

    #[error("循环依赖检测到: {dependency_chain}")]
    CircularDependency { dependency_chain: String },

    #[error("构造函数执行失败: {key}, 原因: {source}")]
    ConstructorFailed {
        key: TypeKey,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("解析深度超过上限 {max_depth}: {key}")]
    ResolutionDepthExceeded { key: TypeKey, max_depth: usize },

    #[error("缺少限定符: {key}")]
    MissingQualifier { key: TypeKey },

    #[error("限定符类型不匹配: {key}, 期望 {expected}")]
    QualifierMismatch { key: TypeKey, expected: &'static str },

    #[error("实例类型不匹配: {key}, 期望 {expected}")]
    TypeMismatch { key: TypeKey, expected: &'static str },
}

impl DependencyError {
    /// 创建未注册错误
    pub fn unregistered(key: &TypeKey) -> Self {
        Self::UnregisteredBinding { key: key.clone() }
    }

    /// 是否为未注册错误（`resolve_or_*` 只屏蔽这一类）
    pub fn is_unregistered(&self) -> bool {
        matches!(self, Self::UnregisteredBinding { .. })
    }

    /// 是否为配置结构错误，嵌套在构造函数中时原样向上传播
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::AliasCycle { .. }
                | Self::CircularDependency { .. }
                | Self::ResolutionDepthExceeded { .. }
        )
    }
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
