//! 错误类型定义

use thiserror::Error;

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("参数无效: {parameter}, 原因: {message}")]
    InvalidArgument { parameter: String, message: String },

    #[error("服务未注册: {type_name}")]
    ServiceNotRegistered { type_name: String },

    #[error("循环依赖检测到: {dependency_chain}")]
    CircularDependency { dependency_chain: String },

    #[error("依赖解析失败: {type_name}, 原因: {message}")]
    DependencyResolutionFailed { type_name: String, message: String },

    #[error("作用域不匹配: 期望 {expected}, 实际 {actual}")]
    ScopeMismatch { expected: String, actual: String },

    #[error("服务类型不匹配: {type_name}")]
    TypeMismatch { type_name: String },

    #[error("解析深度超出限制: {type_name}, 最大深度: {max_depth}")]
    MaxDepthExceeded { type_name: String, max_depth: usize },
}

impl DependencyError {
    /// 创建参数无效错误
    pub fn invalid_argument(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// 创建服务未注册错误
    pub fn not_registered(type_name: impl Into<String>) -> Self {
        Self::ServiceNotRegistered {
            type_name: type_name.into(),
        }
    }

    /// 是否为参数无效错误
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
