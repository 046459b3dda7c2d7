//! 日志初始化

use infrastructure_common::{InfrastructureError, InfrastructureResult};
use tracing_subscriber::EnvFilter;

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别，`RUST_LOG` 存在时以其为准
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 初始化全局日志订阅器，日志输出到标准错误
    pub fn init(&self) -> InfrastructureResult<()> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.to_string().to_lowercase()));

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(self.show_target);

        let result = if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        };

        result.map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })
    }
}
