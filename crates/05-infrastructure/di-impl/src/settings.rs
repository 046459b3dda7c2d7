//! 容器配置加载
//!
//! 配置来源按优先级从低到高：默认值、配置文件的 `[container]` 节、
//! `ADSP_DI__CONTAINER__*` 环境变量

use di_abstractions::ContainerConfig;
use infrastructure_common::{ConfigError, ConfigResult};
use std::path::Path;
use tracing::{debug, error};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "ADSP_DI";

/// 容器配置节名称
pub const CONTAINER_SECTION: &str = "container";

/// 加载容器配置
pub fn load_container_config(path: Option<&Path>) -> ConfigResult<ContainerConfig> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        debug!("加载容器配置文件: {}", path.display());
        builder = builder.add_source(config::File::from(path));
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let settings = builder.build().map_err(|e| {
        error!("构建容器配置失败: {}", e);
        ConfigError::ParseError {
            source: Box::new(e),
        }
    })?;

    let container = match settings.get::<ContainerConfig>(CONTAINER_SECTION) {
        Ok(container) => container,
        Err(config::ConfigError::NotFound(_)) => {
            debug!("未找到容器配置节，使用默认配置");
            ContainerConfig::default()
        }
        Err(e) => {
            error!("解析容器配置失败: {}", e);
            return Err(ConfigError::ParseError {
                source: Box::new(e),
            });
        }
    };

    validate_container_config(&container)?;
    Ok(container)
}

fn validate_container_config(container: &ContainerConfig) -> ConfigResult<()> {
    if container.max_resolution_depth == 0 {
        return Err(ConfigError::ValidationError {
            message: "max_resolution_depth 必须大于 0".to_string(),
        });
    }
    Ok(())
}
