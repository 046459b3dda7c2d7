//! # 依赖注入具体实现
//!
//! 提供服务集合、服务提供者与作用域的具体实现
//!
//! ```ignore
//! let mut services = ServiceCollectionImpl::new();
//! services.add_singleton::<Clock, SystemClock>();
//!
//! let provider = services.build_service_provider()?;
//! let scope = provider.create_scope();
//! let clock = scope.resolve::<Clock>()?;
//! ```

pub mod collection;
pub mod provider;
pub mod settings;
mod validation;

pub use collection::{RegistrationSummary, ServiceCollectionImpl};
pub use provider::{ServiceProvider, ServiceScope};
pub use settings::load_container_config;
