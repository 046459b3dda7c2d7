//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn ADSP 平台依赖注入基础设施的公共类型。
//!
//! ## 核心类型
//!
//! - [`Lifetime`] - 服务生命周期
//! - [`Scope`] - 服务作用域
//! - [`TypeInfo`] - 服务类型标识
//! - [`DependencyError`] - 依赖注入错误

pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
