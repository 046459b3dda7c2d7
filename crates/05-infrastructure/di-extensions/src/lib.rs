//! # Dependency Injection Extensions
//!
//! 服务注册扩展方法：以 [`Lifetime`](infrastructure_common::Lifetime) 参数统一按工厂、
//! 按实现类型、按运行时类型以及按实例的注册方式，并提供不覆盖已有注册的 `try_*` 变体。

pub mod extensions;

pub use extensions::ServiceCollectionExtensions;
