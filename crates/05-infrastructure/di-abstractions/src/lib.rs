//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义服务注册和解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`ServiceCollection`] - 服务集合接口及按生命周期划分的注册原语
//! - [`ServiceDescriptor`] - 服务描述符
//! - [`ServiceResolver`] - 服务解析器接口
//! - [`Injectable`] / [`Implements`] - 构造注入与接口转换

pub mod container;
pub mod descriptor;
pub mod factory;
pub mod graph;
pub mod resolver;

pub use container::*;
pub use descriptor::*;
pub use factory::*;
pub use graph::*;
pub use resolver::*;
