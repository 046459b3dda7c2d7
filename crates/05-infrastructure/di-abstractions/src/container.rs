//! 服务集合抽象接口
//!
//! 提供服务注册的核心抽象以及按生命周期划分的注册原语

use crate::descriptor::{DescriptorKey, ServiceDescriptor, ServiceType};
use crate::factory::{Implements, Injectable};
use crate::resolver::ServiceResolver;
use infrastructure_common::{DependencyResult, Lifetime};
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::sync::Arc;

/// 服务集合 trait
///
/// 在组合阶段收集服务描述符。`add_*` 系列方法是按生命周期划分的注册原语，
/// 返回集合自身以便链式调用。
pub trait ServiceCollection {
    /// 添加服务描述符
    fn add_descriptor(&mut self, descriptor: ServiceDescriptor);

    /// 获取所有已注册的描述符
    fn descriptors(&self) -> &[ServiceDescriptor];

    /// 检查是否已存在等价的描述符
    fn contains(&self, descriptor: &ServiceDescriptor) -> bool {
        self.contains_key(&descriptor.key())
    }

    /// 检查是否已存在指定键的描述符
    fn contains_key(&self, key: &DescriptorKey) -> bool {
        self.descriptors()
            .iter()
            .any(|descriptor| descriptor.key() == *key)
    }

    /// 检查服务是否已注册（任意实现与生命周期）
    fn is_registered<S>(&self) -> bool
    where
        S: ?Sized + 'static,
        Self: Sized,
    {
        let service = TypeId::of::<S>();
        self.descriptors()
            .iter()
            .any(|descriptor| descriptor.key().service() == service)
    }

    /// 已注册描述符数量
    fn len(&self) -> usize {
        self.descriptors().len()
    }

    /// 是否没有任何注册
    fn is_empty(&self) -> bool {
        self.descriptors().is_empty()
    }

    /// 注册单例服务（按实现类型）
    fn add_singleton<S, I>(&mut self) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<S>,
        Self: Sized,
    {
        self.add_descriptor(ServiceDescriptor::from_type::<S, I>(Lifetime::Singleton));
        self
    }

    /// 注册作用域服务（按实现类型）
    fn add_scoped<S, I>(&mut self) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<S>,
        Self: Sized,
    {
        self.add_descriptor(ServiceDescriptor::from_type::<S, I>(Lifetime::Scoped));
        self
    }

    /// 注册瞬时服务（按实现类型）
    fn add_transient<S, I>(&mut self) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<S>,
        Self: Sized,
    {
        self.add_descriptor(ServiceDescriptor::from_type::<S, I>(Lifetime::Transient));
        self
    }

    /// 注册单例服务（按工厂）
    fn add_singleton_factory<S, F>(&mut self, factory: F) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn ServiceResolver) -> DependencyResult<Arc<S>> + Send + Sync + 'static,
        Self: Sized,
    {
        self.add_descriptor(ServiceDescriptor::from_factory::<S, F>(factory, Lifetime::Singleton));
        self
    }

    /// 注册作用域服务（按工厂）
    fn add_scoped_factory<S, F>(&mut self, factory: F) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn ServiceResolver) -> DependencyResult<Arc<S>> + Send + Sync + 'static,
        Self: Sized,
    {
        self.add_descriptor(ServiceDescriptor::from_factory::<S, F>(factory, Lifetime::Scoped));
        self
    }

    /// 注册瞬时服务（按工厂）
    fn add_transient_factory<S, F>(&mut self, factory: F) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn ServiceResolver) -> DependencyResult<Arc<S>> + Send + Sync + 'static,
        Self: Sized,
    {
        self.add_descriptor(ServiceDescriptor::from_factory::<S, F>(factory, Lifetime::Transient));
        self
    }

    /// 注册单例实例
    fn add_singleton_instance<S, I>(&mut self, instance: Arc<I>) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Implements<S>,
        Self: Sized,
    {
        self.add_descriptor(ServiceDescriptor::from_instance::<S, I>(instance));
        self
    }

    /// 注册单例服务（按运行时类型）
    fn add_singleton_type(
        &mut self,
        service: &ServiceType,
        implementation: &ServiceType,
    ) -> DependencyResult<&mut Self>
    where
        Self: Sized,
    {
        let descriptor =
            ServiceDescriptor::from_service_types(service, implementation, Lifetime::Singleton)?;
        self.add_descriptor(descriptor);
        Ok(self)
    }

    /// 注册作用域服务（按运行时类型）
    fn add_scoped_type(
        &mut self,
        service: &ServiceType,
        implementation: &ServiceType,
    ) -> DependencyResult<&mut Self>
    where
        Self: Sized,
    {
        let descriptor =
            ServiceDescriptor::from_service_types(service, implementation, Lifetime::Scoped)?;
        self.add_descriptor(descriptor);
        Ok(self)
    }

    /// 注册瞬时服务（按运行时类型）
    fn add_transient_type(
        &mut self,
        service: &ServiceType,
        implementation: &ServiceType,
    ) -> DependencyResult<&mut Self>
    where
        Self: Sized,
    {
        let descriptor =
            ServiceDescriptor::from_service_types(service, implementation, Lifetime::Transient)?;
        self.add_descriptor(descriptor);
        Ok(self)
    }
}

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 是否校验作用域（禁止从根提供者解析作用域服务，禁止单例捕获作用域服务）
    pub validate_scopes: bool,
    /// 是否在构建服务提供者时校验注册
    pub validate_on_build: bool,
    /// 是否启用循环依赖检测
    pub enable_circular_dependency_detection: bool,
    /// 最大解析深度
    pub max_resolution_depth: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            validate_scopes: false,
            validate_on_build: false,
            enable_circular_dependency_detection: true,
            max_resolution_depth: 100,
        }
    }
}

impl ContainerConfig {
    /// 开发环境配置，开启全部校验
    pub fn development() -> Self {
        Self {
            validate_scopes: true,
            validate_on_build: true,
            ..Self::default()
        }
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContainerStats {
    /// 已注册服务数量
    pub registered_services: usize,
    /// 成功解析次数
    pub resolved_services: usize,
    /// 活跃单例数量
    pub active_singletons: usize,
    /// 已创建作用域数量
    pub created_scopes: usize,
    /// 解析错误数量
    pub resolution_errors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_config_defaults_from_partial_json() {
        let config: ContainerConfig = serde_json::from_str(r#"{"validate_scopes": true}"#).unwrap();
        assert!(config.validate_scopes);
        assert!(!config.validate_on_build);
        assert!(config.enable_circular_dependency_detection);
        assert_eq!(config.max_resolution_depth, 100);
    }

    #[test]
    fn test_development_config() {
        let config = ContainerConfig::development();
        assert!(config.validate_scopes);
        assert!(config.validate_on_build);
    }
}
