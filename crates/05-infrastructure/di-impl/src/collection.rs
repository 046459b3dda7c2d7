//! 服务集合实现

use crate::provider::ServiceProvider;
use di_abstractions::{ContainerConfig, ImplementationKind, ServiceCollection, ServiceDescriptor};
use infrastructure_common::{DependencyResult, Lifetime};
use serde::Serialize;
use std::any::TypeId;
use std::fmt;
use tracing::debug;

/// 服务集合实现
///
/// 按注册顺序保存描述符，构建后得到 [`ServiceProvider`]
#[derive(Clone, Default)]
pub struct ServiceCollectionImpl {
    descriptors: Vec<ServiceDescriptor>,
}

impl ServiceCollectionImpl {
    /// 创建新的服务集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 移除指定服务的全部注册，返回移除数量
    pub fn remove_all<S: ?Sized + 'static>(&mut self) -> usize {
        let service = TypeId::of::<S>();
        let before = self.descriptors.len();
        self.descriptors
            .retain(|descriptor| descriptor.key().service() != service);
        let removed = before - self.descriptors.len();
        debug!("移除服务注册: {} ({} 个)", std::any::type_name::<S>(), removed);
        removed
    }

    /// 清空全部注册
    pub fn clear(&mut self) {
        self.descriptors.clear();
    }

    /// 获取注册摘要
    pub fn summaries(&self) -> Vec<RegistrationSummary> {
        self.descriptors.iter().map(RegistrationSummary::from).collect()
    }

    /// 使用默认配置构建服务提供者
    pub fn build_service_provider(&self) -> DependencyResult<ServiceProvider> {
        self.build_service_provider_with(ContainerConfig::default())
    }

    /// 使用指定配置构建服务提供者
    pub fn build_service_provider_with(
        &self,
        config: ContainerConfig,
    ) -> DependencyResult<ServiceProvider> {
        ServiceProvider::build(self.descriptors.clone(), config)
    }
}

impl ServiceCollection for ServiceCollectionImpl {
    fn add_descriptor(&mut self, descriptor: ServiceDescriptor) {
        debug!(
            "注册服务: {} -> {} ({}, {:?})",
            descriptor.service_type().name,
            descriptor.implementation().implementation_type().name,
            descriptor.lifetime(),
            descriptor.implementation().kind()
        );
        self.descriptors.push(descriptor);
    }

    fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }
}

impl fmt::Debug for ServiceCollectionImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.descriptors.iter()).finish()
    }
}

impl Extend<ServiceDescriptor> for ServiceCollectionImpl {
    fn extend<T: IntoIterator<Item = ServiceDescriptor>>(&mut self, iter: T) {
        for descriptor in iter {
            self.add_descriptor(descriptor);
        }
    }
}

/// 注册摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationSummary {
    pub service: String,
    pub implementation: String,
    pub kind: ImplementationKind,
    pub lifetime: Lifetime,
}

impl From<&ServiceDescriptor> for RegistrationSummary {
    fn from(descriptor: &ServiceDescriptor) -> Self {
        Self {
            service: descriptor.service_type().full_name.clone(),
            implementation: descriptor
                .implementation()
                .implementation_type()
                .full_name
                .clone(),
            kind: descriptor.implementation().kind(),
            lifetime: descriptor.lifetime(),
        }
    }
}
