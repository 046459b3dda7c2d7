//! 服务解析器抽象接口
//!
//! 提供服务解析和解析链跟踪的能力

use crate::factory::{downcast_instance, ServiceInstance};
use infrastructure_common::{DependencyError, DependencyResult, Lifetime, TypeInfo};
use std::sync::Arc;

/// 服务解析器 trait
///
/// 工厂与 [`Injectable`](crate::Injectable) 实现通过它获取依赖
pub trait ServiceResolver {
    /// 解析指定类型的服务（最后一次注册生效）
    fn resolve_by_type(&self, service: &TypeInfo) -> DependencyResult<ServiceInstance>;

    /// 解析指定类型的全部注册，按注册顺序返回
    fn resolve_all_by_type(&self, service: &TypeInfo) -> DependencyResult<Vec<ServiceInstance>>;

    /// 检查是否可以解析指定类型
    fn can_resolve_by_type(&self, service: &TypeInfo) -> bool;
}

/// 类型化解析扩展
pub trait ServiceResolverExt: ServiceResolver {
    /// 解析服务
    fn resolve<S>(&self) -> DependencyResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let service = TypeInfo::of::<S>();
        let instance = self.resolve_by_type(&service)?;
        downcast_instance::<S>(&instance).ok_or(DependencyError::TypeMismatch {
            type_name: service.full_name,
        })
    }

    /// 解析服务，未注册时返回 `None`
    fn try_resolve<S>(&self) -> DependencyResult<Option<Arc<S>>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        if !self.can_resolve::<S>() {
            return Ok(None);
        }
        self.resolve::<S>().map(Some)
    }

    /// 解析服务的全部注册
    fn resolve_all<S>(&self) -> DependencyResult<Vec<Arc<S>>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let service = TypeInfo::of::<S>();
        self.resolve_all_by_type(&service)?
            .iter()
            .map(|instance| {
                downcast_instance::<S>(instance).ok_or_else(|| DependencyError::TypeMismatch {
                    type_name: service.full_name.clone(),
                })
            })
            .collect()
    }

    /// 检查是否可以解析服务
    fn can_resolve<S>(&self) -> bool
    where
        S: ?Sized + 'static,
    {
        self.can_resolve_by_type(&TypeInfo::of::<S>())
    }
}

impl<R: ServiceResolver + ?Sized> ServiceResolverExt for R {}

/// 解析链中的一个节点
#[derive(Debug, Clone)]
pub struct ResolutionStep {
    pub service: TypeInfo,
    pub lifetime: Lifetime,
}

/// 解析上下文
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// 当前解析链，用于检测循环依赖
    pub resolution_chain: Vec<ResolutionStep>,
    /// 解析选项
    pub options: ResolveOptions,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new() -> Self {
        Self::with_options(ResolveOptions::default())
    }

    /// 使用指定选项创建解析上下文
    pub fn with_options(options: ResolveOptions) -> Self {
        Self {
            resolution_chain: Vec::new(),
            options,
        }
    }

    /// 添加类型到解析链
    pub fn push_type(&mut self, service: &TypeInfo, lifetime: Lifetime) -> DependencyResult<()> {
        if self.options.detect_cycles
            && self
                .resolution_chain
                .iter()
                .any(|step| step.service.same_type(service))
        {
            return Err(DependencyError::CircularDependency {
                dependency_chain: format!("{} -> {}", self.chain_description(), service.name),
            });
        }

        if self.resolution_chain.len() >= self.options.max_depth {
            return Err(DependencyError::MaxDepthExceeded {
                type_name: service.full_name.clone(),
                max_depth: self.options.max_depth,
            });
        }

        self.resolution_chain.push(ResolutionStep {
            service: service.clone(),
            lifetime,
        });
        Ok(())
    }

    /// 从解析链中移除类型
    pub fn pop_type(&mut self) {
        self.resolution_chain.pop();
    }

    /// 当前解析深度
    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }

    /// 解析链中最外层的单例服务
    pub fn singleton_owner(&self) -> Option<&TypeInfo> {
        self.resolution_chain
            .iter()
            .find(|step| step.lifetime == Lifetime::Singleton)
            .map(|step| &step.service)
    }

    fn chain_description(&self) -> String {
        self.resolution_chain
            .iter()
            .map(|step| step.service.name.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self::new()
    }
}

/// 解析选项
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// 最大递归深度
    pub max_depth: usize,
    /// 是否检测循环依赖
    pub detect_cycles: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: 100,
            detect_cycles: true,
        }
    }
}
