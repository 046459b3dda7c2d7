//! 按生命周期注册服务的扩展方法
//!
//! 每个 `add_*` 方法根据 [`Lifetime`] 分派到且仅分派到一个生命周期注册原语；
//! 每个 `try_*` 方法先检查是否已存在等价注册，存在时不做任何修改并返回 `false`。

use di_abstractions::{
    DescriptorKey, Implements, Injectable, ServiceCollection, ServiceResolver, ServiceType,
};
use infrastructure_common::{DependencyResult, Lifetime};
use std::any::type_name;
use std::sync::Arc;
use tracing::debug;

/// 服务集合扩展 trait
///
/// 为所有 [`ServiceCollection`] 实现，所有方法返回原集合以便链式调用。
///
/// ```ignore
/// services
///     .add_implementation::<dyn Greeter, EnglishGreeter>(Lifetime::Scoped)
///     .add_service::<RequestHandler>(Lifetime::Transient);
///
/// let added = services.try_add_singleton_instance::<dyn Clock, FixedClock>(clock);
/// ```
pub trait ServiceCollectionExtensions: ServiceCollection + Sized {
    /// 按工厂注册服务
    fn add_factory<S, F>(&mut self, factory: F, lifetime: Lifetime) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn ServiceResolver) -> DependencyResult<Arc<S>> + Send + Sync + 'static,
    {
        debug!("按工厂注册服务: {} ({})", type_name::<S>(), lifetime);
        match lifetime {
            Lifetime::Scoped => self.add_scoped_factory::<S, F>(factory),
            Lifetime::Singleton => self.add_singleton_factory::<S, F>(factory),
            Lifetime::Transient => self.add_transient_factory::<S, F>(factory),
        }
    }

    /// 按工厂注册服务，已存在同一无状态工厂的等价注册时跳过
    ///
    /// 带捕获状态的工厂总是会被注册
    fn try_add_factory<S, F>(&mut self, factory: F, lifetime: Lifetime) -> bool
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn ServiceResolver) -> DependencyResult<Arc<S>> + Send + Sync + 'static,
    {
        let key = DescriptorKey::for_factory::<S, F>(lifetime);
        if !self.begin_try_add(&key, type_name::<S>()) {
            return false;
        }
        self.add_factory::<S, F>(factory, lifetime);
        true
    }

    /// 按返回实现类型的工厂注册服务
    fn add_implementation_factory<S, I, F>(&mut self, factory: F, lifetime: Lifetime) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Implements<S>,
        F: Fn(&dyn ServiceResolver) -> DependencyResult<Arc<I>> + Send + Sync + 'static,
    {
        self.add_factory::<S, _>(upcast_factory::<S, I, F>(factory), lifetime)
    }

    /// 按返回实现类型的工厂注册服务，已存在等价注册时跳过
    fn try_add_implementation_factory<S, I, F>(&mut self, factory: F, lifetime: Lifetime) -> bool
    where
        S: ?Sized + Send + Sync + 'static,
        I: Implements<S>,
        F: Fn(&dyn ServiceResolver) -> DependencyResult<Arc<I>> + Send + Sync + 'static,
    {
        // 键取自包装后的工厂，与 add_implementation_factory 注册的描述符一致
        let factory = upcast_factory::<S, I, F>(factory);
        let key = DescriptorKey::for_factory_value::<S, _>(&factory, lifetime);
        if !self.begin_try_add(&key, type_name::<S>()) {
            return false;
        }
        self.add_factory::<S, _>(factory, lifetime);
        true
    }

    /// 按实现类型注册服务
    fn add_implementation<S, I>(&mut self, lifetime: Lifetime) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<S>,
    {
        debug!(
            "按实现类型注册服务: {} -> {} ({})",
            type_name::<S>(),
            type_name::<I>(),
            lifetime
        );
        match lifetime {
            Lifetime::Scoped => self.add_scoped::<S, I>(),
            Lifetime::Singleton => self.add_singleton::<S, I>(),
            Lifetime::Transient => self.add_transient::<S, I>(),
        }
    }

    /// 按实现类型注册服务，已存在等价注册时跳过
    fn try_add_implementation<S, I>(&mut self, lifetime: Lifetime) -> bool
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<S>,
    {
        let key = DescriptorKey::for_type::<S, I>(lifetime);
        if !self.begin_try_add(&key, type_name::<S>()) {
            return false;
        }
        self.add_implementation::<S, I>(lifetime);
        true
    }

    /// 注册以自身作为实现的服务
    fn add_service<T>(&mut self, lifetime: Lifetime) -> &mut Self
    where
        T: Injectable,
    {
        self.add_implementation::<T, T>(lifetime)
    }

    /// 注册以自身作为实现的服务，已存在等价注册时跳过
    fn try_add_service<T>(&mut self, lifetime: Lifetime) -> bool
    where
        T: Injectable,
    {
        self.try_add_implementation::<T, T>(lifetime)
    }

    /// 按运行时类型注册服务
    ///
    /// 参数无效时返回 [`DependencyError::InvalidArgument`](infrastructure_common::DependencyError)，
    /// 集合保持不变
    fn add_type(
        &mut self,
        service: &ServiceType,
        implementation: &ServiceType,
        lifetime: Lifetime,
    ) -> DependencyResult<&mut Self> {
        debug!(
            "按运行时类型注册服务: {} -> {} ({})",
            service.type_info(),
            implementation.type_info(),
            lifetime
        );
        match lifetime {
            Lifetime::Scoped => self.add_scoped_type(service, implementation),
            Lifetime::Singleton => self.add_singleton_type(service, implementation),
            Lifetime::Transient => self.add_transient_type(service, implementation),
        }
    }

    /// 按运行时类型注册服务，已存在等价注册时跳过
    fn try_add_type(
        &mut self,
        service: &ServiceType,
        implementation: &ServiceType,
        lifetime: Lifetime,
    ) -> DependencyResult<bool> {
        let key = DescriptorKey::for_service_types(service, implementation, lifetime)?;
        if !self.begin_try_add(&key, &service.type_info().full_name) {
            return Ok(false);
        }
        self.add_type(service, implementation, lifetime)?;
        Ok(true)
    }

    /// 按运行时类型注册以自身作为实现的服务
    fn add_service_type(
        &mut self,
        service: &ServiceType,
        lifetime: Lifetime,
    ) -> DependencyResult<&mut Self> {
        self.add_type(service, service, lifetime)
    }

    /// 按运行时类型注册以自身作为实现的服务，已存在等价注册时跳过
    fn try_add_service_type(
        &mut self,
        service: &ServiceType,
        lifetime: Lifetime,
    ) -> DependencyResult<bool> {
        self.try_add_type(service, service, lifetime)
    }

    /// 注册单例实例，不覆盖已有的同一服务与实现的单例注册
    ///
    /// 注册成功时解析得到的就是传入的实例本身
    fn try_add_singleton_instance<S, I>(&mut self, instance: Arc<I>) -> bool
    where
        S: ?Sized + Send + Sync + 'static,
        I: Implements<S>,
    {
        let key = DescriptorKey::for_type::<S, I>(Lifetime::Singleton);
        if !self.begin_try_add(&key, type_name::<S>()) {
            return false;
        }
        debug!("注册单例实例: {} -> {}", type_name::<S>(), type_name::<I>());
        self.add_singleton_instance::<S, I>(instance);
        true
    }

    #[doc(hidden)]
    fn begin_try_add(&self, key: &DescriptorKey, service: &str) -> bool {
        if self.contains_key(key) {
            debug!("已存在等价注册，跳过: {} ({})", service, key.lifetime());
            return false;
        }
        true
    }
}

impl<C: ServiceCollection> ServiceCollectionExtensions for C {}

fn upcast_factory<S, I, F>(
    factory: F,
) -> impl Fn(&dyn ServiceResolver) -> DependencyResult<Arc<S>> + Send + Sync + 'static
where
    S: ?Sized + Send + Sync + 'static,
    I: Implements<S>,
    F: Fn(&dyn ServiceResolver) -> DependencyResult<Arc<I>> + Send + Sync + 'static,
{
    move |resolver: &dyn ServiceResolver| factory(resolver).map(<I as Implements<S>>::upcast)
}
