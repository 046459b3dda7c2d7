//! 服务提供者与作用域实现

use crate::validation;
use dashmap::DashMap;
use di_abstractions::{
    ContainerConfig, ContainerStats, ResolveContext, ResolveOptions, ServiceDescriptor,
    ServiceImplementation, ServiceInstance, ServiceResolver,
};
use infrastructure_common::{DependencyError, DependencyResult, Lifetime, Scope, TypeInfo};
use parking_lot::Mutex;
use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 注册项，`slot` 为注册顺序，用作实例缓存键
struct Registration {
    slot: usize,
    descriptor: ServiceDescriptor,
}

/// 服务提供者共享状态
struct ProviderCore {
    registrations: HashMap<TypeId, Vec<Registration>>,
    singletons: DashMap<usize, ServiceInstance>,
    config: ContainerConfig,
    stats: Mutex<ContainerStats>,
}

impl ProviderCore {
    fn registrations_for(&self, service: &TypeInfo) -> Option<&[Registration]> {
        service
            .id
            .and_then(|id| self.registrations.get(&id))
            .map(Vec::as_slice)
            .filter(|registrations| !registrations.is_empty())
    }

    fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            max_depth: self.config.max_resolution_depth,
            detect_cycles: self.config.enable_circular_dependency_detection,
        }
    }

    fn record<T>(&self, service: &TypeInfo, result: &DependencyResult<T>) {
        let mut stats = self.stats.lock();
        match result {
            Ok(_) => stats.resolved_services += 1,
            Err(e) => {
                stats.resolution_errors += 1;
                warn!("服务解析失败: {}, 原因: {}", service.name, e);
            }
        }
    }
}

/// 作用域状态
struct ScopeState {
    scope: Scope,
    is_root: bool,
    instances: DashMap<usize, ServiceInstance>,
}

impl ScopeState {
    fn new(scope: Scope, is_root: bool) -> Self {
        Self {
            scope,
            is_root,
            instances: DashMap::new(),
        }
    }
}

/// 服务提供者（根作用域）
///
/// 单例在整个提供者内共享；根作用域中解析的作用域服务存放在根作用域缓存中
#[derive(Clone)]
pub struct ServiceProvider {
    core: Arc<ProviderCore>,
    root: Arc<ScopeState>,
}

impl ServiceProvider {
    pub(crate) fn build(
        descriptors: Vec<ServiceDescriptor>,
        config: ContainerConfig,
    ) -> DependencyResult<Self> {
        if config.validate_on_build {
            validation::validate_descriptors(&descriptors, &config)?;
        }

        let count = descriptors.len();
        let mut registrations: HashMap<TypeId, Vec<Registration>> = HashMap::new();
        for (slot, descriptor) in descriptors.into_iter().enumerate() {
            registrations
                .entry(descriptor.key().service())
                .or_default()
                .push(Registration { slot, descriptor });
        }

        let core = ProviderCore {
            registrations,
            singletons: DashMap::new(),
            config,
            stats: Mutex::new(ContainerStats {
                registered_services: count,
                ..ContainerStats::default()
            }),
        };

        info!("构建服务提供者完成，注册了 {} 个服务", count);
        Ok(Self {
            core: Arc::new(core),
            root: Arc::new(ScopeState::new(Scope::root(), true)),
        })
    }

    /// 创建新作用域
    pub fn create_scope(&self) -> ServiceScope {
        let ordinal = {
            let mut stats = self.core.stats.lock();
            stats.created_scopes += 1;
            stats.created_scopes
        };
        let scope = self.root.scope.child(format!("scope-{}", ordinal));
        debug!("创建作用域: {} ({})", scope.name, scope.id);

        ServiceScope {
            core: self.core.clone(),
            state: Arc::new(ScopeState::new(scope, false)),
        }
    }

    /// 根作用域
    pub fn scope(&self) -> &Scope {
        &self.root.scope
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.core.config
    }

    /// 容器统计信息
    pub fn stats(&self) -> ContainerStats {
        let mut stats = self.core.stats.lock().clone();
        stats.active_singletons = self.core.singletons.len();
        stats
    }
}

impl ServiceResolver for ServiceProvider {
    fn resolve_by_type(&self, service: &TypeInfo) -> DependencyResult<ServiceInstance> {
        resolve_in(&self.core, &self.root, service)
    }

    fn resolve_all_by_type(&self, service: &TypeInfo) -> DependencyResult<Vec<ServiceInstance>> {
        resolve_all_in(&self.core, &self.root, service)
    }

    fn can_resolve_by_type(&self, service: &TypeInfo) -> bool {
        self.core.registrations_for(service).is_some()
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("scope", &self.root.scope.id)
            .field("config", &self.core.config)
            .field("registrations", &self.core.registrations.len())
            .finish()
    }
}

/// 服务作用域
///
/// 作用域服务在同一作用域内共享，作用域释放时一并释放
pub struct ServiceScope {
    core: Arc<ProviderCore>,
    state: Arc<ScopeState>,
}

impl ServiceScope {
    /// 作用域信息
    pub fn scope(&self) -> &Scope {
        &self.state.scope
    }

    /// 作用域内已创建的实例数量
    pub fn instance_count(&self) -> usize {
        self.state.instances.len()
    }
}

impl ServiceResolver for ServiceScope {
    fn resolve_by_type(&self, service: &TypeInfo) -> DependencyResult<ServiceInstance> {
        resolve_in(&self.core, &self.state, service)
    }

    fn resolve_all_by_type(&self, service: &TypeInfo) -> DependencyResult<Vec<ServiceInstance>> {
        resolve_all_in(&self.core, &self.state, service)
    }

    fn can_resolve_by_type(&self, service: &TypeInfo) -> bool {
        self.core.registrations_for(service).is_some()
    }
}

impl fmt::Debug for ServiceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceScope")
            .field("scope", &self.state.scope)
            .field("instances", &self.state.instances.len())
            .finish()
    }
}

impl Drop for ServiceScope {
    fn drop(&mut self) {
        debug!(
            "释放作用域: {} ({} 个实例)",
            self.state.scope.name,
            self.state.instances.len()
        );
    }
}

fn resolve_in(
    core: &ProviderCore,
    state: &ScopeState,
    service: &TypeInfo,
) -> DependencyResult<ServiceInstance> {
    let frame = ResolutionFrame::new(core, state);
    let result = frame.resolve_by_type(service);
    core.record(service, &result);
    result
}

fn resolve_all_in(
    core: &ProviderCore,
    state: &ScopeState,
    service: &TypeInfo,
) -> DependencyResult<Vec<ServiceInstance>> {
    let frame = ResolutionFrame::new(core, state);
    let result = frame.resolve_all_by_type(service);
    core.record(service, &result);
    result
}

/// 一次顶层解析的上下文，工厂与激活器通过它解析依赖
struct ResolutionFrame<'a> {
    core: &'a ProviderCore,
    state: &'a ScopeState,
    context: RefCell<ResolveContext>,
}

impl<'a> ResolutionFrame<'a> {
    fn new(core: &'a ProviderCore, state: &'a ScopeState) -> Self {
        Self {
            core,
            state,
            context: RefCell::new(ResolveContext::with_options(core.resolve_options())),
        }
    }

    fn resolve_registration(&self, registration: &Registration) -> DependencyResult<ServiceInstance> {
        let descriptor = &registration.descriptor;
        match descriptor.lifetime() {
            Lifetime::Singleton => {
                cached(&self.core.singletons, registration.slot, || self.activate(descriptor))
            }
            Lifetime::Scoped => {
                self.check_scoped(descriptor)?;
                cached(&self.state.instances, registration.slot, || self.activate(descriptor))
            }
            Lifetime::Transient => self.activate(descriptor),
        }
    }

    fn check_scoped(&self, descriptor: &ServiceDescriptor) -> DependencyResult<()> {
        if !self.core.config.validate_scopes {
            return Ok(());
        }

        if self.state.is_root {
            return Err(DependencyError::ScopeMismatch {
                expected: format!("在作用域中解析 {}", descriptor.service_type().name),
                actual: "根服务提供者".to_string(),
            });
        }

        if let Some(owner) = self.context.borrow().singleton_owner() {
            return Err(DependencyError::ScopeMismatch {
                expected: format!("单例 {} 仅依赖单例或瞬时服务", owner.name),
                actual: format!("作用域服务 {}", descriptor.service_type().name),
            });
        }

        Ok(())
    }

    fn activate(&self, descriptor: &ServiceDescriptor) -> DependencyResult<ServiceInstance> {
        let activator = match descriptor.implementation() {
            ServiceImplementation::Instance { instance, .. } => return Ok(instance.clone()),
            ServiceImplementation::Type { activator, .. }
            | ServiceImplementation::Factory { activator, .. } => activator,
        };

        self.context
            .borrow_mut()
            .push_type(descriptor.service_type(), descriptor.lifetime())?;
        debug!(
            "创建服务实例: {} ({}, 作用域 {})",
            descriptor.service_type().name,
            descriptor.lifetime(),
            self.state.scope.name
        );

        let result = activator(self as &dyn ServiceResolver);
        self.context.borrow_mut().pop_type();
        result
    }
}

impl ServiceResolver for ResolutionFrame<'_> {
    fn resolve_by_type(&self, service: &TypeInfo) -> DependencyResult<ServiceInstance> {
        let registration = self
            .core
            .registrations_for(service)
            .and_then(|registrations| registrations.last())
            .ok_or_else(|| DependencyError::not_registered(service.full_name.clone()))?;
        self.resolve_registration(registration)
    }

    fn resolve_all_by_type(&self, service: &TypeInfo) -> DependencyResult<Vec<ServiceInstance>> {
        match self.core.registrations_for(service) {
            Some(registrations) => registrations
                .iter()
                .map(|registration| self.resolve_registration(registration))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    fn can_resolve_by_type(&self, service: &TypeInfo) -> bool {
        self.core.registrations_for(service).is_some()
    }
}

// 创建期间不持有缓存锁，激活器可能递归解析同一缓存中的其他服务
fn cached(
    cache: &DashMap<usize, ServiceInstance>,
    slot: usize,
    create: impl FnOnce() -> DependencyResult<ServiceInstance>,
) -> DependencyResult<ServiceInstance> {
    if let Some(existing) = cache.get(&slot) {
        return Ok(existing.value().clone());
    }

    let instance = create()?;
    Ok(cache.entry(slot).or_insert(instance).value().clone())
}
