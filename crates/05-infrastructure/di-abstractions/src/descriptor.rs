//! 服务描述符
//!
//! 描述一次服务注册：服务类型、实现方式与生命周期

use crate::factory::{
    erase, factory_activator, type_activator, Activator, Implements, Injectable, ServiceInstance,
};
use crate::resolver::ServiceResolver;
use infrastructure_common::{DependencyError, DependencyResult, Lifetime, TypeInfo};
use serde::Serialize;
use std::any::TypeId;
use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// 服务实现方式
#[derive(Clone)]
pub enum ServiceImplementation {
    /// 按实现类型注册，解析时通过激活器构造
    Type {
        implementation: TypeInfo,
        activator: Activator,
        dependencies: Vec<TypeInfo>,
    },
    /// 按工厂函数注册
    Factory {
        factory: TypeInfo,
        activator: Activator,
    },
    /// 已构造的实例
    Instance {
        implementation: TypeInfo,
        instance: ServiceInstance,
    },
}

impl ServiceImplementation {
    /// 实现方式类别
    pub fn kind(&self) -> ImplementationKind {
        match self {
            ServiceImplementation::Type { .. } => ImplementationKind::Type,
            ServiceImplementation::Factory { .. } => ImplementationKind::Factory,
            ServiceImplementation::Instance { .. } => ImplementationKind::Instance,
        }
    }

    /// 实现类型（工厂注册时为工厂类型）
    pub fn implementation_type(&self) -> &TypeInfo {
        match self {
            ServiceImplementation::Type { implementation, .. } => implementation,
            ServiceImplementation::Factory { factory, .. } => factory,
            ServiceImplementation::Instance { implementation, .. } => implementation,
        }
    }
}

/// 实现方式类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImplementationKind {
    Type,
    Factory,
    Instance,
}

/// 描述符键
///
/// 两个描述符的键相等即视为等价注册。按类型注册与按实例注册同一实现类型
/// 共用同一个键。无捕获的工厂（函数项、无捕获闭包）以工厂类型作为标识；
/// 带捕获状态的工厂每个值都有独立标识，只与自身注册的描述符等价。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorKey {
    service: TypeId,
    implementation: TypeId,
    by_factory: bool,
    factory_instance: u64,
    lifetime: Lifetime,
}

// 0 保留给按类型标识的键
static NEXT_FACTORY_INSTANCE: AtomicU64 = AtomicU64::new(1);

impl DescriptorKey {
    /// 按实现类型注册的键
    pub fn for_type<S, I>(lifetime: Lifetime) -> Self
    where
        S: ?Sized + 'static,
        I: ?Sized + 'static,
    {
        Self {
            service: TypeId::of::<S>(),
            implementation: TypeId::of::<I>(),
            by_factory: false,
            factory_instance: 0,
            lifetime,
        }
    }

    /// 按工厂注册的键
    ///
    /// 带捕获状态的工厂每次调用都得到新的标识，因此不会与任何已有注册等价
    pub fn for_factory<S, F>(lifetime: Lifetime) -> Self
    where
        S: ?Sized + 'static,
        F: 'static,
    {
        let factory_instance = if mem::size_of::<F>() == 0 {
            0
        } else {
            NEXT_FACTORY_INSTANCE.fetch_add(1, Ordering::Relaxed)
        };

        Self {
            service: TypeId::of::<S>(),
            implementation: TypeId::of::<F>(),
            by_factory: true,
            factory_instance,
            lifetime,
        }
    }

    /// 按工厂值推断工厂类型
    pub fn for_factory_value<S, F>(_factory: &F, lifetime: Lifetime) -> Self
    where
        S: ?Sized + 'static,
        F: 'static,
    {
        Self::for_factory::<S, F>(lifetime)
    }

    /// 按运行时类型注册的键，同时校验参数
    pub fn for_service_types(
        service: &ServiceType,
        implementation: &ServiceType,
        lifetime: Lifetime,
    ) -> DependencyResult<Self> {
        let service_id = service.service_id()?;
        implementation.ensure_provides(service)?;
        let implementation_id = implementation.info.id.ok_or_else(|| {
            DependencyError::invalid_argument("implementation_type", "实现类型未解析")
        })?;

        Ok(Self {
            service: service_id,
            implementation: implementation_id,
            by_factory: false,
            factory_instance: 0,
            lifetime,
        })
    }

    /// 服务类型ID
    pub fn service(&self) -> TypeId {
        self.service
    }

    /// 生命周期
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }
}

/// 服务描述符
#[derive(Clone)]
pub struct ServiceDescriptor {
    service: TypeInfo,
    lifetime: Lifetime,
    implementation: ServiceImplementation,
    key: DescriptorKey,
}

impl ServiceDescriptor {
    /// 按实现类型创建描述符
    pub fn from_type<S, I>(lifetime: Lifetime) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<S>,
    {
        Self {
            service: TypeInfo::of::<S>(),
            lifetime,
            implementation: ServiceImplementation::Type {
                implementation: TypeInfo::of::<I>(),
                activator: type_activator::<S, I>(),
                dependencies: I::dependencies(),
            },
            key: DescriptorKey::for_type::<S, I>(lifetime),
        }
    }

    /// 按工厂函数创建描述符
    pub fn from_factory<S, F>(factory: F, lifetime: Lifetime) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn ServiceResolver) -> DependencyResult<Arc<S>> + Send + Sync + 'static,
    {
        Self {
            service: TypeInfo::of::<S>(),
            lifetime,
            implementation: ServiceImplementation::Factory {
                factory: TypeInfo::of::<F>(),
                activator: factory_activator::<S, F>(factory),
            },
            key: DescriptorKey::for_factory::<S, F>(lifetime),
        }
    }

    /// 按已构造实例创建单例描述符
    pub fn from_instance<S, I>(instance: Arc<I>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Implements<S>,
    {
        Self {
            service: TypeInfo::of::<S>(),
            lifetime: Lifetime::Singleton,
            implementation: ServiceImplementation::Instance {
                implementation: TypeInfo::of::<I>(),
                instance: erase::<S>(<I as Implements<S>>::upcast(instance)),
            },
            key: DescriptorKey::for_type::<S, I>(Lifetime::Singleton),
        }
    }

    /// 按运行时类型创建描述符
    pub fn from_service_types(
        service: &ServiceType,
        implementation: &ServiceType,
        lifetime: Lifetime,
    ) -> DependencyResult<Self> {
        let key = DescriptorKey::for_service_types(service, implementation, lifetime)?;
        let activator = implementation.activator.clone().ok_or_else(|| {
            DependencyError::invalid_argument(
                "implementation_type",
                format!("类型 {} 不可激活", implementation.info),
            )
        })?;

        Ok(Self {
            service: service.info.clone(),
            lifetime,
            implementation: ServiceImplementation::Type {
                implementation: implementation.info.clone(),
                activator,
                dependencies: implementation.dependencies.clone(),
            },
            key,
        })
    }

    /// 服务类型
    pub fn service_type(&self) -> &TypeInfo {
        &self.service
    }

    /// 生命周期
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// 实现方式
    pub fn implementation(&self) -> &ServiceImplementation {
        &self.implementation
    }

    /// 描述符键
    pub fn key(&self) -> DescriptorKey {
        self.key
    }

    /// 声明的依赖类型，只有按类型注册时存在
    pub fn dependencies(&self) -> &[TypeInfo] {
        match &self.implementation {
            ServiceImplementation::Type { dependencies, .. } => dependencies,
            _ => &[],
        }
    }

    /// 是否与另一个描述符等价
    pub fn is_equivalent(&self, other: &ServiceDescriptor) -> bool {
        self.key == other.key
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("service", &self.service.full_name)
            .field("lifetime", &self.lifetime)
            .field("kind", &self.implementation.kind())
            .field("implementation", &self.implementation.implementation_type().full_name)
            .finish()
    }
}

/// 运行时服务类型
///
/// 用于在编译期类型不可用时（例如来自配置）描述服务与实现
#[derive(Clone)]
pub struct ServiceType {
    info: TypeInfo,
    provides: Option<TypeInfo>,
    activator: Option<Activator>,
    dependencies: Vec<TypeInfo>,
}

impl ServiceType {
    /// 可自我激活的具体类型
    pub fn of<T: Injectable>() -> Self {
        Self {
            info: TypeInfo::of::<T>(),
            provides: Some(TypeInfo::of::<T>()),
            activator: Some(type_activator::<T, T>()),
            dependencies: T::dependencies(),
        }
    }

    /// 作为服务 `S` 提供的实现类型
    pub fn implementing<S, I>() -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<S>,
    {
        Self {
            info: TypeInfo::of::<I>(),
            provides: Some(TypeInfo::of::<S>()),
            activator: Some(type_activator::<S, I>()),
            dependencies: I::dependencies(),
        }
    }

    /// 仅作为服务标识的抽象类型，不可激活
    pub fn abstraction<S: ?Sized + 'static>() -> Self {
        Self {
            info: TypeInfo::of::<S>(),
            provides: None,
            activator: None,
            dependencies: Vec::new(),
        }
    }

    /// 按名称创建，未解析为具体类型
    pub fn from_name(name: &str) -> Self {
        Self {
            info: TypeInfo::from_name(name),
            provides: None,
            activator: None,
            dependencies: Vec::new(),
        }
    }

    /// 类型信息
    pub fn type_info(&self) -> &TypeInfo {
        &self.info
    }

    /// 是否可以被激活
    pub fn is_activatable(&self) -> bool {
        self.activator.is_some()
    }

    fn service_id(&self) -> DependencyResult<TypeId> {
        self.info.id.ok_or_else(|| {
            DependencyError::invalid_argument(
                "service_type",
                format!("无法识别的服务类型: {}", self.info),
            )
        })
    }

    fn ensure_provides(&self, service: &ServiceType) -> DependencyResult<()> {
        if !self.is_activatable() {
            return Err(DependencyError::invalid_argument(
                "implementation_type",
                format!("类型 {} 不可激活", self.info),
            ));
        }

        match &self.provides {
            Some(provided) if provided.same_type(&service.info) => Ok(()),
            _ => Err(DependencyError::invalid_argument(
                "implementation_type",
                format!("类型 {} 未实现服务 {}", self.info, service.info),
            )),
        }
    }
}

impl fmt::Debug for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceType")
            .field("type", &self.info.full_name)
            .field("activatable", &self.is_activatable())
            .finish()
    }
}
