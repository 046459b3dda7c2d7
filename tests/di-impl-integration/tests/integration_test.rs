//! 服务注册扩展、服务提供者与容器配置的集中集成测试

use di_abstractions::{
    implements, ContainerConfig, Injectable, ServiceCollection, ServiceResolver,
    ServiceResolverExt, ServiceType,
};
use di_extensions::ServiceCollectionExtensions;
use di_impl::{load_container_config, ServiceCollectionImpl};
use infrastructure_common::{DependencyError, DependencyResult, Lifetime, TypeInfo};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait Repository: Send + Sync {
    fn find(&self, id: u32) -> Option<String>;
}

struct InMemoryRepository;

impl Repository for InMemoryRepository {
    fn find(&self, id: u32) -> Option<String> {
        (id == 1).then(|| "ada".to_string())
    }
}

impl Injectable for InMemoryRepository {
    fn inject(_resolver: &dyn ServiceResolver) -> DependencyResult<Self> {
        Ok(InMemoryRepository)
    }
}

implements!(InMemoryRepository => dyn Repository);

struct UnitOfWork {
    id: usize,
}

static NEXT_UNIT: AtomicUsize = AtomicUsize::new(0);

impl Injectable for UnitOfWork {
    fn inject(_resolver: &dyn ServiceResolver) -> DependencyResult<Self> {
        Ok(UnitOfWork {
            id: NEXT_UNIT.fetch_add(1, Ordering::SeqCst),
        })
    }
}

struct UserService {
    repository: Arc<dyn Repository>,
    unit: Arc<UnitOfWork>,
}

impl Injectable for UserService {
    fn inject(resolver: &dyn ServiceResolver) -> DependencyResult<Self> {
        Ok(UserService {
            repository: resolver.resolve::<dyn Repository>()?,
            unit: resolver.resolve::<UnitOfWork>()?,
        })
    }

    fn dependencies() -> Vec<TypeInfo> {
        vec![TypeInfo::of::<dyn Repository>(), TypeInfo::of::<UnitOfWork>()]
    }
}

fn register(services: &mut ServiceCollectionImpl) {
    services
        .add_implementation::<dyn Repository, InMemoryRepository>(Lifetime::Singleton)
        .add_service::<UnitOfWork>(Lifetime::Scoped)
        .add_service::<UserService>(Lifetime::Transient);
}

#[test]
fn test_facade_registrations_resolve_end_to_end() {
    let mut services = ServiceCollectionImpl::new();
    register(&mut services);
    let provider = services
        .build_service_provider_with(ContainerConfig::development())
        .unwrap();

    let scope = provider.create_scope();
    let first = scope.resolve::<UserService>().unwrap();
    let second = scope.resolve::<UserService>().unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.unit, &second.unit));
    assert!(Arc::ptr_eq(&first.repository, &second.repository));
    assert_eq!(first.repository.find(1).as_deref(), Some("ada"));

    let other = provider.create_scope().resolve::<UserService>().unwrap();
    assert_ne!(other.unit.id, first.unit.id);
    assert!(Arc::ptr_eq(&other.repository, &first.repository));
}

#[test]
fn test_repeated_module_registration_is_idempotent() {
    let mut services = ServiceCollectionImpl::new();

    for _ in 0..3 {
        services.try_add_implementation::<dyn Repository, InMemoryRepository>(Lifetime::Singleton);
        services.try_add_service::<UnitOfWork>(Lifetime::Scoped);
        services
            .try_add_service_type(&ServiceType::of::<UserService>(), Lifetime::Transient)
            .unwrap();
    }

    assert_eq!(services.len(), 3);
    assert!(services.build_service_provider().is_ok());
}

#[test]
fn test_build_validation_reports_missing_dependency() {
    let mut services = ServiceCollectionImpl::new();
    services
        .add_service::<UnitOfWork>(Lifetime::Scoped)
        .add_service::<UserService>(Lifetime::Transient);

    let error = services
        .build_service_provider_with(ContainerConfig::development())
        .unwrap_err();
    assert!(matches!(error, DependencyError::DependencyResolutionFailed { .. }));

    // 不校验时构建成功，解析时才失败
    let provider = services.build_service_provider().unwrap();
    let error = provider.create_scope().resolve::<UserService>().err().expect("解析应当失败");
    assert!(matches!(error, DependencyError::ServiceNotRegistered { .. }));
}

#[test]
fn test_singleton_instance_survives_later_type_registration() {
    let configured: Arc<InMemoryRepository> = Arc::new(InMemoryRepository);
    let expected: Arc<dyn Repository> = configured.clone();

    let mut services = ServiceCollectionImpl::new();
    assert!(services.try_add_singleton_instance::<dyn Repository, InMemoryRepository>(configured));
    assert!(!services.try_add_implementation::<dyn Repository, InMemoryRepository>(Lifetime::Singleton));

    let provider = services.build_service_provider().unwrap();
    let resolved = provider.resolve::<dyn Repository>().unwrap();
    assert!(Arc::ptr_eq(&resolved, &expected));
}

#[test]
fn test_config_file_enables_scope_validation() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[container]\nvalidate_scopes = true").unwrap();

    let config = load_container_config(Some(file.path())).unwrap();
    assert!(config.validate_scopes);

    let mut services = ServiceCollectionImpl::new();
    register(&mut services);
    let provider = services.build_service_provider_with(config).unwrap();

    let error = provider.resolve::<UnitOfWork>().err().expect("解析应当失败");
    assert!(matches!(error, DependencyError::ScopeMismatch { .. }));
    assert!(provider.create_scope().resolve::<UnitOfWork>().is_ok());
}

#[test]
fn test_max_resolution_depth() {
    let mut services = ServiceCollectionImpl::new();
    register(&mut services);
    let provider = services
        .build_service_provider_with(ContainerConfig {
            max_resolution_depth: 1,
            ..ContainerConfig::default()
        })
        .unwrap();

    let error = provider.create_scope().resolve::<UserService>().err().expect("解析应当失败");
    assert!(matches!(error, DependencyError::MaxDepthExceeded { max_depth: 1, .. }));
}
