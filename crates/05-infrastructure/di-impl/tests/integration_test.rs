//! 依赖注入实现的集成测试

use di_abstractions::{
    implements, ContainerConfig, Injectable, ServiceCollection, ServiceResolver,
    ServiceResolverExt, ServiceType,
};
use di_impl::ServiceCollectionImpl;
use infrastructure_common::{DependencyError, DependencyResult, TypeInfo};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> String;
}

#[derive(Debug)]
struct EnglishGreeter;

impl Greeter for EnglishGreeter {
    fn greet(&self, name: &str) -> String {
        format!("Hello, {name}")
    }
}

impl Injectable for EnglishGreeter {
    fn inject(_resolver: &dyn ServiceResolver) -> DependencyResult<Self> {
        Ok(EnglishGreeter)
    }
}

implements!(EnglishGreeter => dyn Greeter);

#[derive(Debug)]
struct FrenchGreeter;

impl Greeter for FrenchGreeter {
    fn greet(&self, name: &str) -> String {
        format!("Bonjour, {name}")
    }
}

impl Injectable for FrenchGreeter {
    fn inject(_resolver: &dyn ServiceResolver) -> DependencyResult<Self> {
        Ok(FrenchGreeter)
    }
}

implements!(FrenchGreeter => dyn Greeter);

/// 依赖 Greeter 的请求处理器
struct RequestHandler {
    greeter: Arc<dyn Greeter>,
}

impl Injectable for RequestHandler {
    fn inject(resolver: &dyn ServiceResolver) -> DependencyResult<Self> {
        Ok(RequestHandler {
            greeter: resolver.resolve::<dyn Greeter>()?,
        })
    }

    fn dependencies() -> Vec<TypeInfo> {
        vec![TypeInfo::of::<dyn Greeter>()]
    }
}

struct Ping {
    _pong: Arc<Pong>,
}

struct Pong {
    _ping: Arc<Ping>,
}

impl Injectable for Ping {
    fn inject(resolver: &dyn ServiceResolver) -> DependencyResult<Self> {
        Ok(Ping {
            _pong: resolver.resolve::<Pong>()?,
        })
    }

    fn dependencies() -> Vec<TypeInfo> {
        vec![TypeInfo::of::<Pong>()]
    }
}

impl Injectable for Pong {
    fn inject(resolver: &dyn ServiceResolver) -> DependencyResult<Self> {
        Ok(Pong {
            _ping: resolver.resolve::<Ping>()?,
        })
    }

    fn dependencies() -> Vec<TypeInfo> {
        vec![TypeInfo::of::<Ping>()]
    }
}

#[test]
fn test_singleton_is_shared_across_scopes() {
    let mut services = ServiceCollectionImpl::new();
    services.add_singleton::<dyn Greeter, EnglishGreeter>();
    let provider = services.build_service_provider().unwrap();

    let root = provider.resolve::<dyn Greeter>().unwrap();
    let scoped = provider.create_scope().resolve::<dyn Greeter>().unwrap();

    assert!(Arc::ptr_eq(&root, &scoped));
    assert_eq!(root.greet("Ada"), "Hello, Ada");
}

#[test]
fn test_scoped_is_shared_within_scope_only() {
    let mut services = ServiceCollectionImpl::new();
    services.add_scoped::<dyn Greeter, EnglishGreeter>();
    let provider = services.build_service_provider().unwrap();

    let first_scope = provider.create_scope();
    let second_scope = provider.create_scope();

    let a = first_scope.resolve::<dyn Greeter>().unwrap();
    let b = first_scope.resolve::<dyn Greeter>().unwrap();
    let c = second_scope.resolve::<dyn Greeter>().unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(first_scope.instance_count(), 1);
}

#[test]
fn test_transient_creates_new_instances() {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();

    let mut services = ServiceCollectionImpl::new();
    services.add_transient_factory::<dyn Greeter, _>(move |_resolver| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FrenchGreeter) as Arc<dyn Greeter>)
    });
    let provider = services.build_service_provider().unwrap();

    provider.resolve::<dyn Greeter>().unwrap();
    provider.resolve::<dyn Greeter>().unwrap();

    assert_eq!(created.load(Ordering::SeqCst), 2);
}

#[test]
fn test_constructor_injection() {
    let mut services = ServiceCollectionImpl::new();
    services
        .add_singleton::<dyn Greeter, FrenchGreeter>()
        .add_transient::<RequestHandler, RequestHandler>();
    let provider = services.build_service_provider().unwrap();

    let handler = provider.resolve::<RequestHandler>().unwrap();
    assert_eq!(handler.greeter.greet("Ada"), "Bonjour, Ada");
}

#[test]
fn test_last_registration_wins_and_resolve_all_keeps_order() {
    let mut services = ServiceCollectionImpl::new();
    services
        .add_transient::<dyn Greeter, EnglishGreeter>()
        .add_transient::<dyn Greeter, FrenchGreeter>();
    let provider = services.build_service_provider().unwrap();

    assert_eq!(provider.resolve::<dyn Greeter>().unwrap().greet("Ada"), "Bonjour, Ada");

    let all: Vec<String> = provider
        .resolve_all::<dyn Greeter>()
        .unwrap()
        .iter()
        .map(|greeter| greeter.greet("Ada"))
        .collect();
    assert_eq!(all, vec!["Hello, Ada", "Bonjour, Ada"]);
}

#[test]
fn test_unregistered_service() {
    let provider = ServiceCollectionImpl::new().build_service_provider().unwrap();

    let error = provider.resolve::<dyn Greeter>().err().expect("解析应当失败");
    assert!(matches!(error, DependencyError::ServiceNotRegistered { .. }));
    assert!(provider.try_resolve::<dyn Greeter>().unwrap().is_none());
    assert!(provider.resolve_all::<dyn Greeter>().unwrap().is_empty());
}

#[test]
fn test_circular_dependency_at_resolution() {
    let mut services = ServiceCollectionImpl::new();
    services
        .add_transient::<Ping, Ping>()
        .add_transient::<Pong, Pong>();
    let provider = services.build_service_provider().unwrap();

    let error = provider.resolve::<Ping>().err().expect("解析应当失败");
    assert!(matches!(error, DependencyError::CircularDependency { .. }));
}

#[test]
fn test_circular_dependency_at_build() {
    let mut services = ServiceCollectionImpl::new();
    services
        .add_singleton::<Ping, Ping>()
        .add_singleton::<Pong, Pong>();

    let error = services
        .build_service_provider_with(ContainerConfig::development())
        .unwrap_err();
    assert!(matches!(error, DependencyError::CircularDependency { .. }));
}

#[test]
fn test_scoped_from_root_is_rejected_when_validating() {
    let mut services = ServiceCollectionImpl::new();
    services.add_scoped::<dyn Greeter, EnglishGreeter>();
    let provider = services
        .build_service_provider_with(ContainerConfig {
            validate_scopes: true,
            ..ContainerConfig::default()
        })
        .unwrap();

    let error = provider.resolve::<dyn Greeter>().err().expect("解析应当失败");
    assert!(matches!(error, DependencyError::ScopeMismatch { .. }));
    assert!(provider.create_scope().resolve::<dyn Greeter>().is_ok());
}

#[test]
fn test_singleton_capturing_scoped_is_rejected_at_resolution() {
    let mut services = ServiceCollectionImpl::new();
    services
        .add_scoped::<dyn Greeter, EnglishGreeter>()
        .add_singleton::<RequestHandler, RequestHandler>();
    let provider = services
        .build_service_provider_with(ContainerConfig {
            validate_scopes: true,
            ..ContainerConfig::default()
        })
        .unwrap();

    let scope = provider.create_scope();
    let error = scope.resolve::<RequestHandler>().err().expect("解析应当失败");
    assert!(matches!(error, DependencyError::ScopeMismatch { .. }));
}

#[test]
fn test_runtime_type_registration() {
    let mut services = ServiceCollectionImpl::new();
    services
        .add_scoped_type(
            &ServiceType::abstraction::<dyn Greeter>(),
            &ServiceType::implementing::<dyn Greeter, FrenchGreeter>(),
        )
        .unwrap();
    let provider = services.build_service_provider().unwrap();

    let greeter = provider.create_scope().resolve::<dyn Greeter>().unwrap();
    assert_eq!(greeter.greet("Ada"), "Bonjour, Ada");
}

#[test]
fn test_singleton_resolved_concurrently_is_unique() {
    let mut services = ServiceCollectionImpl::new();
    services.add_singleton::<dyn Greeter, EnglishGreeter>();
    let provider = services.build_service_provider().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let provider = provider.clone();
            std::thread::spawn(move || provider.resolve::<dyn Greeter>().unwrap())
        })
        .collect();

    let instances: Vec<Arc<dyn Greeter>> =
        handles.into_iter().map(|handle| handle.join().unwrap()).collect();
    assert!(instances.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}
