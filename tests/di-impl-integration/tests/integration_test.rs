//! 目录驱动解析器的集中集成测试

use di_abstractions::{ComponentResolver, MemoryLoader};
use infrastructure_common::{InjectError, ProviderMap, Value};
use infrastructure_composition::{Resolver, ResolverBuilder};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use tempfile::TempDir;

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .try_init()
            .ok();
    });
}

fn touch(root: &Path, files: &[&str]) {
    for file in files {
        let path = root.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "").unwrap();
    }
}

fn empty_provider() -> Value {
    Value::injectable(|_, _| Ok(Value::Empty))
}

/// `Models` 目录：`User` 类依赖 `Token`，`User` 下挂一个查询方法
fn models(root: &Path) -> MemoryLoader {
    touch(
        root,
        &[
            "Token/index.js",
            "User/index.js",
            "User/provider.js",
            "User/classMethods/finder/index.js",
            "User/classMethods/finder/provider.js",
        ],
    );

    let user = Value::class(1, |_, args| {
        let deps = args[0].clone();
        Ok(Value::object_from([(
            "token",
            Value::function(move |_, _| deps.get("Token")?.get("create")?.call(&[])),
        )]))
    });
    let token = Value::object_from([("create", Value::function(|_, _| Ok(Value::from("id"))))]);
    let finder = Value::injectable(|_, args| {
        let deps = args[0].clone();
        Ok(Value::function(move |_, _| deps.get("Token")))
    });

    MemoryLoader::new()
        .with_module("Token/index.js", token)
        .with_module("User/index.js", user)
        .with_module("User/classMethods/finder/index.js", finder)
        .with_providers(
            root.join("User/provider.js"),
            ProviderMap::new().memoized("getToken", empty_provider()),
        )
        .with_providers(
            root.join("User/classMethods/finder/provider.js"),
            ProviderMap::new().memoized("getToken", empty_provider()),
        )
}

async fn build(root: &Path, loader: MemoryLoader) -> Resolver {
    ResolverBuilder::new()
        .directory(root)
        .loader(loader)
        .build()
        .await
        .unwrap()
}

/// 测试 `User` 类在构造时拿到 `Token` 依赖
#[tokio::test]
async fn test_user_class_resolves_token_from_directory() {
    init_test_logger();
    let dir = TempDir::new().unwrap();
    let resolver = build(dir.path(), models(dir.path())).await;

    let user = resolver.get("User").unwrap();
    assert!(user.is_locked());

    let instance = user.construct(&[]).unwrap();
    assert_eq!(instance.get("token").unwrap().call(&[]).unwrap(), Value::from("id"));

    let finder = user.get("classMethods").unwrap().get("finder").unwrap();
    let token = finder.call(&[]).unwrap();
    assert!(token.same(&resolver.get("Token").unwrap()));
}

/// 测试重复解析返回同一实例，after 钩子只调用一次
#[tokio::test]
async fn test_repeated_get_is_idempotent() {
    init_test_logger();
    let dir = TempDir::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let resolver = ResolverBuilder::new()
        .directory(dir.path())
        .loader(models(dir.path()))
        .after(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        })
        .build()
        .await
        .unwrap();

    let first = resolver.get("Token").unwrap();
    let second = resolver.get("Token").unwrap();
    assert!(first.same(&second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // 强制刷新会再次经过 after 钩子
    resolver.refresh("Token").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// 测试提供者文件旁边是普通对象时扫描失败
#[tokio::test]
async fn test_unexpected_provider_file_fails_the_build() {
    init_test_logger();
    let dir = TempDir::new().unwrap();
    touch(dir.path(), &["Settings/index.js", "Settings/provider.js"]);
    let loader = MemoryLoader::new().with_module("Settings/index.js", Value::object());

    let err = ResolverBuilder::new()
        .directory(dir.path())
        .loader(loader)
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, InjectError::UnexpectedProviderFile { .. }));
}

/// 测试未登记的名称
#[tokio::test]
async fn test_unregistered_name_raises_not_an_object() {
    init_test_logger();
    let dir = TempDir::new().unwrap();
    let resolver = build(dir.path(), models(dir.path())).await;

    let err = resolver.get("Unregistered").unwrap_err();
    assert!(matches!(err, InjectError::NotAnObject { ref name, .. } if name == "Unregistered"));
    assert!(!resolver.has("Unregistered"));
}

/// 测试互相依赖的条目不会无限递归
#[tokio::test]
async fn test_mutual_dependencies_resolve_without_looping() {
    init_test_logger();
    let dir = TempDir::new().unwrap();
    touch(
        dir.path(),
        &[
            "A/index.js",
            "A/peer/index.js",
            "A/peer/provider.js",
            "B/index.js",
            "B/peer/index.js",
            "B/peer/provider.js",
        ],
    );
    let peer = |other: &'static str| {
        Value::injectable(move |_, args| Ok(Value::List(vec![args[0].get(other)?])))
    };
    let loader = MemoryLoader::new()
        .with_module("A/index.js", Value::object())
        .with_module("B/index.js", Value::object())
        .with_module("A/peer/index.js", peer("B"))
        .with_module("B/peer/index.js", peer("A"))
        .with_providers(
            dir.path().join("A/peer/provider.js"),
            ProviderMap::new().memoized("getB", empty_provider()),
        )
        .with_providers(
            dir.path().join("B/peer/provider.js"),
            ProviderMap::new().memoized("getA", empty_provider()),
        );
    let resolver = build(dir.path(), loader).await;

    let a = resolver.get("A").unwrap();
    let b = resolver.get("B").unwrap();
    assert!(a.is_locked());
    assert!(b.is_locked());

    let seen_by_a = a.get("peer").unwrap();
    assert!(matches!(&seen_by_a, Value::List(items) if items[0].same(&b)));
}

/// 测试根级依赖的占位符与多个根目录的优先级
#[tokio::test]
async fn test_placeholders_and_root_precedence() {
    init_test_logger();
    let primary = TempDir::new().unwrap();
    let secondary = TempDir::new().unwrap();
    touch(primary.path(), &["provider.js", "Shared/index.js"]);
    touch(secondary.path(), &["Shared/index.js"]);

    let loader = MemoryLoader::new()
        .with_providers(
            primary.path().join("provider.js"),
            ProviderMap::new().memoized("getCache", empty_provider()),
        )
        .with_module(
            primary.path().join("Shared/index.js"),
            Value::object_from([("origin", Value::from("primary"))]),
        )
        .with_module(
            secondary.path().join("Shared/index.js"),
            Value::object_from([("origin", Value::from("secondary"))]),
        );

    let resolver = ResolverBuilder::new()
        .directory(primary.path())
        .directory(secondary.path())
        .loader(loader)
        .build()
        .await
        .unwrap();

    assert!(resolver.has("Cache"));
    assert!(resolver.get("Cache").unwrap().is_empty());
    assert_eq!(
        resolver.get("Shared").unwrap().get("origin").unwrap(),
        Value::from("primary")
    );
    assert_eq!(resolver.directories().len(), 2);
    assert_eq!(resolver.names(), vec!["Shared".to_string(), "Cache".to_string()]);
}

/// 测试类型声明覆盖全部入口文件
#[tokio::test]
async fn test_typedefs_describe_scanned_entries() {
    init_test_logger();
    let dir = TempDir::new().unwrap();
    let resolver = build(dir.path(), models(dir.path())).await;

    let typedefs = resolver.typedefs();
    assert!(typedefs.contains(
        "import UserClassMethodsFinderModule from './User/classMethods/finder/index.js';"
    ));
    assert!(typedefs.contains("export interface TokenInterface extends TokenModule {}"));
    assert!(typedefs.contains("export interface UserInterface extends UserModule {"));
    assert!(typedefs.contains("  classMethods: UserInterfaceModule.ClassMethods;"));
}
