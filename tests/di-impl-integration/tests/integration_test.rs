//! 依赖注入容器集中集成测试：生命周期、别名、模块与日志绑定

use di_common::{LoggerKey, TypeInfo, TypeKey};
use di_abstractions::{Module, Registrar, Resolver};
use di_impl::Scope;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once};
use std::thread;

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 测试组件
trait Named: Send + Sync {
    fn name(&self) -> &str;
}

#[derive(Debug)]
struct Descendant {
    name: String,
}

impl Named for Descendant {
    fn name(&self) -> &str {
        &self.name
    }
}

/// 构造时记录序号的组件
#[derive(Debug)]
struct Ticket(u64);

#[derive(Debug, PartialEq, Eq)]
struct Greeting(&'static str);

/// 提供默认问候语的模块
struct GreetingModule;

impl Module for GreetingModule {
    fn register<R: Registrar>(&self, registrar: &mut R) {
        registrar.add_singleton(Greeting("来自模块"));
    }
}

fn ticket_scope() -> Scope {
    let counter = Arc::new(AtomicU64::new(0));
    Scope::builder().name("tickets").build_with(move |r| {
        r.add_factory(move || Ticket(counter.fetch_add(1, Ordering::SeqCst)));
    })
}

#[test]
fn test_singleton_identity_across_threads() {
    init_test_logger();
    let scope = Scope::builder().build_with(|r| {
        r.add_singleton_factory(|| Descendant {
            name: "shared".to_string(),
        });
    });

    let local = scope.resolve::<Descendant>().unwrap();
    let remote: Vec<Arc<Descendant>> = (0..4)
        .map(|_| {
            let scope = scope.clone();
            thread::spawn(move || scope.resolve::<Descendant>().unwrap())
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert!(remote.iter().all(|other| Arc::ptr_eq(&local, other)));
}

#[test]
fn test_factory_values_are_unique() {
    init_test_logger();
    let scope = ticket_scope();

    let mut values: Vec<u64> = (0..1000)
        .map(|_| scope.resolve::<Ticket>().unwrap().0)
        .collect();
    values.sort_unstable();
    values.dedup();

    assert_eq!(values.len(), 1000);
}

#[test]
fn test_per_thread_identity() {
    init_test_logger();
    let scope = Scope::builder().build_with(|r| {
        r.add_per_thread_factory(|| Descendant {
            name: format!("{:?}", thread::current().id()),
        });
    });

    let instances: Vec<Arc<Descendant>> = (0..3)
        .map(|_| {
            let scope = scope.clone();
            thread::spawn(move || {
                let first = scope.resolve::<Descendant>().unwrap();
                let second = scope.resolve::<Descendant>().unwrap();
                assert!(Arc::ptr_eq(&first, &second));
                first
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert!(!Arc::ptr_eq(&instances[0], &instances[1]));
    assert!(!Arc::ptr_eq(&instances[1], &instances[2]));
    assert!(!Arc::ptr_eq(&instances[0], &instances[2]));
}

#[test]
fn test_per_key_identity() {
    init_test_logger();
    let scope = Scope::builder().build_with(|r| {
        r.add_per_key_factory(|key: &String| Descendant { name: key.clone() });
    });

    let one = scope.resolve_keyed::<Descendant>("one").unwrap();
    let again = scope.resolve_keyed::<Descendant>("one").unwrap();
    let two = scope.resolve_keyed::<Descendant>("two").unwrap();

    assert!(Arc::ptr_eq(&one, &again));
    assert!(!Arc::ptr_eq(&one, &two));
    assert_eq!(two.name, "two");
}

#[test]
fn test_alias_shares_instance() {
    init_test_logger();
    let scope = Scope::builder().build_with(|r| {
        r.add_alias::<dyn Named, Descendant, _>(|d: Arc<Descendant>| d as Arc<dyn Named>);
        r.add_singleton_factory(|| Descendant {
            name: "descendant".to_string(),
        });
    });

    let ancestor = scope.resolve::<dyn Named>().unwrap();
    let descendant = scope.resolve::<Descendant>().unwrap();

    assert_eq!(ancestor.name(), "descendant");
    assert!(std::ptr::eq(
        Arc::as_ptr(&ancestor) as *const u8,
        Arc::as_ptr(&descendant) as *const u8
    ));
}

#[test]
fn test_alias_sees_later_override() {
    init_test_logger();
    let scope = Scope::builder().build_with(|r| {
        r.add_alias::<dyn Named, Descendant, _>(|d: Arc<Descendant>| d as Arc<dyn Named>);
        r.add_singleton(Descendant {
            name: "first".to_string(),
        });
    });
    assert_eq!(scope.resolve::<dyn Named>().unwrap().name(), "first");

    scope.registrar().add_singleton(Descendant {
        name: "second".to_string(),
    });
    assert_eq!(scope.resolve::<dyn Named>().unwrap().name(), "second");
}

#[test]
fn test_unqualified_alias_forwards_qualifier() {
    init_test_logger();
    let scope = Scope::builder().build_with(|r| {
        r.add_per_key_factory(|key: &String| Descendant { name: key.clone() });
        r.add_alias::<dyn Named, Descendant, _>(|d: Arc<Descendant>| d as Arc<dyn Named>);
    });

    let through_alias = scope.resolve_keyed::<dyn Named>("one").unwrap();
    let direct = scope.resolve_keyed::<Descendant>("one").unwrap();

    assert_eq!(through_alias.name(), "one");
    assert_eq!(direct.name, "one");
}

#[test]
fn test_module_import_then_override() {
    init_test_logger();
    let scope = Scope::builder().build_with(|r| {
        r.import_module(&GreetingModule);
        r.add_singleton(Greeting("本地覆盖"));
    });

    assert_eq!(*scope.resolve::<Greeting>().unwrap(), Greeting("本地覆盖"));
}

#[test]
fn test_module_shared_by_scopes() {
    init_test_logger();
    let first = Scope::builder().build_with(|r| {
        r.import_module(&GreetingModule);
    });
    let second = Scope::builder().build_with(|r| {
        r.import_module(&GreetingModule);
    });

    let a = first.resolve::<Greeting>().unwrap();
    let b = second.resolve::<Greeting>().unwrap();
    assert_eq!(*a, *b);
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn test_unregistered_fallbacks() {
    init_test_logger();
    let scope = Scope::new();

    let fallback = scope
        .resolve_or_else(|| Arc::new(Greeting("默认")))
        .unwrap();
    assert_eq!(*fallback, Greeting("默认"));
    assert!(scope.resolve_or_none::<Greeting>().unwrap().is_none());
    assert_eq!(
        *scope.resolve_or(Arc::new(Greeting("值"))).unwrap(),
        Greeting("值")
    );
    assert!(scope.resolve::<Greeting>().unwrap_err().is_unregistered());
}

#[test]
fn test_scope_isolation() {
    init_test_logger();
    let registered = Scope::builder().build_with(|r| {
        r.add_singleton(Greeting("仅此作用域"));
    });
    let empty = Scope::new();

    assert!(registered.contains::<Greeting>());
    assert!(!empty.contains::<Greeting>());
    assert!(empty.resolve::<Greeting>().unwrap_err().is_unregistered());
}

/// 活动作用域：每个活动持有自己的控制器
struct Activity {
    title: String,
}

struct Controller {
    activity: Arc<Activity>,
    tickets: Arc<Ticket>,
}

fn activity_scope(title: &str) -> Scope {
    let title = title.to_string();
    let counter = Arc::new(AtomicU64::new(100));
    Scope::builder().name(title.clone()).build_with(move |r| {
        r.add_singleton(Activity { title });
        r.add_factory(move || Ticket(counter.fetch_add(1, Ordering::SeqCst)));
        r.add_scoped_singleton_factory(|scope: &Scope| {
            Ok(Controller {
                activity: scope.resolve()?,
                tickets: scope.resolve()?,
            })
        });
    })
}

#[test]
fn test_activity_scopes() {
    init_test_logger();
    let main = activity_scope("main");
    let settings = activity_scope("settings");

    let main_controller = main.resolve::<Controller>().unwrap();
    let settings_controller = settings.resolve::<Controller>().unwrap();

    assert_eq!(main_controller.activity.title, "main");
    assert_eq!(settings_controller.activity.title, "settings");
    assert_eq!(main_controller.tickets.0, 100);
    assert!(Arc::ptr_eq(
        &main_controller,
        &main.resolve::<Controller>().unwrap()
    ));
    assert_eq!(main.stats().constructions, 2);
}

/// 测试日志实现
#[derive(Debug)]
struct TestLogger {
    tag: String,
}

fn logger_scope() -> Scope {
    Scope::builder().build_with(|r| {
        r.add_logger_factory(
            |name: &str| TestLogger {
                tag: format!("name:{name}"),
            },
            |type_info: &TypeInfo| TestLogger {
                tag: format!("type:{}", type_info.short_name()),
            },
        );
    })
}

#[test]
fn test_logger_by_name_and_type() {
    init_test_logger();
    let scope = logger_scope();

    let by_name = scope.logger::<TestLogger>(LoggerKey::by_name("network")).unwrap();
    let by_type = scope.logger_for::<TestLogger, Controller>().unwrap();

    assert_eq!(by_name.tag, "name:network");
    assert_eq!(by_type.tag, "type:Controller");
}

#[test]
fn test_logger_from_plain_qualifiers() {
    init_test_logger();
    let scope = logger_scope();

    let by_string = scope.resolve_keyed::<TestLogger>("storage").unwrap();
    let by_type_info = scope
        .resolve_keyed::<TestLogger>(TypeInfo::of::<Activity>())
        .unwrap();
    let by_value_type = scope.resolve_keyed::<TestLogger>(42_u64).unwrap();

    assert_eq!(by_string.tag, "name:storage");
    assert_eq!(by_type_info.tag, "type:Activity");
    assert_eq!(by_value_type.tag, "type:u64");
}

#[test]
fn test_lazy_handle() {
    init_test_logger();
    let scope = ticket_scope();

    let lazy = scope.resolve_lazy::<Ticket>();
    assert!(!lazy.is_resolved());
    assert_eq!(lazy.key(), &TypeKey::of::<Ticket>());

    let first = lazy.get().unwrap();
    let direct = scope.resolve::<Ticket>().unwrap();
    assert!(Arc::ptr_eq(&first, &lazy.get().unwrap()));
    assert_ne!(first.0, direct.0);
}
