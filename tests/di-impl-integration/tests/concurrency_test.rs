//! 并发解析与进程级默认作用域的集成测试

use di_impl::{global, reset_default_scope, DependencyError, Registrar, Resolver, Scope};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::Duration;

/// 构建较慢的组件
#[derive(Debug)]
struct SlowService {
    id: usize,
}

fn slow_scope(builds: Arc<AtomicUsize>) -> Scope {
    Scope::builder().name("slow").build_with(move |r| {
        r.add_singleton_factory(move || {
            std::thread::sleep(Duration::from_millis(50));
            SlowService {
                id: builds.fetch_add(1, Ordering::SeqCst),
            }
        });
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_singleton_first_access() {
    let builds = Arc::new(AtomicUsize::new(0));
    let scope = slow_scope(Arc::clone(&builds));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let scope = scope.clone();
            tokio::task::spawn_blocking(move || scope.resolve::<SlowService>().unwrap())
        })
        .collect();

    let mut instances = Vec::with_capacity(handles.len());
    for handle in handles {
        instances.push(handle.await.unwrap());
    }

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(instances.iter().all(|s| Arc::ptr_eq(s, &instances[0])));
    assert_eq!(instances[0].id, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_per_key_access() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    let scope = Scope::builder().build_with(move |r| {
        r.add_per_key_factory(move |key: &u64| {
            std::thread::sleep(Duration::from_millis(10));
            counter.fetch_add(1, Ordering::SeqCst);
            SlowService { id: *key as usize }
        });
    });

    let handles: Vec<_> = (0..12_u64)
        .map(|i| {
            let scope = scope.clone();
            tokio::task::spawn_blocking(move || {
                scope.resolve_keyed::<SlowService>(i % 3).unwrap()
            })
        })
        .collect();

    for handle in handles {
        let service = handle.await.unwrap();
        assert!(service.id < 3);
    }
    assert_eq!(builds.load(Ordering::SeqCst), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scoped_singleton_first_access() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    let scope = Scope::builder().name("scoped").build_with(move |r| {
        r.add_scoped_singleton_factory(move |_: &Scope| {
            std::thread::sleep(Duration::from_millis(50));
            Ok(SlowService {
                id: counter.fetch_add(1, Ordering::SeqCst),
            })
        });
    });

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let scope = scope.clone();
            tokio::task::spawn_blocking(move || scope.resolve::<SlowService>().unwrap())
        })
        .collect();

    let mut instances = Vec::with_capacity(handles.len());
    for handle in handles {
        instances.push(handle.await.unwrap());
    }

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(instances.iter().all(|s| Arc::ptr_eq(s, &instances[0])));
}

struct Ping;
struct Pong;

/// 两个作用域单例互相依赖，首次构建时在屏障处会合
fn crossing_scope() -> Scope {
    let barrier = Arc::new(Barrier::new(2));
    let arrivals = Arc::new(AtomicUsize::new(0));
    let (ping_barrier, ping_arrivals) = (Arc::clone(&barrier), Arc::clone(&arrivals));
    Scope::builder().name("crossing").build_with(move |r| {
        r.add_scoped_singleton_factory(move |scope: &Scope| {
            if ping_arrivals.fetch_add(1, Ordering::SeqCst) < 2 {
                ping_barrier.wait();
            }
            scope.resolve::<Pong>()?;
            Ok(Ping)
        });
        r.add_scoped_singleton_factory(move |scope: &Scope| {
            if arrivals.fetch_add(1, Ordering::SeqCst) < 2 {
                barrier.wait();
            }
            scope.resolve::<Ping>()?;
            Ok(Pong)
        });
    })
}

#[test]
fn test_cross_thread_cycle_fails_instead_of_blocking() {
    let scope = crossing_scope();
    let (sender, receiver) = mpsc::channel();

    let ping = {
        let (scope, sender) = (scope.clone(), sender.clone());
        thread::spawn(move || sender.send(scope.resolve::<Ping>().map(|_| ())).ok())
    };
    let pong = thread::spawn(move || sender.send(scope.resolve::<Pong>().map(|_| ())).ok());

    for _ in 0..2 {
        let outcome = receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("跨线程循环依赖未被检测，解析线程被阻塞");
        assert!(matches!(
            outcome,
            Err(DependencyError::CircularDependency { .. })
        ));
    }
    ping.join().unwrap();
    pong.join().unwrap();
}

#[tokio::test]
#[serial]
async fn test_default_scope_replacement() {
    let replacement = Scope::named("integration");
    replacement.registrar().add_singleton(SlowService { id: 7 });
    global::replace_default_scope(replacement);

    let resolved = tokio::task::spawn_blocking(global::resolve::<SlowService>)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.id, 7);

    reset_default_scope();
    assert!(global::resolve::<SlowService>()
        .unwrap_err()
        .is_unregistered());
}

#[test]
#[serial]
fn test_default_scope_starts_empty_after_reset() {
    reset_default_scope();
    let scope = global::default_scope();

    assert_eq!(scope.name(), "global");
    assert!(scope.registry().is_empty());
}
