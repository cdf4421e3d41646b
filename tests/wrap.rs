use std::{
    convert::Infallible,
    rc::Rc,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::Result;
use wrap_exception::{settle, wrap, CallableKind, Caught, Completion, Deferred, WrappedResult};

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{0}")]
struct RangeError(String);

fn raised<T, E>(res: &WrappedResult<T, E>) -> Option<&E> {
    res.error().and_then(Caught::raised)
}

#[test]
fn sync_success_is_ready() -> Result<()> {
    let wrapped = wrap(|| Ok::<_, Infallible>(42));

    let res = wrapped
        .call(())
        .into_ready()
        .map_err(|_| anyhow::anyhow!("sync call should not be pending"))?;

    assert!(!res.is_error());
    assert_eq!(res.into_data(), Some(42));

    Ok(())
}

#[test]
fn sync_error_is_ready() -> Result<()> {
    let wrapped = wrap(|| Err::<(), _>(RangeError("x".into())));

    let res = wrapped
        .call(())
        .into_ready()
        .map_err(|_| anyhow::anyhow!("sync call should not be pending"))?;

    assert!(res.is_error());
    assert!(res.data().is_none());
    assert_eq!(raised(&res), Some(&RangeError("x".into())));

    Ok(())
}

#[test]
fn sync_conditional_throw() {
    let wrapped = wrap(|num: i32| {
        if num == 0 {
            return Err("test error");
        }
        Ok(num)
    });

    let res = wrapped.call((0,)).into_ready().unwrap();
    assert_eq!(raised(&res), Some(&"test error"));

    let res = wrapped.call((3,)).into_ready().unwrap();
    assert_eq!(res.into_data(), Some(3));
}

#[tokio::test]
async fn async_success() {
    let wrapped = wrap(|| async { Ok::<_, Infallible>("ok") });

    let res = wrapped.call(()).await;

    assert_eq!(res.into_data(), Some("ok"));
}

#[tokio::test]
async fn async_rejection() {
    let wrapped = wrap(|| async { Err::<(), _>(anyhow::anyhow!("bad")) });

    let res = wrapped.call(()).await;

    assert_eq!(raised(&res).map(|e| e.to_string()), Some("bad".to_string()));
}

#[tokio::test]
async fn async_resolution_after_suspension() {
    let wrapped = wrap(|arg: bool| async move {
        if !arg {
            return Ok(None);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok::<_, Infallible>(Some(vec!["test"]))
    });

    assert_eq!(wrapped.call((false,)).await.into_data(), Some(None));
    assert_eq!(
        wrapped.call((true,)).await.into_data(),
        Some(Some(vec!["test"]))
    );
}

#[tokio::test]
async fn sync_returning_rejected_awaitable() {
    let wrapped = wrap(|| Deferred::<(), _>::rejected(anyhow::anyhow!("rej")));

    let invocation = wrapped.call(());
    assert_eq!(invocation.kind(), CallableKind::ReturnsAwaitable);
    assert!(invocation.is_pending());

    let res = invocation.await;
    assert_eq!(raised(&res).map(|e| e.to_string()), Some("rej".to_string()));
}

#[tokio::test]
async fn sync_returning_resolved_awaitable() {
    let wrapped = wrap(|| Deferred::<_, Infallible>::resolved("test"));

    assert_eq!(wrapped.call(()).await.into_data(), Some("test"));
}

#[tokio::test]
async fn shape_can_differ_between_calls() {
    let wrapped = wrap(|arg: bool| -> Completion<'static, &'static str, &'static str> {
        if arg {
            Completion::pending(async { Ok::<_, &str>("later") })
        } else {
            Completion::err("test error")
        }
    });

    let now = wrapped.call((false,));
    assert_eq!(now.kind(), CallableKind::Plain);
    let res = now.into_ready().unwrap();
    assert_eq!(raised(&res), Some(&"test error"));

    let later = wrapped.call((true,));
    assert_eq!(later.kind(), CallableKind::ReturnsAwaitable);
    assert_eq!(later.await.into_data(), Some("later"));
}

#[tokio::test]
async fn sync_failure_before_awaitable_is_constructed() {
    let wrapped = wrap(|arg: bool| {
        let pending = Deferred::<_, &str>::resolved("test");
        if !arg {
            return Completion::err("test error");
        }
        Completion::Pending(pending)
    });

    let res = wrapped.call((false,)).await;
    assert_eq!(raised(&res), Some(&"test error"));

    let res = wrapped.call((true,)).await;
    assert_eq!(res.into_data(), Some("test"));
}

#[tokio::test]
async fn panic_inside_future_resolves_to_failure() {
    let wrapped = wrap(|| async {
        if true {
            panic!("test error from throw");
        }
        Ok::<(), Infallible>(())
    });

    let res = wrapped.call(()).await;
    let panic = res.error().and_then(Caught::panic);

    assert_eq!(panic.and_then(|p| p.message()), Some("test error from throw"));
}

#[tokio::test]
async fn results_are_independent_between_calls() {
    let wrapped = wrap(|fail: bool| async move {
        if fail {
            Err("failed")
        } else {
            Ok(1)
        }
    });

    let ok = wrapped.call((false,)).await;
    let failed = wrapped.call((true,)).await;
    let ok_again = wrapped.call((false,)).await;

    assert!(ok.is_success());
    assert!(failed.is_error());
    assert!(ok_again.is_success());
}

#[tokio::test]
async fn arguments_are_forwarded_verbatim_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(vec![]));

    let wrapped = {
        let calls = calls.clone();
        let seen = seen.clone();
        wrap(move |a: u8, b: &'static str, c: char| {
            calls.fetch_add(1, Ordering::SeqCst);
            seen.lock().unwrap().push((a, b, c));
            async move { Ok::<_, Infallible>(format!("{}{}{}", a, b, c)) }
        })
    };

    let res = wrapped.call((1, "2", '3')).await;

    assert_eq!(res.into_data().as_deref(), Some("123"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*seen.lock().unwrap(), vec![(1, "2", '3')]);
}

#[tokio::test]
async fn wrapped_callable_is_shareable_across_tasks() -> Result<()> {
    let wrapped = Arc::new(wrap(|n: u64| async move {
        tokio::task::yield_now().await;
        if n % 2 == 0 {
            Ok(n)
        } else {
            Err(n)
        }
    }));

    let handles = (0..8u64)
        .map(|n| {
            let wrapped = wrapped.clone();
            tokio::spawn(async move { (n, wrapped.call((n,)).await.into_result()) })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        let (n, res) = handle.await?;
        match res {
            Ok(v) => assert_eq!(v, n),
            Err(err) => assert_eq!(err.into_raised(), Some(n)),
        }
    }

    Ok(())
}

#[tokio::test]
async fn settle_wraps_awaitable_values() {
    let res = settle(async { Err::<u8, _>("rejected") }).await;
    assert_eq!(raised(&res), Some(&"rejected"));

    let res = settle(Deferred::<_, Infallible>::resolved(1u8)).await;
    assert_eq!(res.into_data(), Some(1));
}

async fn count_chars(s: &str) -> Result<usize, ()> {
    tokio::task::yield_now().await;
    Ok(s.chars().count())
}

#[tokio::test]
async fn async_fn_borrowing_its_argument() {
    let owned = String::from("borrowed");

    let res = wrap(count_chars).call((owned.as_str(),)).await;

    assert_eq!(res.into_data(), Some(8));
}

#[tokio::test(flavor = "current_thread")]
async fn non_send_futures_are_accepted() {
    let shared = Rc::new(5);

    let wrapped = wrap(|| {
        let shared = shared.clone();
        async move {
            tokio::task::yield_now().await;
            Ok::<_, ()>(*shared * 2)
        }
    });

    assert_eq!(wrapped.call(()).await.into_data(), Some(10));
}
