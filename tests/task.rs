use coriolis::{Builder, Error, Task};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    cond()
}

#[test]
fn block_on_returns_the_task_value() {
    let ctx = Builder::new().worker_threads(2).build().expect("build");

    let value = ctx.block_on(Task::new(async { Ok(41 + 1) })).expect("task");
    assert_eq!(value, 42);

    ctx.stop();
}

#[test]
fn awaited_tasks_chain_results() {
    let ctx = Builder::new().worker_threads(2).build().expect("build");

    let value = ctx
        .block_on(Task::new(async {
            let first = Task::new(async { Ok(10) });
            let base = first.await?;

            let second = Task::new(async move { Ok(base + 20) });
            Ok(second.await? + 30)
        }))
        .expect("task");
    assert_eq!(value, 60);

    ctx.stop();
}

#[test]
fn spawning_inside_a_task_deadlocks_neither_side() {
    let ctx = Arc::new(Builder::new().worker_threads(2).build().expect("build"));
    let child_ran = Arc::new(AtomicBool::new(false));

    let parent_result = {
        let ctx = ctx.clone();
        let child_ran = child_ran.clone();
        ctx.clone().block_on(Task::new(async move {
            ctx.spawn(Task::new(async move {
                child_ran.store(true, Ordering::SeqCst);
                Ok(())
            }));
            Ok("parent finished")
        }))
    };

    assert_eq!(parent_result.expect("parent"), "parent finished");
    assert!(wait_until(Duration::from_secs(5), || child_ran
        .load(Ordering::SeqCst)));

    ctx.stop();
}

#[test]
fn failure_propagates_through_await() {
    let ctx = Builder::new().worker_threads(2).build().expect("build");

    let result = ctx.block_on(Task::new(async {
        let child: Task<()> = Task::new(async { Err(Error::Task("boom".into())) });
        child.await
    }));

    match result {
        Err(Error::Task(message)) => assert_eq!(message, "boom"),
        other => panic!("expected a task failure, got {other:?}"),
    }

    ctx.stop();
}

#[test]
fn panic_in_a_task_body_surfaces_as_a_failure() {
    let ctx = Builder::new().worker_threads(2).build().expect("build");

    let result = ctx.block_on(Task::new(async {
        let child: Task<()> = Task::new(async { panic!("kaput") });
        child.await
    }));

    match result {
        Err(Error::Task(message)) => assert!(message.contains("kaput")),
        other => panic!("expected a task failure, got {other:?}"),
    }

    ctx.stop();
}

#[test]
fn detached_failure_does_not_poison_the_pool() {
    let ctx = Arc::new(Builder::new().worker_threads(2).build().expect("build"));

    // A failing detached task is logged and swallowed by the worker side.
    ctx.spawn(Task::<()>::new(async {
        Err(Error::Task("ignored".into()))
    }));

    // The pool keeps serving.
    let value = ctx.block_on(Task::new(async { Ok(7) })).expect("task");
    assert_eq!(value, 7);

    ctx.stop();
}
