use coriolis::io::Buffer;
use coriolis::net::Socket;
use coriolis::{Builder, Interest, IoContext, Task};

use std::io::Write;
use std::os::fd::{AsRawFd, IntoRawFd};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn start_reactor(ctx: &Arc<IoContext>) -> thread::JoinHandle<()> {
    let ctx = Arc::clone(ctx);
    thread::spawn(move || ctx.run())
}

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
fn get_events_reports_the_pending_interest() {
    let ctx = Arc::new(Builder::new().worker_threads(2).build().expect("build"));
    let reactor = start_reactor(&ctx);

    let (ours, theirs) = UnixStream::pair().expect("socketpair");
    ours.set_nonblocking(true).expect("nonblocking");
    let fd = ours.as_raw_fd();
    ctx.add_fd(fd, Interest::NONE).expect("add_fd");

    assert_eq!(ctx.get_events(fd), Interest::NONE);

    let resumed = Arc::new(AtomicUsize::new(0));
    {
        let ctx = ctx.clone();
        let resumed = resumed.clone();
        ctx.clone().spawn(Task::new(async move {
            ctx.await_fd(fd, Interest::READ).await;
            resumed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
    }

    assert!(wait_until(Duration::from_secs(5), || ctx.get_events(fd)
        == Interest::READ));

    (&theirs).write_all(b"x").expect("write");

    assert!(wait_until(Duration::from_secs(5), || resumed
        .load(Ordering::SeqCst)
        == 1));
    // Dispatch consumed the waiter.
    assert_eq!(ctx.get_events(fd), Interest::NONE);

    ctx.remove_fd(fd).expect("remove_fd");
    ctx.stop();
    reactor.join().expect("reactor thread");
    drop(ours);
    drop(theirs);
}

#[test]
fn second_await_on_the_same_fd_overwrites_the_first() {
    let ctx = Arc::new(Builder::new().worker_threads(2).build().expect("build"));
    let reactor = start_reactor(&ctx);

    let (ours, theirs) = UnixStream::pair().expect("socketpair");
    ours.set_nonblocking(true).expect("nonblocking");
    let fd = ours.as_raw_fd();
    ctx.add_fd(fd, Interest::NONE).expect("add_fd");

    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    {
        let ctx = ctx.clone();
        let first = first.clone();
        ctx.clone().spawn(Task::new(async move {
            // No data ever arrives, so READ readiness alone cannot wake us.
            ctx.await_fd(fd, Interest::READ).await;
            first.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
    }
    assert!(wait_until(Duration::from_secs(5), || ctx.get_events(fd)
        == Interest::READ));

    {
        let ctx = ctx.clone();
        let second = second.clone();
        ctx.clone().spawn(Task::new(async move {
            // A socket with an empty send buffer is immediately writable,
            // so this waiter is resumed as soon as it is registered.
            ctx.await_fd(fd, Interest::WRITE).await;
            second.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
    }

    assert!(wait_until(Duration::from_secs(5), || second
        .load(Ordering::SeqCst)
        == 1));

    // The overwritten waiter stays parked forever.
    thread::sleep(Duration::from_millis(100));
    assert_eq!(first.load(Ordering::SeqCst), 0);

    ctx.remove_fd(fd).expect("remove_fd");
    ctx.stop();
    reactor.join().expect("reactor thread");
    drop(ours);
    drop(theirs);
}

#[test]
fn remove_fd_discards_the_pending_waiter() {
    let ctx = Arc::new(Builder::new().worker_threads(2).build().expect("build"));
    let reactor = start_reactor(&ctx);

    let (ours, theirs) = UnixStream::pair().expect("socketpair");
    ours.set_nonblocking(true).expect("nonblocking");
    let fd = ours.as_raw_fd();
    ctx.add_fd(fd, Interest::NONE).expect("add_fd");

    let resumed = Arc::new(AtomicUsize::new(0));
    {
        let ctx = ctx.clone();
        let resumed = resumed.clone();
        ctx.clone().spawn(Task::new(async move {
            ctx.await_fd(fd, Interest::READ).await;
            resumed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
    }
    assert!(wait_until(Duration::from_secs(5), || ctx.get_events(fd)
        == Interest::READ));

    ctx.remove_fd(fd).expect("remove_fd");
    assert_eq!(ctx.get_events(fd), Interest::NONE);

    // Data on a deregistered fd wakes nobody.
    (&theirs).write_all(b"x").expect("write");
    thread::sleep(Duration::from_millis(100));
    assert_eq!(resumed.load(Ordering::SeqCst), 0);

    ctx.stop();
    reactor.join().expect("reactor thread");
    drop(ours);
    drop(theirs);
}

#[test]
fn read_suspends_and_resumes_per_eagain() {
    let ctx = Arc::new(Builder::new().worker_threads(2).build().expect("build"));
    let reactor = start_reactor(&ctx);

    let (ours, mut theirs) = UnixStream::pair().expect("socketpair");
    ours.set_nonblocking(true).expect("nonblocking");
    let fd = ours.into_raw_fd();

    let reads_done = Arc::new(AtomicUsize::new(0));
    let total = Arc::new(AtomicUsize::new(0));

    {
        let ctx = ctx.clone();
        let reads_done = reads_done.clone();
        let total = total.clone();
        ctx.clone().spawn(Task::new(async move {
            // The socket owns the fd; dropping it deregisters and closes.
            let socket = Socket::new(fd, ctx)?;
            let mut buffer = Buffer::new();

            let first = socket.read(&mut buffer).await?;
            total.fetch_add(first, Ordering::SeqCst);
            reads_done.fetch_add(1, Ordering::SeqCst);

            let second = socket.read(&mut buffer).await?;
            total.fetch_add(second, Ordering::SeqCst);
            reads_done.fetch_add(1, Ordering::SeqCst);

            Ok(())
        }));
    }

    // First read has to hit EAGAIN and suspend before any data exists.
    thread::sleep(Duration::from_millis(100));
    theirs.write_all(b"one").expect("first write");

    assert!(wait_until(Duration::from_secs(5), || reads_done
        .load(Ordering::SeqCst)
        == 1));

    theirs.write_all(b"two").expect("second write");
    assert!(wait_until(Duration::from_secs(5), || reads_done
        .load(Ordering::SeqCst)
        == 2));

    // Two suspend/resume rounds, same bytes as an immediate success.
    assert_eq!(total.load(Ordering::SeqCst), 6);

    ctx.stop();
    reactor.join().expect("reactor thread");
}
