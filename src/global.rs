//! Optional process-default reactor.
//!
//! Nothing here is constructed implicitly: a program that wants a global
//! context installs one with [`init`] and tears it down with [`teardown`].
//! Everything else in the crate takes the context by reference and works
//! without this module.

use crate::error::{Error, Result};
use crate::reactor::IoContext;

use std::sync::{Arc, Mutex};

static DEFAULT: Mutex<Option<Arc<IoContext>>> = Mutex::new(None);

/// Installs the process-default context. Fails if one is already installed.
pub fn init(ctx: Arc<IoContext>) -> Result<()> {
    let mut slot = DEFAULT.lock().unwrap();
    if slot.is_some() {
        return Err(Error::InvalidArgument("default context already installed"));
    }
    *slot = Some(ctx);
    Ok(())
}

/// The process-default context, if one was installed.
pub fn context() -> Option<Arc<IoContext>> {
    DEFAULT.lock().unwrap().clone()
}

/// Removes the process-default context. The reactor itself is not stopped;
/// the caller owns its lifecycle.
pub fn teardown() {
    DEFAULT.lock().unwrap().take();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Builder;

    #[test]
    fn install_use_teardown_cycle() {
        assert!(context().is_none());

        let ctx = Arc::new(Builder::new().worker_threads(1).build().expect("build"));
        init(ctx.clone()).expect("first install");

        assert!(context().is_some());
        assert!(matches!(
            init(ctx),
            Err(Error::InvalidArgument("default context already installed"))
        ));

        teardown();
        assert!(context().is_none());
    }
}
