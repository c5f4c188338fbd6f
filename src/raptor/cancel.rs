use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use crate::raptor;

/// A shared flag that stops a running search at the next round boundary.
///
/// Clones share the flag, so one clone can be handed to the search and
/// another kept by whoever decides to abort it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Interrupt {
    pub token: Option<CancelToken>,
    pub deadline: Option<Instant>,
}

impl Interrupt {
    pub fn check(&self) -> Result<(), raptor::Error> {
        if self.token.as_ref().is_some_and(|token| token.is_cancelled()) {
            return Err(raptor::Error::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(raptor::Error::DeadlineExceeded);
        }
        Ok(())
    }
}

#[test]
fn cancel_is_shared_between_clones() {
    let token = CancelToken::new();
    let interrupt = Interrupt {
        token: Some(token.clone()),
        deadline: None,
    };
    assert!(interrupt.check().is_ok());
    token.cancel();
    assert!(matches!(interrupt.check(), Err(raptor::Error::Cancelled)));
}

#[test]
fn deadline_in_the_past_interrupts() {
    let interrupt = Interrupt {
        token: None,
        deadline: Some(Instant::now()),
    };
    assert!(matches!(
        interrupt.check(),
        Err(raptor::Error::DeadlineExceeded)
    ));
}
