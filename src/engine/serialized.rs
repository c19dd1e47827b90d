//! One-at-a-time access to an engine binding that is not reentrant.
//!
//! Only the engine call itself holds the lock; trimming and reconstruction
//! in the surrounding unit keep running in parallel.

use std::sync::{Mutex, PoisonError};

use crate::engine::{EngineCall, ModelEngine, RawEngineReply};
use crate::error::Result;

pub struct Serialized<E> {
    inner: E,
    lock: Mutex<()>,
}

impl<E> Serialized<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: ModelEngine> ModelEngine for Serialized<E> {
    fn fit_and_forecast(&self, call: &EngineCall) -> Result<RawEngineReply> {
        // A panic inside a previous call leaves no state behind the lock.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner.fit_and_forecast(call)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use rayon::prelude::*;

    use super::*;
    use crate::domain::{ForecastRequest, TimeSeries};

    #[derive(Default)]
    struct Counting {
        in_flight: AtomicUsize,
        max_seen: AtomicUsize,
    }

    impl ModelEngine for Counting {
        fn fit_and_forecast(&self, _call: &EngineCall) -> Result<RawEngineReply> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(RawEngineReply::default())
        }
    }

    #[test]
    fn calls_never_overlap() {
        let engine = Serialized::new(Counting::default());
        let req = ForecastRequest::new("naive", 1, 12).unwrap();
        let call = EngineCall::new(&req, &TimeSeries::default());

        (0..16).into_par_iter().for_each(|_| {
            engine.fit_and_forecast(&call).unwrap();
        });

        let inner = engine.into_inner();
        assert_eq!(inner.max_seen.load(Ordering::SeqCst), 1);
    }
}
