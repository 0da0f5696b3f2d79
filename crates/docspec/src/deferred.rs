//! Queue of registrations made before the extension is attached

use crate::target::Registration;
use std::collections::VecDeque;

/// A captured call replayed on attachment
#[derive(Debug, Clone)]
pub enum DeferredCall {
    Register(Registration),
}

/// FIFO of deferred calls
///
/// Each call is handed out exactly once. [`DeferredQueue::drain`] stops at
/// the first failure; the failing call is consumed and the calls behind it
/// stay queued for the next drain.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    calls: VecDeque<DeferredCall>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, call: DeferredCall) {
        self.calls.push_back(call);
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Run queued calls in insertion order until one fails
    ///
    /// Returns the number of calls that ran successfully.
    pub fn drain<F, E>(&mut self, mut run: F) -> Result<usize, E>
    where
        F: FnMut(DeferredCall) -> Result<(), E>,
    {
        let mut executed = 0;
        while let Some(call) = self.calls.pop_front() {
            run(call)?;
            executed += 1;
        }
        Ok(executed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{RegisterOptions, Target};
    use docspec_core::ViewFunction;

    fn call(endpoint: &str) -> DeferredCall {
        DeferredCall::Register(Registration {
            target: Target::Function(ViewFunction::new(endpoint, || async { "" })),
            options: RegisterOptions::new().endpoint(endpoint),
        })
    }

    fn endpoint(call: &DeferredCall) -> String {
        let DeferredCall::Register(registration) = call;
        registration.options.endpoint.clone().unwrap_or_default()
    }

    #[test]
    fn drains_in_insertion_order() {
        let mut queue = DeferredQueue::new();
        for name in ["a", "b", "c"] {
            queue.push(call(name));
        }

        let mut seen = Vec::new();
        let executed = queue
            .drain(|call| {
                seen.push(endpoint(&call));
                Ok::<_, ()>(())
            })
            .unwrap();

        assert_eq!(executed, 3);
        assert_eq!(seen, vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn failure_consumes_call_and_keeps_the_rest() {
        let mut queue = DeferredQueue::new();
        for name in ["a", "bad", "c", "d"] {
            queue.push(call(name));
        }

        let mut seen = Vec::new();
        let result = queue.drain(|call| {
            let name = endpoint(&call);
            seen.push(name.clone());
            if name == "bad" {
                Err(name)
            } else {
                Ok(())
            }
        });

        assert_eq!(result, Err("bad".to_string()));
        assert_eq!(seen, vec!["a", "bad"]);
        assert_eq!(queue.len(), 2);

        let mut resumed = Vec::new();
        queue
            .drain(|call| {
                resumed.push(endpoint(&call));
                Ok::<_, String>(())
            })
            .unwrap();
        assert_eq!(resumed, vec!["c", "d"]);
    }
}
