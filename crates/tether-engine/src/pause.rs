use std::sync::mpsc;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::eval::EvalContext;
use crate::stepping::Action;

/// Signal delivered to a paused thread.
#[derive(Debug)]
pub(crate) enum PauseSignal {
    /// An expression must be evaluated within the paused thread.
    Evaluate(EvalContext),

    /// The paused thread must resume with the given action.
    Resume(Action),
}

struct PausedThread {
    thread_id: u64,
    signals: mpsc::Sender<PauseSignal>,
}

/// Rendezvous between a paused script thread and the IDE commands.
///
/// At most one thread is paused at a time.
#[derive(Default)]
pub(crate) struct PauseController {
    slot: Mutex<Option<PausedThread>>,
}

impl PauseController {
    fn lock(&self) -> MutexGuard<'_, Option<PausedThread>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks a thread as paused.
    ///
    /// The returned [Pause] receives the signals sent to the paused thread.
    pub fn claim(&self, thread_id: u64) -> Result<Pause<'_>> {
        let mut slot = self.lock();

        if let Some(paused) = slot.as_ref() {
            return Err(Error::PauseBusy {
                paused: paused.thread_id,
                requested: thread_id,
            });
        }

        let (tx, rx) = mpsc::channel();

        *slot = Some(PausedThread {
            thread_id,
            signals: tx,
        });

        Ok(Pause {
            controller: self,
            thread_id,
            signals: rx,
        })
    }

    /// Returns the ID of the paused thread.
    pub fn paused_thread(&self) -> Option<u64> {
        self.lock().as_ref().map(|paused| paused.thread_id)
    }

    /// Queues an evaluation for the paused thread.
    pub fn evaluate(&self, ctx: EvalContext) -> Result<()> {
        let slot = self.lock();
        let paused = slot.as_ref().ok_or(Error::NotPaused)?;

        paused
            .signals
            .send(PauseSignal::Evaluate(ctx))
            .map_err(|_| Error::NotPaused)
    }

    /// Releases the paused thread, which resumes with the given action once
    /// every queued evaluation is processed.
    ///
    /// On success, the ID of the resumed thread is returned.
    pub fn resume(&self, action: Action) -> Result<u64> {
        let paused = self.lock().take().ok_or(Error::NotPaused)?;

        paused
            .signals
            .send(PauseSignal::Resume(action))
            .map_err(|_| Error::NotPaused)?;

        Ok(paused.thread_id)
    }
}

/// Pause claimed by a thread.
///
/// Dropping it releases the pause slot if it is still held.
pub(crate) struct Pause<'a> {
    controller: &'a PauseController,
    thread_id: u64,
    signals: mpsc::Receiver<PauseSignal>,
}

impl Pause<'_> {
    /// Blocks until the next signal.
    ///
    /// Signals are received in the order they were sent.
    pub fn wait(&self) -> Option<PauseSignal> {
        self.signals.recv().ok()
    }
}

impl Drop for Pause<'_> {
    fn drop(&mut self) {
        let mut slot = self.controller.lock();

        if slot
            .as_ref()
            .is_some_and(|paused| paused.thread_id == self.thread_id)
        {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_paused_thread() {
        let controller = PauseController::default();

        let pause = controller.claim(1).expect("failed to claim");
        assert_eq!(controller.paused_thread(), Some(1));

        assert!(matches!(
            controller.claim(2),
            Err(Error::PauseBusy {
                paused: 1,
                requested: 2
            })
        ));

        drop(pause);
        assert_eq!(controller.paused_thread(), None);
        assert!(controller.claim(2).is_ok());
    }

    #[test]
    fn evaluations_before_resume() {
        let controller = PauseController::default();

        assert!(matches!(
            controller.evaluate(EvalContext::new(0, "x", 0, 0)),
            Err(Error::NotPaused)
        ));

        let pause = controller.claim(1).expect("failed to claim");

        controller
            .evaluate(EvalContext::new(1, "a", 0, 0))
            .expect("failed to queue");
        controller
            .evaluate(EvalContext::new(2, "b", 0, 0))
            .expect("failed to queue");

        assert_eq!(controller.resume(Action::Continue).ok(), Some(1));
        assert!(controller.evaluate(EvalContext::new(3, "c", 0, 0)).is_err());
        assert!(controller.resume(Action::Continue).is_err());

        assert!(matches!(pause.wait(), Some(PauseSignal::Evaluate(ctx)) if ctx.seq == 1));
        assert!(matches!(pause.wait(), Some(PauseSignal::Evaluate(ctx)) if ctx.seq == 2));
        assert!(matches!(
            pause.wait(),
            Some(PauseSignal::Resume(Action::Continue))
        ));
        assert!(pause.wait().is_none());
    }
}
