//! Generation barrier between the coordinator and the camera workers.
//!
//! The coordinator `dispatch`es a phase, which bumps the generation and wakes
//! every worker blocked in `next_phase`. Each worker runs the phase and
//! `arrive`s with the generation it ran; the coordinator waits in
//! `wait_for_all` until every worker arrived or the timeout elapsed. Late
//! arrivals of an older generation are ignored.
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Latch the next frame of every source.
    Grab,
    /// 2D stages up to the ray list.
    Process,
    /// Cross-camera intersection and quad emission.
    Intersect,
}

impl Phase {
    pub const ORDER: [Phase; 3] = [Phase::Grab, Phase::Process, Phase::Intersect];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Run {
        generation: u64,
        phase: Phase,
        frame_index: u64,
    },
    Shutdown,
}

/// Workers that did not arrive in time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarrierTimeout {
    pub generation: u64,
    pub stalled: Vec<usize>,
}

#[derive(Debug)]
struct BarrierState {
    generation: u64,
    phase: Phase,
    frame_index: u64,
    arrived: Vec<bool>,
    shutdown: bool,
}

#[derive(Debug)]
pub struct FrameBarrier {
    state: Mutex<BarrierState>,
    dispatched: Condvar,
    arrived: Condvar,
}

impl FrameBarrier {
    pub fn new(workers: usize) -> Self {
        Self {
            state: Mutex::new(BarrierState {
                generation: 0,
                phase: Phase::Grab,
                frame_index: 0,
                arrived: vec![false; workers],
                shutdown: false,
            }),
            dispatched: Condvar::new(),
            arrived: Condvar::new(),
        }
    }

    pub fn workers(&self) -> usize {
        self.state.lock().arrived.len()
    }

    /// Starts `phase` for every worker and returns its generation.
    pub fn dispatch(&self, phase: Phase, frame_index: u64) -> u64 {
        let mut state = self.state.lock();
        state.generation += 1;
        state.phase = phase;
        state.frame_index = frame_index;
        state.arrived.iter_mut().for_each(|a| *a = false);
        let generation = state.generation;
        drop(state);
        self.dispatched.notify_all();
        generation
    }

    /// Blocks until a generation newer than `seen` was dispatched or the
    /// barrier shut down. Returns `None` after `timeout` so the caller can
    /// check its own stop flag.
    pub fn next_phase(&self, seen: u64, timeout: Duration) -> Option<Signal> {
        let mut state = self.state.lock();
        let deadline = Instant::now() + timeout;
        loop {
            if state.shutdown {
                return Some(Signal::Shutdown);
            }
            if state.generation > seen {
                return Some(Signal::Run {
                    generation: state.generation,
                    phase: state.phase,
                    frame_index: state.frame_index,
                });
            }
            if self.dispatched.wait_until(&mut state, deadline).timed_out() {
                return None;
            }
        }
    }

    /// Marks `worker` as done with `generation`.
    pub fn arrive(&self, worker: usize, generation: u64) {
        let mut state = self.state.lock();
        if state.generation != generation {
            return;
        }
        if let Some(slot) = state.arrived.get_mut(worker) {
            *slot = true;
        }
        let all = state.arrived.iter().all(|&a| a);
        drop(state);
        if all {
            self.arrived.notify_all();
        }
    }

    /// Waits until every worker arrived at `generation`.
    pub fn wait_for_all(&self, generation: u64, timeout: Duration) -> Result<(), BarrierTimeout> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if state.generation != generation {
                // superseded; nobody can arrive at it any more
                return Err(BarrierTimeout {
                    generation,
                    stalled: Vec::new(),
                });
            }
            if state.shutdown || state.arrived.iter().all(|&a| a) {
                return Ok(());
            }
            if self.arrived.wait_until(&mut state, deadline).timed_out() {
                let stalled = state
                    .arrived
                    .iter()
                    .enumerate()
                    .filter(|&(_, &a)| !a)
                    .map(|(i, _)| i)
                    .collect::<Vec<_>>();
                if stalled.is_empty() {
                    return Ok(());
                }
                return Err(BarrierTimeout { generation, stalled });
            }
        }
    }

    /// Releases every waiting worker with `Signal::Shutdown`.
    pub fn shutdown(&self) {
        self.state.lock().shutdown = true;
        self.dispatched.notify_all();
        self.arrived.notify_all();
    }

    pub fn is_shut_down(&self) -> bool {
        self.state.lock().shutdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    const LONG: Duration = Duration::from_secs(5);

    #[test]
    fn all_workers_arrive_for_every_phase() {
        let barrier = Arc::new(FrameBarrier::new(3));
        let handles: Vec<_> = (0..3)
            .map(|w| {
                let barrier = barrier.clone();
                thread::spawn(move || {
                    let mut seen = 0;
                    let mut phases = Vec::new();
                    loop {
                        match barrier.next_phase(seen, LONG) {
                            Some(Signal::Run { generation, phase, .. }) => {
                                seen = generation;
                                phases.push(phase);
                                barrier.arrive(w, generation);
                            }
                            Some(Signal::Shutdown) | None => break,
                        }
                    }
                    phases
                })
            })
            .collect();

        for frame in 0..2 {
            for phase in Phase::ORDER {
                let generation = barrier.dispatch(phase, frame);
                barrier.wait_for_all(generation, LONG).expect("all arrive");
            }
        }
        barrier.shutdown();
        for handle in handles {
            let phases = handle.join().expect("join");
            assert_eq!(phases.len(), 6);
            assert_eq!(&phases[..3], &Phase::ORDER);
        }
    }

    #[test]
    fn stalled_workers_are_named_and_late_arrivals_ignored() {
        let barrier = FrameBarrier::new(2);
        let first = barrier.dispatch(Phase::Grab, 0);
        barrier.arrive(0, first);
        let err = barrier
            .wait_for_all(first, Duration::from_millis(20))
            .unwrap_err();
        assert_eq!(err.stalled, vec![1]);

        let second = barrier.dispatch(Phase::Grab, 1);
        barrier.arrive(1, first); // late arrival of the skipped frame
        barrier.arrive(0, second);
        let err = barrier
            .wait_for_all(second, Duration::from_millis(20))
            .unwrap_err();
        assert_eq!(err.stalled, vec![1]);
    }

    #[test]
    fn next_phase_times_out_and_sees_shutdown() {
        let barrier = FrameBarrier::new(1);
        assert_eq!(barrier.next_phase(0, Duration::from_millis(5)), None);
        let generation = barrier.dispatch(Phase::Process, 7);
        assert_eq!(
            barrier.next_phase(0, Duration::from_millis(5)),
            Some(Signal::Run {
                generation,
                phase: Phase::Process,
                frame_index: 7
            })
        );
        barrier.shutdown();
        assert!(barrier.is_shut_down());
        assert_eq!(barrier.next_phase(generation, LONG), Some(Signal::Shutdown));
    }
}
