//! Sequential playback of streamed audio fragments
//!
//! `StreamPlayer` owns a FIFO of encoded fragments and at most one live
//! decoder/sink at a time. Fragments appended while one is playing wait in
//! the queue; when the backend reports completion the next fragment starts
//! immediately, which is what stitches a chunked TTS response into
//! continuous speech.
//!
//! `append`, backend completions, and `stop` may arrive from different
//! threads (network reader, audio waiter, UI); every state transition goes
//! through one mutex.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::traits::{PlaybackBackend, PlaybackHandle};
use crate::types::PlaybackOutcome;

struct PlayerState {
    queue: VecDeque<Vec<u8>>,
    active: Option<Box<dyn PlaybackHandle>>,
    /// Bumped by `stop`; completions carrying an older value are stale.
    generation: u64,
}

struct PlayerInner {
    backend: Arc<dyn PlaybackBackend>,
    state: Mutex<PlayerState>,
    playing_tx: watch::Sender<bool>,
}

/// Queued, gapless playback of a stream of encoded audio fragments.
///
/// Cloning is cheap and clones share the same queue and playback state.
#[derive(Clone)]
pub struct StreamPlayer {
    inner: Arc<PlayerInner>,
}

impl StreamPlayer {
    pub fn new(backend: Arc<dyn PlaybackBackend>) -> Self {
        let (playing_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(PlayerInner {
                backend,
                state: Mutex::new(PlayerState {
                    queue: VecDeque::new(),
                    active: None,
                    generation: 0,
                }),
                playing_tx,
            }),
        }
    }

    /// Enqueue one encoded audio fragment.
    ///
    /// Empty fragments are dropped. If nothing is currently playing, the
    /// oldest queued fragment starts right away; otherwise the new fragment
    /// waits its turn. Decode and playback failures are handled internally -
    /// this never blocks on audio and never reports an error to the caller.
    pub fn append(&self, audio: Vec<u8>) {
        if audio.is_empty() {
            debug!("Received empty audio fragment, skipping");
            return;
        }

        debug!(bytes = audio.len(), "Queueing audio fragment");
        let mut state = self.inner.state.lock().unwrap();
        state.queue.push_back(audio);
        if state.active.is_none() {
            self.inner.play_next(&mut state);
        }
    }

    /// Halt the current fragment, discard everything queued, and go idle.
    ///
    /// Safe to call from any thread in any state, repeatedly. A completion
    /// from the halted fragment may still arrive afterwards; it is ignored.
    pub fn stop(&self) {
        let mut state = self.inner.state.lock().unwrap();
        state.generation += 1;
        state.queue.clear();
        if let Some(mut handle) = state.active.take() {
            handle.halt();
        }
        self.inner.set_playing(false);
    }

    /// Whether a fragment is currently producing sound.
    pub fn is_playing(&self) -> bool {
        *self.inner.playing_tx.borrow()
    }

    /// Subscribe to `is_playing` transitions (e.g. for a play/pause icon).
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.inner.playing_tx.subscribe()
    }

    /// Number of fragments waiting behind the one currently playing.
    pub fn queued(&self) -> usize {
        self.inner.state.lock().unwrap().queue.len()
    }
}

impl PlayerInner {
    /// Publish the observable without waking watchers on non-transitions.
    fn set_playing(&self, playing: bool) {
        self.playing_tx.send_if_modified(|current| {
            if *current == playing {
                false
            } else {
                *current = playing;
                true
            }
        });
    }

    /// Pop the oldest fragment and hand it to the backend.
    ///
    /// On decoder-construction failure the fragment is dropped and the
    /// player goes idle without touching the rest of the queue; the next
    /// `append` or completion picks playback back up.
    fn play_next(self: &Arc<Self>, state: &mut PlayerState) {
        let Some(audio) = state.queue.pop_front() else {
            return;
        };

        let generation = state.generation;
        let inner = Arc::clone(self);
        let on_done = Box::new(move |outcome| inner.fragment_done(generation, outcome));

        match self.backend.play(audio, on_done) {
            Ok(handle) => {
                state.active = Some(handle);
                self.set_playing(true);
            }
            Err(e) => {
                warn!("Failed to start audio fragment: {e:#}");
                state.active = None;
                self.set_playing(false);
            }
        }
    }

    fn fragment_done(self: Arc<Self>, generation: u64, outcome: PlaybackOutcome) {
        let mut state = self.state.lock().unwrap();
        if generation != state.generation {
            debug!("Ignoring completion from a stopped playback session");
            return;
        }

        state.active = None;
        match outcome {
            PlaybackOutcome::Completed => {
                if state.queue.is_empty() {
                    self.set_playing(false);
                } else {
                    self.play_next(&mut state);
                }
            }
            PlaybackOutcome::Failed(err) => {
                warn!("Audio fragment failed during playback: {err}");
                self.set_playing(false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::DoneCallback;
    use anyhow::bail;

    /// Backend that records started fragments and lets tests drive
    /// completions by hand. Fragments equal to b"bad" refuse to decode.
    #[derive(Default)]
    struct MockBackend {
        started: Mutex<Vec<Vec<u8>>>,
        pending: Mutex<VecDeque<DoneCallback>>,
        halts: Arc<Mutex<usize>>,
    }

    impl MockBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn started(&self) -> Vec<Vec<u8>> {
            self.started.lock().unwrap().clone()
        }

        fn halts(&self) -> usize {
            *self.halts.lock().unwrap()
        }

        fn take_next(&self) -> DoneCallback {
            self.pending
                .lock()
                .unwrap()
                .pop_front()
                .expect("no playback in flight")
        }

        fn finish_next(&self) {
            // Invoke outside the pending lock: the callback re-enters the
            // player and may start the next fragment synchronously.
            (self.take_next())(PlaybackOutcome::Completed);
        }

        fn fail_next(&self, msg: &str) {
            (self.take_next())(PlaybackOutcome::Failed(msg.to_string()));
        }
    }

    impl PlaybackBackend for MockBackend {
        fn play(
            &self,
            audio: Vec<u8>,
            on_done: DoneCallback,
        ) -> anyhow::Result<Box<dyn PlaybackHandle>> {
            if audio == b"bad" {
                bail!("undecodable fragment");
            }
            self.started.lock().unwrap().push(audio);
            self.pending.lock().unwrap().push_back(on_done);
            Ok(Box::new(MockHandle {
                halts: Arc::clone(&self.halts),
            }))
        }
    }

    struct MockHandle {
        halts: Arc<Mutex<usize>>,
    }

    impl PlaybackHandle for MockHandle {
        fn halt(&mut self) {
            *self.halts.lock().unwrap() += 1;
        }
    }

    fn player_with_mock() -> (StreamPlayer, Arc<MockBackend>) {
        let backend = MockBackend::new();
        let player = StreamPlayer::new(backend.clone() as Arc<dyn PlaybackBackend>);
        (player, backend)
    }

    #[test]
    fn plays_fragments_in_arrival_order() {
        let (player, backend) = player_with_mock();

        player.append(b"f1".to_vec());
        assert!(player.is_playing());

        player.append(b"f2".to_vec());
        player.append(b"f3".to_vec());
        assert_eq!(player.queued(), 2);
        assert_eq!(backend.started(), vec![b"f1".to_vec()]);

        backend.finish_next();
        // The handoff to f2 happens inside the completion; playback never
        // reads as stopped in between.
        assert!(player.is_playing());
        backend.finish_next();
        assert!(player.is_playing());
        backend.finish_next();

        assert!(!player.is_playing());
        assert_eq!(player.queued(), 0);
        assert_eq!(
            backend.started(),
            vec![b"f1".to_vec(), b"f2".to_vec(), b"f3".to_vec()]
        );
    }

    #[test]
    fn empty_fragment_is_a_no_op() {
        let (player, backend) = player_with_mock();

        player.append(Vec::new());

        assert!(!player.is_playing());
        assert_eq!(player.queued(), 0);
        assert!(backend.started().is_empty());
    }

    #[test]
    fn undecodable_fragment_is_dropped_while_idle() {
        let (player, backend) = player_with_mock();

        player.append(b"bad".to_vec());

        assert!(!player.is_playing());
        assert_eq!(player.queued(), 0);
        assert!(backend.started().is_empty());
    }

    #[test]
    fn undecodable_fragment_stalls_until_next_trigger() {
        let (player, backend) = player_with_mock();

        player.append(b"f1".to_vec());
        player.append(b"bad".to_vec());
        player.append(b"f2".to_vec());

        backend.finish_next();
        // "bad" was dequeued and refused; f2 stays queued until something
        // pokes the player again.
        assert!(!player.is_playing());
        assert_eq!(player.queued(), 1);

        player.append(b"f3".to_vec());
        // The fresh append restarts from the head of the queue, not the
        // newest fragment.
        assert!(player.is_playing());
        assert_eq!(backend.started(), vec![b"f1".to_vec(), b"f2".to_vec()]);
        assert_eq!(player.queued(), 1);

        backend.finish_next();
        backend.finish_next();
        assert!(!player.is_playing());
        assert_eq!(
            backend.started(),
            vec![b"f1".to_vec(), b"f2".to_vec(), b"f3".to_vec()]
        );
    }

    #[test]
    fn mid_playback_failure_preserves_queue() {
        let (player, backend) = player_with_mock();

        player.append(b"f1".to_vec());
        player.append(b"f2".to_vec());

        backend.fail_next("codec error");

        assert!(!player.is_playing());
        assert_eq!(player.queued(), 1);

        player.append(b"f3".to_vec());
        assert!(player.is_playing());
        assert_eq!(backend.started(), vec![b"f1".to_vec(), b"f2".to_vec()]);
    }

    #[test]
    fn stop_discards_queue_and_ignores_stale_completion() {
        let (player, backend) = player_with_mock();

        player.append(b"f1".to_vec());
        player.append(b"f2".to_vec());
        assert!(player.is_playing());

        player.stop();
        assert!(!player.is_playing());
        assert_eq!(player.queued(), 0);
        assert_eq!(backend.halts(), 1);

        // The halted fragment's completion still arrives; it must not
        // restart anything.
        backend.finish_next();
        assert!(!player.is_playing());
        assert_eq!(backend.started(), vec![b"f1".to_vec()]);

        // A fresh sequence starts with exactly the fragments appended
        // after the stop.
        player.append(b"f3".to_vec());
        assert!(player.is_playing());
        assert_eq!(backend.started(), vec![b"f1".to_vec(), b"f3".to_vec()]);
    }

    #[test]
    fn stop_is_idempotent() {
        let (player, backend) = player_with_mock();

        player.stop();
        player.stop();
        assert!(!player.is_playing());
        assert_eq!(backend.halts(), 0);

        player.append(b"f1".to_vec());
        player.stop();
        player.stop();
        assert!(!player.is_playing());
        assert_eq!(backend.halts(), 1);
    }

    #[test]
    fn watch_reports_transitions() {
        let (player, backend) = player_with_mock();
        let rx = player.watch();
        assert!(!*rx.borrow());

        player.append(b"f1".to_vec());
        assert!(*rx.borrow());

        backend.finish_next();
        assert!(!*rx.borrow());
    }
}
