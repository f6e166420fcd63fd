//! Audio output via rodio
//!
//! A dedicated thread owns the output stream (cpal streams are !Send) and
//! builds one sink per fragment; a waiter thread reports completion once
//! the sink drains. Fragment bytes stay opaque here - rodio's decoder
//! probes the codec on its own.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;

use anyhow::{Context, Result, anyhow};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};

use crate::traits::{DoneCallback, PlaybackBackend, PlaybackHandle};
use crate::types::PlaybackOutcome;

enum Command {
    Play {
        audio: Vec<u8>,
        on_done: DoneCallback,
        reply: Sender<Result<Arc<Sink>>>,
    },
    Shutdown,
}

/// Playback backend on top of the default output device.
pub struct RodioBackend {
    cmd_tx: Sender<Command>,
}

impl RodioBackend {
    /// Open the default output device once, for the lifetime of the
    /// backend. Spawns the thread that owns the output stream.
    pub fn new() -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel::<std::result::Result<(), String>>();

        thread::spawn(move || {
            let stream = match OutputStreamBuilder::open_default_stream() {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Play {
                        audio,
                        on_done,
                        reply,
                    } => {
                        let _ = reply.send(start_fragment(&stream, audio, on_done));
                    }
                    Command::Shutdown => break,
                }
            }
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { cmd_tx }),
            Ok(Err(e)) => Err(anyhow!("Failed to open audio output: {e}")),
            Err(_) => Err(anyhow!("Audio output thread failed to start")),
        }
    }
}

fn start_fragment(
    stream: &OutputStream,
    audio: Vec<u8>,
    on_done: DoneCallback,
) -> Result<Arc<Sink>> {
    let decoder = Decoder::new(Cursor::new(audio)).context("Undecodable audio fragment")?;

    let sink = Arc::new(Sink::connect_new(stream.mixer()));
    sink.append(decoder);

    // A halted sink drains immediately, so this also fires after `halt`;
    // the player sorts stale completions out by generation.
    let waiter = Arc::clone(&sink);
    thread::spawn(move || {
        waiter.sleep_until_end();
        on_done(PlaybackOutcome::Completed);
    });

    Ok(sink)
}

impl PlaybackBackend for RodioBackend {
    fn play(&self, audio: Vec<u8>, on_done: DoneCallback) -> Result<Box<dyn PlaybackHandle>> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.cmd_tx
            .send(Command::Play {
                audio,
                on_done,
                reply: reply_tx,
            })
            .map_err(|_| anyhow!("Audio output thread is gone"))?;

        let sink = reply_rx
            .recv()
            .map_err(|_| anyhow!("Audio output thread is gone"))??;

        Ok(Box::new(RodioHandle { sink }))
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
    }
}

struct RodioHandle {
    sink: Arc<Sink>,
}

impl PlaybackHandle for RodioHandle {
    fn halt(&mut self) {
        self.sink.stop();
    }
}
