//! Background loading of image pairs (native only)
//!
//! A `PairLoader` owns a background thread that reads image headers to
//! obtain their native dimensions. Both images of a sequence are queued
//! together and joined into one [`PairLoadResult`]: success once both
//! finish, failure as soon as either fails.
//!
//! Every request is tagged with a [`LoadTicket`]. Callers must compare
//! the ticket of a result with the one they are waiting for and discard
//! results issued for a sequence that is no longer active.

use std::collections::HashMap;
use std::fmt::Display;
use std::io::Cursor;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use web_time::Instant;

use super::ImageSource;
use crate::coords::Size;
use crate::model::ImageSlot;

/// Errors that can occur while loading images.
#[derive(Error, Debug)]
pub enum LoadError {
    /// I/O error while reading a file or folder
    #[error("IO error on '{name}': {source}")]
    Io {
        /// Image or folder that failed
        name: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The image could not be decoded
    #[error("Failed to load image '{name}': {source}")]
    Decode {
        /// Image identifier
        name: String,
        /// Underlying decoder error
        #[source]
        source: image::ImageError,
    },

    /// The image decoded to zero width or height
    #[error("Image '{name}' has no pixels")]
    Empty {
        /// Image identifier
        name: String,
    },

    /// The image identifier is not in the catalog
    #[error("Image '{name}' was not imported")]
    Missing {
        /// Image identifier
        name: String,
    },

    /// No supported image files were found
    #[error("No image files found")]
    NoImages,

    /// The background thread is gone
    #[error("Image loader stopped")]
    Disconnected,
}

impl LoadError {
    pub(crate) fn io(name: impl Display, source: std::io::Error) -> Self {
        Self::Io {
            name: name.to_string(),
            source,
        }
    }
}

/// Read the native dimensions of an image without decoding its pixels.
pub fn read_dimensions(name: &str, source: &ImageSource) -> Result<Size, LoadError> {
    let decoded = match source {
        ImageSource::Path(path) => image::image_dimensions(path),
        ImageSource::Bytes(bytes) => image::ImageReader::new(Cursor::new(bytes.as_ref()))
            .with_guessed_format()
            .map_err(|e| LoadError::io(name, e))?
            .into_dimensions(),
    };
    let (width, height) = decoded.map_err(|source| LoadError::Decode {
        name: name.to_string(),
        source,
    })?;

    if width == 0 || height == 0 {
        return Err(LoadError::Empty {
            name: name.to_string(),
        });
    }
    Ok(Size::new(width as f64, height as f64))
}

/// Tag identifying one pair-load request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    /// Monotonic request counter
    pub generation: u64,
    /// Sequence the request was issued for
    pub sequence_id: String,
}

/// Joined result of loading both images of a sequence.
#[derive(Debug)]
pub struct PairLoadResult {
    pub ticket: LoadTicket,
    /// Native sizes indexed by display slot
    pub result: Result<[Size; 2], LoadError>,
}

/// Request sent to the background thread.
struct LoadRequest {
    generation: u64,
    slot: ImageSlot,
    name: String,
    source: ImageSource,
}

/// Message sent to the loader thread.
enum ThreadMessage {
    Load(LoadRequest),
    Shutdown,
}

/// Result for a single image, sent back from the thread.
struct SlotResult {
    generation: u64,
    slot: ImageSlot,
    result: Result<Size, LoadError>,
}

/// Join state of an in-flight pair.
struct PendingPair {
    ticket: LoadTicket,
    sizes: [Option<Size>; 2],
    started: Instant,
}

/// Loads image pairs on a background thread.
pub struct PairLoader {
    request_tx: Sender<ThreadMessage>,
    result_rx: Receiver<SlotResult>,
    thread_handle: Option<JoinHandle<()>>,
    next_generation: u64,
    pending: HashMap<u64, PendingPair>,
}

impl PairLoader {
    /// Spawn the loader thread.
    pub fn spawn() -> Result<Self, LoadError> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<SlotResult>();

        let thread_handle = thread::Builder::new()
            .name("image-loader".to_string())
            .spawn(move || {
                log::debug!("Image loader thread started");
                Self::thread_loop(request_rx, result_tx);
                log::debug!("Image loader thread exiting");
            })
            .map_err(|e| LoadError::io("image-loader thread", e))?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            next_generation: 0,
            pending: HashMap::new(),
        })
    }

    fn thread_loop(request_rx: Receiver<ThreadMessage>, result_tx: Sender<SlotResult>) {
        while let Ok(ThreadMessage::Load(request)) = request_rx.recv() {
            let result = read_dimensions(&request.name, &request.source);
            let reply = SlotResult {
                generation: request.generation,
                slot: request.slot,
                result,
            };
            if result_tx.send(reply).is_err() {
                log::warn!("Result channel closed, loader thread exiting");
                break;
            }
        }
    }

    /// Queue both images of a sequence, indexed by display slot.
    pub fn request(
        &mut self,
        sequence_id: &str,
        images: [(String, ImageSource); 2],
    ) -> LoadTicket {
        let generation = self.next_generation;
        self.next_generation += 1;
        let ticket = LoadTicket {
            generation,
            sequence_id: sequence_id.to_string(),
        };

        self.pending.insert(
            generation,
            PendingPair {
                ticket: ticket.clone(),
                sizes: [None, None],
                started: Instant::now(),
            },
        );

        for (slot, (name, source)) in ImageSlot::all().into_iter().zip(images) {
            let request = LoadRequest {
                generation,
                slot,
                name,
                source,
            };
            if self.request_tx.send(ThreadMessage::Load(request)).is_err() {
                log::error!("Failed to send load request: loader thread stopped");
            }
        }

        log::debug!("Requested images for '{}' (#{})", sequence_id, generation);
        ticket
    }

    /// Number of pairs still loading.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Collect every pair that has completed. Non-blocking.
    pub fn poll(&mut self) -> Vec<PairLoadResult> {
        let mut done = Vec::new();
        loop {
            match self.result_rx.try_recv() {
                Ok(reply) => done.extend(self.absorb(reply)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    done.extend(self.fail_all_pending());
                    break;
                }
            }
        }
        done
    }

    /// Block until the next pair completes, or `timeout` elapses.
    ///
    /// Returns `None` when nothing is pending or the timeout expires.
    pub fn wait_next(&mut self, timeout: Duration) -> Option<PairLoadResult> {
        let deadline = Instant::now() + timeout;
        while !self.pending.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.result_rx.recv_timeout(remaining) {
                Ok(reply) => {
                    if let Some(result) = self.absorb(reply) {
                        return Some(result);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => return self.fail_all_pending().pop(),
            }
        }
        None
    }

    /// Fold one image result into its pair, returning the pair once resolved.
    fn absorb(&mut self, reply: SlotResult) -> Option<PairLoadResult> {
        // Pairs that already failed ignore their sibling's late result.
        let pair = self.pending.get_mut(&reply.generation)?;

        match reply.result {
            Ok(size) => {
                pair.sizes[reply.slot.index()] = Some(size);
                let [Some(primary), Some(secondary)] = pair.sizes else {
                    return None;
                };
                let pair = self.pending.remove(&reply.generation)?;
                log::debug!(
                    "Loaded images for '{}' in {:?}",
                    pair.ticket.sequence_id,
                    pair.started.elapsed()
                );
                Some(PairLoadResult {
                    ticket: pair.ticket,
                    result: Ok([primary, secondary]),
                })
            }
            Err(e) => {
                let pair = self.pending.remove(&reply.generation)?;
                log::debug!("Image load failed for '{}': {}", pair.ticket.sequence_id, e);
                Some(PairLoadResult {
                    ticket: pair.ticket,
                    result: Err(e),
                })
            }
        }
    }

    fn fail_all_pending(&mut self) -> Vec<PairLoadResult> {
        log::warn!("Image loader thread disconnected");
        self.pending
            .drain()
            .map(|(_, pair)| PairLoadResult {
                ticket: pair.ticket,
                result: Err(LoadError::Disconnected),
            })
            .collect()
    }
}

impl Drop for PairLoader {
    fn drop(&mut self) {
        let _ = self.request_tx.send(ThreadMessage::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Image loader thread panicked: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn png_bytes(width: u32, height: u32) -> ImageSource {
        let mut buf = Vec::new();
        RgbImage::new(width, height)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        ImageSource::Bytes(buf.into())
    }

    #[test]
    fn test_read_dimensions_from_bytes() {
        let size = read_dimensions("a_1.png", &png_bytes(64, 48)).unwrap();
        assert_eq!(size, Size::new(64.0, 48.0));
    }

    #[test]
    fn test_read_dimensions_rejects_garbage() {
        let source = ImageSource::Bytes(vec![0u8, 1, 2, 3].into());
        assert!(read_dimensions("bad_1.png", &source).is_err());
    }

    #[test]
    fn test_pair_joins_both_slots() {
        let mut loader = PairLoader::spawn().unwrap();
        let ticket = loader.request(
            "A",
            [
                ("A_right.png".to_string(), png_bytes(30, 20)),
                ("A_left.png".to_string(), png_bytes(10, 40)),
            ],
        );

        let result = loader.wait_next(TIMEOUT).unwrap();
        assert_eq!(result.ticket, ticket);
        let sizes = result.result.unwrap();
        assert_eq!(sizes[0], Size::new(30.0, 20.0));
        assert_eq!(sizes[1], Size::new(10.0, 40.0));
        assert_eq!(loader.pending_count(), 0);
    }

    #[test]
    fn test_one_failure_fails_the_pair() {
        let mut loader = PairLoader::spawn().unwrap();
        loader.request(
            "A",
            [
                ("A_right.png".to_string(), ImageSource::Bytes(vec![9u8; 8].into())),
                ("A_left.png".to_string(), png_bytes(10, 10)),
            ],
        );

        let result = loader.wait_next(TIMEOUT).unwrap();
        assert!(result.result.is_err());
        // The sibling's late success does not produce a second result.
        assert!(loader.wait_next(Duration::from_millis(200)).is_none());
    }

    #[test]
    fn test_tickets_are_distinct() {
        let mut loader = PairLoader::spawn().unwrap();
        let first = loader.request(
            "A",
            [
                ("A_1.png".to_string(), png_bytes(2, 2)),
                ("A_2.png".to_string(), png_bytes(2, 2)),
            ],
        );
        let second = loader.request(
            "A",
            [
                ("A_1.png".to_string(), png_bytes(2, 2)),
                ("A_2.png".to_string(), png_bytes(2, 2)),
            ],
        );
        assert_ne!(first, second);

        let mut seen = vec![
            loader.wait_next(TIMEOUT).unwrap().ticket,
            loader.wait_next(TIMEOUT).unwrap().ticket,
        ];
        seen.sort_by_key(|t| t.generation);
        assert_eq!(seen, vec![first, second]);
    }
}
