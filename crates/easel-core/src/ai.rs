//! Bridge to the external image service.
//!
//! Requests run on a background worker thread so pointer handling never
//! blocks on the network. Each request is keyed by operation kind plus
//! target layer; submitting a new request for a key that already has one
//! pending supersedes it, and the superseded completion is dropped when it
//! eventually arrives. Completions are polled from the main loop and
//! applied there, never from the worker.

use crate::layer::{ImageRef, LayerId};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Image-service failure. `Service` carries the provider's message and is
/// shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AiError {
    #[error("{0}")]
    Service(String),
    #[error("connection failed: {0}")]
    Connection(String),
}

/// Super-resolution scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Upscale {
    X2,
    X4,
}

impl Upscale {
    pub fn factor(&self) -> u32 {
        match self {
            Upscale::X2 => 2,
            Upscale::X4 => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Upscale::X2 => "2x",
            Upscale::X4 => "4x",
        }
    }
}

/// Direction to extend an image during outpainting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutpaintDirection {
    Left,
    Right,
    Up,
    Down,
}

impl OutpaintDirection {
    pub fn label(&self) -> &'static str {
        match self {
            OutpaintDirection::Left => "Left",
            OutpaintDirection::Right => "Right",
            OutpaintDirection::Up => "Up",
            OutpaintDirection::Down => "Down",
        }
    }

    pub fn all() -> [OutpaintDirection; 4] {
        [
            OutpaintDirection::Left,
            OutpaintDirection::Right,
            OutpaintDirection::Up,
            OutpaintDirection::Down,
        ]
    }
}

/// Parameters for text-to-image generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub model: String,
    pub width: u32,
    pub height: u32,
    pub count: u32,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: String::new(),
            width: 1024,
            height: 1024,
            count: 1,
        }
    }
}

/// One request to the image service.
#[derive(Debug, Clone, PartialEq)]
pub enum AiRequest {
    Generate(GenerateRequest),
    SuperResolution {
        image: ImageRef,
        scale: Upscale,
    },
    RemoveBackground {
        image: ImageRef,
    },
    Outpaint {
        image: ImageRef,
        direction: OutpaintDirection,
        prompt: Option<String>,
    },
    EditImage {
        image: ImageRef,
        prompt: String,
    },
    TextReplace {
        image: ImageRef,
        original: String,
        replacement: String,
    },
    Inpaint {
        image: ImageRef,
        mask: ImageRef,
        prompt: String,
    },
}

impl AiRequest {
    pub fn kind(&self) -> AiOpKind {
        match self {
            AiRequest::Generate(_) => AiOpKind::Generate,
            AiRequest::SuperResolution { .. } => AiOpKind::SuperResolution,
            AiRequest::RemoveBackground { .. } => AiOpKind::RemoveBackground,
            AiRequest::Outpaint { .. } => AiOpKind::Outpaint,
            AiRequest::EditImage { .. } => AiOpKind::EditImage,
            AiRequest::TextReplace { .. } => AiOpKind::TextReplace,
            AiRequest::Inpaint { .. } => AiOpKind::Inpaint,
        }
    }
}

/// Operation kind, used to key pending requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiOpKind {
    Generate,
    SuperResolution,
    RemoveBackground,
    Outpaint,
    EditImage,
    TextReplace,
    Inpaint,
}

/// Identity of a logical job: one slot per operation kind and target
/// layer. A second submit on the same key supersedes the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub kind: AiOpKind,
    pub target: Option<LayerId>,
}

/// Implemented by the image-service client. The worker thread owns the
/// service exclusively, so methods take `&mut self`.
pub trait AiService: Send {
    fn generate_text2image(&mut self, request: &GenerateRequest) -> Result<Vec<ImageRef>, AiError>;
    fn super_resolution(&mut self, image: &str, scale: Upscale) -> Result<ImageRef, AiError>;
    fn remove_background(&mut self, image: &str) -> Result<ImageRef, AiError>;
    fn outpaint(
        &mut self,
        image: &str,
        direction: OutpaintDirection,
        prompt: Option<&str>,
    ) -> Result<Vec<ImageRef>, AiError>;
    fn edit_image(&mut self, image: &str, prompt: &str) -> Result<Vec<ImageRef>, AiError>;
    fn text_replace(
        &mut self,
        image: &str,
        original: &str,
        replacement: &str,
    ) -> Result<Vec<ImageRef>, AiError>;
    fn inpaint(&mut self, image: &str, mask: &str, prompt: &str) -> Result<ImageRef, AiError>;
}

/// Run one request against a service, normalizing single-image operations
/// to a one-element list.
pub fn dispatch(
    service: &mut dyn AiService,
    request: &AiRequest,
) -> Result<Vec<ImageRef>, AiError> {
    match request {
        AiRequest::Generate(generate) => service.generate_text2image(generate),
        AiRequest::SuperResolution { image, scale } => {
            service.super_resolution(image, *scale).map(|image| vec![image])
        }
        AiRequest::RemoveBackground { image } => {
            service.remove_background(image).map(|image| vec![image])
        }
        AiRequest::Outpaint {
            image,
            direction,
            prompt,
        } => service.outpaint(image, *direction, prompt.as_deref()),
        AiRequest::EditImage { image, prompt } => service.edit_image(image, prompt),
        AiRequest::TextReplace {
            image,
            original,
            replacement,
        } => service.text_replace(image, original, replacement),
        AiRequest::Inpaint {
            image,
            mask,
            prompt,
        } => service.inpaint(image, mask, prompt).map(|image| vec![image]),
    }
}

/// A finished request, fresh or stale.
#[derive(Debug)]
pub struct AiCompletion {
    pub key: JobKey,
    pub generation: u64,
    pub request: AiRequest,
    pub result: Result<Vec<ImageRef>, AiError>,
}

/// Commands sent to the worker thread.
enum WorkerCommand {
    Run {
        key: JobKey,
        generation: u64,
        request: AiRequest,
    },
    Shutdown,
}

/// Owns the worker thread and the pending-request table.
///
/// `submit` assigns each request a generation number and records it under
/// its [`JobKey`]; `poll` delivers only completions whose generation still
/// matches the table, so superseded and cancelled requests can never reach
/// the store.
pub struct AiBridge {
    cmd_tx: Sender<WorkerCommand>,
    completion_rx: Receiver<AiCompletion>,
    pending: HashMap<JobKey, u64>,
    next_generation: u64,
    _thread: JoinHandle<()>,
}

impl AiBridge {
    /// Spawn the worker thread around a service client.
    pub fn spawn(service: impl AiService + 'static) -> Self {
        let (cmd_tx, cmd_rx) = channel::<WorkerCommand>();
        let (completion_tx, completion_rx) = channel::<AiCompletion>();

        let handle = thread::spawn(move || {
            let mut service = service;
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    WorkerCommand::Run {
                        key,
                        generation,
                        request,
                    } => {
                        debug!("ai worker: running {:?} generation {generation}", key.kind);
                        let result = dispatch(&mut service, &request);
                        let completion = AiCompletion {
                            key,
                            generation,
                            request,
                            result,
                        };
                        if completion_tx.send(completion).is_err() {
                            break;
                        }
                    }
                    WorkerCommand::Shutdown => break,
                }
            }
            debug!("ai worker exiting");
        });

        Self {
            cmd_tx,
            completion_rx,
            pending: HashMap::new(),
            next_generation: 1,
            _thread: handle,
        }
    }

    /// Queue a request. Any pending request under the same key is
    /// superseded; its completion will be discarded on arrival.
    pub fn submit(&mut self, target: Option<LayerId>, request: AiRequest) -> JobKey {
        let key = JobKey {
            kind: request.kind(),
            target,
        };
        let generation = self.next_generation;
        self.next_generation += 1;

        if let Some(previous) = self.pending.insert(key, generation) {
            debug!(
                "superseding pending {:?} request (generation {previous})",
                key.kind
            );
        }
        let command = WorkerCommand::Run {
            key,
            generation,
            request,
        };
        if self.cmd_tx.send(command).is_err() {
            warn!("ai worker is gone; {:?} request dropped", key.kind);
            self.pending.remove(&key);
        }
        key
    }

    /// Drop a pending request. The worker may still run it, but its
    /// completion will be discarded.
    pub fn cancel(&mut self, key: &JobKey) -> bool {
        let cancelled = self.pending.remove(key).is_some();
        if cancelled {
            debug!("cancelled pending {:?} request", key.kind);
        }
        cancelled
    }

    /// Drain finished requests, keeping only those still current.
    pub fn poll(&mut self) -> Vec<AiCompletion> {
        let mut fresh = Vec::new();
        while let Ok(completion) = self.completion_rx.try_recv() {
            match self.pending.get(&completion.key) {
                Some(&generation) if generation == completion.generation => {
                    self.pending.remove(&completion.key);
                    fresh.push(completion);
                }
                _ => {
                    debug!(
                        "dropping stale {:?} completion (generation {})",
                        completion.key.kind, completion.generation
                    );
                }
            }
        }
        fresh
    }

    /// True while any request is pending.
    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_pending(&self, key: &JobKey) -> bool {
        self.pending.contains_key(key)
    }
}

impl Drop for AiBridge {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(WorkerCommand::Shutdown);
    }
}
