// src/pipeline/mod.rs

//! Staged file pipelines.
//!
//! A pipeline is a source, a chain of [`Stage`]s and a [`Sink`], each running
//! as its own Tokio task and connected by bounded channels. A slow sink
//! therefore pauses the stages and the source upstream of it.
//!
//! Failure handling:
//! - a stage (or the source) that fails sends [`Packet::Abort`] downstream
//!   and returns its error, so nothing partial reaches the sink;
//! - upstream tasks notice the closed channel and stop quietly;
//! - [`Pipeline::run`] reports the first error in pipeline order.

pub mod asset;
pub mod sink;

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::{PipelineError, Result};
use crate::source::SourceLocator;

pub use asset::Asset;
pub use sink::{DestSink, Sink, WriteOutcome};

/// Default channel capacity between stages.
pub const DEFAULT_CAPACITY: usize = 4;

/// Unit of work travelling between stages.
#[derive(Debug)]
pub enum Packet {
    Asset(Asset),
    /// Upstream failed; drop everything and stop without flushing.
    Abort,
}

/// One transform in a pipeline.
///
/// `transform` may emit zero, one or many assets per input. Stages that
/// combine inputs (e.g. concatenation) buffer in `transform` and emit in
/// `flush`, which runs once after upstream finishes cleanly.
pub trait Stage: Send + 'static {
    fn name(&self) -> &'static str;

    fn transform(&mut self, asset: Asset) -> Result<Vec<Asset>>;

    fn flush(&mut self) -> Result<Vec<Asset>> {
        Ok(Vec::new())
    }
}

/// Where the assets entering a pipeline come from.
#[derive(Debug)]
pub enum Source {
    /// Root-relative files read lazily through a locator. Destination paths
    /// are taken relative to `base`.
    Files {
        locator: SourceLocator,
        base: PathBuf,
        paths: Vec<PathBuf>,
    },
    /// Assets already in memory.
    Assets(Vec<Asset>),
}

/// What a finished pipeline did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Number of assets the source produced.
    pub read: usize,
    /// Files written by the sink.
    pub written: Vec<PathBuf>,
    /// Files the sink left alone because their contents were already current.
    pub unchanged: Vec<PathBuf>,
}

/// Builder + runner for a staged pipeline.
pub struct Pipeline {
    label: String,
    stages: Vec<Box<dyn Stage>>,
    capacity: usize,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.stages.iter().map(|s| s.name()).collect();
        f.debug_struct("Pipeline")
            .field("label", &self.label)
            .field("stages", &names)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl Pipeline {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            stages: Vec::new(),
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn stage(mut self, stage: impl Stage) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Channel capacity between consecutive stages (clamped to at least 1).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Run the pipeline to completion.
    pub async fn run(self, source: Source, sink: impl Sink) -> Result<PipelineReport> {
        let names: Vec<_> = self.stages.iter().map(|s| s.name()).collect();
        debug!(pipeline = %self.label, stages = ?names, "starting pipeline");

        let (source_tx, mut rx) = mpsc::channel::<Packet>(self.capacity);
        let source_handle = tokio::spawn(drive_source(source, source_tx));

        let mut stage_handles: Vec<JoinHandle<Result<()>>> = Vec::with_capacity(self.stages.len());
        for stage in self.stages {
            let (tx, next_rx) = mpsc::channel::<Packet>(self.capacity);
            stage_handles.push(tokio::spawn(drive_stage(stage, rx, tx)));
            rx = next_rx;
        }

        let sink_handle = tokio::spawn(drive_sink(sink, rx));

        let mut first_error: Option<PipelineError> = None;

        let read = match join(source_handle).await {
            Ok(n) => n,
            Err(e) => {
                first_error.get_or_insert(e);
                0
            }
        };
        for handle in stage_handles {
            if let Err(e) = join(handle).await {
                first_error.get_or_insert(e);
            }
        }
        let (written, unchanged) = match join(sink_handle).await {
            Ok(tally) => tally,
            Err(e) => {
                first_error.get_or_insert(e);
                (Vec::new(), Vec::new())
            }
        };

        if let Some(err) = first_error {
            warn!(pipeline = %self.label, error = %err, "pipeline aborted");
            return Err(err);
        }

        debug!(
            pipeline = %self.label,
            read,
            written = written.len(),
            unchanged = unchanged.len(),
            "pipeline finished"
        );
        Ok(PipelineReport {
            read,
            written,
            unchanged,
        })
    }
}

async fn join<T>(handle: JoinHandle<Result<T>>) -> Result<T> {
    match handle.await {
        Ok(res) => res,
        Err(e) => Err(PipelineError::Other(anyhow::anyhow!("pipeline task panicked: {e}"))),
    }
}

async fn drive_source(source: Source, tx: mpsc::Sender<Packet>) -> Result<usize> {
    let mut count = 0;
    match source {
        Source::Assets(assets) => {
            for asset in assets {
                if tx.send(Packet::Asset(asset)).await.is_err() {
                    return Ok(count);
                }
                count += 1;
            }
        }
        Source::Files {
            locator,
            base,
            paths,
        } => {
            for path in paths {
                let asset = match locator.read_asset(&path, &base) {
                    Ok(a) => a,
                    Err(e) => {
                        let _ = tx.send(Packet::Abort).await;
                        return Err(e);
                    }
                };
                if tx.send(Packet::Asset(asset)).await.is_err() {
                    return Ok(count);
                }
                count += 1;
            }
        }
    }
    Ok(count)
}

async fn drive_stage(
    mut stage: Box<dyn Stage>,
    mut rx: mpsc::Receiver<Packet>,
    tx: mpsc::Sender<Packet>,
) -> Result<()> {
    while let Some(packet) = rx.recv().await {
        let asset = match packet {
            Packet::Asset(asset) => asset,
            Packet::Abort => {
                let _ = tx.send(Packet::Abort).await;
                return Ok(());
            }
        };

        let path = asset.path.clone();
        match stage.transform(asset) {
            Ok(out) => {
                if !forward(&tx, out).await {
                    return Ok(());
                }
            }
            Err(e) => {
                debug!(stage = stage.name(), ?path, error = %e, "stage failed");
                let _ = tx.send(Packet::Abort).await;
                return Err(e);
            }
        }
    }

    match stage.flush() {
        Ok(out) => {
            forward(&tx, out).await;
            Ok(())
        }
        Err(e) => {
            debug!(stage = stage.name(), error = %e, "stage flush failed");
            let _ = tx.send(Packet::Abort).await;
            Err(e)
        }
    }
}

/// Send every asset downstream; false if the downstream side has gone away.
async fn forward(tx: &mpsc::Sender<Packet>, assets: Vec<Asset>) -> bool {
    for asset in assets {
        if tx.send(Packet::Asset(asset)).await.is_err() {
            return false;
        }
    }
    true
}

async fn drive_sink(
    mut sink: impl Sink,
    mut rx: mpsc::Receiver<Packet>,
) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut written = Vec::new();
    let mut unchanged = Vec::new();

    while let Some(packet) = rx.recv().await {
        match packet {
            Packet::Abort => break,
            Packet::Asset(asset) => match sink.write(asset)? {
                WriteOutcome::Written(path) => written.push(path),
                WriteOutcome::Unchanged(path) => unchanged.push(path),
            },
        }
    }

    Ok((written, unchanged))
}
