use crate::api::error::{AppError, AppResult};
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};

/// One message of a client-to-server streaming call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Metadata(String),
    Chunk(Bytes),
}

/// Which streaming call is being assembled; decides what the metadata frame
/// means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Metadata is the display filename of a new blob.
    Upload,
    /// Metadata is the identifier of an existing blob.
    Update,
}

impl TransferKind {
    pub fn metadata_field(&self) -> &'static str {
        match self {
            TransferKind::Upload => "filename",
            TransferKind::Update => "file_id",
        }
    }
}

/// Result of draining a frame sequence.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub metadata: String,
    pub payload: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingFirstFrame,
    Accumulating,
    Done,
}

enum State {
    AwaitingFirstFrame,
    Accumulating { metadata: String, payload: BytesMut },
    Done,
}

/// State machine turning an ordered frame sequence into `(metadata, payload)`.
///
/// Metadata is legal only as the very first frame. Every `(phase, frame)`
/// pair has exactly one outcome:
///
/// | phase              | metadata frame            | chunk frame               |
/// |--------------------|---------------------------|---------------------------|
/// | AwaitingFirstFrame | Accumulating (or Missing if empty) | MissingRequiredMetadata |
/// | Accumulating       | DuplicateMetadata         | Accumulating (append)     |
/// | Done               | Internal                  | Internal                  |
pub struct TransferAssembler {
    kind: TransferKind,
    state: State,
}

impl TransferAssembler {
    pub fn new(kind: TransferKind) -> Self {
        Self {
            kind,
            state: State::AwaitingFirstFrame,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::AwaitingFirstFrame => Phase::AwaitingFirstFrame,
            State::Accumulating { .. } => Phase::Accumulating,
            State::Done => Phase::Done,
        }
    }

    fn missing(&self) -> AppError {
        AppError::MissingRequiredMetadata {
            field: self.kind.metadata_field(),
        }
    }

    pub fn push(&mut self, frame: Frame) -> AppResult<()> {
        let state = std::mem::replace(&mut self.state, State::Done);
        self.state = match (state, frame) {
            (State::AwaitingFirstFrame, Frame::Metadata(value)) => {
                if value.trim().is_empty() {
                    return Err(self.missing());
                }
                State::Accumulating {
                    metadata: value,
                    payload: BytesMut::new(),
                }
            }
            (State::AwaitingFirstFrame, Frame::Chunk(_)) => return Err(self.missing()),
            (State::Accumulating { .. }, Frame::Metadata(_)) => {
                return Err(AppError::DuplicateMetadata {
                    field: self.kind.metadata_field(),
                });
            }
            (State::Accumulating { metadata, mut payload }, Frame::Chunk(chunk)) => {
                payload.extend_from_slice(&chunk);
                State::Accumulating { metadata, payload }
            }
            (State::Done, _) => {
                return Err(AppError::internal("frame received after end of stream"));
            }
        };
        Ok(())
    }

    /// Called on end-of-stream.
    pub fn finish(&mut self) -> AppResult<Assembled> {
        match std::mem::replace(&mut self.state, State::Done) {
            State::Accumulating { metadata, payload } => Ok(Assembled {
                metadata,
                payload: payload.freeze(),
            }),
            State::AwaitingFirstFrame => Err(self.missing()),
            State::Done => Err(AppError::internal("transfer already finished")),
        }
    }
}

/// Drains `frames` in arrival order and returns the assembled transfer.
///
/// A failure yielded by the frame source aborts the call unchanged; the
/// source is responsible for classifying transport errors.
pub async fn assemble<S>(kind: TransferKind, frames: S) -> AppResult<Assembled>
where
    S: Stream<Item = AppResult<Frame>>,
{
    futures::pin_mut!(frames);
    let mut assembler = TransferAssembler::new(kind);

    while let Some(frame) = frames.next().await {
        assembler.push(frame?)?;
    }

    assembler.finish()
}
