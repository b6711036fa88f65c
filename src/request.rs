//! Request types shared by the serializer, signer, endpoint and transport.
//!
//! A [`RequestDict`] is produced once per logical call and never changes. Every
//! attempt turns it into a fresh [`RequestDescriptor`] (new URL resolution, new
//! signature). The only state that crosses attempts is a [`StreamBody`], which
//! must be rewound before the next attempt reads it.

use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex};
use url::Url;

use crate::{Error, Result};

/// Readers that can be rewound to a recorded offset.
pub trait SeekableRead: Read + Seek + Send {}
impl<T: Read + Seek + Send> SeekableRead for T {}

enum StreamState {
    Seekable {
        reader: Box<dyn SeekableRead>,
        start: u64,
    },
    OneShot {
        reader: Box<dyn Read + Send>,
        consumed: bool,
    },
}

/// Shared handle to a streaming request body.
///
/// Clones share the same underlying reader. Reads and seeks run on the
/// blocking pool so a file-backed body never stalls a runtime worker.
#[derive(Clone)]
pub struct StreamBody {
    state: Arc<Mutex<StreamState>>,
    seekable: bool,
}

impl StreamBody {
    /// Wrap a seekable reader. Its current position becomes the rewind offset.
    pub fn seekable<R>(mut reader: R) -> io::Result<Self>
    where
        R: Read + Seek + Send + 'static,
    {
        let start = reader.stream_position()?;
        Ok(Self {
            state: Arc::new(Mutex::new(StreamState::Seekable {
                reader: Box::new(reader),
                start,
            })),
            seekable: true,
        })
    }

    /// Wrap a reader that can only be read once.
    pub fn one_shot<R>(reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self {
            state: Arc::new(Mutex::new(StreamState::OneShot {
                reader: Box::new(reader),
                consumed: false,
            })),
            seekable: false,
        }
    }

    pub fn is_seekable(&self) -> bool {
        self.seekable
    }

    async fn with_state<T, F>(&self, op: F) -> io::Result<T>
    where
        F: FnOnce(&mut StreamState) -> io::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::clone(&self.state);
        tokio::task::spawn_blocking(move || {
            let mut guard = state
                .lock()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "stream body lock poisoned"))?;
            op(&mut *guard)
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("stream body task failed: {}", e)))?
    }

    /// Read everything from the current position.
    pub async fn read_to_bytes(&self) -> io::Result<Bytes> {
        self.with_state(|state| {
            let mut buf = Vec::new();
            match state {
                StreamState::Seekable { reader, .. } => {
                    reader.read_to_end(&mut buf)?;
                }
                StreamState::OneShot { reader, consumed } => {
                    *consumed = true;
                    reader.read_to_end(&mut buf)?;
                }
            }
            Ok(Bytes::from(buf))
        })
        .await
    }

    /// Read the remaining bytes without moving the position.
    ///
    /// Returns `None` for one-shot bodies, which cannot be inspected.
    pub async fn peek_bytes(&self) -> io::Result<Option<Bytes>> {
        if !self.seekable {
            return Ok(None);
        }
        self.with_state(|state| match state {
            StreamState::Seekable { reader, .. } => {
                let pos = reader.stream_position()?;
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                reader.seek(SeekFrom::Start(pos))?;
                Ok(Some(Bytes::from(buf)))
            }
            StreamState::OneShot { .. } => Ok(None),
        })
        .await
    }

    /// Rewind to the offset recorded at construction.
    ///
    /// A one-shot body that has already been read fails with
    /// [`io::ErrorKind::Unsupported`]; an unread one is left untouched.
    pub async fn reset(&self) -> io::Result<()> {
        self.with_state(|state| match state {
            StreamState::Seekable { reader, start } => {
                reader.seek(SeekFrom::Start(*start))?;
                Ok(())
            }
            StreamState::OneShot { consumed: false, .. } => Ok(()),
            StreamState::OneShot { consumed: true, .. } => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "one-shot request body was already consumed",
            )),
        })
        .await
    }
}

impl fmt::Debug for StreamBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamBody")
            .field("seekable", &self.is_seekable())
            .finish()
    }
}

/// Body of an outgoing request.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Bytes(Bytes),
    Stream(StreamBody),
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Bytes(b) => b.is_empty(),
            RequestBody::Stream(_) => false,
        }
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(v: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(v))
    }
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Bytes(Bytes::from(s))
    }
}

impl From<&'static str> for RequestBody {
    fn from(s: &'static str) -> Self {
        RequestBody::Bytes(Bytes::from_static(s.as_bytes()))
    }
}

impl From<StreamBody> for RequestBody {
    fn from(s: StreamBody) -> Self {
        RequestBody::Stream(s)
    }
}

/// Serializer output: everything needed to build a request, before URL
/// resolution and signing.
#[derive(Debug, Clone)]
pub struct RequestDict {
    pub method: String,
    pub url_path: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: RequestBody,
}

impl RequestDict {
    pub fn new(method: impl Into<String>, url_path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url_path: url_path.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }
}

/// A fully-formed request for one attempt.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: String,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub body: RequestBody,
    /// 1-based attempt this descriptor was built for.
    pub attempt: u32,
}

impl RequestDescriptor {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Materialize the body for sending. Reading a stream body advances it.
    pub async fn body_bytes(&self) -> io::Result<Bytes> {
        match &self.body {
            RequestBody::Empty => Ok(Bytes::new()),
            RequestBody::Bytes(b) => Ok(b.clone()),
            RequestBody::Stream(s) => s.read_to_bytes().await,
        }
    }

    /// Rewind a stream body so the next attempt resends it in full.
    pub async fn reset_stream(&self) -> Result<()> {
        match &self.body {
            RequestBody::Stream(s) => s.reset().await.map_err(|e| {
                if e.kind() == io::ErrorKind::Unsupported {
                    Error::BodyNotRewindable {
                        attempt: self.attempt + 1,
                    }
                } else {
                    Error::Io(e)
                }
            }),
            _ => Ok(()),
        }
    }
}
