//! Asset loading
//!
//! Sources are fetched through a platform-provided [`Fetch`] and decoded
//! into [`Resources`]. Loading is a future: it completes once every source
//! is ready, fails on the first broken source, and can be cancelled through
//! the [`LoadHandle`] returned by [`LoadTask::new`].

use futures::future::{abortable, AbortHandle, Abortable, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::{CoreError, Result};
use crate::geometry::Mesh;
use crate::stl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// STL mesh
    Model,
    /// UTF-8 text, e.g. shader source
    Text,
    Binary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub kind: SourceKind,
    pub path: String,
}

impl Source {
    pub fn new(name: impl Into<String>, kind: SourceKind, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            path: path.into(),
        }
    }

    pub fn model(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, SourceKind::Model, path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Model(Mesh),
    Text(String),
    Binary(Vec<u8>),
}

/// Loaded items by source name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resources {
    items: HashMap<String, Resource>,
}

impl Resources {
    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.items.get(name)
    }

    pub fn model(&self, name: &str) -> Option<&Mesh> {
        match self.items.get(name)? {
            Resource::Model(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.items.get(name)? {
            Resource::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Add an item that did not come through [`load`]
    pub fn insert(&mut self, name: impl Into<String>, resource: Resource) {
        self.items.insert(name.into(), resource);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Loading progress after each completed source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub loaded: usize,
    pub total: usize,
}

/// Platform byte source: filesystem, HTTP, embedded assets...
pub trait Fetch {
    fn fetch<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, Result<Vec<u8>>>;
}

fn decode(source: &Source, bytes: Vec<u8>) -> Result<Resource> {
    let failed = |message: String| CoreError::Resource {
        name: source.name.clone(),
        message,
    };
    match source.kind {
        SourceKind::Model => stl::parse_stl(&bytes)
            .map(Resource::Model)
            .map_err(|e| failed(e.to_string())),
        SourceKind::Text => String::from_utf8(bytes)
            .map(Resource::Text)
            .map_err(|e| failed(e.to_string())),
        SourceKind::Binary => Ok(Resource::Binary(bytes)),
    }
}

/// Fetch and decode every source concurrently
pub async fn load<F, P>(sources: &[Source], fetch: &F, mut on_progress: P) -> Result<Resources>
where
    F: Fetch + ?Sized,
    P: FnMut(Progress),
{
    let total = sources.len();
    let mut pending: FuturesUnordered<_> = sources
        .iter()
        .map(|source| async move { (source, fetch.fetch(&source.path).await) })
        .collect();

    let mut resources = Resources::default();
    while let Some((source, fetched)) = pending.next().await {
        let bytes = fetched.map_err(|e| CoreError::Resource {
            name: source.name.clone(),
            message: e.to_string(),
        })?;
        let resource = decode(source, bytes)?;
        resources.items.insert(source.name.clone(), resource);

        let progress = Progress {
            loaded: resources.items.len(),
            total,
        };
        tracing::debug!(name = %source.name, loaded = progress.loaded, total, "resource loaded");
        on_progress(progress);
    }

    tracing::info!("Loaded {} resources", resources.len());
    Ok(resources)
}

/// Cancels the load it was created with
#[derive(Debug, Clone)]
pub struct LoadHandle(AbortHandle);

impl LoadHandle {
    pub fn cancel(&self) {
        self.0.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_aborted()
    }
}

/// A load future that resolves to `CoreError::Cancelled` once its handle is
/// cancelled, even if it has not been polled yet.
pub struct LoadTask<'a> {
    inner: Abortable<LocalBoxFuture<'a, Result<Resources>>>,
}

impl<'a> LoadTask<'a> {
    pub fn new<Fut>(future: Fut) -> (Self, LoadHandle)
    where
        Fut: Future<Output = Result<Resources>> + 'a,
    {
        let boxed: LocalBoxFuture<'a, Result<Resources>> = Box::pin(future);
        let (inner, handle) = abortable(boxed);
        (Self { inner }, LoadHandle(handle))
    }
}

impl Future for LoadTask<'_> {
    type Output = Result<Resources>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.inner).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_aborted)) => Poll::Ready(Err(CoreError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}
