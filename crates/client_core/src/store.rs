//! Generic cached resource with a loading flag and generation-tagged requests.
//!
//! Every issued request takes the next generation of its store. A response is
//! applied only while its generation is still the latest one; invalidation
//! also advances the generation, so responses to requests issued before an
//! invalidation are dropped instead of resurrecting stale data.

use std::{
    future::Future,
    sync::{Mutex, MutexGuard, PoisonError},
};

use tracing::{debug, warn};

use crate::error::FetchError;

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    /// `None` until a fetch succeeds, and again after every invalidation.
    pub value: Option<T>,
    pub loading: bool,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            value: None,
            loading: false,
        }
    }
}

/// What happened to a response that completed without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer request or an invalidation retired this one; nothing changed.
    Superseded,
}

/// In-place edit replayed on responses to requests issued before it.
type Amendment<T> = Box<dyn Fn(&mut T) + Send>;

struct StoreInner<T> {
    value: Option<T>,
    in_flight: usize,
    generation: u64,
    amendments: Vec<(u64, Amendment<T>)>,
}

pub struct ResourceStore<T> {
    name: &'static str,
    inner: Mutex<StoreInner<T>>,
}

/// Outstanding request. Dropping it, whether completed or abandoned, releases
/// its share of the loading flag.
pub(crate) struct InFlight<'a, T> {
    store: &'a ResourceStore<T>,
    generation: u64,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        let mut inner = self.store.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        if inner.in_flight == 0 {
            inner.amendments.clear();
        }
    }
}

impl<T> ResourceStore<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Mutex::new(StoreInner {
                value: None,
                in_flight: 0,
                generation: 0,
                amendments: Vec::new(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_loading(&self) -> bool {
        self.lock().in_flight > 0
    }

    /// Reads the current value without cloning it.
    pub fn with_value<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.lock().value.as_ref())
    }

    pub fn invalidate_data(&self) {
        let mut inner = self.lock();
        inner.value = None;
        inner.generation += 1;
        inner.amendments.clear();
        debug!(store = self.name, generation = inner.generation, "invalidated");
    }

    /// Edits the cached value in place and replays the edit on responses to
    /// requests that are already outstanding, so a response computed before
    /// the edit cannot roll it back. Returns `false` when nothing is cached.
    pub fn amend(&self, edit: impl Fn(&mut T) + Send + 'static) -> bool {
        let mut inner = self.lock();
        let amended = match inner.value.as_mut() {
            Some(value) => {
                edit(value);
                true
            }
            None => false,
        };
        if inner.in_flight > 0 {
            let generation = inner.generation;
            inner.amendments.push((generation, Box::new(edit)));
        }
        amended
    }

    pub(crate) fn begin(&self) -> InFlight<'_, T> {
        let mut inner = self.lock();
        self.issue(&mut inner)
    }

    /// Issues a request whose parameters depend on the current value, read
    /// under the same lock that assigns the generation.
    pub(crate) fn begin_with<R>(
        &self,
        prepare: impl FnOnce(Option<&T>) -> Result<R, FetchError>,
    ) -> Result<(InFlight<'_, T>, R), FetchError> {
        let mut inner = self.lock();
        let params = prepare(inner.value.as_ref())?;
        Ok((self.issue(&mut inner), params))
    }

    fn issue(&self, inner: &mut StoreInner<T>) -> InFlight<'_, T> {
        inner.generation += 1;
        inner.in_flight += 1;
        debug!(store = self.name, generation = inner.generation, "request issued");
        InFlight {
            store: self,
            generation: inner.generation,
        }
    }

    pub(crate) fn complete<R>(
        &self,
        request: InFlight<'_, T>,
        result: Result<R, FetchError>,
        apply: impl FnOnce(&mut Option<T>, R),
    ) -> Result<FetchOutcome, FetchError> {
        let outcome = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let current = inner.generation == request.generation;

            match result {
                Ok(response) if current => {
                    apply(&mut inner.value, response);
                    if let Some(value) = inner.value.as_mut() {
                        for (since, edit) in &inner.amendments {
                            if *since >= request.generation {
                                edit(value);
                            }
                        }
                    }
                    inner.amendments.clear();
                    Ok(FetchOutcome::Applied)
                }
                Ok(_) => {
                    debug!(
                        store = self.name,
                        generation = request.generation,
                        latest = inner.generation,
                        "discarding superseded response"
                    );
                    Ok(FetchOutcome::Superseded)
                }
                Err(err) if current => {
                    warn!(store = self.name, error = %err, "request failed");
                    Err(err)
                }
                Err(err) => {
                    debug!(
                        store = self.name,
                        generation = request.generation,
                        error = %err,
                        "discarding superseded failure"
                    );
                    Ok(FetchOutcome::Superseded)
                }
            }
        };
        drop(request);
        outcome
    }

    /// Runs `request` as the store's latest generation and applies its
    /// response with `apply` if nothing superseded it meanwhile.
    pub(crate) async fn fetch_with<R, Fut>(
        &self,
        request: Fut,
        apply: impl FnOnce(&mut Option<T>, R),
    ) -> Result<FetchOutcome, FetchError>
    where
        Fut: Future<Output = Result<R, FetchError>>,
    {
        let in_flight = self.begin();
        let result = request.await;
        self.complete(in_flight, result, apply)
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> ResourceStore<T> {
    pub fn snapshot(&self) -> ResourceState<T> {
        let inner = self.lock();
        ResourceState {
            value: inner.value.clone(),
            loading: inner.in_flight > 0,
        }
    }

    pub fn value(&self) -> Option<T> {
        self.lock().value.clone()
    }
}

/// `apply` callback for requests whose response replaces the cached value.
pub(crate) fn replace<T>(slot: &mut Option<T>, response: T) {
    *slot = Some(response);
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
