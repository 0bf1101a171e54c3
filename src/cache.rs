use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

/// Upper bound on stored pages; the oldest page goes first once it is reached.
pub const MAX_PAGES: usize = 1024;

#[derive(Debug)]
struct CachedPage {
    body: Value,
    stored_at: Instant,
    seq: u64,
}

/// Page data of dashboard GET routes, keyed by `path?query`.
///
/// Mutations call [`RouteCache::revalidate`] for every page whose data they
/// touched, so the next read goes back to the database. Every revalidation
/// bumps a generation counter; a fill that started under an older generation
/// is discarded by [`RouteCache::put`].
#[derive(Clone)]
pub struct RouteCache {
    pages: Arc<RwLock<HashMap<String, CachedPage>>>,
    generation: Arc<AtomicU64>,
    inserted: Arc<AtomicU64>,
    ttl: Duration,
}

pub fn cache_key(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{path}?{q}"),
        _ => path.to_string(),
    }
}

fn key_path(key: &str) -> &str {
    key.split_once('?').map_or(key, |(path, _)| path)
}

impl RouteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pages: Arc::new(RwLock::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
            inserted: Arc::new(AtomicU64::new(0)),
            ttl,
        }
    }

    /// Generation to hand back to [`RouteCache::put`]; read it before loading.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        let pages = self.pages.read().await;
        pages
            .get(key)
            .filter(|page| page.stored_at.elapsed() < self.ttl)
            .map(|page| page.body.clone())
    }

    /// Stores `body` unless a revalidation ran since `generation` was read.
    /// Expired pages are pruned on the way.
    pub async fn put(&self, key: String, body: Value, generation: u64) {
        let mut pages = self.pages.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(key = %key, "page data loaded before a revalidation; not stored");
            return;
        }

        let ttl = self.ttl;
        pages.retain(|_, page| page.stored_at.elapsed() < ttl);
        if pages.len() >= MAX_PAGES && !pages.contains_key(&key) {
            let oldest = pages
                .iter()
                .min_by_key(|(_, page)| page.seq)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                pages.remove(&oldest);
            }
        }

        pages.insert(
            key,
            CachedPage {
                body,
                stored_at: Instant::now(),
                seq: self.inserted.fetch_add(1, Ordering::Relaxed),
            },
        );
    }

    /// Drops `path` and everything below it, whatever the query string.
    pub async fn revalidate(&self, path: &str) {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let mut pages = self.pages.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        let before = pages.len();
        pages.retain(|key, _| {
            let p = key_path(key);
            p != path && !p.starts_with(&prefix)
        });
        debug!(path, dropped = before - pages.len(), "revalidated");
    }

    /// Drops exactly `path`, whatever the query string.
    pub async fn revalidate_page(&self, path: &str) {
        let mut pages = self.pages.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        pages.retain(|key, _| key_path(key) != path);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.pages.read().await.len()
    }
}
