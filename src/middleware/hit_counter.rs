/// File Server Hit Counter
///
/// Counts requests under a path prefix (the static site at `/app`). The
/// count lives only in process memory and is shown on `/admin/metrics`.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared hit count, registered as `web::Data<FileServerHits>`
#[derive(Debug, Default)]
pub struct FileServerHits {
    hits: AtomicUsize,
}

impl FileServerHits {
    pub fn record(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
    }
}

/// Middleware counting every request whose path is `prefix` or below it
pub struct HitCounter {
    hits: web::Data<FileServerHits>,
    prefix: &'static str,
}

impl HitCounter {
    pub fn new(hits: web::Data<FileServerHits>, prefix: &'static str) -> Self {
        Self { hits, prefix }
    }
}

fn is_under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .map_or(false, |rest| rest.is_empty() || rest.starts_with('/'))
}

impl<S, B> Transform<S, ServiceRequest> for HitCounter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = HitCounterService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(HitCounterService {
            service: Rc::new(service),
            hits: self.hits.clone(),
            prefix: self.prefix,
        }))
    }
}

pub struct HitCounterService<S> {
    service: Rc<S>,
    hits: web::Data<FileServerHits>,
    prefix: &'static str,
}

impl<S, B> Service<ServiceRequest> for HitCounterService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if is_under(req.path(), self.prefix) {
            self.hits.record();
        }

        let service = self.service.clone();
        Box::pin(async move { service.call(req).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matching() {
        assert!(is_under("/app", "/app"));
        assert!(is_under("/app/", "/app"));
        assert!(is_under("/app/assets/logo.png", "/app"));
        assert!(!is_under("/apple", "/app"));
        assert!(!is_under("/api/healthz", "/app"));
    }

    #[test]
    fn test_counter_reset() {
        let hits = FileServerHits::default();
        hits.record();
        hits.record();
        assert_eq!(hits.count(), 2);

        hits.reset();
        assert_eq!(hits.count(), 0);
    }
}
