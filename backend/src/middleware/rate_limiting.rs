use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpResponse};
use futures_util::future::LocalBoxFuture;
use std::{
    collections::HashMap,
    future::{ready, Ready},
    sync::{Arc, Mutex},
    time::Instant,
};

/// Fixed-window, in-memory rate limiter keyed by client IP. The admin/portal
/// API is low-traffic and single-process, so there is no distributed store
/// behind this - restarting the process resets all counters.
pub struct RateLimitMiddleware {
    max_requests: u32,
    window_secs: u64,
    counts: Arc<Mutex<HashMap<String, (u32, Instant)>>>,
}

impl RateLimitMiddleware {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
            counts: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service,
            max_requests: self.max_requests,
            window_secs: self.window_secs,
            counts: self.counts.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: S,
    max_requests: u32,
    window_secs: u64,
    counts: Arc<Mutex<HashMap<String, (u32, Instant)>>>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let max_requests = self.max_requests;
        let window_secs = self.window_secs;
        let counts = self.counts.clone();
        let client_id = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        let limited = {
            let mut counts = counts.lock().unwrap();
            let now = Instant::now();
            match counts.get_mut(&client_id) {
                Some((count, window_start)) if now.duration_since(*window_start).as_secs() < window_secs => {
                    *count += 1;
                    *count > max_requests
                }
                _ => {
                    counts.insert(client_id.clone(), (1, now));
                    false
                }
            }
        };

        if limited {
            let response = HttpResponse::TooManyRequests().json(serde_json::json!({
                "error": "rate_limit_exceeded",
                "message": format!("maximum {max_requests} requests per {window_secs}s")
            }));
            return Box::pin(async move { Ok(req.into_response(response)) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await })
    }
}
