use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::Error;
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    time::Instant,
};
use tracing::{debug, error, warn};

const SLOW_REQUEST_MS: u128 = 1000;

/// Logs method, path, status and latency for every request; escalates to
/// `warn!` past [`SLOW_REQUEST_MS`] and to `error!` on 5xx responses.
pub struct RequestTimingMiddleware;

impl RequestTimingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestTimingMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestTimingMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestTimingMiddlewareService { service: Rc::new(service) }))
    }
}

pub struct RequestTimingMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestTimingMiddlewareService<S>
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
        let service = Rc::clone(&self.service);
        let method = req.method().to_string();
        let path = req.path().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let response = service.call(req).await?;
            let elapsed = start.elapsed();
            let status = response.status().as_u16();

            if status >= 500 {
                error!(%method, %path, status, elapsed_ms = elapsed.as_millis() as u64, "request failed");
            } else if elapsed.as_millis() > SLOW_REQUEST_MS {
                warn!(%method, %path, status, elapsed_ms = elapsed.as_millis() as u64, "slow request");
            } else {
                debug!(%method, %path, status, elapsed_ms = elapsed.as_millis() as u64, "request completed");
            }

            Ok(response)
        })
    }
}
