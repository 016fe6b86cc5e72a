use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use plexguard_shared::PrincipalRole;
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use crate::error::AppError;
use crate::utils::jwt::{Claims, JwtService};

/// Verified principal, attached to a request by [`AuthMiddleware`].
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    pub role: PrincipalRole,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, PrincipalRole::Admin)
    }
}

/// Extractor for handlers that only admins may call.
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin(pub Principal);

impl FromRequest for AuthenticatedAdmin {
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let principal = req
                .extensions()
                .get::<Principal>()
                .cloned()
                .ok_or_else(|| AppError::Internal("principal not found in request".to_string()))?;

            if !principal.is_admin() {
                return Err(AppError::Authorization("administrator role required".to_string()));
            }

            Ok(AuthenticatedAdmin(principal))
        })
    }
}

/// Extractor for handlers any verified principal (admin or portal user) may call.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal(pub Principal);

impl FromRequest for AuthenticatedPrincipal {
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            req.extensions()
                .get::<Principal>()
                .cloned()
                .map(AuthenticatedPrincipal)
                .ok_or_else(|| AppError::Internal("principal not found in request".to_string()))
        })
    }
}

/// Verifies the bearer token on every request in its scope and attaches the
/// resulting [`Principal`] to request extensions. Does not mint tokens - the
/// core only trusts an external auth collaborator's signature.
pub struct AuthMiddleware {
    jwt_service: Rc<JwtService>,
    required_role: Option<PrincipalRole>,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self {
            jwt_service: Rc::new(jwt_service),
            required_role: None,
        }
    }

    pub fn require_role(mut self, role: PrincipalRole) -> Self {
        self.required_role = Some(role);
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            required_role: self.required_role,
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: Rc<JwtService>,
    required_role: Option<PrincipalRole>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
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
        let jwt_service = self.jwt_service.clone();
        let required_role = self.required_role;

        Box::pin(async move {
            let token = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "));

            let token = match token {
                Some(token) => token,
                None => {
                    let response = HttpResponse::Unauthorized().json(serde_json::json!({
                        "error": "missing_token",
                        "message": "Authorization token is required"
                    }));
                    return Ok(req.into_response(response));
                }
            };

            let claims: Claims = match jwt_service.validate_token(token) {
                Ok(claims) => claims,
                Err(e) => {
                    let response = HttpResponse::Unauthorized().json(serde_json::json!({
                        "error": "invalid_token",
                        "message": e.to_string()
                    }));
                    return Ok(req.into_response(response));
                }
            };

            if let Some(required_role) = required_role {
                if !has_required_role(claims.role, required_role) {
                    let response = HttpResponse::Forbidden().json(serde_json::json!({
                        "error": "insufficient_permissions",
                        "message": "insufficient permissions for this operation"
                    }));
                    return Ok(req.into_response(response));
                }
            }

            req.extensions_mut().insert(Principal { id: claims.sub, role: claims.role });

            self.service.call(req).await
        })
    }
}

/// Admins may act as any principal; portal users may only act as themselves.
fn has_required_role(held: PrincipalRole, required: PrincipalRole) -> bool {
    match required {
        PrincipalRole::PortalUser => true,
        PrincipalRole::Admin => matches!(held, PrincipalRole::Admin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_satisfies_either_requirement() {
        assert!(has_required_role(PrincipalRole::Admin, PrincipalRole::Admin));
        assert!(has_required_role(PrincipalRole::Admin, PrincipalRole::PortalUser));
    }

    #[test]
    fn portal_user_cannot_satisfy_admin_requirement() {
        assert!(!has_required_role(PrincipalRole::PortalUser, PrincipalRole::Admin));
        assert!(has_required_role(PrincipalRole::PortalUser, PrincipalRole::PortalUser));
    }
}
