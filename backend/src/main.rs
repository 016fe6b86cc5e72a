use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tokio::sync::{watch, RwLock};
use tracing::{info, warn, Level};

use plexguard::config::AppConfig;
use plexguard::database::{Database, DatabaseConfig};
use plexguard::error::AppError;
use plexguard::middleware::{AuthMiddleware, RateLimitMiddleware, RequestTimingMiddleware, SecurityHeaders};
use plexguard::repositories::Repositories;
use plexguard::services::upstream::SessionSnapshot;
use plexguard::services::{
    ConfigStore, DeviceRegistry, EventBus, PollScheduler, SessionHistoryWriter, SessionOrchestrator, UpstreamClient, UpstreamConfig,
};
use plexguard::state::AppState;
use plexguard::utils::JwtService;
use plexguard::handlers;
use plexguard_shared::{CoreEvent, PrincipalRole};

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::from_env()?;
    info!(host = %config.host, port = config.port, "starting plexguard");

    let database = Database::new(DatabaseConfig::from_url(config.database_url.clone())).await?;
    database.migrate().await?;

    let pool = Arc::new(database.pool().clone());
    let repositories = Repositories::new(pool);

    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret)?);

    let config_store = Arc::new(ConfigStore::new(repositories.settings.clone()));

    let upstream = Arc::new(UpstreamClient::new(UpstreamConfig {
        host: config.plex_server_ip.clone(),
        port: config.plex_server_port,
        token: config.plex_token.clone(),
        use_ssl: config.use_ssl,
        ignore_ssl_errors: config.ignore_ssl_errors,
        timeout: Duration::from_secs(plexguard_shared::DEFAULT_UPSTREAM_TIMEOUT_SECS),
    })?);

    let registry = Arc::new(DeviceRegistry::new(repositories.devices.clone(), repositories.user_preferences.clone(), config_store.clone()));
    let history = Arc::new(SessionHistoryWriter::new(repositories.session_history.clone()));
    let event_bus = EventBus::new();

    event_bus
        .subscribe(|event: &CoreEvent| {
            match event {
                CoreEvent::NewDevice { user_id, device_identifier, .. } => {
                    info!(user_id, device_identifier, "new device observed")
                }
                CoreEvent::LocationChange { user_id, device_identifier, old_ip, new_ip, .. } => {
                    info!(user_id, device_identifier, old_ip, new_ip, "device location changed")
                }
                CoreEvent::ReturnedDevice { user_id, device_identifier, inactive_for_hours, .. } => {
                    info!(user_id, device_identifier, inactive_for_hours, "device returned from inactivity")
                }
                CoreEvent::DeviceNoteSubmitted { user_id, device_identifier, .. } => {
                    info!(user_id, device_identifier, "device note submitted")
                }
                CoreEvent::StreamBlocked { user_id, device_identifier, stop_code, session_key, ip, .. } => {
                    warn!(user_id, device_identifier, stop_code, session_key, ip, "stream blocked")
                }
            }
            Ok(())
        })
        .await;

    let latest_snapshot = Arc::new(RwLock::new(SessionSnapshot::default()));

    let orchestrator = Arc::new(SessionOrchestrator::new(
        upstream.clone(),
        registry.clone(),
        history.clone(),
        config_store.clone(),
        repositories.time_rules.clone(),
        repositories.user_preferences.clone(),
        event_bus.clone(),
        latest_snapshot.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = PollScheduler::new(orchestrator, config_store.clone());
    let poll_task = tokio::spawn(scheduler.run(shutdown_rx));

    let cleanup_registry = registry.clone();
    let mut cleanup_shutdown = shutdown_tx.subscribe();
    let cleanup_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(24 * 60 * 60));
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match cleanup_registry.cleanup_inactive().await {
                        Ok(deleted) if deleted > 0 => info!(deleted, "swept inactive devices"),
                        Ok(_) => {}
                        Err(error) => warn!(%error, "inactive device cleanup sweep failed"),
                    }
                }
                _ = cleanup_shutdown.changed() => {
                    if *cleanup_shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    });

    let app_state = web::Data::new(AppState {
        database: database.clone(),
        repositories,
        registry,
        config: config_store,
        event_bus,
        upstream,
        history,
        jwt: jwt_service.clone(),
        latest_snapshot,
    });

    let cors_origin = config.cors_allowed_origin.clone();
    let bind_addr = format!("{}:{}", config.host, config.port);

    let server = HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default().allowed_origin(origin).allow_any_method().allow_any_header(),
            None => Cors::default().allow_any_origin().allow_any_method().allow_any_header(),
        };

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(SecurityHeaders::new())
            .wrap(RequestTimingMiddleware::new())
            .wrap(RateLimitMiddleware::new(600, 60))
            .service(web::scope("/health").route("", web::get().to(handlers::health::health)).route("/ready", web::get().to(handlers::health::health_ready)))
            .service(
                web::scope("/api/v1")
                    .service(
                        web::scope("")
                            .wrap(AuthMiddleware::new((*jwt_service).clone()).require_role(PrincipalRole::Admin))
                            .route("/sessions", web::get().to(handlers::sessions::list_sessions))
                            .route("/sessions/{id}/terminate", web::post().to(handlers::sessions::terminate_session))
                            .route("/users", web::get().to(handlers::users::list_users))
                            .route("/users/{user_id}/preference", web::post().to(handlers::users::update_preference))
                            .route("/users/{user_id}/ip-policy", web::post().to(handlers::users::update_ip_policy))
                            .route("/users/{user_id}/concurrent-stream-limit", web::post().to(handlers::users::update_concurrent_limit))
                            .route("/users/{user_id}/hide", web::post().to(handlers::users::hide_user))
                            .route("/users/{user_id}/show", web::post().to(handlers::users::show_user))
                            .route("/users/{user_id}/rules", web::get().to(handlers::rules::list_rules))
                            .route("/users/{user_id}/rules", web::post().to(handlers::rules::create_rule))
                            .route("/rules/{id}", web::put().to(handlers::rules::update_rule))
                            .route("/rules/{id}", web::delete().to(handlers::rules::delete_rule))
                            .route("/devices", web::get().to(handlers::devices::list_devices))
                            .route("/devices/{id}", web::patch().to(handlers::devices::update_device))
                            .route("/devices/{id}/temp-access", web::post().to(handlers::devices::grant_temp_access))
                            .route("/devices/{id}/temp-access", web::delete().to(handlers::devices::revoke_temp_access))
                            .route("/devices/{id}/note/read", web::post().to(handlers::devices::mark_note_read))
                            .route("/settings", web::get().to(handlers::settings::list_settings))
                            .route("/settings/{key}", web::patch().to(handlers::settings::update_setting)),
                    )
                    .service(
                        web::scope("/user-portal")
                            .wrap(AuthMiddleware::new((*jwt_service).clone()).require_role(PrincipalRole::PortalUser))
                            .route("/devices", web::get().to(handlers::portal::list_my_devices))
                            .route("/rules", web::get().to(handlers::portal::list_my_rules))
                            .route("/settings", web::get().to(handlers::portal::list_public_settings))
                            .route("/devices/{id}/request", web::post().to(handlers::portal::submit_device_note)),
                    ),
            )
    })
    .bind(&bind_addr)?
    .run();

    tokio::select! {
        result = server => {
            result.map_err(AppError::from)?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = poll_task.await;
    let _ = cleanup_task.await;
    database.close().await;

    Ok(())
}
