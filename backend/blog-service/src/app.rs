/// Route table and shared application state
use crate::config::MediaConfig;
use crate::error::AppError;
use crate::handlers::{admin, auth, blogs, health};
use crate::metrics;
use crate::middleware::{CookieSettings, SessionAuth};
use crate::services::{AuthService, EmailService, MediaStore, PostService};
use actix_web::web;
use sqlx::PgPool;
use std::sync::Arc;

/// Upper bound for JSON request bodies
pub const JSON_LIMIT_BYTES: usize = 256 * 1024;

/// Everything handlers pull out of `web::Data`
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub posts: web::Data<PostService>,
    pub auth: web::Data<AuthService>,
    pub cookies: CookieSettings,
    pub media: MediaConfig,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        media_store: Arc<dyn MediaStore>,
        email: EmailService,
        cookies: CookieSettings,
        media: MediaConfig,
        otp_ttl_minutes: i64,
    ) -> Self {
        Self {
            posts: web::Data::new(PostService::new(pool.clone(), media_store)),
            auth: web::Data::new(AuthService::new(pool.clone(), email, otp_ttl_minutes)),
            pool,
            cookies,
            media,
        }
    }
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(|err, _req| AppError::BadRequest(format!("Invalid JSON body: {err}")).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(format!("Invalid query string: {err}")).into())
}

/// Register state and every route. Reads are public; writes and the
/// dashboard go through `SessionAuth`.
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    let session = || SessionAuth::new(state.cookies.clone());

    cfg.app_data(web::Data::new(state.pool.clone()))
        .app_data(state.posts.clone())
        .app_data(state.auth.clone())
        .app_data(web::Data::new(state.cookies.clone()))
        .app_data(web::Data::new(state.media.clone()))
        .app_data(json_config())
        .app_data(query_config())
        .route("/health", web::get().to(health::health_check))
        .route("/health/ready", web::get().to(health::readiness_check))
        .route("/metrics", web::get().to(metrics::serve_metrics))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health::health_check))
                .service(
                    web::scope("/blocks")
                        .service(
                            web::resource("/create")
                                .wrap(session())
                                .route(web::post().to(blogs::create_blog)),
                        )
                        .route("/fetchBlogs", web::get().to(blogs::fetch_blogs))
                        .route("/getSearchResult/{value}", web::get().to(blogs::search_blogs))
                        // Legacy spelling still used by deployed clients
                        .route("/getscarchResult/{value}", web::get().to(blogs::search_blogs))
                        .route("/onFilterChange", web::get().to(blogs::filter_blogs))
                        .route("/getPeosonalDetails/{id}", web::get().to(blogs::blog_details))
                        .service(
                            web::resource("/hendleLikeDislike")
                                .wrap(session())
                                .route(web::put().to(blogs::handle_reaction)),
                        )
                        .service(
                            web::resource("/handleReview")
                                .wrap(session())
                                .route(web::post().to(blogs::handle_review)),
                        )
                        .route("/fetchReview", web::put().to(blogs::fetch_reviews)),
                )
                .service(
                    web::scope("/admin")
                        .wrap(session())
                        .route("/adminBlogs", web::get().to(admin::admin_blogs))
                        .route("/adminscarchResult/{value}", web::get().to(admin::admin_search))
                        .route("/onFilterChange", web::get().to(admin::admin_filter))
                        .route("/fetchBlogById/{id}", web::get().to(admin::fetch_blog_by_id))
                        .route("/updateBLogs/{id}", web::put().to(admin::update_blog))
                        .route("/deleteBlog/{id}", web::delete().to(admin::delete_blog)),
                )
                .service(
                    web::scope("/Auth")
                        .route("/otp", web::post().to(auth::request_otp))
                        .route("/verify-otp", web::post().to(auth::verify_otp))
                        .route("/signin", web::post().to(auth::sign_in))
                        .service(
                            web::resource("/signOut")
                                .wrap(session())
                                .route(web::post().to(auth::sign_out)),
                        )
                        .service(
                            web::resource("/checkLogin")
                                .wrap(session())
                                .route(web::get().to(auth::check_login)),
                        ),
                ),
        );
}
