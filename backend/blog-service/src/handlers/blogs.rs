/// Public feed, reactions and reviews
use crate::config::MediaConfig;
use crate::error::{AppError, Result};
use crate::handlers::{multipart::read_post_form, parse_id};
use crate::middleware::AuthenticatedUser;
use crate::query::{FilterParams, PostQuery};
use crate::services::reactions::{self, Reaction};
use crate::services::reviews::{self, ReviewRequest};
use crate::services::PostService;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    pub id: Uuid,
    #[serde(default)]
    pub likeordislike: String,
}

#[derive(Debug, Deserialize)]
pub struct FetchReviewRequest {
    pub id: Option<Uuid>,
}

/// POST /api/blocks/create
pub async fn create_blog(
    posts: web::Data<PostService>,
    media: web::Data<MediaConfig>,
    user: AuthenticatedUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = read_post_form(payload, media.max_file_bytes).await?;
    let post = posts.create(&user, form).await?;

    Ok(HttpResponse::Created().json(json!({ "success": true, "data": post })))
}

/// GET /api/blocks/fetchBlogs
pub async fn fetch_blogs(posts: web::Data<PostService>) -> Result<HttpResponse> {
    let blocks = posts.list(&PostQuery::newest()).await?;
    Ok(HttpResponse::Ok().json(json!({ "blocks": blocks })))
}

/// GET /api/blocks/getSearchResult/{value}
pub async fn search_blogs(
    posts: web::Data<PostService>,
    value: web::Path<String>,
) -> Result<HttpResponse> {
    let blocks = posts.list(&PostQuery::search(value.trim())).await?;
    Ok(HttpResponse::Ok().json(json!({ "blocks": blocks })))
}

/// GET /api/blocks/onFilterChange
pub async fn filter_blogs(
    posts: web::Data<PostService>,
    params: web::Query<FilterParams>,
) -> Result<HttpResponse> {
    let query = PostQuery::from_filter(&params, &Local::now())?;
    let blocks = posts.list(&query).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "blocks": blocks })))
}

/// GET /api/blocks/getPeosonalDetails/{id}
pub async fn blog_details(
    posts: web::Data<PostService>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&id)?;

    match posts.get(post_id).await {
        Ok(post) => Ok(HttpResponse::Ok().json(json!({
            "message": "Blog found",
            "success": true,
            "data": post,
        }))),
        Err(AppError::NotFound(message)) => Ok(HttpResponse::NotFound().json(json!({
            "message": message,
            "success": false,
        }))),
        Err(e) => Err(e),
    }
}

/// PUT /api/blocks/hendleLikeDislike
pub async fn handle_reaction(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    body: web::Json<ReactionRequest>,
) -> Result<HttpResponse> {
    let reaction: Reaction = body.likeordislike.parse()?;
    let counts = reactions::toggle(pool.get_ref(), body.id, user.id, reaction).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Reaction updated",
        "likes": counts.likes,
        "dislikes": counts.dislikes,
    })))
}

/// POST /api/blocks/handleReview
pub async fn handle_review(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    body: web::Json<ReviewRequest>,
) -> Result<HttpResponse> {
    reviews::submit(pool.get_ref(), &user, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "message": "Review submitted successfully" })))
}

/// PUT /api/blocks/fetchReview
pub async fn fetch_reviews(
    pool: web::Data<PgPool>,
    body: web::Json<FetchReviewRequest>,
) -> Result<HttpResponse> {
    let post_id = body
        .id
        .ok_or_else(|| AppError::Validation("Post ID is required".into()))?;
    let reviews = reviews::list(pool.get_ref(), post_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "reviews": reviews })))
}
