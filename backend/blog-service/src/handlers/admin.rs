/// Owner dashboard: the caller's own posts
use crate::config::MediaConfig;
use crate::error::Result;
use crate::handlers::{multipart::read_post_form, parse_id};
use crate::middleware::AuthenticatedUser;
use crate::query::{FilterParams, PostQuery};
use crate::services::PostService;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::Local;
use serde_json::json;

/// GET /api/admin/adminBlogs
pub async fn admin_blogs(
    posts: web::Data<PostService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let blocks = posts.list(&PostQuery::newest().owned_by(user.id)).await?;
    Ok(HttpResponse::Ok().json(json!({ "blocks": blocks })))
}

/// GET /api/admin/adminscarchResult/{value}
pub async fn admin_search(
    posts: web::Data<PostService>,
    user: AuthenticatedUser,
    value: web::Path<String>,
) -> Result<HttpResponse> {
    let query = PostQuery::search(value.trim()).owned_by(user.id);
    let blocks = posts.list(&query).await?;
    Ok(HttpResponse::Ok().json(json!({ "blocks": blocks })))
}

/// GET /api/admin/onFilterChange
pub async fn admin_filter(
    posts: web::Data<PostService>,
    user: AuthenticatedUser,
    params: web::Query<FilterParams>,
) -> Result<HttpResponse> {
    let query = PostQuery::from_filter(&params, &Local::now())?.owned_by(user.id);
    let blocks = posts.list(&query).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "blocks": blocks })))
}

/// GET /api/admin/fetchBlogById/{id}
pub async fn fetch_blog_by_id(
    posts: web::Data<PostService>,
    user: AuthenticatedUser,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let view = posts.get_for_edit(parse_id(&id)?, &user).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// PUT /api/admin/updateBLogs/{id}
pub async fn update_blog(
    posts: web::Data<PostService>,
    media: web::Data<MediaConfig>,
    user: AuthenticatedUser,
    id: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let post_id = parse_id(&id)?;
    let form = read_post_form(payload, media.max_file_bytes).await?;
    let post = posts.update(post_id, &user, form).await?;

    Ok(HttpResponse::Created().json(json!({ "success": true, "data": post })))
}

/// DELETE /api/admin/deleteBlog/{id}
pub async fn delete_blog(
    posts: web::Data<PostService>,
    user: AuthenticatedUser,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    posts.delete(parse_id(&id)?, &user).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Blog deleted successfully" })))
}
