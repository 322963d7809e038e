use crate::models::PostRow;
use crate::query::{PostQuery, POST_SELECT};
use content_blocks::{Category, ContentBlock};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Like/dislike counts after a toggle, plus the caller's resulting membership
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionCounts {
    pub likes: i64,
    pub dislikes: i64,
    pub liked: bool,
    pub disliked: bool,
}

pub async fn list(pool: &PgPool, query: &PostQuery) -> Result<Vec<PostRow>, sqlx::Error> {
    query.build().build_query_as::<PostRow>().fetch_all(pool).await
}

pub async fn find_by_id(pool: &PgPool, post_id: Uuid) -> Result<Option<PostRow>, sqlx::Error> {
    sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} WHERE p.id = $1"))
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_owner(pool: &PgPool, post_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>("SELECT uploaded_by FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert(
    pool: &PgPool,
    author: Uuid,
    category: Category,
    content: &[ContentBlock],
) -> Result<PostRow, sqlx::Error> {
    sqlx::query_as::<_, PostRow>(
        r#"
        WITH p AS (
            INSERT INTO posts (uploaded_by, block_type, content)
            VALUES ($1, $2, $3)
            RETURNING *
        )
        SELECT p.id, p.uploaded_by, u.email AS author_email, p.block_type, p.content,
               p.likes, p.dislikes, p.created_at, p.updated_at
        FROM p JOIN users u ON u.id = p.uploaded_by
        "#,
    )
    .bind(author)
    .bind(category.as_str())
    .bind(Json(content))
    .fetch_one(pool)
    .await
}

/// Replace category and content wholesale. Returns `None` unless the post
/// exists and belongs to `owner`.
pub async fn replace_content(
    pool: &PgPool,
    post_id: Uuid,
    owner: Uuid,
    category: Category,
    content: &[ContentBlock],
) -> Result<Option<PostRow>, sqlx::Error> {
    sqlx::query_as::<_, PostRow>(
        r#"
        WITH p AS (
            UPDATE posts
            SET block_type = $3, content = $4, updated_at = NOW()
            WHERE id = $1 AND uploaded_by = $2
            RETURNING *
        )
        SELECT p.id, p.uploaded_by, u.email AS author_email, p.block_type, p.content,
               p.likes, p.dislikes, p.created_at, p.updated_at
        FROM p JOIN users u ON u.id = p.uploaded_by
        "#,
    )
    .bind(post_id)
    .bind(owner)
    .bind(category.as_str())
    .bind(Json(content))
    .fetch_optional(pool)
    .await
}

/// Toggle a reaction in a single statement.
///
/// The user is removed from both sets and re-added to the requested one only
/// if they were not already in it. The row lock taken by UPDATE serialises
/// concurrent toggles on the same post.
pub async fn toggle_reaction(
    pool: &PgPool,
    post_id: Uuid,
    user_id: Uuid,
    reaction: &str,
) -> Result<Option<ReactionCounts>, sqlx::Error> {
    let row = sqlx::query_as::<_, (i64, i64, bool, bool)>(
        r#"
        UPDATE posts
        SET likes = CASE
                WHEN $3 = 'like' AND NOT ($2 = ANY(likes))
                    THEN array_append(array_remove(likes, $2), $2)
                ELSE array_remove(likes, $2)
            END,
            dislikes = CASE
                WHEN $3 = 'dislike' AND NOT ($2 = ANY(dislikes))
                    THEN array_append(array_remove(dislikes, $2), $2)
                ELSE array_remove(dislikes, $2)
            END
        WHERE id = $1
        RETURNING cardinality(likes)::BIGINT,
                  cardinality(dislikes)::BIGINT,
                  $2 = ANY(likes),
                  $2 = ANY(dislikes)
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .bind(reaction)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(likes, dislikes, liked, disliked)| ReactionCounts {
        likes,
        dislikes,
        liked,
        disliked,
    }))
}

/// Delete a post and every comment on it in one transaction
pub async fn delete_with_comments(pool: &PgPool, post_id: Uuid) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let comments = sqlx::query("DELETE FROM comments WHERE comment_for = $1")
        .bind(post_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let posts = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    tracing::debug!(%post_id, comments, "post deleted");
    Ok(posts)
}
