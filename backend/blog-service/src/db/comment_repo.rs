use crate::models::CommentRow;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert(
    pool: &PgPool,
    comment_by: Uuid,
    comment_for: Uuid,
    comment: &str,
    rating: &str,
) -> Result<CommentRow, sqlx::Error> {
    sqlx::query_as::<_, CommentRow>(
        r#"
        WITH c AS (
            INSERT INTO comments (comment_by, comment_for, comment, rating)
            VALUES ($1, $2, $3, $4)
            RETURNING *
        )
        SELECT c.id, c.comment_by, u.email AS author_email, c.comment_for, c.comment,
               c.rating, c.created_at
        FROM c JOIN users u ON u.id = c.comment_by
        "#,
    )
    .bind(comment_by)
    .bind(comment_for)
    .bind(comment)
    .bind(rating)
    .fetch_one(pool)
    .await
}

/// Comments on a post, oldest first
pub async fn list_for_post(pool: &PgPool, post_id: Uuid) -> Result<Vec<CommentRow>, sqlx::Error> {
    sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT c.id, c.comment_by, u.email AS author_email, c.comment_for, c.comment,
               c.rating, c.created_at
        FROM comments c JOIN users u ON u.id = c.comment_by
        WHERE c.comment_for = $1
        ORDER BY c.created_at ASC, c.id ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
}
