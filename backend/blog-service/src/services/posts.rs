/// Post business logic: validation, image resolution and owner checks
use crate::db::post_repo;
use crate::error::{AppError, Result};
use crate::metrics::{ORPHANED_MEDIA_TOTAL, POST_WRITES_TOTAL};
use crate::middleware::AuthenticatedUser;
use crate::models::into_documents;
use crate::query::PostQuery;
use crate::services::media::{MediaStore, StoredObject};
use content_blocks::{BlockBody, BlockId, BlockKind, Category, ContentBlock, PostDocument, SubmittedBlock};
use futures::future::join_all;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Image file received with a create/update request
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Decoded create/update request
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub category: String,
    pub content: Vec<SubmittedBlock>,
    pub files: Vec<ImageUpload>,
}

/// Content with every pending image resolved, plus the objects uploaded for it
#[derive(Debug)]
pub struct ResolvedContent {
    pub blocks: Vec<ContentBlock>,
    pub staged: Vec<StoredObject>,
}

/// What the owner's editor loads: category, content and image URLs by block id
#[derive(Debug, Serialize)]
pub struct EditView {
    #[serde(rename = "type")]
    pub category: Category,
    pub content: Vec<ContentBlock>,
    pub previews: BTreeMap<BlockId, String>,
}

impl From<PostDocument> for EditView {
    fn from(post: PostDocument) -> Self {
        let previews = post
            .content
            .iter()
            .filter_map(|block| match &block.body {
                BlockBody::Image { url } => Some((block.id.clone(), url.clone())),
                _ => None,
            })
            .collect();

        Self {
            category: post.block_type,
            content: post.content,
            previews,
        }
    }
}

/// Check a form before anything is uploaded. Returns the parsed category.
pub fn validate_form(form: &PostForm) -> Result<Category> {
    let category: Category = form
        .category
        .parse()
        .map_err(|e: content_blocks::UnknownCategory| AppError::Validation(e.to_string()))?;

    let first = form.content.first().ok_or_else(|| {
        AppError::Validation("Content must contain at least a title block".into())
    })?;
    if first.kind != BlockKind::Title {
        return Err(AppError::Validation("The first block must be a title".into()));
    }

    let mut seen = HashSet::new();
    for block in &form.content {
        if !seen.insert(&block.id) {
            return Err(AppError::Validation(format!("Duplicate block id '{}'", block.id)));
        }
        if block.kind != BlockKind::Image && block.value.is_none() {
            return Err(AppError::Validation(format!(
                "{} block '{}' has no value",
                block.kind, block.id
            )));
        }
    }

    let pending = form.content.iter().filter(|b| b.is_pending_image()).count();
    if form.files.len() > pending {
        return Err(AppError::BadRequest(format!(
            "Received {} image files but only {} image blocks are waiting for upload",
            form.files.len(),
            pending
        )));
    }

    Ok(category)
}

enum Slot {
    Ready(ContentBlock),
    Pending(BlockId),
}

/// Pair each file with the pending image block it fills.
///
/// Files are matched by part filename when every file names a distinct pending
/// block id. When no filename names one, the i-th file fills the i-th pending
/// block in content order. A mix of the two is rejected.
fn assign_files(pending: &[BlockId], files: &[ImageUpload]) -> Result<Vec<(BlockId, bool)>> {
    if files.len() > pending.len() {
        return Err(AppError::BadRequest(format!(
            "Received {} image files but only {} image blocks are waiting for upload",
            files.len(),
            pending.len()
        )));
    }

    let named: Vec<Option<&BlockId>> = files
        .iter()
        .map(|file| pending.iter().find(|id| id.as_str() == file.file_name))
        .collect();
    let matched = named.iter().filter(|id| id.is_some()).count();

    if matched == 0 {
        return Ok(pending.iter().take(files.len()).map(|id| (id.clone(), false)).collect());
    }
    if matched < files.len() {
        return Err(AppError::BadRequest(
            "Image files must all be named by block id, or none of them".into(),
        ));
    }

    let mut seen = HashSet::new();
    named
        .into_iter()
        .flatten()
        .map(|id| {
            if seen.insert(id) {
                Ok((id.clone(), true))
            } else {
                Err(AppError::BadRequest(format!("More than one image file for block '{id}'")))
            }
        })
        .collect()
}

/// Object name for an upload; id-named parts get the block id plus an extension
fn upload_name(block_id: &BlockId, by_id: bool, file: &ImageUpload) -> String {
    if !by_id {
        return file.file_name.clone();
    }
    match file.content_type.split_once('/') {
        Some((_, ext)) if !ext.is_empty() => format!("{block_id}.{ext}"),
        _ => block_id.to_string(),
    }
}

/// Upload `files` and substitute their URLs into the pending image blocks.
///
/// Files are paired with blocks by [`assign_files`]. Pending blocks left
/// without a file are dropped. Uploads run concurrently; if any fails,
/// objects that did upload are reported as orphaned.
pub async fn resolve_images(
    media: &dyn MediaStore,
    content: Vec<SubmittedBlock>,
    files: Vec<ImageUpload>,
) -> Result<ResolvedContent> {
    let slots = content
        .into_iter()
        .map(|block| {
            if block.is_pending_image() {
                Ok(Slot::Pending(block.id))
            } else {
                ContentBlock::try_from(block)
                    .map(Slot::Ready)
                    .map_err(|e| AppError::Validation(e.to_string()))
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let pending: Vec<BlockId> = slots
        .iter()
        .filter_map(|slot| match slot {
            Slot::Pending(id) => Some(id.clone()),
            Slot::Ready(_) => None,
        })
        .collect();
    let targets = assign_files(&pending, &files)?;

    let uploads = files.into_iter().zip(targets).map(|(file, (block_id, by_id))| async move {
        let name = upload_name(&block_id, by_id, &file);
        media
            .upload(&name, &file.content_type, file.bytes)
            .await
            .map(|object| (block_id, object))
    });
    let results = join_all(uploads).await;

    let mut urls = HashMap::with_capacity(results.len());
    let mut staged = Vec::with_capacity(results.len());
    let mut failure = None;
    for result in results {
        match result {
            Ok((block_id, object)) => {
                urls.insert(block_id, object.url.clone());
                staged.push(object);
            }
            Err(e) if failure.is_none() => failure = Some(e),
            Err(e) => warn!(error = %e, "additional image upload failed"),
        }
    }
    if let Some(err) = failure {
        report_orphans(&staged, "upload");
        return Err(err);
    }

    let mut blocks = Vec::with_capacity(slots.len());
    for slot in slots {
        match slot {
            Slot::Ready(block) => blocks.push(block),
            Slot::Pending(id) => match urls.remove(&id) {
                Some(url) => blocks.push(ContentBlock::new(id, BlockBody::Image { url })),
                None => debug!(block_id = %id, "image block without a file dropped"),
            },
        }
    }

    Ok(ResolvedContent { blocks, staged })
}

/// Staged uploads are left in place for later collection, never deleted here
fn report_orphans(objects: &[StoredObject], stage: &str) {
    for object in objects {
        warn!(key = %object.key, stage, "uploaded image is not referenced by any post");
    }
    ORPHANED_MEDIA_TOTAL.inc_by(objects.len() as u64);
}

pub struct PostService {
    pool: PgPool,
    media: Arc<dyn MediaStore>,
}

impl PostService {
    pub fn new(pool: PgPool, media: Arc<dyn MediaStore>) -> Self {
        Self { pool, media }
    }

    pub async fn list(&self, query: &PostQuery) -> Result<Vec<PostDocument>> {
        let rows = post_repo::list(&self.pool, query).await?;
        into_documents(rows)
    }

    pub async fn get(&self, post_id: Uuid) -> Result<PostDocument> {
        post_repo::find_by_id(&self.pool, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Blog not found".into()))?
            .try_into()
    }

    /// Post as loaded into the owner's editor
    pub async fn get_for_edit(&self, post_id: Uuid, caller: &AuthenticatedUser) -> Result<EditView> {
        let post = self.get(post_id).await?;
        if post.uploaded_by.id != caller.id {
            return Err(AppError::Forbidden("You can only edit your own blogs".into()));
        }
        Ok(post.into())
    }

    pub async fn create(&self, author: &AuthenticatedUser, form: PostForm) -> Result<PostDocument> {
        let category = validate_form(&form)?;
        let resolved = resolve_images(self.media.as_ref(), form.content, form.files).await?;

        match post_repo::insert(&self.pool, author.id, category, &resolved.blocks).await {
            Ok(row) => {
                POST_WRITES_TOTAL.with_label_values(&["create"]).inc();
                info!(
                    post_id = %row.id,
                    user_id = %author.id,
                    images = resolved.staged.len(),
                    "post created"
                );
                row.try_into()
            }
            Err(e) => {
                report_orphans(&resolved.staged, "create");
                Err(e.into())
            }
        }
    }

    /// Replace category and content of a post owned by `caller`
    pub async fn update(
        &self,
        post_id: Uuid,
        caller: &AuthenticatedUser,
        form: PostForm,
    ) -> Result<PostDocument> {
        self.ensure_owner(post_id, caller, "edit").await?;
        let category = validate_form(&form)?;
        let resolved = resolve_images(self.media.as_ref(), form.content, form.files).await?;

        match post_repo::replace_content(&self.pool, post_id, caller.id, category, &resolved.blocks)
            .await
        {
            Ok(Some(row)) => {
                POST_WRITES_TOTAL.with_label_values(&["update"]).inc();
                info!(%post_id, user_id = %caller.id, "post updated");
                row.try_into()
            }
            Ok(None) => {
                report_orphans(&resolved.staged, "update");
                Err(AppError::NotFound("Blog not found".into()))
            }
            Err(e) => {
                report_orphans(&resolved.staged, "update");
                Err(e.into())
            }
        }
    }

    /// Delete a post owned by `caller` together with its comments
    pub async fn delete(&self, post_id: Uuid, caller: &AuthenticatedUser) -> Result<()> {
        self.ensure_owner(post_id, caller, "delete").await?;

        if post_repo::delete_with_comments(&self.pool, post_id).await? == 0 {
            return Err(AppError::NotFound("Blog not found".into()));
        }
        info!(%post_id, user_id = %caller.id, "post deleted");
        Ok(())
    }

    async fn ensure_owner(&self, post_id: Uuid, caller: &AuthenticatedUser, action: &str) -> Result<()> {
        match post_repo::find_owner(&self.pool, post_id).await? {
            None => Err(AppError::NotFound("Blog not found".into())),
            Some(owner) if owner != caller.id => Err(AppError::Forbidden(format!(
                "You can only {action} your own blogs"
            ))),
            Some(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::media::MockMediaStore;
    use content_blocks::BlockKind;

    fn block(id: &str, kind: BlockKind, value: Option<&str>) -> SubmittedBlock {
        SubmittedBlock {
            id: BlockId::new(id),
            kind,
            value: value.map(str::to_string),
        }
    }

    fn file(name: &str) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    fn form(content: Vec<SubmittedBlock>, files: Vec<ImageUpload>) -> PostForm {
        PostForm {
            category: "tech".to_string(),
            content,
            files,
        }
    }

    fn echo_store() -> MockMediaStore {
        let mut media = MockMediaStore::new();
        media.expect_upload().returning(|name, _, _| {
            Ok(StoredObject {
                key: format!("blocks/{name}"),
                url: format!("https://cdn.test/blocks/{name}"),
            })
        });
        media
    }

    #[test]
    fn test_validate_requires_leading_title() {
        let err = validate_form(&form(vec![block("a", BlockKind::Text, Some("x"))], vec![]))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert!(validate_form(&form(vec![], vec![])).is_err());
        assert_eq!(
            validate_form(&form(vec![block("t", BlockKind::Title, Some("Hi"))], vec![])).unwrap(),
            Category::Tech
        );
    }

    #[test]
    fn test_validate_rejects_unknown_category_and_duplicate_ids() {
        let mut bad = form(vec![block("t", BlockKind::Title, Some("Hi"))], vec![]);
        bad.category = "gossip".into();
        assert!(validate_form(&bad).is_err());

        let dup = form(
            vec![
                block("t", BlockKind::Title, Some("Hi")),
                block("t", BlockKind::Text, Some("again")),
            ],
            vec![],
        );
        assert!(validate_form(&dup).is_err());
    }

    #[test]
    fn test_validate_rejects_surplus_files() {
        let content = vec![
            block("t", BlockKind::Title, Some("Hi")),
            block("i", BlockKind::Image, None),
        ];
        assert!(validate_form(&form(content.clone(), vec![file("a.png")])).is_ok());

        let err = validate_form(&form(content, vec![file("a.png"), file("b.png")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_files_fill_pending_images_in_order() {
        let media = echo_store();
        let content = vec![
            block("t", BlockKind::Title, Some("Trip")),
            block("a", BlockKind::Image, None),
            block("r", BlockKind::Image, Some("https://cdn.test/old.png")),
            block("b", BlockKind::Image, None),
        ];

        let resolved = resolve_images(&media, content, vec![file("first.png"), file("second.png")])
            .await
            .unwrap();

        let urls: Vec<&str> = resolved.blocks.iter().map(|b| b.body.value()).collect();
        assert_eq!(
            urls,
            [
                "Trip",
                "https://cdn.test/blocks/first.png",
                "https://cdn.test/old.png",
                "https://cdn.test/blocks/second.png",
            ]
        );
        assert_eq!(resolved.staged.len(), 2);
    }

    #[tokio::test]
    async fn test_named_file_fills_its_own_block_after_empty_image() {
        let media = echo_store();
        let content = vec![
            block("t", BlockKind::Title, Some("Hi")),
            block("a", BlockKind::Image, None),
            block("x", BlockKind::Text, Some("between")),
            block("b", BlockKind::Image, None),
        ];

        let resolved = resolve_images(&media, content, vec![file("b")]).await.unwrap();
        let blocks: Vec<(&str, &str)> = resolved
            .blocks
            .iter()
            .map(|b| (b.id.as_str(), b.body.value()))
            .collect();
        assert_eq!(
            blocks,
            [
                ("t", "Hi"),
                ("x", "between"),
                ("b", "https://cdn.test/blocks/b.png"),
            ]
        );
    }

    #[tokio::test]
    async fn test_named_files_may_arrive_out_of_order() {
        let media = echo_store();
        let content = vec![
            block("t", BlockKind::Title, Some("Hi")),
            block("a", BlockKind::Image, None),
            block("b", BlockKind::Image, None),
        ];

        let resolved = resolve_images(&media, content, vec![file("b"), file("a")])
            .await
            .unwrap();
        let urls: Vec<&str> = resolved.blocks.iter().skip(1).map(|b| b.body.value()).collect();
        assert_eq!(
            urls,
            ["https://cdn.test/blocks/a.png", "https://cdn.test/blocks/b.png"]
        );
    }

    #[tokio::test]
    async fn test_mixed_or_repeated_file_names_rejected() {
        let mut media = MockMediaStore::new();
        media.expect_upload().never();
        let content = vec![
            block("t", BlockKind::Title, Some("Hi")),
            block("a", BlockKind::Image, None),
            block("b", BlockKind::Image, None),
        ];

        let mixed = resolve_images(&media, content.clone(), vec![file("a"), file("photo.png")]).await;
        assert!(matches!(mixed, Err(AppError::BadRequest(_))));

        let repeated = resolve_images(&media, content, vec![file("a"), file("a")]).await;
        assert!(matches!(repeated, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_pending_image_without_file_is_dropped() {
        let mut media = MockMediaStore::new();
        media.expect_upload().never();
        let content = vec![
            block("t", BlockKind::Title, Some("Hi")),
            block("i", BlockKind::Image, None),
            block("x", BlockKind::Text, Some("after")),
        ];

        let resolved = resolve_images(&media, content, vec![]).await.unwrap();
        let ids: Vec<&str> = resolved.blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["t", "x"]);
    }

    #[tokio::test]
    async fn test_upload_failure_fails_the_write() {
        let mut media = MockMediaStore::new();
        media
            .expect_upload()
            .returning(|_, _, _| Err(AppError::Media("bucket unavailable".into())));
        let content = vec![
            block("t", BlockKind::Title, Some("Hi")),
            block("i", BlockKind::Image, None),
        ];

        let err = resolve_images(&media, content, vec![file("a.png")]).await.unwrap_err();
        assert!(matches!(err, AppError::Media(_)));
    }

    #[test]
    fn test_edit_view_maps_image_previews() {
        let now = chrono::Utc::now();
        let post = PostDocument {
            id: Uuid::new_v4(),
            uploaded_by: content_blocks::Author {
                id: Uuid::new_v4(),
                email: "owner@test.dev".into(),
            },
            block_type: Category::Photo,
            content: vec![
                ContentBlock::new("t", BlockBody::Title("Dunes".into())),
                ContentBlock::new("i", BlockBody::Image { url: "https://cdn.test/d.png".into() }),
            ],
            likes: vec![],
            dislikes: vec![],
            created_at: now,
            updated_at: now,
        };

        let view = EditView::from(post);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["type"], "photo");
        assert_eq!(json["previews"]["i"], "https://cdn.test/d.png");
        assert_eq!(view.previews.len(), 1);
    }
}
