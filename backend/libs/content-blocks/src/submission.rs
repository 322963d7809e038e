//! Turns a draft into the wire payload of a create/update request.

use crate::block::{BlockId, BlockKind, SubmittedBlock};
use crate::category::Category;
use crate::editor::{Draft, ImageSlot};
use crate::preview::PreviewStore;
use crate::{CONTENT_FIELD, IMAGES_FIELD, TYPE_FIELD};
use reqwest::multipart::{Form, Part};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AssembleError {
    #[error("choose a category before submitting")]
    MissingCategory,

    #[error("add a title before submitting")]
    Empty,
}

/// File to upload for the image block `block_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub block_id: BlockId,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Wire-ready post: ordered content plus the files its pending images consume
///
/// Each file names its block through `block_id`; image blocks with neither a
/// value nor a file are skipped by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub category: Category,
    pub content: Vec<SubmittedBlock>,
    pub files: Vec<PendingUpload>,
}

impl<P: PreviewStore> Draft<P> {
    pub fn assemble(&self) -> Result<Submission, AssembleError> {
        let category = self.category().ok_or(AssembleError::MissingCategory)?;
        if self.is_empty() {
            return Err(AssembleError::Empty);
        }

        let mut content = Vec::with_capacity(self.blocks().len());
        let mut files = Vec::new();

        for block in self.blocks() {
            let value = match block.image() {
                None => block.text().map(str::to_string),
                Some(ImageSlot::Remote(url)) => Some(url.clone()),
                Some(ImageSlot::Empty) => None,
                Some(ImageSlot::Local { file, .. }) => {
                    files.push(PendingUpload {
                        block_id: block.id().clone(),
                        file_name: file.file_name.clone(),
                        content_type: file.content_type.clone(),
                        bytes: file.bytes.clone(),
                    });
                    None
                }
            };

            content.push(SubmittedBlock {
                id: block.id().clone(),
                kind: block.kind(),
                value,
            });
        }

        Ok(Submission {
            category,
            content,
            files,
        })
    }
}

impl Submission {
    pub fn content_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.content)
    }

    /// Image blocks that will be resolved from `files`, in content order
    pub fn pending_images(&self) -> impl Iterator<Item = &SubmittedBlock> {
        self.content
            .iter()
            .filter(|b| b.kind == BlockKind::Image && b.is_pending_image())
    }

    /// Multipart body: `type`, `content` (JSON string), then one `images` part
    /// per file whose part filename is the owning block id
    pub fn into_form(self) -> Result<Form, crate::ClientError> {
        let content = self.content_json()?;
        let mut form = Form::new()
            .text(TYPE_FIELD, self.category.as_str())
            .text(CONTENT_FIELD, content);

        for file in self.files {
            let part = Part::bytes(file.bytes)
                .file_name(file.block_id.as_str().to_string())
                .mime_str(&file.content_type)?;
            form = form.part(IMAGES_FIELD, part);
        }

        Ok(form)
    }
}
