//! Working draft of one post.
//!
//! A `Draft` is owned by a single editing session. Every mutation reports
//! whether it was applied, and every preview handle it creates is released
//! when superseded, when its block is removed, on `reset`, or on drop.

use crate::block::{BlockBody, BlockId, BlockKind};
use crate::category::Category;
use crate::post::PostDocument;
use crate::preview::{BlobPreviewStore, LocalFile, PreviewStore};

/// Result of an editor operation
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    Rejected(RejectReason),
}

impl EditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Non-title block added before any title block exists
    TitleRequiredFirst,
    UnknownBlock,
    DuplicateId,
    NotAnImageBlock,
}

/// Image state of a draft block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSlot {
    Empty,
    /// Already uploaded
    Remote(String),
    /// Picked locally, shown through `preview` until uploaded
    Local { file: LocalFile, preview: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Text(String),
    Image(ImageSlot),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftBlock {
    id: BlockId,
    kind: BlockKind,
    slot: Slot,
}

impl DraftBlock {
    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    /// Value as displayed in the editor; a local image shows its preview handle
    pub fn display_value(&self) -> Option<&str> {
        match &self.slot {
            Slot::Text(v) => Some(v),
            Slot::Image(ImageSlot::Remote(url)) => Some(url),
            Slot::Image(ImageSlot::Local { preview, .. }) => Some(preview),
            Slot::Image(ImageSlot::Empty) => None,
        }
    }

    pub fn image(&self) -> Option<&ImageSlot> {
        match &self.slot {
            Slot::Image(image) => Some(image),
            Slot::Text(_) => None,
        }
    }

    pub(crate) fn text(&self) -> Option<&str> {
        match &self.slot {
            Slot::Text(v) => Some(v),
            Slot::Image(_) => None,
        }
    }

    fn take_preview(&mut self) -> Option<String> {
        match &mut self.slot {
            Slot::Image(slot @ ImageSlot::Local { .. }) => {
                match std::mem::replace(slot, ImageSlot::Empty) {
                    ImageSlot::Local { preview, .. } => Some(preview),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

pub struct Draft<P: PreviewStore = BlobPreviewStore> {
    category: Option<Category>,
    blocks: Vec<DraftBlock>,
    previews: P,
}

impl Draft<BlobPreviewStore> {
    pub fn new() -> Self {
        Self::with_previews(BlobPreviewStore::new())
    }

    /// Load a persisted post for editing; its images start out resolved
    pub fn from_post(post: &PostDocument) -> Self {
        let mut draft = Self::new();
        draft.category = Some(post.block_type);
        draft.blocks = post
            .content
            .iter()
            .map(|block| DraftBlock {
                id: block.id.clone(),
                kind: block.kind(),
                slot: match &block.body {
                    BlockBody::Image { url } => Slot::Image(ImageSlot::Remote(url.clone())),
                    body => Slot::Text(body.value().to_string()),
                },
            })
            .collect();
        draft
    }
}

impl Default for Draft<BlobPreviewStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PreviewStore> Draft<P> {
    pub fn with_previews(previews: P) -> Self {
        Self {
            category: None,
            blocks: Vec::new(),
            previews,
        }
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = Some(category);
    }

    pub fn blocks(&self) -> &[DraftBlock] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn previews(&self) -> &P {
        &self.previews
    }

    pub fn has_title(&self) -> bool {
        self.blocks.iter().any(|b| b.kind == BlockKind::Title)
    }

    /// Append a block. A fresh id is generated when none is given.
    pub fn add_block(
        &mut self,
        kind: BlockKind,
        id: Option<BlockId>,
        value: Option<String>,
    ) -> EditOutcome {
        if kind != BlockKind::Title && !self.has_title() {
            return EditOutcome::Rejected(RejectReason::TitleRequiredFirst);
        }

        let id = id.unwrap_or_else(BlockId::generate);
        if self.position(&id).is_some() {
            return EditOutcome::Rejected(RejectReason::DuplicateId);
        }

        let slot = match kind {
            BlockKind::Image => Slot::Image(match value {
                Some(url) if !url.is_empty() => ImageSlot::Remote(url),
                _ => ImageSlot::Empty,
            }),
            _ => Slot::Text(value.unwrap_or_default()),
        };

        self.blocks.push(DraftBlock { id, kind, slot });
        EditOutcome::Applied
    }

    /// Replace a block's value. On an image block this drops any local file.
    pub fn update_value(&mut self, id: &BlockId, value: impl Into<String>) -> EditOutcome {
        let Some(idx) = self.position(id) else {
            return EditOutcome::Rejected(RejectReason::UnknownBlock);
        };

        let value = value.into();
        let released = self.blocks[idx].take_preview();
        self.blocks[idx].slot = match self.blocks[idx].kind {
            BlockKind::Image if value.is_empty() => Slot::Image(ImageSlot::Empty),
            BlockKind::Image => Slot::Image(ImageSlot::Remote(value)),
            _ => Slot::Text(value),
        };

        if let Some(handle) = released {
            self.previews.release(&handle);
        }
        EditOutcome::Applied
    }

    /// Bind a local file to an image block and show it through a new preview
    pub fn set_image(&mut self, id: &BlockId, file: LocalFile) -> EditOutcome {
        let Some(idx) = self.position(id) else {
            return EditOutcome::Rejected(RejectReason::UnknownBlock);
        };
        if self.blocks[idx].kind != BlockKind::Image {
            return EditOutcome::Rejected(RejectReason::NotAnImageBlock);
        }

        let released = self.blocks[idx].take_preview();
        let preview = self.previews.create(&file);
        self.blocks[idx].slot = Slot::Image(ImageSlot::Local { file, preview });

        if let Some(handle) = released {
            self.previews.release(&handle);
        }
        EditOutcome::Applied
    }

    pub fn remove_block(&mut self, id: &BlockId) -> EditOutcome {
        let Some(idx) = self.position(id) else {
            return EditOutcome::Rejected(RejectReason::UnknownBlock);
        };

        let mut removed = self.blocks.remove(idx);
        if let Some(handle) = removed.take_preview() {
            self.previews.release(&handle);
        }
        EditOutcome::Applied
    }

    /// Back to the empty draft: no category, no blocks, no files, no previews
    pub fn reset(&mut self) {
        self.release_all();
        self.blocks.clear();
        self.category = None;
    }

    fn position(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| &b.id == id)
    }

    fn release_all(&mut self) {
        for block in &mut self.blocks {
            if let Some(handle) = block.take_preview() {
                self.previews.release(&handle);
            }
        }
    }
}

impl<P: PreviewStore> Drop for Draft<P> {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl<P: PreviewStore> std::fmt::Debug for Draft<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Draft")
            .field("category", &self.category)
            .field("blocks", &self.blocks)
            .finish_non_exhaustive()
    }
}
