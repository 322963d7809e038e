/// Multipart decoding for post create/update
use crate::error::{AppError, Result};
use crate::services::{ImageUpload, PostForm};
use actix_multipart::Multipart;
use content_blocks::{SubmittedBlock, CONTENT_FIELD, IMAGES_FIELD, TYPE_FIELD};
use futures_util::StreamExt;

/// Text fields larger than this are rejected
const MAX_TEXT_FIELD_BYTES: usize = 1024 * 1024;

/// Read `type`, `content` and `images` parts. Files must be `image/*` and at
/// most `max_file_bytes` each; unknown fields are skipped.
pub async fn read_post_form(mut payload: Multipart, max_file_bytes: usize) -> Result<PostForm> {
    let mut category = None;
    let mut content = None;
    let mut files = Vec::new();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?;
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            TYPE_FIELD | CONTENT_FIELD => {
                let bytes = read_field(&mut field, MAX_TEXT_FIELD_BYTES, &name).await?;
                let text = String::from_utf8(bytes)
                    .map_err(|_| AppError::BadRequest(format!("Field '{name}' is not UTF-8")))?;
                if name == TYPE_FIELD {
                    category = Some(text);
                } else {
                    content = Some(text);
                }
            }
            IMAGES_FIELD => {
                let content_type = match field.content_type() {
                    Some(m) if m.type_() == mime::IMAGE => m.essence_str().to_string(),
                    other => {
                        return Err(AppError::BadRequest(format!(
                            "Unsupported image type '{}'",
                            other.map(|m| m.essence_str()).unwrap_or("unknown")
                        )))
                    }
                };
                let file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .unwrap_or("upload")
                    .to_string();
                let bytes = read_field(&mut field, max_file_bytes, &name).await?;

                files.push(ImageUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            other => {
                tracing::debug!(field = other, "ignoring multipart field");
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
                }
            }
        }
    }

    let category = category
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Field 'type' is required".into()))?;
    let content = content.ok_or_else(|| AppError::Validation("Field 'content' is required".into()))?;

    Ok(PostForm {
        category,
        content: parse_content(&content)?,
        files,
    })
}

/// Decode the `content` field's JSON array
pub fn parse_content(raw: &str) -> Result<Vec<SubmittedBlock>> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::Validation(format!("Field 'content' is not a valid block list: {e}")))
}

async fn read_field(
    field: &mut actix_multipart::Field,
    limit: usize,
    name: &str,
) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::BadRequest(format!("Failed to read '{name}': {e}")))?;
        if bytes.len() + chunk.len() > limit {
            return Err(AppError::BadRequest(format!(
                "Field '{name}' exceeds {limit} bytes"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use content_blocks::BlockKind;

    #[test]
    fn test_parse_content_keeps_pending_images() {
        let blocks = parse_content(
            r#"[{"id":"t","type":"title","value":"Hello"},{"id":"i","type":"image"}]"#,
        )
        .unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, BlockKind::Title);
        assert!(blocks[1].is_pending_image());
    }

    #[test]
    fn test_parse_content_rejects_garbage() {
        assert!(matches!(
            parse_content("{not json").unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(parse_content(r#"[{"id":"x","type":"video","value":"v"}]"#).is_err());
    }
}
