//! Object key layout: `{category}/{userId}/{characterId}/{file}`.

use studio_core::error::CoreError;

pub const CATEGORY_REFERENCES: &str = "references";
pub const CATEGORY_TRAINING: &str = "training";
pub const CATEGORY_VISUALIZATIONS: &str = "visualizations";

/// Key for a paired-creation reference image.
pub fn reference_image(user_id: &str, character_id: &str, extension: &str) -> String {
    format!("{CATEGORY_REFERENCES}/{user_id}/{character_id}/reference.{extension}")
}

/// Key for one batch-training input image.
pub fn training_image(user_id: &str, character_id: &str, file_name: &str) -> String {
    format!("{CATEGORY_TRAINING}/{user_id}/{character_id}/{file_name}")
}

/// Key for a saved visualization image.
pub fn visualization_image(
    user_id: &str,
    character_id: &str,
    visualization_id: &str,
    extension: &str,
) -> String {
    format!("{CATEGORY_VISUALIZATIONS}/{user_id}/{character_id}/{visualization_id}.{extension}")
}

/// Validate a client-declared file name before it becomes part of a key.
///
/// Rejects empty names, path separators, and traversal segments.
pub fn validate_file_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() || name.len() > 256 {
        return Err(CoreError::Validation(
            "File name must be 1-256 characters".into(),
        ));
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(CoreError::Validation(format!(
            "File name '{name}' must not contain path separators"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_category_layout() {
        assert_eq!(
            reference_image("u1", "c1", "jpg"),
            "references/u1/c1/reference.jpg"
        );
        assert_eq!(
            training_image("u1", "c1", "image-0.png"),
            "training/u1/c1/image-0.png"
        );
        assert_eq!(
            visualization_image("u1", "c1", "v1", "png"),
            "visualizations/u1/c1/v1.png"
        );
    }

    #[test]
    fn file_name_validation() {
        assert!(validate_file_name("image.png").is_ok());
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("a/b.png").is_err());
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name(&"x".repeat(300)).is_err());
    }
}
