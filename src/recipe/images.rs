use std::fmt::Display;

use uuid::Uuid;

use crate::error::ModelError;

const RECIPE_UPLOAD_DIR: &str = "uploads/recipe";

/// Storage path for a newly uploaded recipe image, named by a fresh UUID and
/// keeping the original file's extension.
pub fn recipe_image_file_path(filename: &str) -> Result<String, ModelError> {
    image_path_for(Uuid::new_v4(), filename)
}

pub(crate) fn image_path_for(stem: impl Display, filename: &str) -> Result<String, ModelError> {
    let ext = match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => ext,
        _ => {
            return Err(ModelError::InvalidArgument(format!(
                "file name {filename:?} has no usable extension"
            )))
        }
    };
    Ok(format!("{RECIPE_UPLOAD_DIR}/{stem}.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_uses_stem_and_extension() {
        let path = image_path_for("test-uuid", "myimage.jpg").unwrap();
        assert_eq!(path, "uploads/recipe/test-uuid.jpg");
    }

    #[test]
    fn only_last_extension_is_kept() {
        let path = image_path_for("x", "holiday.photo.png").unwrap();
        assert_eq!(path, "uploads/recipe/x.png");
    }

    #[test]
    fn name_without_extension_is_rejected() {
        let err = image_path_for("test-uuid", "myimage").unwrap_err();
        assert!(matches!(err, ModelError::InvalidArgument(_)));
        assert!(image_path_for("test-uuid", "trailing.").is_err());
    }

    #[test]
    fn extension_cannot_carry_path_parts() {
        for name in ["a.jpg/x", "a.jpg/../../etc", "a.j pg", "a.jpg\\x"] {
            let err = image_path_for("test-uuid", name).unwrap_err();
            assert!(matches!(err, ModelError::InvalidArgument(_)), "{name}");
        }
    }

    #[test]
    fn random_paths_differ() {
        let a = recipe_image_file_path("a.jpg").unwrap();
        let b = recipe_image_file_path("a.jpg").unwrap();
        assert!(a.starts_with("uploads/recipe/") && a.ends_with(".jpg"));
        assert_ne!(a, b);
    }
}
