//! Profile picture upload naming rules.

use uuid::Uuid;

/// File extensions accepted for profile pictures (lowercase).
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Largest accepted profile picture, in bytes.
pub const MAX_PROFILE_PICTURE_BYTES: usize = 5 * 1024 * 1024;

/// Sub-directory of the upload root that holds profile pictures.
pub const PROFILE_PICTURE_DIR: &str = "profile_pictures";

/// Return the lowercase extension of `filename` if it is an accepted image type.
pub fn image_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_IMAGE_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Generate a collision-free stored filename for an upload.
pub fn stored_filename(extension: &str) -> String {
    format!("{}.{extension}", Uuid::new_v4().simple())
}

/// Public URL path under which a stored profile picture is served.
pub fn public_path(stored_filename: &str) -> String {
    format!("/api/uploads/{PROFILE_PICTURE_DIR}/{stored_filename}")
}

/// Whether `name` is a plain file name (no separators, no parent references).
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}
