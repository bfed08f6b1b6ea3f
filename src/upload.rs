pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];
const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Checks the client-declared filename and content type against the image
/// allow-list. Advisory only, the bytes themselves are never inspected.
pub fn check_upload(filename: &str, content_type: &str) -> Option<&'static str> {
    let extension_allowed = filename
        .rsplit_once('.')
        .is_some_and(|(_, extension)| {
            ALLOWED_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
        });

    if !extension_allowed {
        return Some("only image files are allowed (jpg, jpeg, png, webp)");
    }

    if !ALLOWED_CONTENT_TYPES.contains(&content_type.to_ascii_lowercase().as_str()) {
        return Some("unsupported image content type");
    }

    None
}
