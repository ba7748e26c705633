/// MIME types the funnel accepts without complaint.
pub const ACCEPTED_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/jpg",
    "image/png",
    "application/postscript",
    "image/vnd.adobe.photoshop",
    "image/tiff",
    "application/illustrator",
];

/// Extensions accepted when the content type is missing or generic.
pub const ACCEPTED_EXTENSIONS: &[&str] =
    &["pdf", "jpg", "jpeg", "png", "ai", "psd", "tiff", "tif", "eps"];

/// One file lifted out of the multipart form, not yet encoded.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Whether a file looks like print material.
///
/// The content type wins when it is on the list; otherwise the file name
/// extension gets a say, since browsers leave the type blank or generic
/// for the design formats.
pub fn is_accepted(name: &str, content_type: &str) -> bool {
    if ACCEPTED_TYPES
        .iter()
        .any(|t| content_type.eq_ignore_ascii_case(t))
    {
        return true;
    }

    name.rsplit_once('.')
        .map(|(_, ext)| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|e| ext.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}
