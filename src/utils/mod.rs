pub mod file_url;
pub mod format;
pub mod image_crop;
pub mod session;

pub use file_url::*;
pub use format::*;
pub use image_crop::{CropSurface, crop_data_url, crop_image, decode_data_url, oversize_error, to_png_data_url, validate_upload};
pub use session::*;
