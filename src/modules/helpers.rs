pub mod image_export;
