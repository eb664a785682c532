pub mod helpers;
pub mod image_edit;
