pub mod image;
pub mod post;
pub mod speech;
pub mod text;

pub use image::*;
pub use post::*;
pub use speech::*;
pub use text::*;
