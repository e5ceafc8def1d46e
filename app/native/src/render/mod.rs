//! Default rendering and desktop integration.
//!
//! - [`processing`] - Composes a plan into one desktop-sized image
//! - [`desktop`] - Saves the image and installs it as the background
//! - [`discovery`] - Finds wallpaper images in configured directories

pub mod desktop;
pub mod discovery;
pub mod processing;

pub use desktop::SystemDesktop;
pub use discovery::{discover_images, is_supported_image};
pub use processing::ImageComposer;
