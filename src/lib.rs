pub mod bounds;
pub mod build;
pub mod config;
pub mod error;
pub mod history;
pub mod lamps;
pub mod layer;
pub mod math;
pub mod mesh;
pub mod pick;
pub mod scene;
pub mod solar;

pub use config::SiteConfig;
pub use error::{MaquetteError, Result};
