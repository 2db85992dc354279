pub mod article;
pub mod category;
pub mod settings;

pub use article::{Article, Source};
pub use category::Category;
pub use settings::Settings;
