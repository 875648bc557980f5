//! Configuration module

mod site;

pub use site::BlogConfig;
pub use site::ExpertiseConfig;
pub use site::HighlightConfig;
pub use site::LinkConfig;
pub use site::PortfolioConfig;
pub use site::ProjectConfig;
pub use site::SiteConfig;
