pub mod model;
pub mod repository;
pub mod repository_sqlx;

pub use model::{NewPricePoint, PricePoint};
pub use repository::PriceRepository;
pub use repository_sqlx::SqlxPriceRepository;
