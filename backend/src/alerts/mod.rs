pub mod intake;
pub mod model;
pub mod repository;
pub mod repository_sqlx;

pub use intake::create_alert;
pub use model::{Alert, AlertId, NewAlert};
pub use repository::AlertRepository;
pub use repository_sqlx::SqlxAlertRepository;
