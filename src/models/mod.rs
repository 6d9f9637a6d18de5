pub mod catalog;
pub mod dataset;
pub mod diagnostic;
pub mod equipment;
pub mod id;
pub mod logged_data;
pub mod prescription;
pub mod representation;
pub mod shapes;
pub mod summary;

pub use catalog::*;
pub use dataset::*;
pub use diagnostic::*;
pub use equipment::*;
pub use id::*;
pub use logged_data::*;
pub use prescription::*;
pub use representation::*;
pub use shapes::*;
pub use summary::*;
