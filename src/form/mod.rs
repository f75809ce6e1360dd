//! Create-job form: job name rules, parameter rows, job options and the
//! form model.

pub mod model;
pub mod name;
pub mod options;
pub mod params;

pub use model::{CreateJobModel, CreateType, Created};
pub use name::{MAX_NAME_LENGTH, make_name_valid, name_error, name_is_valid};
pub use options::{JobOptions, NotificationEvent, NotificationSettings};
pub use params::{JobParameter, ParamId, ParameterList};
