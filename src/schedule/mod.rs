//! Easy scheduling fields, cron expressions, validation and plain-language
//! descriptions.

pub mod cron;
pub mod describe;
pub mod fields;
pub mod model;
pub mod validate;

pub use self::cron::{CronExpression, CronPreview, derive_cron_from_fields, derive_fields_from_cron, is_valid_cron};
pub use describe::describe;
pub use fields::{ClockTime, EasyInterval, ScheduleField, ScheduleFields, ScheduleInterval};
pub use model::{PRESETS, Preset, ScheduleEdit, ScheduleSpec, ScheduleState, reduce};
pub use validate::{FieldErrors, validate};
