//! Form model for the investment term sheet.
//!
//! Declares what the form engine operates on: field identity and schema,
//! raw values and ordered snapshots, typed calculation rule identifiers, and
//! the conditional rules that drive visibility and labels.

pub mod condition;
pub mod enums;
pub mod error;
pub mod field;
pub mod ids;
pub mod keys;
pub mod rule;
pub mod schema;
pub mod snapshot;
pub mod value;

pub use condition::{ConditionOperator, ConditionValue, ConditionalRule, LabelRule};
pub use enums::{CurrencyUnit, DisplayFormat, FieldType};
pub use error::{ModelError, Result};
pub use field::FieldSchema;
pub use ids::FieldKey;
pub use rule::RuleId;
pub use schema::{FormSchema, SchemaIssue, Section};
pub use snapshot::FieldSnapshot;
pub use value::{FieldValue, format_grouped, format_number, parse_number};
