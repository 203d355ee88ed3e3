pub mod derive;
pub mod normalize;
pub mod types;
pub mod unify;

pub use derive::derive_column_info;
pub use normalize::{coerce_age, normalize_column_name, normalize_columns, normalize_sample};
pub use types::{AnalysisRecord, ColumnInfo, ColumnKind, NormalizedSample, UnifiedRow, UnifiedTable};
pub use unify::{project, unify};
