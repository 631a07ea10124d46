use super::errors::{
    ConfigError,
    ExportError,
    FilterError,
    GlobalError,
    IngestError,
    NarrativeError,
};

pub type IngestResult<T> = Result<T,IngestError>;
pub type FilterResult<T> = Result<T,FilterError>;
pub type NarrativeResult<T> = Result<T,NarrativeError>;
pub type ConfigResult<T> = Result<T,ConfigError>;
pub type ExportResult<T> = Result<T,ExportError>;
pub type GlobalResult<T> = Result<T,GlobalError>;
