use crate::record::RawRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Search {
        query: String,
    },
    /// One persistence call per row, in order.
    PersistRecords {
        rows: Vec<RawRecord>,
    },
    GenerateDrafts {
        subject: String,
        body_template: String,
        records: Vec<RawRecord>,
    },
    /// One send call per draft, in order.
    SendDrafts {
        drafts: Vec<RawRecord>,
    },
    Export {
        format: ExportFormat,
        file_stem: String,
        rows: Vec<RawRecord>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}
