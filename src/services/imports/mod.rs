/// Library imports from other tracking services
pub mod csv;
pub mod mal_xml;
pub mod parsers;
pub mod wizard;

pub use csv::parse_csv_lines;
pub use parsers::{find_column, parse_import, ImportPlatform, ImportedItem};
pub use wizard::{ImportWizard, WizardError, WizardStep};
