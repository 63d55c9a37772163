//! Namespace and type specifications
//!
//! Declares the ndx-sound types in the NWB schema language and exports them
//! as YAML documents for NWB readers.

pub mod declarations;
pub mod namespace;
pub mod types;

use std::path::Path;

use crate::config::NamespaceInfo;
use crate::error::Result;

pub use declarations::{all_declarations, DEFAULT_UNIT};
pub use namespace::{
    ExportedSpec, ExtensionsDocument, NamespaceBuilder, NamespaceDocument, NamespaceEntry,
    SchemaSource,
};
pub use types::{
    AttributeSpec, DatasetSpec, DimsSpec, DtypeSpec, GroupSpec, LinkSpec, Quantity, RefSpec,
    ShapeSpec,
};

/// Namespace builder with every core include the declarations depend on.
pub fn namespace_builder(info: NamespaceInfo) -> NamespaceBuilder {
    let mut builder = NamespaceBuilder::new(info);
    for type_name in declarations::CORE_INCLUDES {
        builder.include_type(type_name, declarations::CORE_NAMESPACE);
    }
    builder
}

/// Regenerate the schema files for `info` into `output_dir`.
pub fn generate(info: NamespaceInfo, output_dir: &Path) -> Result<ExportedSpec> {
    namespace_builder(info).export(output_dir, &all_declarations())
}
