//! Group, dataset, attribute and link specifications
//!
//! Serialized field names and ordering follow the NWB schema language so the
//! exported documents load in any NWB-aware reader.

use std::collections::HashSet;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SoundError};

// ============================================================================
// Quantity
// ============================================================================

/// How many instances of a child may appear in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quantity {
    /// Exactly one (the schema language's default, omitted on export)
    #[default]
    One,
    /// `?`
    ZeroOrOne,
    /// `*`
    ZeroOrMany,
    /// `+`
    OneOrMany,
    /// A fixed count other than one
    Exactly(u64),
}

impl Quantity {
    pub fn is_one(&self) -> bool {
        matches!(self, Quantity::One | Quantity::Exactly(1))
    }

    /// Whether the child may be left out entirely.
    pub fn is_optional(&self) -> bool {
        matches!(self, Quantity::ZeroOrOne | Quantity::ZeroOrMany)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Quantity::One => serializer.serialize_u64(1),
            Quantity::ZeroOrOne => serializer.serialize_str("?"),
            Quantity::ZeroOrMany => serializer.serialize_str("*"),
            Quantity::OneOrMany => serializer.serialize_str("+"),
            Quantity::Exactly(n) => serializer.serialize_u64(*n),
        }
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(u64),
            Marker(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Count(1) => Ok(Quantity::One),
            Raw::Count(n) => Ok(Quantity::Exactly(n)),
            Raw::Marker(m) => match m.as_str() {
                "?" | "zero_or_one" => Ok(Quantity::ZeroOrOne),
                "*" | "zero_or_many" => Ok(Quantity::ZeroOrMany),
                "+" | "one_or_many" => Ok(Quantity::OneOrMany),
                other => Err(de::Error::custom(format!("invalid quantity '{}'", other))),
            },
        }
    }
}

// ============================================================================
// Dtype / shape / dims
// ============================================================================

/// Reference dtype pointing at objects of a given type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefSpec {
    pub target_type: String,
    pub reftype: String,
}

/// A dataset or attribute dtype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DtypeSpec {
    Simple(String),
    Ref(RefSpec),
}

impl DtypeSpec {
    pub fn simple(name: &str) -> Self {
        DtypeSpec::Simple(name.to_string())
    }

    pub fn text() -> Self {
        Self::simple("text")
    }

    pub fn numeric() -> Self {
        Self::simple("numeric")
    }

    pub fn float64() -> Self {
        Self::simple("float64")
    }

    pub fn object_ref(target_type: &str) -> Self {
        DtypeSpec::Ref(RefSpec {
            target_type: target_type.to_string(),
            reftype: "object".to_string(),
        })
    }
}

/// Allowed shapes; `None` marks an unconstrained dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShapeSpec {
    Single(Vec<Option<u64>>),
    Alternatives(Vec<Vec<Option<u64>>>),
}

impl ShapeSpec {
    /// Rank of every alternative, in declaration order.
    pub fn ranks(&self) -> Vec<usize> {
        match self {
            ShapeSpec::Single(s) => vec![s.len()],
            ShapeSpec::Alternatives(alts) => alts.iter().map(Vec::len).collect(),
        }
    }

    /// Whether a concrete shape satisfies any alternative.
    pub fn accepts(&self, shape: &[usize]) -> bool {
        let matches = |alt: &Vec<Option<u64>>| {
            alt.len() == shape.len()
                && alt
                    .iter()
                    .zip(shape)
                    .all(|(want, &got)| want.map_or(true, |w| w == got as u64))
        };
        match self {
            ShapeSpec::Single(s) => matches(s),
            ShapeSpec::Alternatives(alts) => alts.iter().any(matches),
        }
    }
}

/// Dimension labels, parallel to [`ShapeSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimsSpec {
    Single(Vec<String>),
    Alternatives(Vec<Vec<String>>),
}

impl DimsSpec {
    pub fn ranks(&self) -> Vec<usize> {
        match self {
            DimsSpec::Single(d) => vec![d.len()],
            DimsSpec::Alternatives(alts) => alts.iter().map(Vec::len).collect(),
        }
    }
}

fn check_dims_shape(
    type_name: &str,
    dims: &Option<DimsSpec>,
    shape: &Option<ShapeSpec>,
) -> Result<()> {
    if let (Some(dims), Some(shape)) = (dims, shape) {
        if dims.ranks() != shape.ranks() {
            return Err(SoundError::InvalidSpec {
                type_name: type_name.to_string(),
                reason: format!(
                    "dims ranks {:?} do not match shape ranks {:?}",
                    dims.ranks(),
                    shape.ranks()
                ),
            });
        }
    }
    Ok(())
}

fn check_doc(type_name: &str, doc: &str) -> Result<()> {
    if doc.trim().is_empty() {
        return Err(SoundError::InvalidSpec {
            type_name: type_name.to_string(),
            reason: "doc must not be empty".to_string(),
        });
    }
    Ok(())
}

fn is_true(value: &bool) -> bool {
    *value
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Attribute
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    pub dtype: DtypeSpec,
    pub doc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dims: Option<DimsSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeSpec>,
    /// Fixed value; the attribute cannot be set by callers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_yaml::Value>,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub required: bool,
}

impl AttributeSpec {
    pub fn new(name: &str, dtype: DtypeSpec, doc: &str) -> Self {
        Self {
            name: name.to_string(),
            dtype,
            doc: doc.to_string(),
            dims: None,
            shape: None,
            value: None,
            default_value: None,
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Optional attribute with a default filled in when the caller omits it.
    pub fn with_default(mut self, value: impl Into<serde_yaml::Value>) -> Self {
        self.default_value = Some(value.into());
        self.required = false;
        self
    }

    pub fn with_shape(mut self, dims: DimsSpec, shape: ShapeSpec) -> Self {
        self.dims = Some(dims);
        self.shape = Some(shape);
        self
    }

    /// Default value rendered as text, if it is a string.
    pub fn default_text(&self) -> Option<&str> {
        self.default_value.as_ref().and_then(|v| v.as_str())
    }

    pub fn validate(&self, owner: &str) -> Result<()> {
        let label = format!("{}.{}", owner, self.name);
        check_doc(&label, &self.doc)?;
        check_dims_shape(&label, &self.dims, &self.shape)?;
        if self.value.is_some() && self.default_value.is_some() {
            return Err(SoundError::InvalidSpec {
                type_name: label,
                reason: "cannot declare both value and default_value".to_string(),
            });
        }
        if self.required && self.default_value.is_some() {
            return Err(SoundError::InvalidSpec {
                type_name: label,
                reason: "a required attribute cannot carry a default".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Dataset
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neurodata_type_def: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neurodata_type_inc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<DtypeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dims: Option<DimsSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeSpec>,
    pub doc: String,
    #[serde(default, skip_serializing_if = "Quantity::is_one")]
    pub quantity: Quantity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeSpec>,
}

impl DatasetSpec {
    /// A named dataset, optionally typed by an included data type.
    pub fn named(name: &str, doc: &str) -> Self {
        Self {
            neurodata_type_def: None,
            neurodata_type_inc: None,
            name: Some(name.to_string()),
            dtype: None,
            dims: None,
            shape: None,
            doc: doc.to_string(),
            quantity: Quantity::One,
            attributes: Vec::new(),
        }
    }

    pub fn of_type(mut self, neurodata_type_inc: &str) -> Self {
        self.neurodata_type_inc = Some(neurodata_type_inc.to_string());
        self
    }

    pub fn with_dtype(mut self, dtype: DtypeSpec) -> Self {
        self.dtype = Some(dtype);
        self
    }

    pub fn with_shape(mut self, dims: DimsSpec, shape: ShapeSpec) -> Self {
        self.dims = Some(dims);
        self.shape = Some(shape);
        self
    }

    pub fn with_quantity(mut self, quantity: Quantity) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    fn label(&self) -> String {
        self.neurodata_type_def
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| "<anonymous dataset>".to_string())
    }

    pub fn validate(&self, owner: &str) -> Result<()> {
        let label = format!("{}/{}", owner, self.label());
        check_doc(&label, &self.doc)?;
        check_dims_shape(&label, &self.dims, &self.shape)?;
        if self.name.is_none() && self.neurodata_type_def.is_none() && self.neurodata_type_inc.is_none()
        {
            return Err(SoundError::InvalidSpec {
                type_name: label,
                reason: "an untyped dataset must have a name".to_string(),
            });
        }
        check_unique(&label, self.attributes.iter().map(|a| a.name.as_str()))?;
        for attribute in &self.attributes {
            attribute.validate(&label)?;
        }
        Ok(())
    }
}

// ============================================================================
// Link
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub name: String,
    pub target_type: String,
    pub doc: String,
    #[serde(default, skip_serializing_if = "Quantity::is_one")]
    pub quantity: Quantity,
}

impl LinkSpec {
    pub fn new(name: &str, target_type: &str, doc: &str) -> Self {
        Self {
            name: name.to_string(),
            target_type: target_type.to_string(),
            doc: doc.to_string(),
            quantity: Quantity::One,
        }
    }

    pub fn with_quantity(mut self, quantity: Quantity) -> Self {
        self.quantity = quantity;
        self
    }
}

// ============================================================================
// Group
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neurodata_type_def: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neurodata_type_inc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_name: Option<String>,
    pub doc: String,
    #[serde(default, skip_serializing_if = "Quantity::is_one")]
    pub quantity: Quantity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datasets: Vec<DatasetSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkSpec>,
}

impl GroupSpec {
    /// Declare a new data type extending `parent`.
    pub fn define(type_def: &str, parent: &str, doc: &str) -> Self {
        Self {
            neurodata_type_def: Some(type_def.to_string()),
            neurodata_type_inc: Some(parent.to_string()),
            name: None,
            default_name: None,
            doc: doc.to_string(),
            quantity: Quantity::One,
            attributes: Vec::new(),
            datasets: Vec::new(),
            groups: Vec::new(),
            links: Vec::new(),
        }
    }

    /// An untitled child group of an existing type.
    pub fn include(type_inc: &str, doc: &str) -> Self {
        Self {
            neurodata_type_def: None,
            neurodata_type_inc: Some(type_inc.to_string()),
            ..Self::define("", "", doc)
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_default_name(mut self, name: &str) -> Self {
        self.default_name = Some(name.to_string());
        self
    }

    pub fn with_quantity(mut self, quantity: Quantity) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_dataset(mut self, dataset: DatasetSpec) -> Self {
        self.datasets.push(dataset);
        self
    }

    pub fn with_group(mut self, group: GroupSpec) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_link(mut self, link: LinkSpec) -> Self {
        self.links.push(link);
        self
    }

    /// The type this group defines, if any.
    pub fn type_def(&self) -> Option<&str> {
        self.neurodata_type_def.as_deref()
    }

    pub fn type_inc(&self) -> Option<&str> {
        self.neurodata_type_inc.as_deref()
    }

    pub fn dataset(&self, name: &str) -> Option<&DatasetSpec> {
        self.datasets.iter().find(|d| d.name.as_deref() == Some(name))
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn link(&self, name: &str) -> Option<&LinkSpec> {
        self.links.iter().find(|l| l.name == name)
    }

    fn label(&self) -> String {
        self.neurodata_type_def
            .clone()
            .or_else(|| self.name.clone())
            .or_else(|| self.neurodata_type_inc.clone())
            .unwrap_or_else(|| "<anonymous group>".to_string())
    }

    /// Check the spec is internally consistent.
    pub fn validate(&self) -> Result<()> {
        let label = self.label();
        check_doc(&label, &self.doc)?;

        if self.neurodata_type_def.as_deref() == Some("") {
            return Err(SoundError::InvalidSpec {
                type_name: label,
                reason: "neurodata_type_def must not be empty".to_string(),
            });
        }
        if self.name.is_some() && self.default_name.is_some() {
            return Err(SoundError::InvalidSpec {
                type_name: label,
                reason: "cannot declare both name and default_name".to_string(),
            });
        }

        check_unique(&label, self.attributes.iter().map(|a| a.name.as_str()))?;
        let child_names = self
            .datasets
            .iter()
            .filter_map(|d| d.name.as_deref())
            .chain(self.groups.iter().filter_map(|g| g.name.as_deref()))
            .chain(self.links.iter().map(|l| l.name.as_str()));
        check_unique(&label, child_names)?;

        for attribute in &self.attributes {
            attribute.validate(&label)?;
        }
        for dataset in &self.datasets {
            dataset.validate(&label)?;
        }
        for group in &self.groups {
            group.validate()?;
        }
        for link in &self.links {
            check_doc(&format!("{}/{}", label, link.name), &link.doc)?;
        }
        Ok(())
    }
}

fn check_unique<'a>(owner: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(SoundError::InvalidSpec {
                type_name: owner.to_string(),
                reason: format!("duplicate child name '{}'", name),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_yaml() {
        let q: Quantity = serde_yaml::from_str("'?'").unwrap();
        assert_eq!(q, Quantity::ZeroOrOne);
        let q: Quantity = serde_yaml::from_str("3").unwrap();
        assert_eq!(q, Quantity::Exactly(3));
        assert_eq!(serde_yaml::to_string(&Quantity::OneOrMany).unwrap().trim(), "+");
    }

    #[test]
    fn test_shape_accepts() {
        let shape = ShapeSpec::Alternatives(vec![vec![None], vec![None, Some(1)], vec![None, Some(2)]]);
        assert!(shape.accepts(&[100]));
        assert!(shape.accepts(&[100, 2]));
        assert!(!shape.accepts(&[100, 3]));
        assert!(!shape.accepts(&[10, 10, 10]));
    }

    #[test]
    fn test_shape_yaml_untagged() {
        let single: ShapeSpec = serde_yaml::from_str("[2]").unwrap();
        assert_eq!(single, ShapeSpec::Single(vec![Some(2)]));
        let alts: ShapeSpec = serde_yaml::from_str("[[null], [null, 1]]").unwrap();
        assert_eq!(alts.ranks(), vec![1, 2]);
    }

    #[test]
    fn test_dims_shape_mismatch_rejected() {
        let dataset = DatasetSpec::named("data", "doc").with_shape(
            DimsSpec::Single(vec!["time".into(), "channel".into()]),
            ShapeSpec::Single(vec![None]),
        );
        let err = dataset.validate("Owner").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SPEC");
    }

    #[test]
    fn test_duplicate_children_rejected() {
        let group = GroupSpec::define("Thing", "Container", "a thing")
            .with_dataset(DatasetSpec::named("x", "first"))
            .with_link(LinkSpec::new("x", "Device", "second"));
        assert!(group.validate().is_err());
    }

    #[test]
    fn test_required_attribute_with_default_rejected() {
        let mut attribute = AttributeSpec::new("unit", DtypeSpec::text(), "unit").with_default("n.a.");
        attribute.required = true;
        assert!(attribute.validate("Owner").is_err());
    }

    #[test]
    fn test_empty_doc_rejected() {
        let group = GroupSpec::define("Thing", "Container", "  ");
        assert!(group.validate().is_err());
    }
}
